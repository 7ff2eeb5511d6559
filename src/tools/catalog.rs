//! Declarative tool table
//!
//! Every Amadeus operation the gateway exposes is one [`ToolSpec`] row: a
//! fixed method and path plus the parameters the caller may supply and where
//! each one goes in the upstream request. Input schemas for `tools/list` and
//! argument validation are both derived from the same rows.

use serde_json::{Map, Value, json};

use crate::protocol::{Tool, ToolAnnotations};
use crate::upstream::HttpMethod;

/// Name of the general-purpose request tool
pub const GENERIC_TOOL: &str = "amadeus_api_request";

/// JSON type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// JSON string
    String,
    /// Whole number
    Integer,
    /// Any number
    Number,
    /// `true` / `false`
    Boolean,
    /// List of strings (sent comma-separated in queries)
    StringArray,
    /// JSON object
    Object,
    /// Any JSON value
    Any,
}

impl ParamType {
    /// JSON Schema `type` keyword, `None` for [`ParamType::Any`]
    #[must_use]
    pub fn schema_type(self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::StringArray => Some("array"),
            Self::Object => Some("object"),
            Self::Any => None,
        }
    }
}

/// Where a validated argument ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Replaces the `:name` segment of the tool path
    Path,
    /// Query string parameter
    Query,
    /// Field of the JSON request body
    Body,
    /// The whole request body, passed through as-is
    Payload,
    /// Consumed by the tool handler itself
    Control,
}

/// One tool parameter
#[derive(Debug, Clone, Copy)]
pub struct Param {
    /// Argument name (also the upstream name)
    pub name: &'static str,
    /// JSON type
    pub ty: ParamType,
    /// Description shown to the model
    pub description: &'static str,
    /// Must be present and non-null
    pub required: bool,
    /// Allowed values; empty means unrestricted
    pub choices: &'static [&'static str],
    /// Inclusive lower bound for numbers
    pub minimum: Option<i64>,
    /// Inclusive upper bound for numbers
    pub maximum: Option<i64>,
    /// Placement in the upstream request
    pub location: Location,
}

impl Param {
    const fn new(
        name: &'static str,
        ty: ParamType,
        location: Location,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            ty,
            description,
            required: false,
            choices: &[],
            minimum: None,
            maximum: None,
            location,
        }
    }

    /// Optional query parameter
    #[must_use]
    pub const fn query(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self::new(name, ty, Location::Query, description)
    }

    /// Required path segment
    #[must_use]
    pub const fn path(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::String, Location::Path, description).required()
    }

    /// Optional body field
    #[must_use]
    pub const fn body(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self::new(name, ty, Location::Body, description)
    }

    /// Required pass-through request body named `body`
    #[must_use]
    pub const fn payload(description: &'static str) -> Self {
        Self::new("body", ParamType::Object, Location::Payload, description).required()
    }

    /// Handler-level parameter
    #[must_use]
    pub const fn control(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self::new(name, ty, Location::Control, description)
    }

    /// Mark as required
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict to a fixed set of values
    #[must_use]
    pub const fn choices(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }

    /// Inclusive numeric bounds
    #[must_use]
    pub const fn range(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// JSON Schema for this parameter
    #[must_use]
    pub fn schema(&self) -> Value {
        let mut schema = Map::new();
        if let Some(ty) = self.ty.schema_type() {
            schema.insert("type".into(), json!(ty));
        }
        if self.ty == ParamType::StringArray {
            schema.insert("items".into(), json!({"type": "string"}));
        }
        schema.insert("description".into(), json!(self.description));
        if !self.choices.is_empty() {
            schema.insert("enum".into(), json!(self.choices));
        }
        if let Some(min) = self.minimum {
            schema.insert("minimum".into(), json!(min));
        }
        if let Some(max) = self.maximum {
            schema.insert("maximum".into(), json!(max));
        }
        Value::Object(schema)
    }
}

/// What a tool does with its validated arguments
#[derive(Debug, Clone, Copy)]
pub enum ToolKind {
    /// Fixed, trusted upstream operation
    Fixed {
        /// HTTP method
        method: HttpMethod,
        /// Path, possibly with `:name` placeholders
        path: &'static str,
    },
    /// Caller picks method and path; the path must pass the allowlist
    Generic,
}

/// One row of the tool table
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Tool name
    pub name: &'static str,
    /// Human-readable title
    pub title: &'static str,
    /// Description shown to the model
    pub description: &'static str,
    /// Dispatch target
    pub kind: ToolKind,
    /// Accepted parameters
    pub params: &'static [Param],
}

impl ToolSpec {
    /// Method of a fixed tool
    #[must_use]
    pub fn method(&self) -> Option<HttpMethod> {
        match self.kind {
            ToolKind::Fixed { method, .. } => Some(method),
            ToolKind::Generic => None,
        }
    }

    /// Path template of a fixed tool
    #[must_use]
    pub fn path(&self) -> Option<&'static str> {
        match self.kind {
            ToolKind::Fixed { path, .. } => Some(path),
            ToolKind::Generic => None,
        }
    }

    /// Whether the tool only reads upstream state
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        match self.kind {
            ToolKind::Fixed { method, path } => {
                method == HttpMethod::Get || READ_ONLY_POSTS.contains(&path)
            }
            ToolKind::Generic => false,
        }
    }

    /// Generated input schema
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// MCP tool definition
    #[must_use]
    pub fn to_tool(&self) -> Tool {
        let method = self.method();
        Tool {
            name: self.name.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            input_schema: self.input_schema(),
            annotations: ToolAnnotations {
                read_only_hint: self.is_read_only(),
                destructive_hint: method == Some(HttpMethod::Delete) || self.is_cancellation(),
                idempotent_hint: self.is_read_only(),
                open_world_hint: true,
            },
        }
    }

    fn is_cancellation(&self) -> bool {
        matches!(self.kind, ToolKind::Fixed { path, .. } if path.ends_with("/cancellation"))
    }
}

/// POST searches that do not create anything upstream
const READ_ONLY_POSTS: &[&str] = &[
    "/v2/shopping/flight-offers",
    "/v1/shopping/flight-offers/pricing",
    "/v1/shopping/flight-offers/upselling",
    "/v2/shopping/flight-offers/prediction",
    "/v1/shopping/seatmaps",
    "/v1/shopping/availability/flight-availabilities",
    "/v1/shopping/transfer-offers",
];

use HttpMethod::{Delete, Get, Post};
use ParamType::{Any, Boolean, Integer, Number, Object, String as Str, StringArray};

const TRAVEL_CLASSES: &[&str] = &["ECONOMY", "PREMIUM_ECONOMY", "BUSINESS", "FIRST"];
const RADIUS_UNITS: &[&str] = &["KM", "MILE"];
const HOTEL_SOURCES: &[&str] = &["BEDBANK", "DIRECTCHAIN", "ALL"];
const ANALYTICS_SORT: &[&str] = &[
    "analytics.flights.score",
    "analytics.travelers.score",
];

/// Every tool the gateway serves
pub static TOOLS: &[ToolSpec] = &[
    // ------------------------------------------------------------------ flights
    ToolSpec {
        name: "search_flight_offers",
        title: "Search flight offers",
        description: "Find bookable flight offers between two airports or cities for given dates and travellers.",
        kind: ToolKind::Fixed { method: Get, path: "/v2/shopping/flight-offers" },
        params: &[
            Param::query("originLocationCode", Str, "IATA code of the departure city or airport, e.g. SYD").required(),
            Param::query("destinationLocationCode", Str, "IATA code of the arrival city or airport, e.g. BKK").required(),
            Param::query("departureDate", Str, "Departure date, YYYY-MM-DD").required(),
            Param::query("returnDate", Str, "Return date, YYYY-MM-DD; omit for one-way"),
            Param::query("adults", Integer, "Number of adult travellers").required().range(1, 9),
            Param::query("children", Integer, "Number of children (2-11)").range(0, 9),
            Param::query("infants", Integer, "Number of infants (under 2)").range(0, 9),
            Param::query("travelClass", Str, "Minimum cabin class").choices(TRAVEL_CLASSES),
            Param::query("includedAirlineCodes", Str, "Comma-separated IATA airline codes to include"),
            Param::query("excludedAirlineCodes", Str, "Comma-separated IATA airline codes to exclude"),
            Param::query("nonStop", Boolean, "Only non-stop flights"),
            Param::query("currencyCode", Str, "ISO 4217 currency for prices"),
            Param::query("maxPrice", Integer, "Maximum price per traveller").range(1, 1_000_000),
            Param::query("max", Integer, "Maximum number of offers").range(1, 250),
        ],
    },
    ToolSpec {
        name: "search_flight_offers_advanced",
        title: "Search flight offers (advanced)",
        description: "Multi-city or fully customised flight search. The body is the upstream search request: originDestinations, travelers, sources and searchCriteria.",
        kind: ToolKind::Fixed { method: Post, path: "/v2/shopping/flight-offers" },
        params: &[Param::payload("Flight offers search request body")],
    },
    ToolSpec {
        name: "price_flight_offers",
        title: "Confirm flight offer price",
        description: "Confirm the live price and availability of flight offers returned by a search before booking.",
        kind: ToolKind::Fixed { method: Post, path: "/v1/shopping/flight-offers/pricing" },
        params: &[
            Param::payload("Pricing request body: {\"data\": {\"type\": \"flight-offers-pricing\", \"flightOffers\": [...]}}"),
            Param::query("include", Str, "Comma-separated extras: credit-card-fees, bags, other-services, detailed-fare-rules"),
            Param::query("forceClass", Boolean, "Force the booking class of the offer"),
        ],
    },
    ToolSpec {
        name: "upsell_flight_offers",
        title: "Flight offer upsell",
        description: "Find branded fare upsell options for a priced flight offer.",
        kind: ToolKind::Fixed { method: Post, path: "/v1/shopping/flight-offers/upselling" },
        params: &[Param::payload("Upselling request body with the flight offers")],
    },
    ToolSpec {
        name: "predict_flight_choice",
        title: "Flight choice prediction",
        description: "Score flight offers by the probability a traveller picks each one. The body is a flight offers search response.",
        kind: ToolKind::Fixed { method: Post, path: "/v2/shopping/flight-offers/prediction" },
        params: &[Param::payload("Flight offers search response to score")],
    },
    ToolSpec {
        name: "create_flight_order",
        title: "Book a flight",
        description: "Create a flight order from a priced offer and traveller details.",
        kind: ToolKind::Fixed { method: Post, path: "/v1/booking/flight-orders" },
        params: &[Param::payload("Flight order body: {\"data\": {\"type\": \"flight-order\", \"flightOffers\": [...], \"travelers\": [...]}}")],
    },
    ToolSpec {
        name: "get_flight_order",
        title: "Get flight order",
        description: "Retrieve a flight order by its id.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/booking/flight-orders/:flightOrderId" },
        params: &[Param::path("flightOrderId", "Flight order id returned at booking")],
    },
    ToolSpec {
        name: "cancel_flight_order",
        title: "Cancel flight order",
        description: "Cancel a flight order by its id.",
        kind: ToolKind::Fixed { method: Delete, path: "/v1/booking/flight-orders/:flightOrderId" },
        params: &[Param::path("flightOrderId", "Flight order id returned at booking")],
    },
    ToolSpec {
        name: "search_flight_destinations",
        title: "Flight inspiration search",
        description: "Find the cheapest destinations reachable from an origin city.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/shopping/flight-destinations" },
        params: &[
            Param::query("origin", Str, "IATA code of the origin city").required(),
            Param::query("departureDate", Str, "Date or range, e.g. 2026-12-01,2026-12-15"),
            Param::query("oneWay", Boolean, "One-way trips only"),
            Param::query("duration", Str, "Trip length in days or a range, e.g. 2,8"),
            Param::query("nonStop", Boolean, "Only non-stop flights"),
            Param::query("maxPrice", Integer, "Maximum price").range(1, 1_000_000),
            Param::query("viewBy", Str, "Grouping of results").choices(&["COUNTRY", "DATE", "DESTINATION", "DURATION", "WEEK"]),
        ],
    },
    ToolSpec {
        name: "search_cheapest_flight_dates",
        title: "Cheapest flight dates",
        description: "Find the cheapest dates to fly between two cities.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/shopping/flight-dates" },
        params: &[
            Param::query("origin", Str, "IATA code of the origin city").required(),
            Param::query("destination", Str, "IATA code of the destination city").required(),
            Param::query("departureDate", Str, "Date or range, e.g. 2026-12-01,2026-12-15"),
            Param::query("oneWay", Boolean, "One-way trips only"),
            Param::query("duration", Str, "Trip length in days or a range"),
            Param::query("nonStop", Boolean, "Only non-stop flights"),
            Param::query("maxPrice", Integer, "Maximum price").range(1, 1_000_000),
            Param::query("viewBy", Str, "Grouping of results").choices(&["DATE", "DURATION", "WEEK"]),
        ],
    },
    ToolSpec {
        name: "get_seatmaps",
        title: "Seat map for a booking",
        description: "Display the seat map of every flight in a flight order.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/shopping/seatmaps" },
        params: &[Param::query("flightOrderId", Str, "Flight order id").required()],
    },
    ToolSpec {
        name: "get_seatmaps_for_offers",
        title: "Seat map for offers",
        description: "Display seat maps for flight offers before booking.",
        kind: ToolKind::Fixed { method: Post, path: "/v1/shopping/seatmaps" },
        params: &[Param::payload("{\"data\": [flight offers]}")],
    },
    ToolSpec {
        name: "search_flight_availabilities",
        title: "Flight availability search",
        description: "List seat availability per booking class for flights matching the request body.",
        kind: ToolKind::Fixed { method: Post, path: "/v1/shopping/availability/flight-availabilities" },
        params: &[Param::payload("Availability request: originDestinations, travelers, sources")],
    },
    ToolSpec {
        name: "get_flight_price_analysis",
        title: "Flight price analysis",
        description: "Compare a fare against historical price quartiles for a route and date.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/analytics/itinerary-price-metrics" },
        params: &[
            Param::query("originIataCode", Str, "IATA code of the origin airport").required(),
            Param::query("destinationIataCode", Str, "IATA code of the destination airport").required(),
            Param::query("departureDate", Str, "Departure date, YYYY-MM-DD").required(),
            Param::query("currencyCode", Str, "ISO 4217 currency"),
            Param::query("oneWay", Boolean, "One-way fares only"),
        ],
    },
    ToolSpec {
        name: "predict_flight_delay",
        title: "Flight delay prediction",
        description: "Predict the probability that a specific flight is delayed.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/travel/predictions/flight-delay" },
        params: &[
            Param::query("originLocationCode", Str, "IATA code of the origin airport").required(),
            Param::query("destinationLocationCode", Str, "IATA code of the destination airport").required(),
            Param::query("departureDate", Str, "Departure date, YYYY-MM-DD").required(),
            Param::query("departureTime", Str, "Local departure time, HH:MM:SS").required(),
            Param::query("arrivalDate", Str, "Arrival date, YYYY-MM-DD").required(),
            Param::query("arrivalTime", Str, "Local arrival time, HH:MM:SS").required(),
            Param::query("aircraftCode", Str, "IATA aircraft code").required(),
            Param::query("carrierCode", Str, "IATA airline code").required(),
            Param::query("flightNumber", Str, "Flight number without carrier").required(),
            Param::query("duration", Str, "ISO 8601 flight duration, e.g. PT2H10M").required(),
        ],
    },
    ToolSpec {
        name: "get_flight_status",
        title: "On-demand flight status",
        description: "Get the schedule and live status of a flight.",
        kind: ToolKind::Fixed { method: Get, path: "/v2/schedule/flights" },
        params: &[
            Param::query("carrierCode", Str, "IATA airline code").required(),
            Param::query("flightNumber", Str, "Flight number without carrier").required(),
            Param::query("scheduledDepartureDate", Str, "Scheduled departure date, YYYY-MM-DD").required(),
            Param::query("operationalSuffix", Str, "Operational suffix, if any"),
        ],
    },
    ToolSpec {
        name: "get_checkin_links",
        title: "Flight check-in links",
        description: "Get the online check-in URLs of an airline.",
        kind: ToolKind::Fixed { method: Get, path: "/v2/reference-data/urls/checkin-links" },
        params: &[
            Param::query("airlineCode", Str, "IATA airline code").required(),
            Param::query("language", Str, "Preferred language, e.g. en-GB"),
        ],
    },
    // --------------------------------------------------------- reference data
    ToolSpec {
        name: "search_locations",
        title: "Airport and city search",
        description: "Find airports and cities by keyword.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/reference-data/locations" },
        params: &[
            Param::query("subType", Str, "Location types to search").required().choices(&["AIRPORT", "CITY", "AIRPORT,CITY"]),
            Param::query("keyword", Str, "Search keyword, e.g. MUC or Munich").required(),
            Param::query("countryCode", Str, "ISO 3166-1 alpha-2 country filter"),
            Param::query("page[limit]", Integer, "Results per page").range(1, 100),
            Param::query("page[offset]", Integer, "Results offset").range(0, 10_000),
            Param::query("view", Str, "Level of detail").choices(&["LIGHT", "FULL"]),
        ],
    },
    ToolSpec {
        name: "get_location",
        title: "Location by id",
        description: "Retrieve an airport or city by its location id, e.g. CMUC.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/reference-data/locations/:locationId" },
        params: &[Param::path("locationId", "Location id from a location search")],
    },
    ToolSpec {
        name: "search_nearest_airports",
        title: "Nearest relevant airports",
        description: "Find airports near a geographic point, ranked by relevance.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/reference-data/locations/airports" },
        params: &[
            Param::query("latitude", Number, "Latitude in decimal degrees").required().range(-90, 90),
            Param::query("longitude", Number, "Longitude in decimal degrees").required().range(-180, 180),
            Param::query("radius", Integer, "Search radius in km").range(0, 500),
            Param::query("page[limit]", Integer, "Results per page").range(1, 100),
        ],
    },
    ToolSpec {
        name: "search_cities",
        title: "City search",
        description: "Find cities by keyword.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/reference-data/locations/cities" },
        params: &[
            Param::query("keyword", Str, "City name or prefix").required(),
            Param::query("countryCode", Str, "ISO 3166-1 alpha-2 country filter"),
            Param::query("max", Integer, "Maximum number of results").range(1, 100),
        ],
    },
    ToolSpec {
        name: "get_airlines",
        title: "Airline code lookup",
        description: "Resolve airline names from IATA or ICAO codes.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/reference-data/airlines" },
        params: &[Param::query("airlineCodes", StringArray, "Airline codes, e.g. [\"BA\", \"AF\"]").required()],
    },
    ToolSpec {
        name: "get_airport_routes",
        title: "Airport routes",
        description: "List destinations served by direct flights from an airport.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/airport/direct-destinations" },
        params: &[
            Param::query("departureAirportCode", Str, "IATA code of the airport").required(),
            Param::query("max", Integer, "Maximum number of destinations").range(1, 500),
        ],
    },
    ToolSpec {
        name: "get_airline_routes",
        title: "Airline routes",
        description: "List destinations served by an airline.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/airline/destinations" },
        params: &[
            Param::query("airlineCode", Str, "IATA airline code").required(),
            Param::query("max", Integer, "Maximum number of destinations").range(1, 500),
        ],
    },
    ToolSpec {
        name: "get_recommended_locations",
        title: "Travel recommendations",
        description: "Recommend destinations similar to the given cities.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/reference-data/recommended-locations" },
        params: &[
            Param::query("cityCodes", StringArray, "IATA city codes the traveller searched").required(),
            Param::query("travelerCountryCode", Str, "Traveller's country, ISO 3166-1 alpha-2"),
            Param::query("destinationCountryCodes", StringArray, "Restrict results to these countries"),
        ],
    },
    // ------------------------------------------------------------------ hotels
    ToolSpec {
        name: "search_hotels_by_city",
        title: "Hotels in a city",
        description: "List hotels in a city by IATA city code.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/reference-data/locations/hotels/by-city" },
        params: &[
            Param::query("cityCode", Str, "IATA city code, e.g. PAR").required(),
            Param::query("radius", Integer, "Search radius").range(1, 300),
            Param::query("radiusUnit", Str, "Unit of the radius").choices(RADIUS_UNITS),
            Param::query("chainCodes", StringArray, "Two-letter hotel chain codes"),
            Param::query("amenities", StringArray, "Required amenities, e.g. SWIMMING_POOL"),
            Param::query("ratings", StringArray, "Star ratings, e.g. [\"4\", \"5\"]"),
            Param::query("hotelSource", Str, "Inventory source").choices(HOTEL_SOURCES),
        ],
    },
    ToolSpec {
        name: "search_hotels_by_geocode",
        title: "Hotels near a point",
        description: "List hotels around a latitude/longitude.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/reference-data/locations/hotels/by-geocode" },
        params: &[
            Param::query("latitude", Number, "Latitude in decimal degrees").required().range(-90, 90),
            Param::query("longitude", Number, "Longitude in decimal degrees").required().range(-180, 180),
            Param::query("radius", Integer, "Search radius").range(1, 300),
            Param::query("radiusUnit", Str, "Unit of the radius").choices(RADIUS_UNITS),
            Param::query("chainCodes", StringArray, "Two-letter hotel chain codes"),
            Param::query("amenities", StringArray, "Required amenities"),
            Param::query("ratings", StringArray, "Star ratings"),
            Param::query("hotelSource", Str, "Inventory source").choices(HOTEL_SOURCES),
        ],
    },
    ToolSpec {
        name: "search_hotels_by_ids",
        title: "Hotels by id",
        description: "Look up hotels by their Amadeus property codes.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/reference-data/locations/hotels/by-hotels" },
        params: &[Param::query("hotelIds", StringArray, "Amadeus property codes, e.g. [\"ACPAR419\"]").required()],
    },
    ToolSpec {
        name: "search_hotel_offers",
        title: "Hotel offers",
        description: "Get available room offers and prices for one or more hotels.",
        kind: ToolKind::Fixed { method: Get, path: "/v3/shopping/hotel-offers" },
        params: &[
            Param::query("hotelIds", StringArray, "Amadeus property codes").required(),
            Param::query("adults", Integer, "Adults per room").range(1, 9),
            Param::query("checkInDate", Str, "Check-in date, YYYY-MM-DD"),
            Param::query("checkOutDate", Str, "Check-out date, YYYY-MM-DD"),
            Param::query("roomQuantity", Integer, "Number of rooms").range(1, 9),
            Param::query("priceRange", Str, "Price range, e.g. 100-300"),
            Param::query("currency", Str, "ISO 4217 currency"),
            Param::query("boardType", Str, "Meal plan").choices(&["ROOM_ONLY", "BREAKFAST", "HALF_BOARD", "FULL_BOARD", "ALL_INCLUSIVE"]),
            Param::query("bestRateOnly", Boolean, "Only the cheapest offer per hotel"),
        ],
    },
    ToolSpec {
        name: "get_hotel_offer",
        title: "Hotel offer by id",
        description: "Re-check the price and conditions of a hotel offer before booking.",
        kind: ToolKind::Fixed { method: Get, path: "/v3/shopping/hotel-offers/:hotelOfferId" },
        params: &[Param::path("hotelOfferId", "Offer id from a hotel offers search")],
    },
    ToolSpec {
        name: "book_hotel",
        title: "Book a hotel",
        description: "Create a hotel order from an offer id, guest and payment details.",
        kind: ToolKind::Fixed { method: Post, path: "/v2/booking/hotel-orders" },
        params: &[Param::payload("Hotel order body: {\"data\": {\"type\": \"hotel-order\", \"guests\": [...], \"roomAssociations\": [...], \"payment\": {...}}}")],
    },
    ToolSpec {
        name: "get_hotel_ratings",
        title: "Hotel sentiment ratings",
        description: "Get guest sentiment scores for hotels.",
        kind: ToolKind::Fixed { method: Get, path: "/v2/e-reputation/hotel-sentiments" },
        params: &[Param::query("hotelIds", StringArray, "Up to three Amadeus property codes").required()],
    },
    ToolSpec {
        name: "autocomplete_hotel_names",
        title: "Hotel name autocomplete",
        description: "Suggest hotels whose name matches a keyword.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/reference-data/locations/hotel" },
        params: &[
            Param::query("keyword", Str, "Hotel name or prefix (at least 4 characters)").required(),
            Param::query("subType", StringArray, "Inventory sources, e.g. [\"HOTEL_LEISURE\", \"HOTEL_GDS\"]").required(),
            Param::query("countryCode", Str, "ISO 3166-1 alpha-2 country filter"),
            Param::query("lang", Str, "Language of the results"),
            Param::query("max", Integer, "Maximum number of results").range(1, 20),
        ],
    },
    // -------------------------------------------------------------- activities
    ToolSpec {
        name: "search_activities",
        title: "Tours and activities",
        description: "Find tours and activities around a point.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/shopping/activities" },
        params: &[
            Param::query("latitude", Number, "Latitude in decimal degrees").required().range(-90, 90),
            Param::query("longitude", Number, "Longitude in decimal degrees").required().range(-180, 180),
            Param::query("radius", Integer, "Search radius in km").range(0, 20),
        ],
    },
    ToolSpec {
        name: "search_activities_by_square",
        title: "Activities in an area",
        description: "Find tours and activities inside a bounding box.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/shopping/activities/by-square" },
        params: &[
            Param::query("north", Number, "Northern latitude").required().range(-90, 90),
            Param::query("west", Number, "Western longitude").required().range(-180, 180),
            Param::query("south", Number, "Southern latitude").required().range(-90, 90),
            Param::query("east", Number, "Eastern longitude").required().range(-180, 180),
        ],
    },
    ToolSpec {
        name: "get_activity",
        title: "Activity by id",
        description: "Retrieve one tour or activity.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/shopping/activities/:activityId" },
        params: &[Param::path("activityId", "Activity id from an activity search")],
    },
    // --------------------------------------------------------------- transfers
    ToolSpec {
        name: "search_transfers",
        title: "Transfer search",
        description: "Find private, shared or taxi transfers. The body is the upstream transfer search request.",
        kind: ToolKind::Fixed { method: Post, path: "/v1/shopping/transfer-offers" },
        params: &[Param::payload("Transfer search body: startLocationCode, endAddressLine, startDateTime, passengers, ...")],
    },
    ToolSpec {
        name: "book_transfer",
        title: "Book a transfer",
        description: "Book a transfer offer.",
        kind: ToolKind::Fixed { method: Post, path: "/v1/ordering/transfer-orders" },
        params: &[
            Param::query("offerId", Str, "Offer id from a transfer search").required(),
            Param::payload("Transfer order body: {\"data\": {\"passengers\": [...], \"payment\": {...}}}"),
        ],
    },
    ToolSpec {
        name: "cancel_transfer",
        title: "Cancel a transfer",
        description: "Cancel a booked transfer.",
        kind: ToolKind::Fixed { method: Post, path: "/v1/ordering/transfer-orders/:orderId/transfers/cancellation" },
        params: &[
            Param::path("orderId", "Transfer order id"),
            Param::query("confirmNbr", Str, "Confirmation number of the transfer").required(),
        ],
    },
    // ------------------------------------------------- predictions & analytics
    ToolSpec {
        name: "predict_trip_purpose",
        title: "Trip purpose prediction",
        description: "Predict whether a trip is for business or leisure.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/travel/predictions/trip-purpose" },
        params: &[
            Param::query("originLocationCode", Str, "IATA code of the origin city").required(),
            Param::query("destinationLocationCode", Str, "IATA code of the destination city").required(),
            Param::query("departureDate", Str, "Departure date, YYYY-MM-DD").required(),
            Param::query("returnDate", Str, "Return date, YYYY-MM-DD").required(),
            Param::query("searchDate", Str, "Date the search was made, YYYY-MM-DD"),
        ],
    },
    ToolSpec {
        name: "predict_airport_on_time",
        title: "Airport on-time performance",
        description: "Predict the share of on-time departures at an airport on a date.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/airport/predictions/on-time" },
        params: &[
            Param::query("airportCode", Str, "IATA airport code").required(),
            Param::query("date", Str, "Date, YYYY-MM-DD").required(),
        ],
    },
    ToolSpec {
        name: "get_most_traveled_destinations",
        title: "Most travelled destinations",
        description: "Rank destinations by travellers from an origin city in a month.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/travel/analytics/air-traffic/traveled" },
        params: &[
            Param::query("originCityCode", Str, "IATA code of the origin city").required(),
            Param::query("period", Str, "Month, YYYY-MM").required(),
            Param::query("max", Integer, "Maximum number of destinations").range(1, 50),
            Param::query("sort", Str, "Ranking criterion").choices(ANALYTICS_SORT),
        ],
    },
    ToolSpec {
        name: "get_most_booked_destinations",
        title: "Most booked destinations",
        description: "Rank destinations by bookings from an origin city in a month.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/travel/analytics/air-traffic/booked" },
        params: &[
            Param::query("originCityCode", Str, "IATA code of the origin city").required(),
            Param::query("period", Str, "Month, YYYY-MM").required(),
            Param::query("max", Integer, "Maximum number of destinations").range(1, 50),
            Param::query("sort", Str, "Ranking criterion").choices(ANALYTICS_SORT),
        ],
    },
    ToolSpec {
        name: "get_busiest_travel_period",
        title: "Busiest travel period",
        description: "Rank the months of a year by traffic for a city.",
        kind: ToolKind::Fixed { method: Get, path: "/v1/travel/analytics/air-traffic/busiest-period" },
        params: &[
            Param::query("cityCode", Str, "IATA city code").required(),
            Param::query("period", Str, "Year, YYYY").required(),
            Param::query("direction", Str, "Traffic direction").choices(&["ARRIVING", "DEPARTING"]),
        ],
    },
    // ----------------------------------------------------------------- generic
    ToolSpec {
        name: GENERIC_TOOL,
        title: "Amadeus API request",
        description: "Call any allowlisted Amadeus endpoint directly. Authentication is added by the gateway; do not pass an authorization header.",
        kind: ToolKind::Generic,
        params: &[
            Param::control("method", Str, "HTTP method").required().choices(&["GET", "POST", "PUT", "PATCH", "DELETE"]),
            Param::control("path", Str, "Resource path starting with /, without query string, e.g. /v1/reference-data/airlines").required(),
            Param::control("query", Object, "Query parameters; arrays are sent comma-separated"),
            Param::control("body", Any, "Request body"),
            Param::control("headers", Object, "Extra request headers with string values"),
            Param::control("contentType", Str, "Body content type (default application/json)"),
            Param::control("timeoutMs", Integer, "Timeout in milliseconds (default 15000)").range(1, 60_000),
        ],
    },
];

/// Look up a tool by name
#[must_use]
pub fn find(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::upstream::PathMatcher;

    #[test]
    fn tool_names_are_unique() {
        let names: HashSet<&str> = TOOLS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), TOOLS.len());
    }

    #[test]
    fn fixed_paths_are_allowlisted() {
        let matcher = PathMatcher::amadeus();
        for tool in TOOLS {
            if let ToolKind::Fixed { path, .. } = tool.kind {
                assert!(matcher.is_allowed(path), "{} uses unlisted path {path}", tool.name);
            }
        }
    }

    #[test]
    fn path_placeholders_have_path_params() {
        for tool in TOOLS {
            let ToolKind::Fixed { path, .. } = tool.kind else {
                continue;
            };
            for segment in path.split('/').filter_map(|s| s.strip_prefix(':')) {
                assert!(
                    tool.params
                        .iter()
                        .any(|p| p.name == segment && p.location == Location::Path),
                    "{} lacks a path param for :{segment}",
                    tool.name
                );
            }
        }
    }

    #[test]
    fn schema_lists_required_params() {
        let tool = find("search_flight_offers").unwrap();
        let schema = tool.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(
            schema["required"],
            json!(["originLocationCode", "destinationLocationCode", "departureDate", "adults"])
        );
        assert_eq!(schema["properties"]["adults"]["minimum"], 1);
        assert_eq!(schema["properties"]["travelClass"]["enum"][0], "ECONOMY");
    }

    #[test]
    fn annotations_reflect_method() {
        let get = find("get_flight_order").unwrap().to_tool();
        let cancel = find("cancel_flight_order").unwrap().to_tool();
        let search = find("search_flight_offers_advanced").unwrap().to_tool();

        assert!(get.annotations.read_only_hint);
        assert!(!get.annotations.destructive_hint);

        assert!(!cancel.annotations.read_only_hint);
        assert!(cancel.annotations.destructive_hint);

        assert!(search.annotations.read_only_hint);
        assert!(find("cancel_transfer").unwrap().is_cancellation());
    }

    #[test]
    fn generic_tool_has_no_type_on_body() {
        let schema = find(GENERIC_TOOL).unwrap().input_schema();
        assert!(schema["properties"]["body"].get("type").is_none());
        assert_eq!(schema["properties"]["timeoutMs"]["maximum"], 60_000);
    }
}
