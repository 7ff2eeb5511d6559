//! Upstream path allowlist
//!
//! Only resource paths listed in [`AMADEUS_PATHS`] may be forwarded by the
//! general-purpose request tool. Entries are either literal paths or
//! templates whose `:name` segments stand for exactly one non-empty path
//! segment.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Resource paths the gateway is allowed to reach.
pub const AMADEUS_PATHS: &[&str] = &[
    // Flights
    "/v2/shopping/flight-offers",
    "/v1/shopping/flight-offers/pricing",
    "/v1/shopping/flight-offers/upselling",
    "/v2/shopping/flight-offers/prediction",
    "/v1/shopping/flight-destinations",
    "/v1/shopping/flight-dates",
    "/v1/shopping/seatmaps",
    "/v1/shopping/availability/flight-availabilities",
    "/v1/booking/flight-orders",
    "/v1/booking/flight-orders/:flightOrderId",
    "/v1/analytics/itinerary-price-metrics",
    "/v2/schedule/flights",
    "/v1/travel/predictions/flight-delay",
    "/v2/reference-data/urls/checkin-links",
    // Airports, airlines and locations
    "/v1/reference-data/locations",
    "/v1/reference-data/locations/:locationId",
    "/v1/reference-data/locations/airports",
    "/v1/reference-data/locations/cities",
    "/v1/reference-data/recommended-locations",
    "/v1/reference-data/airlines",
    "/v1/airport/direct-destinations",
    "/v1/airport/predictions/on-time",
    "/v1/airline/destinations",
    // Hotels
    "/v1/reference-data/locations/hotels/by-city",
    "/v1/reference-data/locations/hotels/by-geocode",
    "/v1/reference-data/locations/hotels/by-hotels",
    "/v1/reference-data/locations/hotel",
    "/v3/shopping/hotel-offers",
    "/v3/shopping/hotel-offers/:hotelOfferId",
    "/v2/booking/hotel-orders",
    "/v2/e-reputation/hotel-sentiments",
    // Activities
    "/v1/shopping/activities",
    "/v1/shopping/activities/by-square",
    "/v1/shopping/activities/:activityId",
    // Transfers
    "/v1/shopping/transfer-offers",
    "/v1/ordering/transfer-orders",
    "/v1/ordering/transfer-orders/:orderId/transfers/cancellation",
    // Predictions and analytics
    "/v1/travel/predictions/trip-purpose",
    "/v1/travel/analytics/air-traffic/traveled",
    "/v1/travel/analytics/air-traffic/booked",
    "/v1/travel/analytics/air-traffic/busiest-period",
];

static AMADEUS_MATCHER: LazyLock<PathMatcher> = LazyLock::new(|| PathMatcher::new(AMADEUS_PATHS));

/// One segment of a templated path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must match verbatim
    Literal(String),
    /// Matches any single safe segment; holds the placeholder name
    Placeholder(String),
}

/// A parsed allowlist entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTemplate {
    /// Path without placeholders
    Literal(String),
    /// Path with at least one placeholder segment
    Templated(Vec<Segment>),
}

impl PathTemplate {
    /// Parse a template such as `/v1/booking/flight-orders/:flightOrderId`.
    #[must_use]
    pub fn parse(template: &str) -> Self {
        if !template.split('/').any(|s| s.starts_with(':')) {
            return Self::Literal(template.to_string());
        }

        let segments = template
            .split('/')
            .skip(1)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Placeholder(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        Self::Templated(segments)
    }

    /// Placeholder names in order of appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Templated(segments) => segments
                .iter()
                .filter_map(|s| match s {
                    Segment::Placeholder(name) => Some(name.as_str()),
                    Segment::Literal(_) => None,
                })
                .collect(),
        }
    }

    /// Whether `path` (already stripped of query/fragment) matches this entry.
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == path,
            Self::Templated(segments) => {
                let Some(rest) = path.strip_prefix('/') else {
                    return false;
                };
                let candidate: Vec<&str> = rest.split('/').collect();
                candidate.len() == segments.len()
                    && segments.iter().zip(&candidate).all(|(seg, value)| match seg {
                        Segment::Literal(lit) => lit == value,
                        Segment::Placeholder(_) => is_safe_segment(value),
                    })
            }
        }
    }
}

/// Compiled allowlist
#[derive(Debug, Clone)]
pub struct PathMatcher {
    literals: HashSet<String>,
    templates: Vec<PathTemplate>,
}

impl PathMatcher {
    /// Compile a matcher from template strings.
    pub fn new<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut literals = HashSet::new();
        let mut templated = Vec::new();

        for template in templates {
            match PathTemplate::parse(template.as_ref()) {
                PathTemplate::Literal(path) => {
                    literals.insert(path);
                }
                t @ PathTemplate::Templated(_) => templated.push(t),
            }
        }

        Self {
            literals,
            templates: templated,
        }
    }

    /// The process-wide matcher for [`AMADEUS_PATHS`].
    #[must_use]
    pub fn amadeus() -> &'static Self {
        &AMADEUS_MATCHER
    }

    /// Check whether `candidate` may be forwarded.
    ///
    /// Anything from the first `?` or `#` onwards is ignored, so a query
    /// string or fragment cannot smuggle a disallowed path past the check.
    /// Trailing slashes are significant.
    #[must_use]
    pub fn is_allowed(&self, candidate: &str) -> bool {
        let path = strip_query_and_fragment(candidate);
        if path.is_empty() || !path.starts_with('/') || has_invisible(path) {
            return false;
        }

        if self.literals.contains(path) {
            return true;
        }

        self.templates.iter().any(|t| t.matches(path))
    }

    /// Number of allowlist entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len() + self.templates.len()
    }

    /// Whether the allowlist is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether `value` is usable as the substitution for a placeholder segment.
///
/// Empty values, embedded slashes and dot-segments are rejected: URL
/// normalization collapses `.` / `..` (also in `%2e` form), which would walk
/// out of the matched template. Control characters and whitespace are
/// rejected too, since URL parsing strips tabs and newlines and `.\t.`
/// would become `..`.
#[must_use]
pub fn is_safe_segment(value: &str) -> bool {
    if value.is_empty() || value.contains(['/', '?', '#', '\\']) || has_invisible(value) {
        return false;
    }
    let decoded = value.to_ascii_lowercase().replace("%2e", ".");
    decoded != "." && decoded != ".."
}

fn has_invisible(value: &str) -> bool {
    value.chars().any(|c| c.is_control() || c.is_whitespace())
}

fn strip_query_and_fragment(candidate: &str) -> &str {
    candidate
        .find(['?', '#'])
        .map_or(candidate, |idx| &candidate[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_literal_entry_matches_itself() {
        let matcher = PathMatcher::amadeus();
        for path in AMADEUS_PATHS.iter().filter(|p| !p.contains(':')) {
            assert!(matcher.is_allowed(path), "{path} should be allowed");
        }
    }

    #[test]
    fn templated_entry_matches_single_segment() {
        let matcher = PathMatcher::amadeus();
        assert!(matcher.is_allowed("/v1/booking/flight-orders/ABC123"));
        assert!(matcher.is_allowed("/v1/booking/flight-orders/eJzTd9f3NjIJdzYBAAsKAkI%3D"));
        assert!(matcher.is_allowed("/v1/ordering/transfer-orders/123/transfers/cancellation"));
    }

    #[test]
    fn templated_entry_rejects_empty_extra_or_missing_segments() {
        let matcher = PathMatcher::amadeus();
        assert!(!matcher.is_allowed("/v1/booking/flight-orders/"));
        assert!(!matcher.is_allowed("/v1/booking/flight-orders/ABC/extra"));
        assert!(!matcher.is_allowed("/v1/ordering/transfer-orders/123/transfers"));
        assert!(!matcher.is_allowed("/v1/ordering/transfer-orders//transfers/cancellation"));
    }

    #[test]
    fn dot_segments_never_fill_a_placeholder() {
        let matcher = PathMatcher::amadeus();
        assert!(!matcher.is_allowed("/v1/booking/flight-orders/.."));
        assert!(!matcher.is_allowed("/v1/booking/flight-orders/."));
        assert!(!matcher.is_allowed("/v1/booking/flight-orders/%2e%2E"));
        assert!(!matcher.is_allowed("/v1/booking/flight-orders/.%2e"));
    }

    #[test]
    fn control_characters_never_fill_a_placeholder() {
        let matcher = PathMatcher::amadeus();
        assert!(!matcher.is_allowed("/v1/ordering/transfer-orders/.\t./transfers/cancellation"));
        assert!(!matcher.is_allowed("/v1/ordering/transfer-orders/.\n./transfers/cancellation"));
        assert!(!matcher.is_allowed("/v1/booking/flight-orders/AB C"));
        assert!(!matcher.is_allowed("/v2/shopping/flight-offers\r"));
        assert!(!is_safe_segment(".\t."));
        assert!(!is_safe_segment("a\u{0}b"));
        assert!(is_safe_segment("eJzTd9f3NjIJdzYBAAsKAkI%3D"));
    }

    #[test]
    fn unknown_and_prefix_paths_are_rejected() {
        let matcher = PathMatcher::amadeus();
        assert!(!matcher.is_allowed("/v1/unknown/endpoint"));
        assert!(!matcher.is_allowed("/v2/shopping"));
        assert!(!matcher.is_allowed("/v2/shopping/flight-offers-x"));
        assert!(!matcher.is_allowed(""));
        assert!(!matcher.is_allowed("v2/shopping/flight-offers"));
    }

    #[test]
    fn trailing_slash_is_not_normalized() {
        let matcher = PathMatcher::amadeus();
        assert!(matcher.is_allowed("/v2/shopping/flight-offers"));
        assert!(!matcher.is_allowed("/v2/shopping/flight-offers/"));
    }

    #[test]
    fn query_and_fragment_are_stripped_before_matching() {
        let matcher = PathMatcher::amadeus();
        assert!(matcher.is_allowed("/v2/shopping/flight-offers?max=1"));
        assert!(!matcher.is_allowed("/v1/admin?/v2/shopping/flight-offers"));
        assert!(!matcher.is_allowed("/v1/admin#/v2/shopping/flight-offers"));
        assert!(!matcher.is_allowed("?/v2/shopping/flight-offers"));
    }

    #[test]
    fn matching_is_idempotent() {
        let matcher = PathMatcher::amadeus();
        for candidate in ["/v1/booking/flight-orders/X", "/nope", "/v1/shopping/activities"] {
            assert_eq!(matcher.is_allowed(candidate), matcher.is_allowed(candidate));
        }
    }

    #[test]
    fn parse_splits_literal_and_placeholder_segments() {
        let template = PathTemplate::parse("/v1/ordering/transfer-orders/:orderId/transfers/cancellation");
        assert_eq!(template.placeholders(), vec!["orderId"]);
        assert_eq!(
            PathTemplate::parse("/v2/shopping/flight-offers"),
            PathTemplate::Literal("/v2/shopping/flight-offers".to_string())
        );
    }

    #[test]
    fn custom_matcher_counts_entries() {
        let matcher = PathMatcher::new(["/a", "/a/:id", "/b"]);
        assert_eq!(matcher.len(), 3);
        assert!(matcher.is_allowed("/a/1"));
        assert!(!matcher.is_allowed("/a/1/"));
        assert!(PathMatcher::new(Vec::<String>::new()).is_empty());
    }
}
