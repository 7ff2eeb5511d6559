//! Argument validation against a tool's parameter table.
//!
//! Runs before any network I/O. The goal is an error message that tells the
//! model exactly what it got wrong and which parameters exist.
//!
//! # Validation steps (in order)
//!
//! 1. **Required parameters**: present and non-null.
//! 2. **Unknown parameters**: keys not declared by the tool are rejected.
//! 3. **Type validation with coercion**, applying safe coercions:
//!    - `"123"` → `123` for integer / number parameters
//!    - `"true"` / `"false"` → `true` / `false` for booleans
//!    - `"A,B"` → `["A", "B"]` for string lists
//! 4. **Choices and bounds** (after coercion).

use std::fmt::Write as _;

use serde_json::{Map, Number, Value};

use super::catalog::{Param, ParamType};

/// A single problem with one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Parameter name (empty for top-level issues)
    pub param: String,
    /// What is wrong
    pub message: String,
}

impl Violation {
    fn new(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            message: message.into(),
        }
    }
}

/// Validate `arguments` and return them with coercions applied.
///
/// Null optional parameters are dropped from the result.
pub fn validate(params: &[Param], arguments: &Value) -> Result<Map<String, Value>, Vec<Violation>> {
    let empty = Map::new();
    let args = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(vec![Violation::new("", "Arguments must be a JSON object")]),
    };

    let mut violations = Vec::new();

    for param in params.iter().filter(|p| p.required) {
        match args.get(param.name) {
            None => violations.push(Violation::new(param.name, "required parameter is missing")),
            Some(Value::Null) => {
                violations.push(Violation::new(param.name, "required parameter must not be null"));
            }
            Some(_) => {}
        }
    }

    for key in args.keys() {
        if !params.iter().any(|p| p.name == key) {
            violations.push(Violation::new(key, "unknown parameter"));
        }
    }

    // Cascading type errors would only bury the real problem.
    if !violations.is_empty() {
        return Err(violations);
    }

    let mut coerced = Map::new();
    for param in params {
        let Some(value) = args.get(param.name).filter(|v| !v.is_null()) else {
            continue;
        };
        match check(param, value) {
            Ok(value) => {
                coerced.insert(param.name.to_string(), value);
            }
            Err(message) => violations.push(Violation::new(param.name, message)),
        }
    }

    if violations.is_empty() {
        Ok(coerced)
    } else {
        Err(violations)
    }
}

/// Render violations plus the tool's parameter list.
#[must_use]
pub fn format_violations(tool: &str, params: &[Param], violations: &[Violation]) -> String {
    let mut out = format!("Invalid arguments for tool '{tool}':\n");
    for v in violations {
        if v.param.is_empty() {
            let _ = writeln!(out, "- {}", v.message);
        } else {
            let _ = writeln!(out, "- Parameter '{}': {}", v.param, v.message);
        }
    }

    if !params.is_empty() {
        out.push_str("\nValid parameters for this tool:\n");
        for p in params {
            let ty = p.ty.schema_type().unwrap_or("any");
            let req = if p.required { ", required" } else { "" };
            let _ = write!(out, "  - {} ({ty}{req})", p.name);
            if !p.choices.is_empty() {
                let _ = write!(out, " one of: {}", p.choices.join(", "));
            }
            out.push('\n');
        }
    }
    out
}

fn check(param: &Param, value: &Value) -> Result<Value, String> {
    let value = coerce(value, param.ty)?;

    if !param.choices.is_empty() {
        let matches = value.as_str().is_some_and(|s| param.choices.contains(&s));
        if !matches {
            return Err(format!("must be one of: {}", param.choices.join(", ")));
        }
    }

    if let Some(num) = value.as_f64() {
        if let Some(min) = param.minimum.filter(|min| num < as_f64(*min)) {
            return Err(format!("must be >= {min}"));
        }
        if let Some(max) = param.maximum.filter(|max| num > as_f64(*max)) {
            return Err(format!("must be <= {max}"));
        }
    }

    Ok(value)
}

fn coerce(value: &Value, ty: ParamType) -> Result<Value, String> {
    match ty {
        ParamType::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(expected("string", value)),
        },
        ParamType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => match n.as_f64() {
                #[allow(clippy::cast_possible_truncation)]
                Some(f) if f.fract() == 0.0 => Ok(Value::Number((f as i64).into())),
                _ => Err(format!("expected integer, got float {n}")),
            },
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| Value::Number(i.into()))
                .map_err(|_| format!("expected integer, got string \"{s}\"")),
            _ => Err(expected("integer", value)),
        },
        ParamType::Number => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("expected number, got string \"{s}\"")),
            _ => Err(expected("number", value)),
        },
        ParamType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("expected boolean, got string \"{s}\", use true or false")),
            },
            _ => Err(expected("boolean", value)),
        },
        ParamType::StringArray => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(_) => Ok(item.clone()),
                    Value::Number(n) => Ok(Value::String(n.to_string())),
                    other => Err(format!("expected a list of strings, found {}", type_name(other))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::String(s) => Ok(Value::Array(
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )),
            _ => Err(expected("array of strings", value)),
        },
        ParamType::Object => match value {
            Value::Object(_) => Ok(value.clone()),
            _ => Err(expected("object", value)),
        },
        ParamType::Any => Ok(value.clone()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(bound: i64) -> f64 {
    bound as f64
}

fn expected(ty: &str, value: &Value) -> String {
    format!("expected {ty}, got {}", type_name(value))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
