// Type expressions: checks and coercion
//
// A type expression is a single type name or a `|`-separated union
// (`string|number`). Checks are lenient about how scalars are spelled:
// numeric strings satisfy numeric types and "true"/"false" satisfy boolean,
// because attribute values written without quotes and with quotes must
// validate the same way.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

pub const PRIMITIVE_TYPES: &[&str] = &[
    "string", "number", "integer", "float", "boolean", "null", "array", "object", "any",
];

pub const EXTENDED_TYPES: &[&str] = &["url", "email", "color", "date", "json"];

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("valid color regex")
});

static FN_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(rgb|rgba|hsl|hsla)\(\s*[0-9.%\s,/+-]+\)$").expect("valid color regex")
});

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

pub fn is_known_type(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name) || EXTENDED_TYPES.contains(&name)
}

/// Branches of a type expression that name no known type.
pub fn unknown_types(type_expr: &str) -> Vec<&str> {
    branches(type_expr)
        .filter(|name| !is_known_type(name))
        .collect()
}

fn branches(type_expr: &str) -> impl Iterator<Item = &str> {
    type_expr.split('|').map(str::trim)
}

/// Does `value` satisfy `type_expr`? Unknown type names never match.
pub fn validate_type(value: &Value, type_expr: &str) -> bool {
    branches(type_expr).any(|name| matches_type(value, name))
}

fn matches_type(value: &Value, name: &str) -> bool {
    match name {
        "any" => true,
        "null" => value.is_null(),
        "string" => value.is_string(),
        "number" | "float" => match value {
            Value::Number(_) => true,
            Value::String(s) => parse_float(s).is_some(),
            _ => false,
        },
        "integer" => match value {
            Value::Number(n) => is_integral(n),
            Value::String(s) => s.trim().parse::<i64>().is_ok(),
            _ => false,
        },
        "boolean" => match value {
            Value::Bool(_) => true,
            Value::String(s) => s == "true" || s == "false",
            _ => false,
        },
        "array" => value.is_array(),
        "object" => value.is_object(),
        "url" => value.as_str().is_some_and(is_url),
        "email" => value.as_str().is_some_and(|s| EMAIL_RE.is_match(s)),
        "color" => value.as_str().is_some_and(is_color),
        "date" => value.as_str().is_some_and(is_date),
        "json" => match value {
            Value::String(s) => serde_json::from_str::<Value>(s).is_ok(),
            Value::Array(_) | Value::Object(_) => true,
            _ => false,
        },
        _ => false,
    }
}

/// Strict form used to decide whether coercion is needed at all.
fn matches_exactly(value: &Value, name: &str) -> bool {
    match name {
        "number" => value.is_number(),
        "float" => value.is_f64(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        other => matches_type(value, other),
    }
}

/// Convert `value` into the representation its type expression asks for.
///
/// Values that already have the right shape are returned unchanged. For
/// unions the first branch that accepts a coerced value wins. A value that
/// cannot be coerced is returned as-is; checking it is [`validate_type`]'s job.
pub fn coerce_value(value: &Value, type_expr: &str) -> Value {
    if branches(type_expr).any(|name| matches_exactly(value, name)) {
        return value.clone();
    }
    branches(type_expr)
        .find_map(|name| coerce_to(value, name))
        .unwrap_or_else(|| value.clone())
}

fn coerce_to(value: &Value, name: &str) -> Option<Value> {
    match (name, value) {
        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),
        ("integer", Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        ("integer", Value::Number(n)) if is_integral(n) => {
            n.as_f64().map(|f| Value::from(f as i64))
        }
        ("number", Value::String(s)) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Some(Value::from(i)),
                Err(_) => parse_float(s).and_then(Number::from_f64).map(Value::Number),
            }
        }
        ("float", Value::String(s)) => parse_float(s).and_then(Number::from_f64).map(Value::Number),
        ("float", Value::Number(n)) => n.as_f64().and_then(Number::from_f64).map(Value::Number),
        ("boolean", Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim();
    // Rust accepts "inf"/"NaN"; template authors mean a word there
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn is_integral(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

fn is_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(_) => true,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            ["/", "./", "../", "#", "?"].iter().any(|p| s.starts_with(p))
        }
        Err(_) => false,
    }
}

fn is_color(s: &str) -> bool {
    let s = s.trim();
    HEX_COLOR_RE.is_match(s)
        || FN_COLOR_RE.is_match(s)
        // Named colors: accept any plain word rather than carrying the CSS list
        || (!s.is_empty() && s.len() <= 32 && s.chars().all(|c| c.is_ascii_alphabetic()))
}

fn is_date(s: &str) -> bool {
    DATE_RE.is_match(s) && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
