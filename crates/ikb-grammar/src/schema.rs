// Prop schema checks: required, type, length, enum and pattern

use ikb_error_reporting::{ValidationError, ValidationResult, codes};
use ikb_registry::PropSchema;
use ikb_registry::filters::stringify;
use regex::Regex;
use serde_json::Value;

use crate::types::{coerce_value, unknown_types, validate_type};

/// Name of a JSON value's type, for messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    value.is_none_or(Value::is_null)
}

/// Check `value` against `schema`, pushing every finding into `result`.
///
/// `subject` names the value in messages ("value", "attribute 'src' of
/// 'ikb_image'"). Checks after the type check only run when the type matched.
pub fn check_value(
    value: Option<&Value>,
    schema: &PropSchema,
    subject: &str,
    result: &mut ValidationResult,
) {
    if is_missing(value) {
        if schema.required {
            result.error(
                codes::REQUIRED_VALUE_MISSING,
                format!("{} is required", capitalize(subject)),
            );
        }
        return;
    }
    let Some(value) = value else { return };

    let unknown = unknown_types(&schema.type_name);
    if !unknown.is_empty() {
        for name in unknown {
            result.error(
                codes::UNKNOWN_TYPE,
                format!("Unknown type '{}' declared for {}", name, subject),
            );
        }
        return;
    }

    if !validate_type(value, &schema.type_name) {
        result.error(
            codes::TYPE_MISMATCH,
            format!(
                "{} must be of type {}, got {}",
                capitalize(subject),
                schema.type_name,
                json_type_name(value)
            ),
        );
        return;
    }

    if let Some(len) = measured_length(value) {
        if let Some(min) = schema.min_length
            && len < min
        {
            result.error(
                codes::STRING_TOO_SHORT,
                format!("{} must be at least {} characters long", capitalize(subject), min),
            );
        }
        if let Some(max) = schema.max_length
            && len > max
        {
            result.error(
                codes::STRING_TOO_LONG,
                format!("{} must be at most {} characters long", capitalize(subject), max),
            );
        }
    }

    if let Some(allowed) = &schema.enum_values
        && !enum_contains(allowed, value)
    {
        let listed: Vec<String> = allowed.iter().map(stringify).collect();
        result.error(
            codes::INVALID_ENUM_VALUE,
            format!(
                "{} must be one of: {} (got '{}')",
                capitalize(subject),
                listed.join(", "),
                stringify(value)
            ),
        );
    }

    if let Some(pattern) = &schema.pattern
        && !matches!(value, Value::Array(_) | Value::Object(_))
    {
        match Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(&stringify(value)) {
                    result.error(
                        codes::PATTERN_MISMATCH,
                        format!("{} does not match pattern '{}'", capitalize(subject), pattern),
                    );
                }
            }
            Err(err) => {
                result.error(
                    codes::INVALID_PATTERN,
                    format!("Invalid pattern '{}' declared for {}: {}", pattern, subject, err),
                );
            }
        }
    }
}

/// Check a value against a schema, collecting every finding.
pub fn validate_value_rich(value: Option<&Value>, schema: &PropSchema) -> ValidationResult {
    let mut result = ValidationResult::new();
    check_value(value, schema, "value", &mut result);
    result
}

/// Check a value against a schema, stopping at the first error.
pub fn validate_value(value: Option<&Value>, schema: &PropSchema) -> Result<(), ValidationError> {
    validate_value_rich(value, schema).into_result()
}

/// Apply the schema's default and coerce the value to its declared type.
///
/// A missing required value is an error, even when the schema declares a
/// default. A missing optional value becomes the default, or `null` without
/// one. Present values are coerced and then validated, so the returned value
/// always satisfies the schema.
pub fn normalize_value(value: Option<&Value>, schema: &PropSchema) -> Result<Value, ValidationError> {
    if is_missing(value) {
        if schema.required {
            return Err(ValidationError::error(
                codes::REQUIRED_VALUE_MISSING,
                "Value is required",
            ));
        }
        return Ok(schema.default.clone().unwrap_or(Value::Null));
    }
    let value = value.cloned().unwrap_or(Value::Null);
    let coerced = coerce_value(&value, &schema.type_name);
    validate_value(Some(&coerced), schema)?;
    Ok(coerced)
}

/// Enum membership, treating `"2"` and `2` as the same member.
pub fn enum_contains(allowed: &[Value], value: &Value) -> bool {
    allowed.iter().any(|candidate| {
        candidate == value
            || (!matches!(candidate, Value::Array(_) | Value::Object(_))
                && stringify(candidate) == stringify(value))
    })
}

fn measured_length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
