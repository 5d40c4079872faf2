//! Built-in filter implementations.
//!
//! Filters are plain functions over JSON values. They never fail: arguments
//! of the wrong shape fall back to the parameter default, and values a
//! filter cannot handle are returned unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One filter argument, positional (`name == None`) or named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterArg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: Value,
}

impl FilterArg {
    pub fn positional(value: Value) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// Signature shared by all filter implementations.
pub type FilterFn = fn(&Value, &[FilterArg]) -> Value;

static BUILTIN_FILTERS: Lazy<HashMap<&'static str, FilterFn>> = Lazy::new(|| {
    let mut filters: HashMap<&'static str, FilterFn> = HashMap::new();
    filters.insert("escape", escape);
    filters.insert("esc_html", escape);
    filters.insert("esc_attr", esc_attr);
    filters.insert("esc_url", esc_url);
    filters.insert("raw", raw);
    filters.insert("upper", upper);
    filters.insert("lower", lower);
    filters.insert("capitalize", capitalize);
    filters.insert("title", title);
    filters.insert("trim", trim);
    filters.insert("truncate", truncate);
    filters.insert("default", default);
    filters.insert("join", join);
    filters.insert("length", length);
    filters.insert("striptags", striptags);
    filters.insert("nl2br", nl2br);
    filters.insert("slugify", slugify);
    filters.insert("json", json);
    filters.insert("url_encode", url_encode);
    filters.insert("date", date);
    filters
});

/// Look up a built-in implementation by name.
pub fn builtin_filter(name: &str) -> Option<FilterFn> {
    BUILTIN_FILTERS.get(name).copied()
}

/// Names of all built-in implementations, sorted.
pub fn builtin_filter_names() -> Vec<&'static str> {
    let mut names: Vec<_> = BUILTIN_FILTERS.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Find an argument by name, or else the `position`-th positional one.
fn arg<'a>(args: &'a [FilterArg], position: usize, name: &str) -> Option<&'a Value> {
    args.iter()
        .find(|a| a.name.as_deref() == Some(name))
        .or_else(|| args.iter().filter(|a| a.name.is_none()).nth(position))
        .map(|a| &a.value)
}

fn arg_str(args: &[FilterArg], position: usize, name: &str, default: &str) -> String {
    match arg(args, position, name) {
        Some(Value::Null) | None => default.to_string(),
        Some(value) => stringify(value),
    }
}

/// Text form of a value as it would appear in output.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Apply `f` to string content; non-string scalars are stringified first.
fn map_text(value: &Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => value.clone(),
        other => Value::String(f(&stringify(other))),
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn escape(value: &Value, _args: &[FilterArg]) -> Value {
    Value::String(html_escape(&stringify(value)))
}

fn esc_attr(value: &Value, _args: &[FilterArg]) -> Value {
    let escaped = html_escape(&stringify(value))
        .replace('\n', "&#10;")
        .replace('\r', "&#13;");
    Value::String(escaped)
}

const SAFE_URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

fn esc_url(value: &Value, _args: &[FilterArg]) -> Value {
    let input = stringify(value);
    let trimmed = input.trim();
    let cleaned = match url::Url::parse(trimmed) {
        Ok(parsed) if SAFE_URL_SCHEMES.contains(&parsed.scheme()) => parsed.to_string(),
        Ok(_) => String::new(),
        Err(url::ParseError::RelativeUrlWithoutBase) => trimmed.replace(' ', "%20"),
        Err(_) => String::new(),
    };
    Value::String(html_escape(&cleaned))
}

fn raw(value: &Value, _args: &[FilterArg]) -> Value {
    value.clone()
}

fn upper(value: &Value, _args: &[FilterArg]) -> Value {
    map_text(value, str::to_uppercase)
}

fn lower(value: &Value, _args: &[FilterArg]) -> Value {
    map_text(value, str::to_lowercase)
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn capitalize(value: &Value, _args: &[FilterArg]) -> Value {
    map_text(value, capitalize_word)
}

fn title(value: &Value, _args: &[FilterArg]) -> Value {
    map_text(value, |s| {
        s.split(' ')
            .map(capitalize_word)
            .collect::<Vec<_>>()
            .join(" ")
    })
}

fn trim(value: &Value, _args: &[FilterArg]) -> Value {
    map_text(value, |s| s.trim().to_string())
}

fn truncate(value: &Value, args: &[FilterArg]) -> Value {
    let Some(limit) = arg(args, 0, "length")
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
    else {
        return value.clone();
    };
    let end = arg_str(args, 1, "end", "...");
    map_text(value, |s| {
        if s.chars().count() <= limit {
            s.to_string()
        } else {
            let mut shortened: String = s.chars().take(limit).collect();
            shortened.push_str(&end);
            shortened
        }
    })
}

fn default(value: &Value, args: &[FilterArg]) -> Value {
    let empty = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(b) => !b,
        _ => false,
    };
    if empty {
        arg(args, 0, "value").cloned().unwrap_or(Value::Null)
    } else {
        value.clone()
    }
}

fn join(value: &Value, args: &[FilterArg]) -> Value {
    match value {
        Value::Array(items) => {
            let separator = arg_str(args, 0, "separator", ", ");
            Value::String(
                items
                    .iter()
                    .map(stringify)
                    .collect::<Vec<_>>()
                    .join(&separator),
            )
        }
        other => other.clone(),
    }
}

fn length(value: &Value, _args: &[FilterArg]) -> Value {
    let len = match value {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => stringify(other).chars().count(),
    };
    Value::from(len)
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

fn striptags(value: &Value, _args: &[FilterArg]) -> Value {
    map_text(value, |s| TAG_RE.replace_all(s, "").into_owned())
}

fn nl2br(value: &Value, _args: &[FilterArg]) -> Value {
    map_text(value, |s| s.replace("\r\n", "\n").replace('\n', "<br />\n"))
}

fn slugify(value: &Value, _args: &[FilterArg]) -> Value {
    map_text(value, |s| {
        let mut slug = String::with_capacity(s.len());
        let mut pending_dash = false;
        for c in s.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
            } else {
                pending_dash = true;
            }
        }
        slug
    })
}

fn json(value: &Value, _args: &[FilterArg]) -> Value {
    Value::String(value.to_string())
}

fn url_encode(value: &Value, _args: &[FilterArg]) -> Value {
    map_text(value, |s| {
        url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
    })
}

fn date(value: &Value, args: &[FilterArg]) -> Value {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use std::fmt::Write;

    let format = arg_str(args, 0, "format", "%Y-%m-%d");
    let parsed: Option<NaiveDateTime> = match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc()),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.naive_utc())
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }),
        _ => None,
    };

    let Some(parsed) = parsed else {
        return value.clone();
    };
    let mut out = String::new();
    // chrono reports bad format specifiers as a fmt::Error
    if write!(out, "{}", parsed.format(&format)).is_err() {
        return value.clone();
    }
    Value::String(out)
}
