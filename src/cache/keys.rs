//! Cache key construction.
//!
//! Turns a logical name plus parameters into a deterministic string key.

use std::fmt;

use serde_json::{Map, Value};

// == Key Parts ==
/// Separator between positional key parts.
pub const PART_SEPARATOR: &str = ":";

/// A single positional component of a cache key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPart {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Text(s) => f.write_str(s),
            KeyPart::Int(n) => write!(f, "{n}"),
            KeyPart::UInt(n) => write!(f, "{n}"),
            KeyPart::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Text(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Text(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        KeyPart::Text(value.clone())
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Int(value.into())
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::UInt(value.into())
    }
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        KeyPart::UInt(value)
    }
}

impl From<usize> for KeyPart {
    fn from(value: usize) -> Self {
        KeyPart::UInt(value as u64)
    }
}

impl From<f64> for KeyPart {
    fn from(value: f64) -> Self {
        KeyPart::Float(value)
    }
}

// == Build Key ==
/// Joins the present parts with `:`, skipping `None`.
///
/// ```
/// use portal_cache::cache::build_key;
///
/// let key = build_key([Some("notices".into()), None, Some(2u32.into())]);
/// assert_eq!(key, "notices:2");
/// ```
pub fn build_key<I>(parts: I) -> String
where
    I: IntoIterator<Item = Option<KeyPart>>,
{
    parts
        .into_iter()
        .flatten()
        .map(|part| part.to_string())
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR)
}

// == Build Key With Params ==
/// Appends `?k1=v1&k2=v2` to `base`, with null values dropped and keys sorted.
///
/// Returns `base` unchanged when no parameter survives filtering. Sorting makes
/// the key independent of the caller's field order.
///
/// # Arguments
/// * `base` - Logical name of the cached resource
/// * `params` - Query parameters; `null` values are ignored
pub fn build_key_with_params(base: &str, params: &Map<String, Value>) -> String {
    let mut pairs: Vec<(&String, &Value)> = params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .collect();

    if pairs.is_empty() {
        return base.to_string();
    }

    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));

    let query = pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, render_value(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{base}?{query}")
}

/// Renders a parameter value: strings unquoted, arrays comma-joined, objects as JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}
