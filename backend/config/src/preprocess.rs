//! Field coercions applied before structural validation.
//!
//! Imported documents are loosely typed: booleans and numbers arrive as
//! strings, strings arrive wrapped in an extra layer of JSON quoting, and an
//! empty string stands in for "not provided". Every function here is pure and
//! total. A coercion that cannot apply hands its input on untouched, so the
//! validator reports the concrete type mismatch instead.

use serde_json::{Number, Value};

/// A document field as seen by the preprocessors.
#[derive(Debug, Clone, PartialEq)]
pub enum RawField {
    /// The key is absent, or its value counts as absent.
    Missing,
    /// The value as it currently stands.
    Present(Value),
    /// A string that failed numeric coercion. Never satisfies a number check.
    NotANumber(String),
}

impl RawField {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(value) => RawField::Present(value.clone()),
            None => RawField::Missing,
        }
    }
}

/// One step of a field's coercion chain.
pub type Preprocessor = fn(RawField) -> RawField;

/// Run `field` through every step of `chain`, in order.
pub fn apply(chain: &[Preprocessor], field: RawField) -> RawField {
    chain.iter().fold(field, |field, step| step(field))
}

/// Parse a string as a number. Anything that is not a finite number becomes
/// [`RawField::NotANumber`], never zero.
pub fn to_number(field: RawField) -> RawField {
    match field {
        RawField::Present(Value::String(text)) => parse_number(text),
        other => other,
    }
}

/// Parse a string as strict JSON and reduce the result to its truthiness.
/// Strings that are not valid JSON are left alone.
pub fn to_boolean(field: RawField) -> RawField {
    match field {
        RawField::Present(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => RawField::Present(Value::Bool(is_truthy(&parsed))),
            Err(_) => RawField::Present(Value::String(text)),
        },
        other => other,
    }
}

/// Strip one layer of JSON quoting from a string (`"\"dark\""` becomes
/// `"dark"`). Strings that are not valid JSON are left alone.
pub fn to_clean_string(field: RawField) -> RawField {
    match field {
        RawField::Present(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => RawField::Present(Value::String(stringify(&parsed))),
            Err(_) => RawField::Present(Value::String(text)),
        },
        other => other,
    }
}

/// [`to_clean_string`] followed by [`to_number`], for numbers that may arrive
/// as quoted numeric strings.
pub fn to_string_then_number(field: RawField) -> RawField {
    to_number(to_clean_string(field))
}

/// Treat an empty string as an absent field.
pub fn empty_string_to_absent(field: RawField) -> RawField {
    match field {
        RawField::Present(Value::String(text)) if text.is_empty() => RawField::Missing,
        other => other,
    }
}

fn parse_number(text: String) -> RawField {
    let trimmed = text.trim();
    let parsed = if trimmed.is_empty() {
        None
    } else if let Some(n) = parse_radix_literal(trimmed) {
        Some(n)
    } else {
        trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
    };

    match parsed.and_then(number_from_f64) {
        Some(number) => RawField::Present(Value::Number(number)),
        None => RawField::NotANumber(text),
    }
}

/// Unsigned `0x`, `0o` and `0b` literals, as script engines accept them.
fn parse_radix_literal(text: &str) -> Option<f64> {
    let prefix = text.get(..2)?.to_ascii_lowercase();
    let radix = match prefix.as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };
    let digits = &text[2..];
    if digits.starts_with('+') {
        return None;
    }
    u64::from_str_radix(digits, radix).ok().map(|n| n as f64)
}

/// Integral values are stored as integers so `"42"` compares equal to `42`.
fn number_from_f64(n: f64) -> Option<Number> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(Number::from(n as i64))
    } else {
        Number::from_f64(n)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String conversion with script-engine semantics: arrays join their
/// elements with commas, objects collapse to a fixed tag.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => stringify_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => stringify(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn stringify_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    // f64 Display drops a trailing ".0".
    n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string())
}
