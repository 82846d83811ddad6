//! Value codec: persisted string form <-> typed value
//!
//! Rows store every value as text. The codec turns that text back into a
//! [`serde_json::Value`] (bool, integer, float, null, JSON, or string) on load
//! and renders typed values to text on write.

use crate::error::Result;
use serde_json::{Number, Value};

/// Converts between typed setting values and their persisted text
pub trait ValueCodec: Send + Sync {
    /// Render a typed value to the text stored in the settings table
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be rendered.
    fn encode(&self, value: &Value) -> Result<String>;

    /// Turn persisted text back into a typed value
    ///
    /// A missing column (`None`) decodes to `Value::Null`.
    fn decode(&self, raw: Option<&str>) -> Value;
}

/// Default codec that guesses the native type from the stored text
///
/// Decoding order, first match wins:
///
/// 1. `true` / `false` (any case) -> bool
/// 2. `null` (any case) -> null
/// 3. optional `-` then ASCII digits -> integer
/// 4. numeric text containing a `.` -> float
/// 5. any other valid JSON document -> parsed JSON
/// 6. the trimmed text as a string
#[derive(Debug, Clone, Copy, Default)]
pub struct CastingCodec;

impl CastingCodec {
    /// Create the default casting codec
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn decode_integer(text: &str) -> Option<Value> {
        let digits = text.strip_prefix('-').unwrap_or(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Out of range integers fall through to the float/JSON rules
        text.parse::<i64>().ok().map(|n| Value::Number(n.into()))
    }

    fn decode_float(text: &str) -> Option<Value> {
        if !text.contains('.') || !looks_numeric(text) {
            return None;
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    }
}

/// Decimal number syntax: sign, digits with at most one dot, optional exponent.
///
/// Rejects `inf`, `NaN` and friends which `f64::from_str` would accept.
fn looks_numeric(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let mut digits = 0;
    let mut dots = 0;
    for b in mantissa.bytes() {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' => dots += 1,
            _ => return false,
        }
    }
    if digits == 0 || dots > 1 {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !exp.is_empty() && exp.bytes().all(|b| b.is_ascii_digit())
        }
    }
}

impl ValueCodec for CastingCodec {
    fn encode(&self, value: &Value) -> Result<String> {
        Ok(match value {
            Value::Null => "null".to_string(),
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => serde_json::to_string(value)?,
        })
    }

    fn decode(&self, raw: Option<&str>) -> Value {
        let Some(raw) = raw else {
            return Value::Null;
        };
        let text = raw.trim();

        if text.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if text.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if text.eq_ignore_ascii_case("null") {
            return Value::Null;
        }

        if let Some(value) = Self::decode_integer(text) {
            return value;
        }
        if let Some(value) = Self::decode_float(text) {
            return value;
        }

        serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()))
    }
}
