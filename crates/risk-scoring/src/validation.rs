//! Field validation for raw vital signs
//!
//! Each parser turns one raw JSON field into a [`Validated`] value. A field is
//! either fully valid or `Invalid`; there is no partial validity and no
//! parser ever returns an error.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Sentinel strings the upstream system writes in place of a blood pressure reading
const BLOOD_PRESSURE_INVALID_TOKENS: &[&str] = &["INVALID", "N/A", "NULL", "UNDEFINED", "ERROR"];

/// Sentinel strings the upstream system writes in place of a temperature reading
const TEMPERATURE_INVALID_TOKENS: &[&str] =
    &["INVALID", "ERROR", "TEMP_ERROR", "N/A", "NULL", "UNDEFINED"];

/// Substrings that mark an age value as unusable
const AGE_INVALID_TOKENS: &[&str] = &["UNKNOWN", "INVALID", "ERROR", "NA", "NULL", "UNDEFINED"];

static BLOOD_PRESSURE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)/([0-9]+)$").unwrap());

/// Outcome of validating a single raw field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validated<T> {
    Valid(T),
    Invalid,
}

impl<T> Validated<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validated::Valid(_))
    }

    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    /// The validated value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            Validated::Valid(value) => Some(value),
            Validated::Invalid => None,
        }
    }
}

impl<T> From<Option<T>> for Validated<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Validated::Invalid, Validated::Valid)
    }
}

/// A systolic/diastolic pair in mmHg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloodPressure {
    pub systolic: u32,
    pub diastolic: u32,
}

impl BloodPressure {
    pub fn new(systolic: u32, diastolic: u32) -> Self {
        Self {
            systolic,
            diastolic,
        }
    }
}

/// Body temperature in degrees Fahrenheit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    pub fahrenheit: f64,
}

impl Temperature {
    pub fn new(fahrenheit: f64) -> Self {
        Self { fahrenheit }
    }
}

/// Patient age in whole years
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    pub years: u32,
}

impl Age {
    pub fn new(years: u32) -> Self {
        Self { years }
    }
}

fn is_token(text: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| token.eq_ignore_ascii_case(text))
}

/// Parse a `"<systolic>/<diastolic>"` reading.
///
/// Only an exact match of two ASCII digit runs around a single slash is
/// accepted. Values that overflow `u32` are invalid.
pub fn parse_blood_pressure(raw: Option<&Value>) -> Validated<BloodPressure> {
    let Some(Value::String(text)) = raw else {
        return Validated::Invalid;
    };

    if is_token(text, BLOOD_PRESSURE_INVALID_TOKENS) {
        return Validated::Invalid;
    }

    let Some(captures) = BLOOD_PRESSURE_PATTERN.captures(text) else {
        return Validated::Invalid;
    };

    match (captures[1].parse::<u32>(), captures[2].parse::<u32>()) {
        (Ok(systolic), Ok(diastolic)) => Validated::Valid(BloodPressure::new(systolic, diastolic)),
        _ => Validated::Invalid,
    }
}

/// Parse a temperature given as a JSON number or a numeric string.
pub fn parse_temperature(raw: Option<&Value>) -> Validated<Temperature> {
    let fahrenheit = match raw {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() || is_token(text, TEMPERATURE_INVALID_TOKENS) {
                return Validated::Invalid;
            }
            text.parse::<f64>().ok()
        }
        _ => None,
    };

    fahrenheit
        .filter(|value| value.is_finite())
        .map(Temperature::new)
        .into()
}

/// Parse an age given as a JSON number or a string of digits.
///
/// Non-integral numbers and anything that is not strictly positive are invalid.
pub fn parse_age(raw: Option<&Value>) -> Validated<Age> {
    let years = match raw {
        Some(Value::Number(number)) => {
            if let Some(whole) = number.as_u64() {
                u32::try_from(whole).ok()
            } else {
                number
                    .as_f64()
                    .filter(|value| value.fract() == 0.0 && *value > 0.0)
                    .filter(|value| *value <= f64::from(u32::MAX))
                    .map(|value| value as u32)
            }
        }
        Some(Value::String(text)) => {
            let text = text.trim();
            let upper = text.to_ascii_uppercase();
            if text.is_empty() || AGE_INVALID_TOKENS.iter().any(|token| upper.contains(token)) {
                return Validated::Invalid;
            }
            if !text.bytes().all(|b| b.is_ascii_digit()) {
                return Validated::Invalid;
            }
            text.parse::<u32>().ok()
        }
        _ => None,
    };

    years.filter(|years| *years > 0).map(Age::new).into()
}

/// Permissive numeric read of a raw value.
///
/// Numbers are taken as-is. Strings are read up to the end of their leading
/// numeric prefix, so `"100.4F"` yields `100.4` while `"TEMP_ERROR"` yields
/// nothing. Looser than [`parse_temperature`].
pub fn parse_numeric_prefix(raw: Option<&Value>) -> Option<f64> {
    let value = match raw? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => numeric_prefix(text.trim_start())?.parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn numeric_prefix(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let integral = digits_from(end);
    end += integral;

    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if fraction > 0 {
            end += 1 + fraction;
        }
    }

    if integral + fraction == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }
        let exponent = digits_from(exponent_end);
        if exponent > 0 {
            end = exponent_end + exponent;
        }
    }

    Some(&text[..end])
}
