//! Field parsers for single raw listing values.
//!
//! Every parser takes a possibly-absent raw value and returns `None` when
//! the value is absent or cannot be parsed. None of them fail: a malformed
//! field becomes a missing value that the imputer fills later.

use once_cell::sync::Lazy;
use regex::Regex;

/// Currency tokens removed before digit extraction. Longest first.
const CURRENCY_TOKENS: [&str; 3] = ["EGP/m²", "EGP/m", "EGP"];

/// Unit suffixes seen in the `Area` column, including mis-decoded `m²`.
const AREA_UNIT_TOKENS: [&str; 3] = ["m²", "mÂ²", "Â²"];

static FIRST_DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("Invalid regex: digit run"));

static DEFAULT_LOCATION_CLEANER: Lazy<LocationCleaner> = Lazy::new(|| {
    LocationCleaner::new("Greater Cairo").expect("Invalid regex: default region prefix")
});

/// Parse a currency string such as `"12,500 EGP"` into its digit sequence.
///
/// Newlines, thousands separators and currency tokens are removed, then every
/// remaining non-digit character. Decimal points are digits-only too, so
/// `"1,250.50"` yields `125050`.
pub fn parse_price(raw: Option<&str>) -> Option<i64> {
    let raw = raw?;
    let mut value = raw.replace('\n', " ").replace(',', "");
    for token in CURRENCY_TOKENS {
        value = value.replace(token, "");
    }
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Parse an area string such as `"150 m²"` (or its mis-encoded variants).
///
/// Returns the first contiguous run of digits.
pub fn parse_area(raw: Option<&str>) -> Option<i64> {
    let raw = raw?;
    let mut value = raw.to_string();
    for token in AREA_UNIT_TOKENS {
        value = value.replace(token, "");
    }
    FIRST_DIGIT_RUN
        .find(&value)
        .and_then(|m| m.as_str().parse().ok())
}

/// Coerce a room count to a positive whole number.
///
/// Accepts integers and whole-valued decimals (`"3"`, `"3.0"`). Anything
/// else, including zero, fractions and negative values, is unparseable.
pub fn parse_room_count(raw: Option<&str>) -> Option<i64> {
    let value: f64 = raw?.trim().parse().ok()?;
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 {
        return None;
    }
    Some(value as i64)
}

/// Strip the default regional prefix (`"Greater Cairo /"`) from a location.
pub fn clean_location(raw: &str) -> String {
    DEFAULT_LOCATION_CLEANER.clean(raw)
}

/// Removes a leading `"<region> /"` prefix from location strings.
///
/// Repeated prefixes are removed together, so cleaning is idempotent.
/// Text after the prefix, including internal whitespace, is left as is.
#[derive(Debug, Clone)]
pub struct LocationCleaner {
    pattern: Regex,
}

impl LocationCleaner {
    pub fn new(region: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"^(?:{}\s*/\s*)+", regex::escape(region)))?;
        Ok(Self { pattern })
    }

    pub fn clean(&self, raw: &str) -> String {
        self.pattern.replace(raw, "").into_owned()
    }
}
