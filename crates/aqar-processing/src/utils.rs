//! Shared utilities for the listing pipeline.
//!
//! This module contains helpers used across the cleaner, imputer and
//! feature modules.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Return the series as a String series, casting if needed.
pub fn as_string_series(series: &Series) -> PolarsResult<Series> {
    if series.dtype() == &DataType::String {
        Ok(series.clone())
    } else {
        series.cast(&DataType::String)
    }
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 2] = [',', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !NUMERIC_FORMAT_CHARS.contains(c))
        .collect()
}

/// Try to parse a string as a finite numeric value (f64).
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Get the ratio of numeric-parseable values among the present values of a
/// string Series.
pub fn numeric_ratio(series: &Series) -> f64 {
    let Ok(str_series) = series.str() else {
        return 0.0;
    };

    let (mut numeric_count, mut total_count) = (0usize, 0usize);
    for val in str_series.into_iter().flatten() {
        total_count += 1;
        if parse_numeric_string(val).is_some() {
            numeric_count += 1;
        }
    }

    if total_count == 0 {
        0.0
    } else {
        numeric_count as f64 / total_count as f64
    }
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Calculate the mode (most frequent value) of a Series, compared as text.
///
/// Ties resolve to the lexicographically smallest value, so the result
/// depends only on the multiset of values, not on row order or hashing.
pub fn string_mode(series: &Series) -> Option<String> {
    let str_series = as_string_series(series).ok()?;
    let str_chunked = str_series.str().ok()?;

    let mut value_counts: HashMap<&str, usize> = HashMap::new();
    for val in str_chunked.into_iter().flatten() {
        *value_counts.entry(val).or_insert(0) += 1;
    }

    value_counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
        })
        .map(|(val, _)| val.to_string())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value (as Float64).
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let floats = series.cast(&DataType::Float64)?;
    let filled: Vec<f64> = floats
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in an integer Series with a specific value (as Int64).
pub fn fill_integer_nulls(series: &Series, fill_value: i64) -> PolarsResult<Series> {
    let ints = series.cast(&DataType::Int64)?;
    let filled: Vec<i64> = ints
        .i64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let strings = as_string_series(series)?;
    let filled: Vec<&str> = strings
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Owned column names of a frame, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string(" 1,234.5 "), Some(1234.5));
        assert_eq!(parse_numeric_string("-3"), Some(-3.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("inf"), None);
        assert_eq!(parse_numeric_string("villa"), None);
    }

    #[test]
    fn test_numeric_ratio() {
        let series = Series::new("x".into(), &[Some("1"), Some("two"), None, Some("3")]);
        assert!((numeric_ratio(&series) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_string_mode() {
        let series = Series::new("test".into(), &["a", "b", "a", "c", "a"]);
        assert_eq!(string_mode(&series), Some("a".to_string()));
    }

    #[test]
    fn test_string_mode_tie_is_lexicographic() {
        let series = Series::new("test".into(), &["Zamalek", "Maadi", "Zamalek", "Maadi"]);
        assert_eq!(string_mode(&series), Some("Maadi".to_string()));

        let reversed = Series::new("test".into(), &["Maadi", "Zamalek", "Maadi", "Zamalek"]);
        assert_eq!(string_mode(&reversed), Some("Maadi".to_string()));
    }

    #[test]
    fn test_string_mode_all_null() {
        let series = Series::new("test".into(), &[Option::<&str>::None, None]);
        assert_eq!(string_mode(&series), None);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1i64), None, Some(3)]);
        let filled = fill_numeric_nulls(&series, 2.5).unwrap();

        assert_eq!(filled.dtype(), &DataType::Float64);
        assert_eq!(filled.f64().unwrap().get(1), Some(2.5));
        assert_eq!(filled.f64().unwrap().get(2), Some(3.0));
    }

    #[test]
    fn test_fill_integer_nulls() {
        let series = Series::new("test".into(), &[Some(1i64), None]);
        let filled = fill_integer_nulls(&series, 2).unwrap();
        assert_eq!(filled.i64().unwrap().get(1), Some(2));
        assert_eq!(filled.null_count(), 0);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("test".into(), &[Some("a"), None]);
        let filled = fill_string_nulls(&series, "b").unwrap();
        assert_eq!(filled.str().unwrap().get(1), Some("b"));
    }
}
