//! Missing-value sentinel normalization.

use crate::error::Result;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Replace textual "no value" markers with null in every string column.
///
/// Markers are compared against the trimmed value, so a whitespace-only
/// cell matches the empty-string marker. Non-matching values are kept
/// unchanged. Returns the new frame and the number of cells replaced.
pub(crate) fn normalize_missing_markers(
    df: DataFrame,
    markers: &[String],
) -> Result<(DataFrame, usize)> {
    let mut df = df;
    let markers: HashSet<&str> = markers.iter().map(|m| m.trim()).collect();
    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    debug!("Converting missing-value markers {:?} to null...", markers);

    let mut total_replacements = 0;

    for col_name in &column_names {
        let series = df.column(col_name)?.as_materialized_series();
        if series.dtype() != &DataType::String {
            continue;
        }
        let (cleaned, count) = replace_markers_with_null(series, &markers)?;
        if count > 0 {
            debug!("'{}': {} missing markers", col_name, count);
            total_replacements += count;
            df.replace(col_name, cleaned)?;
        }
    }

    Ok((df, total_replacements))
}

fn replace_markers_with_null(series: &Series, markers: &HashSet<&str>) -> Result<(Series, usize)> {
    let str_series = series.str()?;
    let mut replacement_count = 0;

    let cleaned: Vec<Option<&str>> = str_series
        .into_iter()
        .map(|opt_val| match opt_val {
            Some(val) if markers.contains(val.trim()) => {
                replacement_count += 1;
                None
            }
            other => other,
        })
        .collect();

    Ok((Series::new(series.name().clone(), cleaned), replacement_count))
}
