//! Column-level application of the field parsers.

use crate::error::Result;
use crate::utils::{as_string_series, numeric_ratio, parse_numeric_string};
use polars::prelude::*;

/// Parse every cell of a column with `parser`, producing an `Int64` column.
///
/// Returns the new frame and the number of present cells that did not parse.
pub(crate) fn parse_integer_column(
    df: DataFrame,
    col_name: &str,
    parser: fn(Option<&str>) -> Option<i64>,
) -> Result<(DataFrame, usize)> {
    let mut df = df;
    let series = as_string_series(df.column(col_name)?.as_materialized_series())?;
    let str_series = series.str()?;

    let mut unparseable = 0;
    let parsed: Vec<Option<i64>> = str_series
        .into_iter()
        .map(|raw| {
            let value = parser(raw);
            if raw.is_some() && value.is_none() {
                unparseable += 1;
            }
            value
        })
        .collect();

    df.replace(col_name, Series::new(col_name.into(), parsed))?;
    Ok((df, unparseable))
}

/// Apply `f` to every present cell of a string column. Nulls stay null.
pub(crate) fn map_string_column<F>(df: DataFrame, col_name: &str, f: F) -> Result<DataFrame>
where
    F: Fn(&str) -> String,
{
    let mut df = df;
    let series = as_string_series(df.column(col_name)?.as_materialized_series())?;
    let mapped: Vec<Option<String>> = series
        .str()?
        .into_iter()
        .map(|opt_val| opt_val.map(&f))
        .collect();

    df.replace(col_name, Series::new(col_name.into(), mapped))?;
    Ok(df)
}

/// Convert a string column to `Float64` when every present value is numeric.
///
/// Returns `None` when the column should stay textual.
pub(crate) fn numeric_column_if_uniform(series: &Series) -> Result<Option<Series>> {
    if series.dtype() != &DataType::String || series.null_count() == series.len() {
        return Ok(None);
    }
    if numeric_ratio(series) < 1.0 {
        return Ok(None);
    }

    let values: Vec<Option<f64>> = series
        .str()?
        .into_iter()
        .map(|opt_val| opt_val.and_then(parse_numeric_string))
        .collect();
    Ok(Some(Series::new(series.name().clone(), values)))
}
