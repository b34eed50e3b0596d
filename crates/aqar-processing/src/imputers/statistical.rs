//! Statistical imputation methods.
//!
//! Every fill value is computed from the column's own present values only.

use crate::error::{PreprocessingError, Result};
use crate::schema::is_index_artifact;
use crate::types::{ImputationRecord, ImputationStrategy};
use crate::utils::{
    column_names, fill_integer_nulls, fill_numeric_nulls, fill_string_nulls, is_numeric_dtype,
    string_mode,
};
use polars::prelude::*;
use tracing::debug;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill every column that has missing values.
    ///
    /// - columns listed in `ceiling_columns`: ceiling of the mean, as `Int64`
    /// - other numeric columns: arithmetic mean, as `Float64`
    /// - everything else: the mode
    ///
    /// Index-artifact columns (names starting with `artifact_prefix`) are
    /// left untouched; they are dropped before the table is returned.
    ///
    /// A column whose every cell is missing fails with
    /// [`PreprocessingError::EmptyColumn`].
    pub fn impute_all(
        df: DataFrame,
        ceiling_columns: &[&str],
        artifact_prefix: &str,
    ) -> Result<(DataFrame, Vec<ImputationRecord>)> {
        let mut df = df;
        let mut records = Vec::new();

        for col_name in column_names(&df) {
            if is_index_artifact(&col_name, artifact_prefix) {
                continue;
            }
            let column = df.column(&col_name)?;
            let missing = column.null_count();
            if missing == 0 {
                continue;
            }
            if missing == column.len() {
                return Err(PreprocessingError::EmptyColumn(col_name));
            }

            let record = if is_numeric_dtype(column.dtype()) {
                if ceiling_columns.contains(&col_name.as_str()) {
                    Self::apply_ceiling_mean(&mut df, &col_name)?
                } else {
                    Self::apply_numeric_mean(&mut df, &col_name)?
                }
            } else {
                Self::apply_mode_imputation(&mut df, &col_name)?
            };

            debug!(
                "Filled {} values in '{}' with {}: {}",
                record.filled, record.column, record.strategy, record.fill_value
            );
            records.push(record);
        }

        Ok((df, records))
    }

    /// Apply mean imputation for a numeric column. The column becomes `Float64`.
    pub fn apply_numeric_mean(df: &mut DataFrame, col_name: &str) -> Result<ImputationRecord> {
        let series = df.column(col_name)?.as_materialized_series();
        let missing = series.null_count();
        let mean = series
            .mean()
            .ok_or_else(|| PreprocessingError::EmptyColumn(col_name.to_string()))?;

        let filled = fill_numeric_nulls(series, mean)?;
        df.replace(col_name, filled)?;

        Ok(ImputationRecord::new(
            col_name,
            ImputationStrategy::Mean,
            format!("{:.2}", mean),
            missing,
        ))
    }

    /// Apply ceiling-of-mean imputation, keeping counts whole. The column
    /// becomes `Int64`.
    pub fn apply_ceiling_mean(df: &mut DataFrame, col_name: &str) -> Result<ImputationRecord> {
        let series = df.column(col_name)?.as_materialized_series();
        let missing = series.null_count();
        let mean = series
            .mean()
            .ok_or_else(|| PreprocessingError::EmptyColumn(col_name.to_string()))?;
        let fill = mean.ceil() as i64;

        let filled = fill_integer_nulls(series, fill)?;
        df.replace(col_name, filled)?;

        Ok(ImputationRecord::new(
            col_name,
            ImputationStrategy::CeilingMean,
            fill.to_string(),
            missing,
        ))
    }

    /// Apply mode imputation. The column is filled as text.
    pub fn apply_mode_imputation(df: &mut DataFrame, col_name: &str) -> Result<ImputationRecord> {
        let series = df.column(col_name)?.as_materialized_series();
        let missing = series.null_count();
        let mode = string_mode(series)
            .ok_or_else(|| PreprocessingError::EmptyColumn(col_name.to_string()))?;

        let filled = fill_string_nulls(series, &mode)?;
        df.replace(col_name, filled)?;

        Ok(ImputationRecord::new(
            col_name,
            ImputationStrategy::Mode,
            mode,
            missing,
        ))
    }
}
