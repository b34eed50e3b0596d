//! Table-level stage operations.
//!
//! Each operation takes a frame by value and returns the next table state.

use crate::cleaner::numeric_column_if_uniform;
use crate::error::{PreprocessingError, Result};
use crate::schema::{REQUIRED_COLUMNS, final_dtype, is_index_artifact};
use crate::utils::column_names;
use polars::prelude::*;
use tracing::{debug, warn};

/// Executes the non-parsing stages of a pipeline run.
pub struct PreprocessingExecutor;

impl PreprocessingExecutor {
    /// Type columns outside the listing schema: `Float64` when every present
    /// value is numeric, otherwise left as text.
    ///
    /// Returns the names of the columns converted.
    pub fn coerce_passthrough_columns(
        &self,
        df: DataFrame,
        artifact_prefix: &str,
    ) -> Result<(DataFrame, Vec<String>)> {
        let mut df = df;
        let mut converted = Vec::new();

        for col_name in column_names(&df) {
            if REQUIRED_COLUMNS.contains(&col_name.as_str())
                || is_index_artifact(&col_name, artifact_prefix)
            {
                continue;
            }
            let series = df.column(&col_name)?.as_materialized_series();
            if let Some(numeric) = numeric_column_if_uniform(series)? {
                debug!("Passthrough column '{}' is numeric", col_name);
                df.replace(&col_name, numeric)?;
                converted.push(col_name);
            }
        }

        Ok((df, converted))
    }

    /// Cast the listing columns to their final dtypes.
    ///
    /// Imputation only widens columns that had missing values, so a column
    /// without gaps is still `Int64` here.
    pub fn cast_final_types(&self, df: DataFrame) -> Result<DataFrame> {
        let mut df = df;
        for col_name in REQUIRED_COLUMNS {
            let Some(target) = final_dtype(col_name) else {
                continue;
            };
            let column = df.column(col_name)?;
            if column.dtype() != &target {
                let cast = column.cast(&target)?.take_materialized_series();
                df.replace(col_name, cast)?;
            }
        }
        Ok(df)
    }

    /// Standardize `columns` to zero mean and unit (population) variance.
    ///
    /// A column with zero variance becomes all zeros.
    pub fn scale_columns(&self, df: DataFrame, columns: &[&str]) -> Result<DataFrame> {
        let mut df = df;

        for &col_name in columns {
            let series = df
                .column(col_name)?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = series.f64()?.into_iter().collect();
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            if present.is_empty() {
                return Err(PreprocessingError::EmptyColumn(col_name.to_string()));
            }

            let n = present.len() as f64;
            let mean = present.iter().sum::<f64>() / n;
            let std = (present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
            if std == 0.0 {
                warn!("'{}' has zero variance; scaled to zeros", col_name);
            }

            let scaled: Vec<Option<f64>> = values
                .into_iter()
                .map(|v| v.map(|x| if std == 0.0 { 0.0 } else { (x - mean) / std }))
                .collect();
            df.replace(col_name, Series::new(col_name.into(), scaled))?;
            debug!("Scaled '{}' (mean {:.2}, std {:.2})", col_name, mean, std);
        }

        Ok(df)
    }

    /// Make row `i` of the frame the `i`-th surviving record in one
    /// contiguous chunk.
    pub fn reset_index(&self, df: DataFrame) -> DataFrame {
        let mut df = df;
        df.as_single_chunk_par();
        df
    }

    /// Drop every column whose name marks a positional-index artifact.
    pub fn drop_index_artifacts(
        &self,
        df: DataFrame,
        artifact_prefix: &str,
    ) -> (DataFrame, Vec<String>) {
        let artifacts: Vec<String> = column_names(&df)
            .into_iter()
            .filter(|name| is_index_artifact(name, artifact_prefix))
            .collect();

        if artifacts.is_empty() {
            return (df, artifacts);
        }

        let to_drop: Vec<PlSmallStr> = artifacts.iter().map(|s| s.as_str().into()).collect();
        (df.drop_many(to_drop), artifacts)
    }
}
