//! Main preprocessing pipeline module.
//!
//! This module provides the `Pipeline` struct and its builder. A pipeline
//! owns one [`PipelineConfig`] and runs the preprocessing stages in a
//! fixed order:
//!
//! 1. load the listings file
//! 2. normalize missing-value markers
//! 3. parse Price and Price/m²
//! 4. parse Area
//! 5. parse Bedrooms and Bathrooms
//! 6. clean Location
//! 7. impute missing values
//! 8. reset the row index
//! 9. drop index-artifact columns

use crate::cleaner::ListingCleaner;
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::Result;
use crate::imputers::StatisticalImputer;
use crate::loader::load_listings;
use crate::pipeline::PreprocessingExecutor;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::schema::{CONTINUOUS_COLUMNS, ROOM_COLUMNS, validate_schema};
use crate::types::{PreprocessOutput, PreprocessingSummary};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The listing preprocessing pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use aqar_processing::{Pipeline, PipelineConfig};
///
/// let output = Pipeline::builder()
///     .config(PipelineConfig::builder().scale_numeric(true).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .preprocess("listings.csv")?;
///
/// if !output.has_data() {
///     println!("no data available");
/// }
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: ListingCleaner,
    executor: PreprocessingExecutor,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a listings file and preprocess it.
    ///
    /// A file that cannot be loaded is not an error: the output carries an
    /// empty table and the [`LoadError`](crate::error::LoadError). A file
    /// with a header but no rows comes back unchanged.
    ///
    /// # Errors
    ///
    /// [`SchemaMismatch`](crate::error::PreprocessingError::SchemaMismatch)
    /// when a required column is absent,
    /// [`EmptyColumn`](crate::error::PreprocessingError::EmptyColumn) when a
    /// column has no usable value to impute from.
    pub fn preprocess(&self, path: impl AsRef<Path>) -> Result<PreprocessOutput> {
        let path = path.as_ref();
        let start_time = Instant::now();

        info!("Step 1: Loading listings from {}", path.display());
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Loading {}...", path.display()),
        ));

        let df = match load_listings(path) {
            Ok(df) => df,
            Err(load_error) => {
                warn!("No data available: {}", load_error);
                let mut summary = PreprocessingSummary::new();
                summary.add_warning(load_error.to_string());
                summary.duration_ms = start_time.elapsed().as_millis() as u64;
                self.report_progress(ProgressUpdate::failed(load_error.to_string()));
                return Ok(PreprocessOutput {
                    data: DataFrame::empty(),
                    load_error: Some(load_error),
                    summary,
                });
            }
        };

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} rows x {} columns", df.height(), df.width()),
        ));

        self.finish(self.run_stages(df, start_time))
    }

    /// Preprocess an already-loaded raw table (stages 2 to 9).
    ///
    /// Used for records that never touched a file, e.g. the output of
    /// [`listings_to_frame`](crate::types::listings_to_frame).
    pub fn preprocess_frame(&self, df: DataFrame) -> Result<PreprocessOutput> {
        self.finish(self.run_stages(df, Instant::now()))
    }

    fn finish(&self, result: Result<PreprocessOutput>) -> Result<PreprocessOutput> {
        match result {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Preprocessed {} listings",
                    output.data.height()
                )));
                Ok(output)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_stages(&self, df: DataFrame, start_time: Instant) -> Result<PreprocessOutput> {
        let mut summary = PreprocessingSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();

        if df.height() == 0 {
            info!("Input has no rows; returning it unchanged");
            summary.add_step("Input has no rows; nothing to preprocess");
            summary.columns_after = df.width();
            summary.duration_ms = start_time.elapsed().as_millis() as u64;
            return Ok(PreprocessOutput {
                data: df,
                load_error: None,
                summary,
            });
        }

        validate_schema(&df)?;

        // Step 2: Missing-value markers
        info!("Step 2: Normalizing missing-value markers...");
        self.report_progress(ProgressUpdate::new(
            PipelineStage::NormalizingMissing,
            0.0,
            "Normalizing missing-value markers...",
        ));
        let (df, replaced) = self.cleaner.normalize_missing(df)?;
        summary.missing_markers_replaced = replaced;
        summary.add_step(format!(
            "Converted {} missing-value markers {:?} to null",
            replaced, self.config.missing_markers
        ));

        // Steps 3-5: Price, Area and room counts
        info!("Steps 3-5: Parsing price, area and room fields...");
        self.report_progress(ProgressUpdate::new(
            PipelineStage::ParsingFields,
            0.0,
            "Parsing price, area and room fields...",
        ));
        let (df, unparseable) = self.cleaner.parse_fields(df)?;
        for (column, count) in &unparseable {
            summary.add_warning(format!("{}: {} values could not be parsed", column, count));
        }
        summary.unparseable = unparseable;
        summary.add_step("Parsed Price, Price/m², Area, Bedrooms and Bathrooms");

        // Step 6: Location
        info!("Step 6: Cleaning locations...");
        self.report_progress(ProgressUpdate::new(
            PipelineStage::ParsingFields,
            0.8,
            "Cleaning locations...",
        ));
        let df = self.cleaner.clean_locations(df)?;
        summary.add_step(format!(
            "Removed '{} /' prefix from Location",
            self.config.region_prefix
        ));

        let (df, converted) = self
            .executor
            .coerce_passthrough_columns(df, &self.config.index_artifact_prefix)?;
        if !converted.is_empty() {
            summary.add_step(format!("Converted extra columns to numeric: {:?}", converted));
        }

        // Step 7: Imputation
        info!("Step 7: Imputing missing values...");
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Imputation,
            0.0,
            "Imputing missing values...",
        ));
        let (df, imputations) = StatisticalImputer::impute_all(
            df,
            &ROOM_COLUMNS,
            &self.config.index_artifact_prefix,
        )?;
        summary.add_step(format!("Imputed {} columns", imputations.len()));
        summary.imputations = imputations;

        info!("Finalizing table...");
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Finalizing,
            0.0,
            "Finalizing table...",
        ));
        let mut df = self.executor.cast_final_types(df)?;

        if self.config.scale_numeric {
            df = self.executor.scale_columns(df, &CONTINUOUS_COLUMNS)?;
            summary.add_step(format!("Standardized {:?}", CONTINUOUS_COLUMNS));
        }

        // Step 8: Index reset
        let df = self.executor.reset_index(df);
        summary.add_step("Reset row index");

        // Step 9: Index artifacts
        let (df, dropped) = self
            .executor
            .drop_index_artifacts(df, &self.config.index_artifact_prefix);
        if !dropped.is_empty() {
            info!("Dropped index-artifact columns: {:?}", dropped);
            summary.add_step(format!("Dropped index-artifact columns: {:?}", dropped));
        }
        summary.dropped_columns = dropped;

        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Preprocessing complete: {} rows x {} columns in {}ms",
            summary.rows_after, summary.columns_after, summary.duration_ms
        );

        Ok(PreprocessOutput {
            data: df,
            load_error: None,
            summary,
        })
    }
}

/// Builder for creating a [`Pipeline`] instance.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For anything more involved, implement [`ProgressReporter`] and use
    /// [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let cleaner = ListingCleaner::new(&config)
            .map_err(|_| ConfigValidationError::EmptyValue("region_prefix".to_string()))?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            cleaner,
            executor: PreprocessingExecutor,
        })
    }
}
