use crate::error::{LoadError, Result};
use crate::schema::{
    AREA, BATHROOMS, BEDROOMS, IMAGE_URL, LISTING_URL, LOCATION, PRICE, PRICE_PER_M2, TITLE,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Raw Listing Records
// ============================================================================

/// One listing as produced by the scraper, before any cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Price")]
    pub price: Option<String>,
    #[serde(rename = "Price/m²")]
    pub price_per_m2: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "Area")]
    pub area: Option<String>,
    #[serde(rename = "Bedrooms")]
    pub bedrooms: Option<String>,
    #[serde(rename = "Bathrooms")]
    pub bathrooms: Option<String>,
    #[serde(rename = "Image URL")]
    pub image_url: Option<String>,
    #[serde(rename = "Listing URL")]
    pub listing_url: Option<String>,
}

/// Build a raw listing table (all columns String) from scraped records.
pub fn listings_to_frame(listings: &[RawListing]) -> Result<DataFrame> {
    fn text_column(
        name: &str,
        listings: &[RawListing],
        field: fn(&RawListing) -> &Option<String>,
    ) -> Column {
        let values: Vec<Option<&str>> = listings.iter().map(|l| field(l).as_deref()).collect();
        Column::new(name.into(), values)
    }

    let columns = vec![
        text_column(TITLE, listings, |l| &l.title),
        text_column(PRICE, listings, |l| &l.price),
        text_column(PRICE_PER_M2, listings, |l| &l.price_per_m2),
        text_column(LOCATION, listings, |l| &l.location),
        text_column(AREA, listings, |l| &l.area),
        text_column(BEDROOMS, listings, |l| &l.bedrooms),
        text_column(BATHROOMS, listings, |l| &l.bathrooms),
        text_column(IMAGE_URL, listings, |l| &l.image_url),
        text_column(LISTING_URL, listings, |l| &l.listing_url),
    ];

    Ok(DataFrame::new(columns)?)
}

// ============================================================================
// Imputation Records
// ============================================================================

/// Statistic used to fill a column's missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    Mean,
    CeilingMean,
    Mode,
}

impl fmt::Display for ImputationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mean => "mean",
            Self::CeilingMean => "ceiling of mean",
            Self::Mode => "mode",
        };
        f.write_str(name)
    }
}

/// What the imputer did to one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub column: String,
    pub strategy: ImputationStrategy,
    /// Fill value rendered as text.
    pub fill_value: String,
    /// Number of cells filled.
    pub filled: usize,
}

impl ImputationRecord {
    pub fn new(
        column: impl Into<String>,
        strategy: ImputationStrategy,
        fill_value: impl Into<String>,
        filled: usize,
    ) -> Self {
        Self {
            column: column.into(),
            strategy,
            fill_value: fill_value.into(),
            filled,
        }
    }
}

// ============================================================================
// Preprocessing Summary
// ============================================================================

/// Human-readable summary of what the pipeline did.
///
/// Serializable so the CLI can print it with `--json` and a dashboard can
/// display it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessingSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,

    /// Cells converted from a missing-value marker to null.
    pub missing_markers_replaced: usize,

    /// Present cells per column that a field parser could not parse.
    pub unparseable: BTreeMap<String, usize>,

    /// Imputation applied per column, in column order.
    pub imputations: Vec<ImputationRecord>,

    /// Columns dropped as positional-index artifacts.
    pub dropped_columns: Vec<String>,

    /// Ordered log of processing steps.
    pub steps: Vec<String>,

    /// Warnings and notes generated during preprocessing.
    pub warnings: Vec<String>,
}

impl PreprocessingSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a processing step.
    pub fn add_step(&mut self, step: impl Into<String>) {
        self.steps.push(step.into());
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Total number of cells filled by imputation.
    pub fn cells_imputed(&self) -> usize {
        self.imputations.iter().map(|r| r.filled).sum()
    }
}

/// Result of [`Pipeline::preprocess`](crate::Pipeline::preprocess).
///
/// A load failure does not abort the run: `data` is then an empty table
/// and `load_error` says why. Check [`has_data`](Self::has_data) before
/// handing the table to downstream consumers.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    pub data: DataFrame,
    pub load_error: Option<LoadError>,
    pub summary: PreprocessingSummary,
}

impl PreprocessOutput {
    /// Whether the run produced at least one row.
    pub fn has_data(&self) -> bool {
        self.data.height() > 0
    }
}

// ============================================================================
// Collaborator Results
// ============================================================================

/// Evaluation metrics for one price model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub model: String,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Cluster labels per row plus the chosen cluster count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// One label per row, row-aligned with the input table.
    pub labels: Vec<u32>,
    pub k: usize,
    pub silhouette: f64,
}
