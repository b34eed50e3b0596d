//! Real-Estate Listing Processing Library
//!
//! Cleaning and feature engineering for scraped property listings, built
//! with Rust and Polars.
//!
//! # Overview
//!
//! Raw listings arrive as loosely-typed text: currency strings, areas with
//! mis-encoded unit glyphs, room counts, prefixed locations and "N/A"
//! markers. This library turns them into a fixed-schema table ready for
//! modeling and clustering:
//!
//! - **Field Parsers**: price, area, room-count and location parsers that
//!   never fail; bad input becomes a missing value
//! - **Imputation**: column-local mean, ceiling of the mean for room
//!   counts, mode for text
//! - **Pipeline**: the ordered preprocessing stages with explicit errors
//!   and progress reporting
//! - **Feature Enrichment**: sentence embeddings and TF-IDF blocks for the
//!   Location and Title columns
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use aqar_processing::{Pipeline, PipelineConfig};
//!
//! let output = Pipeline::builder()
//!     .config(PipelineConfig::default())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .preprocess("listings.csv")?;
//!
//! if let Some(load_error) = &output.load_error {
//!     println!("No data available: {}", load_error);
//! }
//! ```
//!
//! # Enrichment
//!
//! The embedding model is loaded once by the caller and shared:
//!
//! ```rust,ignore
//! use aqar_processing::features::{FastEmbedder, FeatureEnricher, feature_columns};
//! use std::sync::Arc;
//!
//! let embedder = Arc::new(FastEmbedder::from_env()?);
//! let enriched = FeatureEnricher::builder(embedder).build()?.enrich(&output.data)?;
//! let features = feature_columns(&enriched, &["loc", "title"]);
//! ```
//!
//! # Errors
//!
//! A file that cannot be loaded is reported in
//! [`PreprocessOutput::load_error`] next to an empty table ("no data
//! available"). Structural problems abort the run with a
//! [`PreprocessingError`]: a missing required column
//! ([`SchemaMismatch`](PreprocessingError::SchemaMismatch)) or a column
//! with nothing left to impute from
//! ([`EmptyColumn`](PreprocessingError::EmptyColumn)).

pub mod cleaner;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod features;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{ListingCleaner, clean_location, parse_area, parse_price, parse_room_count};
pub use collaborators::{ListingClusterer, ListingSource, PriceModeler, collect_listings};
pub use config::{
    ConfigValidationError, EnrichConfig, EnrichConfigBuilder, PipelineConfig,
    PipelineConfigBuilder, TextColumn,
};
pub use error::{LoadError, PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use features::{FeatureEnricher, SentenceEmbedder, TfidfVectorizer, feature_columns};
pub use imputers::StatisticalImputer;
pub use loader::load_listings;
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, PreprocessingExecutor,
    ProgressReporter, ProgressUpdate,
};
pub use types::{
    ClusterAssignment, ImputationRecord, ImputationStrategy, ModelMetrics, PreprocessOutput,
    PreprocessingSummary, RawListing, listings_to_frame,
};
