//! Imputation module for handling missing values.
//!
//! Fill values are column-local statistics: mean, ceiling of the mean for
//! room counts, and mode for text.

mod statistical;

pub use statistical::StatisticalImputer;
