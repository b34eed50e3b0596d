//! Column names and schema checks for listing tables.

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;

pub const TITLE: &str = "Title";
pub const PRICE: &str = "Price";
pub const PRICE_PER_M2: &str = "Price/m²";
pub const LOCATION: &str = "Location";
pub const AREA: &str = "Area";
pub const BEDROOMS: &str = "Bedrooms";
pub const BATHROOMS: &str = "Bathrooms";
pub const IMAGE_URL: &str = "Image URL";
pub const LISTING_URL: &str = "Listing URL";

/// Columns every listings file must carry, in scraper order.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    TITLE,
    PRICE,
    PRICE_PER_M2,
    LOCATION,
    AREA,
    BEDROOMS,
    BATHROOMS,
    IMAGE_URL,
    LISTING_URL,
];

/// Currency columns parsed by the price parser.
pub const PRICE_COLUMNS: [&str; 2] = [PRICE, PRICE_PER_M2];

/// Room-count columns; imputed with the ceiling of the mean.
pub const ROOM_COLUMNS: [&str; 2] = [BEDROOMS, BATHROOMS];

/// Continuous columns eligible for standardization.
pub const CONTINUOUS_COLUMNS: [&str; 3] = [PRICE, PRICE_PER_M2, AREA];

/// Fail with [`PreprocessingError::SchemaMismatch`] if any required column is absent.
pub fn validate_schema(df: &DataFrame) -> Result<()> {
    let present: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !present.contains(col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PreprocessingError::SchemaMismatch { missing })
    }
}

/// Whether a column name is a leftover positional index (e.g. `Unnamed: 0`).
pub fn is_index_artifact(name: &str, artifact_prefix: &str) -> bool {
    name.starts_with(artifact_prefix)
}

/// The dtype a required column carries after preprocessing.
pub fn final_dtype(name: &str) -> Option<DataType> {
    match name {
        PRICE | PRICE_PER_M2 | AREA => Some(DataType::Float64),
        BEDROOMS | BATHROOMS => Some(DataType::Int64),
        TITLE | LOCATION | IMAGE_URL | LISTING_URL => Some(DataType::String),
        _ => None,
    }
}
