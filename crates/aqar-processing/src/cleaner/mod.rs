//! Field cleaning for scraped listings.
//!
//! This module provides:
//! - Pure field parsers for price, area, room counts and location
//! - Missing-marker normalization across all text columns
//! - Column-level application of the parsers

mod converters;
pub mod parsers;
mod sanitizers;

pub(crate) use converters::numeric_column_if_uniform;
pub use parsers::{LocationCleaner, clean_location, parse_area, parse_price, parse_room_count};

use crate::config::PipelineConfig;
use crate::error::{PreprocessingError, Result};
use crate::schema::{AREA, LOCATION, PRICE_COLUMNS, ROOM_COLUMNS};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Applies the field parsers of one pipeline run to a listing table.
#[derive(Debug, Clone)]
pub struct ListingCleaner {
    missing_markers: Vec<String>,
    location: LocationCleaner,
}

impl ListingCleaner {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let location = LocationCleaner::new(&config.region_prefix)
            .map_err(|e| PreprocessingError::InvalidConfig(format!("region_prefix: {}", e)))?;
        Ok(Self {
            missing_markers: config.missing_markers.clone(),
            location,
        })
    }

    /// Turn every missing-value marker into null. Returns the number of
    /// cells replaced.
    pub fn normalize_missing(&self, df: DataFrame) -> Result<(DataFrame, usize)> {
        sanitizers::normalize_missing_markers(df, &self.missing_markers)
    }

    /// Parse Price, Price/m², Area, Bedrooms and Bathrooms into `Int64`.
    ///
    /// Returns the number of present-but-unparseable cells per column.
    /// Columns with no such cells are left out of the map.
    pub fn parse_fields(&self, df: DataFrame) -> Result<(DataFrame, BTreeMap<String, usize>)> {
        let mut df = df;
        let mut unparseable = BTreeMap::new();

        let parsers: Vec<(&str, fn(Option<&str>) -> Option<i64>)> = PRICE_COLUMNS
            .iter()
            .map(|&c| (c, parse_price as fn(Option<&str>) -> Option<i64>))
            .chain(std::iter::once((AREA, parse_area as fn(Option<&str>) -> Option<i64>)))
            .chain(
                ROOM_COLUMNS
                    .iter()
                    .map(|&c| (c, parse_room_count as fn(Option<&str>) -> Option<i64>)),
            )
            .collect();

        for (col_name, parser) in parsers {
            let (parsed, count) = converters::parse_integer_column(df, col_name, parser)?;
            df = parsed;
            if count > 0 {
                debug!("'{}': {} unparseable values", col_name, count);
                unparseable.insert(col_name.to_string(), count);
            }
        }

        Ok((df, unparseable))
    }

    /// Strip the regional prefix from every Location value.
    pub fn clean_locations(&self, df: DataFrame) -> Result<DataFrame> {
        converters::map_string_column(df, LOCATION, |raw| self.location.clean(raw))
    }
}
