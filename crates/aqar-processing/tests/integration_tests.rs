//! Integration tests for the listing pipeline.
//!
//! These tests run the pipeline end to end over the CSV fixtures and feed
//! its output through the feature enricher.

use aqar_processing::{
    FeatureEnricher, LoadError, Pipeline, PipelineConfig, PipelineStage, PreprocessOutput,
    PreprocessingError, PreprocessingResult, RawListing, SentenceEmbedder, feature_columns,
    listings_to_frame,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn preprocess(filename: &str) -> PreprocessingResult<PreprocessOutput> {
    Pipeline::builder()
        .build()
        .unwrap()
        .preprocess(fixtures_path().join(filename))
}

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Deterministic embedder: word count and text length.
struct WordStatsEmbedder;

impl SentenceEmbedder for WordStatsEmbedder {
    fn model_name(&self) -> &str {
        "word-stats"
    }

    fn dimension(&self) -> usize {
        2
    }

    fn embed(&self, texts: &[String]) -> PreprocessingResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| vec![t.split_whitespace().count() as f32, t.len() as f32])
            .collect())
    }
}

// ============================================================================
// Preprocessing
// ============================================================================

#[test]
fn test_preprocess_listings_with_bom() {
    let output = preprocess("listings_bom.csv").unwrap();
    let df = &output.data;

    assert!(output.load_error.is_none());
    assert_eq!(df.height(), 4);
    assert_eq!(
        names(df),
        vec![
            "Title",
            "Price",
            "Price/m²",
            "Location",
            "Area",
            "Bedrooms",
            "Bathrooms",
            "Image URL",
            "Listing URL"
        ]
    );
    assert_eq!(output.summary.dropped_columns, vec!["Unnamed: 0".to_string()]);

    let price = df.column("Price").unwrap().f64().unwrap();
    assert_eq!(price.get(0), Some(2_500_000.0));
    assert!((price.get(2).unwrap() - 14_500_000.0 / 3.0).abs() < 1e-6);

    let area = df.column("Area").unwrap().f64().unwrap();
    assert_eq!(area.get(1), Some(300.0));
    assert_eq!(area.get(2), Some(150.0));
    assert!((area.get(3).unwrap() - 550.0 / 3.0).abs() < 1e-9);

    // ceil(10 / 3) and ceil(7 / 3)
    assert_eq!(df.column("Bedrooms").unwrap().i64().unwrap().get(2), Some(4));
    assert_eq!(df.column("Bathrooms").unwrap().i64().unwrap().get(3), Some(3));

    let location = df.column("Location").unwrap().str().unwrap();
    let locations: Vec<_> = location.into_iter().flatten().collect();
    assert_eq!(locations, vec!["Maadi", "New Cairo", "Zamalek", "Zamalek"]);

    // three-way tie resolves to the smallest title
    let title = df.column("Title").unwrap().str().unwrap();
    assert_eq!(title.get(2), Some("Apartment for sale in Maadi"));

    assert_eq!(output.summary.unparseable.get("Price"), Some(&1));
    assert_eq!(output.summary.unparseable.get("Bathrooms"), Some(&1));
}

#[test]
fn test_preprocess_output_schema() {
    let output = preprocess("listings_bom.csv").unwrap();
    let df = &output.data;

    for col in ["Price", "Price/m²", "Area"] {
        assert_eq!(df.column(col).unwrap().dtype(), &DataType::Float64, "{}", col);
    }
    for col in ["Bedrooms", "Bathrooms"] {
        let column = df.column(col).unwrap();
        assert_eq!(column.dtype(), &DataType::Int64, "{}", col);
        assert!(column.i64().unwrap().into_iter().flatten().all(|v| v > 0));
    }
    for col in ["Title", "Location", "Image URL", "Listing URL"] {
        assert_eq!(df.column(col).unwrap().dtype(), &DataType::String, "{}", col);
    }
    for column in df.get_columns() {
        assert_eq!(column.null_count(), 0, "{}", column.name());
    }
}

#[test]
fn test_preprocess_is_deterministic() {
    let first = preprocess("listings_bom.csv").unwrap();
    let second = preprocess("listings_bom.csv").unwrap();
    assert!(first.data.equals_missing(&second.data));
}

#[test]
fn test_missing_file_is_no_data() {
    let output = preprocess("does_not_exist.csv").unwrap();

    assert!(!output.has_data());
    assert_eq!(output.data.width(), 0);
    assert!(matches!(output.load_error, Some(LoadError::NotFound(_))));
}

#[test]
fn test_empty_file_is_no_data() {
    let output = preprocess("empty.csv").unwrap();

    assert!(!output.has_data());
    assert!(matches!(output.load_error, Some(LoadError::Malformed { .. })));
}

#[test]
fn test_header_only_returns_table_unchanged() {
    let output = preprocess("header_only.csv").unwrap();

    assert!(output.load_error.is_none());
    assert!(!output.has_data());
    // short-circuits before artifact removal
    assert_eq!(output.data.width(), 10);
}

#[test]
fn test_missing_column_is_schema_mismatch() {
    let err = preprocess("missing_column.csv").unwrap_err();

    assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
    assert!(!err.is_no_data());
    match err {
        PreprocessingError::SchemaMismatch { missing } => assert_eq!(missing, vec!["Area"]),
        other => panic!("expected SchemaMismatch, got {:?}", other),
    }
}

#[test]
fn test_exhausted_column_is_fatal() {
    let err = preprocess("exhausted_column.csv").unwrap_err();

    assert!(!err.is_no_data());
    assert!(matches!(err, PreprocessingError::EmptyColumn(ref col) if col == "Area"));
}

#[test]
fn test_empty_index_column_is_dropped() {
    let output = preprocess("empty_index_column.csv").unwrap();
    let df = &output.data;

    assert_eq!(df.height(), 2);
    assert!(df.column("Unnamed: 0").is_err());
    assert_eq!(output.summary.dropped_columns, vec!["Unnamed: 0".to_string()]);
    // ceil((1 + 3) / 2)
    assert_eq!(df.column("Bathrooms").unwrap().i64().unwrap().get(1), Some(2));
}

#[test]
fn test_trailing_comma_column_is_dropped() {
    let output = preprocess("trailing_comma.csv").unwrap();
    let df = &output.data;

    assert!(output.load_error.is_none());
    assert_eq!(df.shape(), (2, 9));
    assert_eq!(output.summary.dropped_columns, vec!["Unnamed: 9".to_string()]);
    assert_eq!(names(df)[8], "Listing URL");
    assert_eq!(df.column("Area").unwrap().f64().unwrap().get(1), Some(200.0));
}

#[test]
fn test_zero_room_count_is_imputed() {
    let listing = |bedrooms: &str| RawListing {
        title: Some("Flat".to_string()),
        price: Some("1,000,000 EGP".to_string()),
        price_per_m2: Some("10,000 EGP/m²".to_string()),
        location: Some("Greater Cairo / Maadi".to_string()),
        area: Some("100 m²".to_string()),
        bedrooms: Some(bedrooms.to_string()),
        bathrooms: Some("1".to_string()),
        image_url: Some("https://img.example/1.jpg".to_string()),
        listing_url: Some("https://listings.example/1".to_string()),
    };

    let output = Pipeline::builder()
        .build()
        .unwrap()
        .preprocess_frame(listings_to_frame(&[listing("3"), listing("0")]).unwrap())
        .unwrap();

    let bedrooms = output.data.column("Bedrooms").unwrap().i64().unwrap();
    assert_eq!(bedrooms.get(1), Some(3));
    assert_eq!(output.summary.unparseable.get("Bedrooms"), Some(&1));
}

#[test]
fn test_progress_on_load_failure() {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    let output = Pipeline::builder()
        .on_progress(move |update| stages_clone.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .preprocess(fixtures_path().join("empty.csv"))
        .unwrap();

    assert!(output.load_error.is_some());
    let stages = stages.lock().unwrap();
    assert_eq!(stages.first(), Some(&PipelineStage::Loading));
    assert_eq!(stages.last(), Some(&PipelineStage::Failed));
}

#[test]
fn test_scraped_records_without_file() {
    let listings = vec![
        RawListing {
            title: Some("Duplex in Sheikh Zayed".to_string()),
            price: Some("4,200,000 EGP".to_string()),
            price_per_m2: Some("21,000 EGP/m²".to_string()),
            location: Some("Greater Cairo / Sheikh Zayed".to_string()),
            area: Some("200 m²".to_string()),
            bedrooms: Some("3".to_string()),
            bathrooms: Some("3".to_string()),
            image_url: Some("https://img.example/9.jpg".to_string()),
            listing_url: Some("https://listings.example/9".to_string()),
        },
        RawListing {
            title: Some("Studio".to_string()),
            price: Some("N/A".to_string()),
            price_per_m2: Some("18,000 EGP/m²".to_string()),
            location: Some("Greater Cairo / Dokki".to_string()),
            area: Some("45 mÂ²".to_string()),
            bedrooms: Some("1".to_string()),
            bathrooms: None,
            image_url: Some("https://img.example/10.jpg".to_string()),
            listing_url: Some("https://listings.example/10".to_string()),
        },
    ];

    let config = PipelineConfig::builder().build().unwrap();
    let output = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .preprocess_frame(listings_to_frame(&listings).unwrap())
        .unwrap();

    let df = &output.data;
    assert_eq!(df.column("Price").unwrap().f64().unwrap().get(1), Some(4_200_000.0));
    assert_eq!(df.column("Area").unwrap().f64().unwrap().get(1), Some(45.0));
    assert_eq!(df.column("Bathrooms").unwrap().i64().unwrap().get(1), Some(3));
    assert_eq!(df.column("Location").unwrap().str().unwrap().get(1), Some("Dokki"));
}

// ============================================================================
// Enrichment
// ============================================================================

#[test]
fn test_preprocess_then_enrich() {
    let cleaned = preprocess("listings_bom.csv").unwrap().data;
    let enriched = FeatureEnricher::builder(Arc::new(WordStatsEmbedder))
        .build()
        .unwrap()
        .enrich(&cleaned)
        .unwrap();

    assert_eq!(enriched.height(), cleaned.height());
    assert_eq!(&names(&enriched)[..cleaned.width()], names(&cleaned).as_slice());
    for name in names(&cleaned) {
        let before = cleaned.column(&name).unwrap().as_materialized_series();
        let after = enriched.column(&name).unwrap().as_materialized_series();
        assert!(after.equals_missing(before), "{}", name);
    }

    // row i of every block belongs to row i of the table
    let words = enriched.column("loc_emb_0").unwrap().f32().unwrap();
    assert_eq!(words.get(0), Some(1.0));
    assert_eq!(words.get(1), Some(2.0));

    let new = enriched.column("loc_tfidf_new").unwrap().f64().unwrap();
    assert!(new.get(1).unwrap() > 0.0);
    assert_eq!(new.get(0), Some(0.0));

    let selected = feature_columns(&enriched, &["loc", "title"]);
    assert_eq!(selected.len(), enriched.width() - cleaned.width());
    assert!(selected.iter().all(|c| c.starts_with("loc_") || c.starts_with("title_")));
}
