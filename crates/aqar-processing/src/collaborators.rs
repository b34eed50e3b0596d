//! Interfaces of the components around the pipeline.
//!
//! The crate ships no implementations. A scraper feeds [`RawListing`]s in;
//! modeling and clustering consume the cleaned or enriched table.

use crate::error::Result;
use crate::types::{ClusterAssignment, ModelMetrics, RawListing};
use polars::prelude::*;

/// Produces raw listings, one results page at a time.
pub trait ListingSource {
    /// Fetch page `page` (1-based). An empty vector means no more pages.
    fn fetch_page(&mut self, page: usize) -> Result<Vec<RawListing>>;
}

/// Trains and evaluates price models on a cleaned or enriched table.
pub trait PriceModeler {
    fn evaluate(&self, df: &DataFrame, target: &str) -> Result<Vec<ModelMetrics>>;
}

/// Groups listings using the feature columns selected by
/// [`feature_columns`](crate::features::feature_columns).
pub trait ListingClusterer {
    fn cluster(&self, df: &DataFrame, feature_columns: &[String]) -> Result<ClusterAssignment>;
}

/// Fetch pages from `source` until an empty page or `max_pages`, in order.
pub fn collect_listings(source: &mut dyn ListingSource, max_pages: usize) -> Result<Vec<RawListing>> {
    let mut listings = Vec::new();
    for page in 1..=max_pages {
        let batch = source.fetch_page(page)?;
        if batch.is_empty() {
            break;
        }
        listings.extend(batch);
    }
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::feature_columns;

    struct FixedPages(Vec<Vec<RawListing>>);

    impl ListingSource for FixedPages {
        fn fetch_page(&mut self, page: usize) -> Result<Vec<RawListing>> {
            Ok(self.0.get(page - 1).cloned().unwrap_or_default())
        }
    }

    fn listing(title: &str) -> RawListing {
        RawListing {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_collect_listings_stops_on_empty_page() {
        let mut source = FixedPages(vec![
            vec![listing("a"), listing("b")],
            vec![listing("c")],
            vec![],
            vec![listing("never")],
        ]);

        let listings = collect_listings(&mut source, 10).unwrap();
        let titles: Vec<_> = listings.iter().filter_map(|l| l.title.as_deref()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_collect_listings_respects_max_pages() {
        let mut source = FixedPages(vec![vec![listing("a")], vec![listing("b")]]);
        assert_eq!(collect_listings(&mut source, 1).unwrap().len(), 1);
    }

    /// Labels each row by whether its first feature is positive.
    struct SignClusterer;

    impl ListingClusterer for SignClusterer {
        fn cluster(&self, df: &DataFrame, feature_columns: &[String]) -> Result<ClusterAssignment> {
            let first = df.column(&feature_columns[0])?.cast(&DataType::Float64)?;
            let labels = first
                .f64()?
                .into_iter()
                .map(|v| u32::from(v.unwrap_or(0.0) > 0.0))
                .collect();
            Ok(ClusterAssignment {
                labels,
                k: 2,
                silhouette: 0.0,
            })
        }
    }

    #[test]
    fn test_clusterer_receives_prefix_selection() {
        let df = df![
            "Title" => ["a", "b", "c"],
            "loc_emb_0" => [0.5f32, -0.5, 0.1],
        ]
        .unwrap();

        let columns = feature_columns(&df, &["loc", "title"]);
        let assignment = SignClusterer.cluster(&df, &columns).unwrap();

        assert_eq!(assignment.labels, vec![1, 0, 1]);
        assert_eq!(assignment.labels.len(), df.height());
    }
}
