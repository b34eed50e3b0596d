//! Appends text feature blocks to a cleaned listing table.

use super::embedding::{SentenceEmbedder, embed_in_batches};
use super::tfidf::TfidfVectorizer;
use super::{EMBEDDING_TAG, TFIDF_TAG};
use crate::config::{ConfigValidationError, EnrichConfig, TextColumn};
use crate::error::{PreprocessingError, Result};
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::utils::as_string_series;
use polars::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A named group of feature columns produced by one vectorization pass.
struct FeatureBlock {
    name: String,
    columns: Vec<Column>,
}

/// Runs both vectorizer strategies over the configured text columns and
/// appends the results to the table.
///
/// Output column order: the original columns unchanged, then one embedding
/// block per text column, then one TF-IDF block per text column, text
/// columns in configured order (Location before Title by default).
///
/// # Example
///
/// ```rust,ignore
/// use aqar_processing::features::{FastEmbedder, FeatureEnricher};
/// use std::sync::Arc;
///
/// let enricher = FeatureEnricher::builder(Arc::new(FastEmbedder::from_env()?)).build()?;
/// let enriched = enricher.enrich(&output.data)?;
/// ```
pub struct FeatureEnricher {
    embedder: Arc<dyn SentenceEmbedder>,
    config: EnrichConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(FeatureEnricher: Send, Sync);

impl FeatureEnricher {
    pub fn builder(embedder: Arc<dyn SentenceEmbedder>) -> FeatureEnricherBuilder {
        FeatureEnricherBuilder {
            embedder,
            config: None,
            progress_reporter: None,
        }
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// Return `df` widened with the text feature blocks.
    ///
    /// Row count and row order are preserved. Every vectorizer is fit once
    /// over its whole column.
    ///
    /// # Errors
    ///
    /// [`SchemaMismatch`](PreprocessingError::SchemaMismatch) when a text
    /// column is absent, [`RowMisalignment`](PreprocessingError::RowMisalignment)
    /// when a block does not line up with the table, and
    /// [`Embedding`](PreprocessingError::Embedding) when the model fails.
    pub fn enrich(&self, df: &DataFrame) -> Result<DataFrame> {
        let missing: Vec<String> = self
            .config
            .text_columns
            .iter()
            .filter(|tc| df.column(&tc.column).is_err())
            .map(|tc| tc.column.clone())
            .collect();
        if !missing.is_empty() {
            return Err(PreprocessingError::SchemaMismatch { missing });
        }

        let height = df.height();
        info!(
            "Enriching {} rows from {:?} with {}",
            height,
            self.config.text_columns.iter().map(|tc| &tc.column).collect::<Vec<_>>(),
            self.embedder.model_name()
        );

        let sources: Vec<(&TextColumn, Vec<String>)> = self
            .config
            .text_columns
            .iter()
            .map(|tc| Ok((tc, column_texts(df, &tc.column)?)))
            .collect::<Result<_>>()?;

        let total_passes = sources.len() * 2;
        let mut blocks = Vec::with_capacity(total_passes);

        for (tc, texts) in &sources {
            self.report_pass(blocks.len(), total_passes, format!("Embedding {}", tc.column));
            blocks.push(self.embedding_block(tc, texts)?);
        }
        for (tc, texts) in &sources {
            self.report_pass(blocks.len(), total_passes, format!("TF-IDF for {}", tc.column));
            blocks.push(self.tfidf_block(tc, texts));
        }

        let mut enriched = df.clone();
        for block in blocks {
            if let Some(bad) = block.columns.iter().find(|c| c.len() != height) {
                return Err(PreprocessingError::RowMisalignment {
                    block: block.name,
                    expected: height,
                    actual: bad.len(),
                });
            }
            debug!("Appending '{}' ({} columns)", block.name, block.columns.len());
            enriched.hstack_mut(&block.columns)?;
        }

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Enrichment,
            1.0,
            format!("Added {} feature columns", enriched.width() - df.width()),
        ));
        info!(
            "Enrichment complete: {} -> {} columns",
            df.width(),
            enriched.width()
        );
        Ok(enriched)
    }

    fn embedding_block(&self, tc: &TextColumn, texts: &[String]) -> Result<FeatureBlock> {
        let vectors = embed_in_batches(
            self.embedder.as_ref(),
            texts,
            self.config.embedding_batch_size,
            |done, total| {
                self.report_progress(ProgressUpdate::with_items(
                    PipelineStage::Enrichment,
                    format!("Batch {}/{}", done, total),
                    done,
                    total,
                    format!("Embedding {}", tc.column),
                ))
            },
        )?;

        let names = (0..self.embedder.dimension())
            .map(|i| format!("{}_{}_{}", tc.prefix, EMBEDDING_TAG, i))
            .collect();
        Ok(FeatureBlock {
            name: format!("{}_{}", tc.prefix, EMBEDDING_TAG),
            columns: matrix_columns(names, &vectors),
        })
    }

    fn tfidf_block(&self, tc: &TextColumn, texts: &[String]) -> FeatureBlock {
        let (model, rows) = TfidfVectorizer::new(self.config.tfidf_max_features).fit_transform(texts);
        if model.dimension() == 0 {
            warn!("'{}' has no TF-IDF vocabulary; block is empty", tc.column);
        }

        let names = model
            .feature_names()
            .iter()
            .map(|term| format!("{}_{}_{}", tc.prefix, TFIDF_TAG, term))
            .collect();
        FeatureBlock {
            name: format!("{}_{}", tc.prefix, TFIDF_TAG),
            columns: matrix_columns(names, &rows),
        }
    }

    fn report_pass(&self, done: usize, total: usize, message: String) {
        self.report_progress(ProgressUpdate::with_items(
            PipelineStage::Enrichment,
            format!("Pass {}/{}", done + 1, total),
            done,
            total,
            message,
        ));
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }
}

/// Builder for [`FeatureEnricher`].
pub struct FeatureEnricherBuilder {
    embedder: Arc<dyn SentenceEmbedder>,
    config: Option<EnrichConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl FeatureEnricherBuilder {
    pub fn config(mut self, config: EnrichConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    pub fn build(self) -> std::result::Result<FeatureEnricher, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(FeatureEnricher {
            embedder: self.embedder,
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

/// Text values of a column in row order; nulls become empty strings.
fn column_texts(df: &DataFrame, col_name: &str) -> Result<Vec<String>> {
    let series = as_string_series(df.column(col_name)?.as_materialized_series())?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Turn row-major vectors into one column per dimension.
fn matrix_columns<T>(names: Vec<String>, rows: &[Vec<T>]) -> Vec<Column>
where
    T: Copy,
    Series: NamedFrom<Vec<T>, [T]>,
{
    names
        .into_iter()
        .enumerate()
        .map(|(j, name)| {
            let values: Vec<T> = rows.iter().map(|row| row[j]).collect();
            Column::from(Series::new(name.into(), values))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::embedding::tests::CharStatsEmbedder;
    use crate::schema::{LOCATION, PRICE, TITLE};
    use crate::utils::column_names;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn cleaned() -> DataFrame {
        df![
            TITLE => ["Villa for sale", "Flat in Maadi", "Maadi flat"],
            PRICE => [3.0e6, 1.0e6, 1.2e6],
            LOCATION => [Some("New Cairo"), Some("Maadi"), None],
        ]
        .unwrap()
    }

    fn enricher() -> FeatureEnricher {
        FeatureEnricher::builder(Arc::new(CharStatsEmbedder))
            .build()
            .unwrap()
    }

    #[test]
    fn test_enrich_preserves_rows_and_original_columns() {
        let df = cleaned();
        let enriched = enricher().enrich(&df).unwrap();

        assert_eq!(enriched.height(), df.height());
        let names = column_names(&enriched);
        assert_eq!(&names[..3], &[TITLE, PRICE, LOCATION]);
        for name in column_names(&df) {
            let before = df.column(&name).unwrap().as_materialized_series();
            let after = enriched.column(&name).unwrap().as_materialized_series();
            assert!(after.equals_missing(before), "{}", name);
        }
    }

    #[test]
    fn test_enrich_column_order() {
        let enriched = enricher().enrich(&cleaned()).unwrap();
        let names = column_names(&enriched);

        assert_eq!(
            &names[3..9],
            &[
                "loc_emb_0",
                "loc_emb_1",
                "loc_emb_2",
                "title_emb_0",
                "title_emb_1",
                "title_emb_2"
            ]
        );
        assert_eq!(
            &names[9..],
            &[
                "loc_tfidf_cairo",
                "loc_tfidf_maadi",
                "loc_tfidf_new",
                "title_tfidf_flat",
                "title_tfidf_maadi",
                "title_tfidf_sale",
                "title_tfidf_villa",
            ]
        );
    }

    #[test]
    fn test_enrich_rows_stay_aligned() {
        let enriched = enricher().enrich(&cleaned()).unwrap();

        // first embedding dimension is the text length
        let loc_len = enriched.column("loc_emb_0").unwrap().f32().unwrap();
        assert_eq!(loc_len.get(0), Some(9.0));
        assert_eq!(loc_len.get(1), Some(5.0));
        // null location embedded as empty text
        assert_eq!(loc_len.get(2), Some(0.0));

        let villa = enriched.column("title_tfidf_villa").unwrap().f64().unwrap();
        assert!(villa.get(0).unwrap() > 0.0);
        assert_eq!(villa.get(1), Some(0.0));
    }

    #[test]
    fn test_enrich_respects_max_features() {
        let config = EnrichConfig::builder().tfidf_max_features(1).build().unwrap();
        let enriched = FeatureEnricher::builder(Arc::new(CharStatsEmbedder))
            .config(config)
            .build()
            .unwrap()
            .enrich(&cleaned())
            .unwrap();

        let tfidf: Vec<String> = column_names(&enriched)
            .into_iter()
            .filter(|n| n.contains("_tfidf_"))
            .collect();
        assert_eq!(tfidf, vec!["loc_tfidf_cairo", "title_tfidf_flat"]);
    }

    #[test]
    fn test_enrich_missing_text_column() {
        let df = df![TITLE => ["Flat"]].unwrap();
        match enricher().enrich(&df) {
            Err(PreprocessingError::SchemaMismatch { missing }) => {
                assert_eq!(missing, vec![LOCATION.to_string()])
            }
            other => panic!("expected SchemaMismatch, got {:?}", other.map(|d| d.shape())),
        }
    }

    #[test]
    fn test_enrich_stop_word_column_adds_no_tfidf() {
        let df = df![TITLE => ["the", "a"], LOCATION => ["Maadi", "Maadi"]].unwrap();
        let enriched = enricher().enrich(&df).unwrap();

        assert!(
            column_names(&enriched)
                .iter()
                .all(|n| !n.starts_with("title_tfidf_"))
        );
        assert_eq!(enriched.height(), 2);
    }

    #[test]
    fn test_enrich_empty_table() {
        let df = df![TITLE => Vec::<String>::new(), LOCATION => Vec::<String>::new()].unwrap();
        let enriched = enricher().enrich(&df).unwrap();
        assert_eq!(enriched.height(), 0);
        assert!(enriched.column("title_emb_0").is_ok());
    }

    #[test]
    fn test_enrich_is_deterministic() {
        let first = enricher().enrich(&cleaned()).unwrap();
        let second = enricher().enrich(&cleaned()).unwrap();
        assert!(first.equals_missing(&second));
    }

    #[test]
    fn test_enrich_reports_progress() {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let updates_clone = updates.clone();

        FeatureEnricher::builder(Arc::new(CharStatsEmbedder))
            .on_progress(move |update| updates_clone.lock().unwrap().push(update))
            .build()
            .unwrap()
            .enrich(&cleaned())
            .unwrap();

        let updates = updates.lock().unwrap();
        assert!(updates.iter().all(|u| u.stage == PipelineStage::Enrichment));
        assert_eq!(updates.last().unwrap().stage_progress, 1.0);
    }
}
