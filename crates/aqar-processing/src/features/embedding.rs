//! Sentence embedding backends.
//!
//! The model is an explicit collaborator: load it once, wrap it in an
//! `Arc<dyn SentenceEmbedder>` and hand it to the
//! [`FeatureEnricher`](super::FeatureEnricher). It is never reloaded during
//! a run.

use crate::error::{PreprocessingError, Result};
use tracing::debug;

/// A pretrained model mapping text to fixed-length dense vectors.
///
/// Implementations must be deterministic for a given input and must return
/// one vector of length [`dimension`](Self::dimension) per input text, in
/// input order.
pub trait SentenceEmbedder: Send + Sync {
    /// Name of the underlying model, for logs and summaries.
    fn model_name(&self) -> &str;

    /// Length of every vector this model produces.
    fn dimension(&self) -> usize;

    /// Encode a batch of texts.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed `texts` in batches of `batch_size`, checking every vector's length.
///
/// `on_batch(done, total)` is called after each batch.
pub fn embed_in_batches<F>(
    embedder: &dyn SentenceEmbedder,
    texts: &[String],
    batch_size: usize,
    mut on_batch: F,
) -> Result<Vec<Vec<f32>>>
where
    F: FnMut(usize, usize),
{
    let batch_size = batch_size.max(1);
    let total = texts.len().div_ceil(batch_size);
    let dimension = embedder.dimension();
    let mut vectors = Vec::with_capacity(texts.len());

    for (i, batch) in texts.chunks(batch_size).enumerate() {
        let embedded = embedder.embed(batch)?;
        if embedded.len() != batch.len() {
            return Err(PreprocessingError::Embedding(format!(
                "{} returned {} vectors for {} texts",
                embedder.model_name(),
                embedded.len(),
                batch.len()
            )));
        }
        if let Some(bad) = embedded.iter().find(|v| v.len() != dimension) {
            return Err(PreprocessingError::Embedding(format!(
                "{} returned a {}-dimensional vector, expected {}",
                embedder.model_name(),
                bad.len(),
                dimension
            )));
        }
        vectors.extend(embedded);
        debug!("Embedded batch {}/{}", i + 1, total);
        on_batch(i + 1, total);
    }

    Ok(vectors)
}

#[cfg(feature = "fastembed")]
pub use fast::FastEmbedder;

#[cfg(feature = "fastembed")]
mod fast {
    use super::SentenceEmbedder;
    use crate::error::{PreprocessingError, Result};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use tracing::info;

    const MODEL_NAME: &str = "all-MiniLM-L6-v2";
    const DIMENSION: usize = 384;

    /// Local `all-MiniLM-L6-v2` embeddings through the ONNX runtime.
    ///
    /// The model is downloaded (or read from the cache directory) once in
    /// [`new`](Self::new).
    pub struct FastEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedder {
        /// Load the model, caching files under `cache_dir` when given.
        pub fn new(cache_dir: Option<PathBuf>) -> Result<Self> {
            let mut options =
                InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
            if let Some(dir) = cache_dir {
                options = options.with_cache_dir(dir);
            }

            info!("Loading embedding model {}...", MODEL_NAME);
            let model = TextEmbedding::try_new(options)
                .map_err(|e| PreprocessingError::Embedding(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(model),
            })
        }

        /// Load the model using `FASTEMBED_CACHE_DIR` if it is set.
        pub fn from_env() -> Result<Self> {
            Self::new(std::env::var_os("FASTEMBED_CACHE_DIR").map(PathBuf::from))
        }
    }

    impl SentenceEmbedder for FastEmbedder {
        fn model_name(&self) -> &str {
            MODEL_NAME
        }

        fn dimension(&self) -> usize {
            DIMENSION
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.model
                .lock()
                .embed(texts.to_vec(), None)
                .map_err(|e| PreprocessingError::Embedding(e.to_string()))
        }
    }

    static_assertions::assert_impl_all!(FastEmbedder: Send, Sync);
}
