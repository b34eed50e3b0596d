//! NLP feature enrichment.
//!
//! Two vectorizer strategies turn a text column into a numeric block:
//!
//! - [`SentenceEmbedder`]: dense vectors from a pretrained model, columns
//!   named `<prefix>_emb_<i>`
//! - [`TfidfVectorizer`]: term weights fit over the whole column, columns
//!   named `<prefix>_tfidf_<term>`
//!
//! [`FeatureEnricher`] runs both over each configured text column and
//! appends the blocks. [`feature_columns`] selects them again by prefix.

pub mod embedding;
mod enricher;
mod stop_words;
pub mod tfidf;

#[cfg(feature = "fastembed")]
pub use embedding::FastEmbedder;
pub use embedding::SentenceEmbedder;
pub use enricher::{FeatureEnricher, FeatureEnricherBuilder};
pub use tfidf::{TfidfModel, TfidfVectorizer};

use polars::prelude::*;

/// Column-name tag of embedding blocks.
pub const EMBEDDING_TAG: &str = "emb";

/// Column-name tag of TF-IDF blocks.
pub const TFIDF_TAG: &str = "tfidf";

/// Names of the feature columns derived from the given text-column
/// prefixes, in table order.
///
/// This is the selection a clustering collaborator uses: `["loc", "title"]`
/// returns every `loc_emb_*`, `loc_tfidf_*`, `title_emb_*` and
/// `title_tfidf_*` column.
pub fn feature_columns(df: &DataFrame, prefixes: &[&str]) -> Vec<String> {
    let patterns: Vec<String> = prefixes
        .iter()
        .flat_map(|p| [format!("{}_{}_", p, EMBEDDING_TAG), format!("{}_{}_", p, TFIDF_TAG)])
        .collect();

    df.get_column_names()
        .into_iter()
        .filter(|name| patterns.iter().any(|p| name.starts_with(p.as_str())))
        .map(|name| name.to_string())
        .collect()
}
