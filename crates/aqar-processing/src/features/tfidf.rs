//! TF-IDF vectorization of a text column.
//!
//! Weights follow scikit-learn's `TfidfVectorizer` defaults: lowercase
//! tokens of two or more word characters, English stop words removed,
//! raw term counts, smoothed idf `ln((1 + n) / (1 + df)) + 1`, and L2
//! normalization per row.

use super::stop_words::is_stop_word;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Vocabulary cap used outside of enrichment.
pub const DEFAULT_MAX_FEATURES: usize = 50;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("Invalid regex: token pattern"));

/// Unfitted TF-IDF vectorizer. Fitting produces an immutable [`TfidfModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TfidfVectorizer {
    max_features: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Fit the vocabulary and idf weights over a whole column.
    ///
    /// The vocabulary keeps the `max_features` terms with the highest total
    /// count across all documents, ties broken alphabetically, and is then
    /// ordered alphabetically.
    pub fn fit<S: AsRef<str>>(&self, documents: &[S]) -> TfidfModel {
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            let unique: HashSet<&String> = tokens.iter().collect();
            for token in unique {
                *document_frequency.entry(token.clone()).or_insert(0) += 1;
            }
            for token in tokens {
                *term_counts.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|(a_term, a_count), (b_term, b_count)| {
            b_count.cmp(a_count).then_with(|| a_term.cmp(b_term))
        });
        ranked.truncate(self.max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort();

        let n = documents.len() as f64;
        let idf = vocabulary
            .iter()
            .map(|term| {
                let df = document_frequency.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        TfidfModel {
            vocabulary,
            index,
            idf,
        }
    }

    /// Fit over `documents` and transform the same documents.
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> (TfidfModel, Vec<Vec<f64>>) {
        let model = self.fit(documents);
        let rows = model.transform(documents);
        (model, rows)
    }
}

/// Fitted vocabulary and idf weights. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfModel {
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfModel {
    /// Vocabulary terms in column order (alphabetical).
    pub fn feature_names(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Dense weight row for one document.
    pub fn transform_one(&self, document: &str) -> Vec<f64> {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(document) {
            if let Some(&idx) = self.index.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut row = vec![0.0; self.dimension()];
        for (idx, count) in counts {
            row[idx] = count * self.idf[idx];
        }

        let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            row.iter_mut().for_each(|w| *w /= norm);
        }
        row
    }

    /// Dense weight rows, one per document, in input order.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Vec<Vec<f64>> {
        documents
            .iter()
            .map(|doc| self.transform_one(doc.as_ref()))
            .collect()
    }
}

/// Lowercased word tokens with stop words removed.
fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}
