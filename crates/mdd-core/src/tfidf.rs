//! Sparse TF-IDF vectors and pairwise cosine similarity over turn texts.
//!
//! Weighting follows the usual smoothed scheme: `idf = ln((1 + n) / (1 + df)) + 1`,
//! raw term counts as tf, and each document vector L2-normalised, so cosine
//! similarity is a plain dot product.

use std::collections::{BTreeMap, HashMap};

use crate::text::content_terms;

/// Sparse, L2-normalised document vector sorted by term index.
pub type SparseVector = Vec<(usize, f64)>;

#[derive(Debug, Clone)]
pub struct TfIdfMatrix {
    vocabulary: Vec<String>,
    rows: Vec<SparseVector>,
}

impl TfIdfMatrix {
    /// Fits the vocabulary on `documents` and weights each of them.
    ///
    /// Only the `max_features` terms with the highest corpus frequency are
    /// kept; ties keep alphabetical order.
    pub fn fit(documents: &[&str], max_features: usize) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|doc| content_terms(doc)).collect();

        let mut corpus_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for terms in &tokenized {
            for term in terms {
                *corpus_counts.entry(term.as_str()).or_default() += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = corpus_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term.to_string()).collect();
        vocabulary.sort();
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.as_str(), idx))
            .collect();

        let counts: Vec<BTreeMap<usize, f64>> = tokenized
            .iter()
            .map(|terms| {
                let mut tf = BTreeMap::new();
                for term in terms {
                    if let Some(&idx) = index.get(term.as_str()) {
                        *tf.entry(idx).or_insert(0.0) += 1.0;
                    }
                }
                tf
            })
            .collect();

        let mut document_frequency = vec![0usize; vocabulary.len()];
        for tf in &counts {
            for &idx in tf.keys() {
                document_frequency[idx] += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|tf| {
                let mut row: SparseVector =
                    tf.into_iter().map(|(idx, count)| (idx, count * idf[idx])).collect();
                let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, weight) in &mut row {
                        *weight /= norm;
                    }
                }
                row
            })
            .collect();

        Self { vocabulary, rows }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    /// Cosine similarity of every unordered pair `(i, j)` with `i < j`, row-major.
    pub fn upper_triangle_similarities(&self) -> Vec<f64> {
        let n = self.rows.len();
        let mut values = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                values.push(sparse_dot(&self.rows[i], &self.rows[j]));
            }
        }
        values
    }
}

/// Dot product of two index-sorted sparse vectors. Empty vectors give 0.
pub fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Median of `values`; 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
