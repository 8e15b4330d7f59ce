//! Okapi BM25 scoring.
//!
//! ```text
//! BM25(q, d) = Σ IDF(t) * (tf(t,d) * (k1 + 1)) / (tf(t,d) + k1 * (1 - b + b * |d|/avgdl))
//! IDF(t)     = ln((N - df(t) + 0.5) / (df(t) + 0.5) + 1)
//! ```

use crate::posting::Posting;
use std::collections::HashMap;

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// Term-frequency saturation parameter.
    pub k1: f32,
    /// Length-normalization parameter.
    pub b: f32,
}

impl Default for Bm25Params {
    /// `k1 = 1.2`, `b = 0.75`, the original CLI's searcher-side default.
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Bm25Params {
    /// Override `b` while keeping the default `k1`, for reproducing the
    /// original CLI's other two disagreeing `b` defaults (`0.6`, `0.7`).
    pub fn with_b(b: f32) -> Self {
        Self { b, ..Self::default() }
    }
}

fn idf(total_docs: u32, df: u32) -> f32 {
    let n = total_docs as f32;
    let df = df as f32;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Score `doc_id` against `query_terms`, looking up each term's posting
/// list in `postings` (already gathered for this query).
pub fn score(
    query_terms: &[String],
    doc_id: u32,
    doc_len: f32,
    avgdl: f32,
    total_docs: u32,
    postings: &HashMap<String, Vec<Posting>>,
    _collection_frequency: &HashMap<String, u64>,
    params: Bm25Params,
) -> f32 {
    let length_ratio = if avgdl > 0.0 { doc_len / avgdl } else { 0.0 };
    let mut total = 0.0;
    for term in query_terms {
        let Some(list) = postings.get(term) else { continue };
        let Some(posting) = list.iter().find(|p| p.doc_id == doc_id) else { continue };
        let tf = posting.entry.term_frequency() as f32;
        let df = list.len() as u32;
        let numerator = tf * (params.k1 + 1.0);
        let denominator = tf + params.k1 * (1.0 - params.b + params.b * length_ratio);
        total += idf(total_docs, df) * numerator / denominator;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posting::PostingEntry;

    fn list(entries: &[(u32, u32)]) -> Vec<Posting> {
        entries
            .iter()
            .map(|&(doc_id, tf)| Posting { doc_id, entry: PostingEntry::Frequency(tf) })
            .collect()
    }

    #[test]
    fn higher_term_frequency_scores_higher_holding_other_params_fixed() {
        let mut postings = HashMap::new();
        postings.insert("fox".to_string(), list(&[(0, 1), (1, 5)]));
        let cf = HashMap::new();
        let terms = vec!["fox".to_string()];
        let low = score(&terms, 0, 10.0, 10.0, 10, &postings, &cf, Bm25Params::default());
        let high = score(&terms, 1, 10.0, 10.0, 10, &postings, &cf, Bm25Params::default());
        assert!(high > low);
    }

    #[test]
    fn missing_term_contributes_zero() {
        let postings = HashMap::new();
        let cf = HashMap::new();
        let terms = vec!["absent".to_string()];
        let result = score(&terms, 0, 5.0, 5.0, 10, &postings, &cf, Bm25Params::default());
        assert_eq!(result, 0.0);
    }

    #[test]
    fn empty_avgdl_does_not_divide_by_zero() {
        let mut postings = HashMap::new();
        postings.insert("fox".to_string(), list(&[(0, 1)]));
        let cf = HashMap::new();
        let terms = vec!["fox".to_string()];
        let result = score(&terms, 0, 0.0, 0.0, 1, &postings, &cf, Bm25Params::default());
        assert!(result.is_finite());
    }
}
