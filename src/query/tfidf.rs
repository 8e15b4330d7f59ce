//! SMART-notation vector-space TF-IDF scoring.
//!
//! Two schemes are supported, `lnc.ltc` and `bnn.bnc` (document-side.query-side,
//! each a `term-freq.doc-freq.normalization` triplet):
//!
//! - `lnc.ltc`: document weight `1 + ln(tf)`, no IDF, cosine-normalized;
//!   query weight `(1 + ln(tf)) * idf`, cosine-normalized.
//! - `bnn.bnc`: document weight `1` if the term occurs else `0`, no IDF, no
//!   normalization; query weight binary, no IDF, cosine-normalized.
//!
//! Two deliberate divergences from the textbook formulas are reproduced
//! here rather than "corrected": IDF uses collection frequency (`Σtf`
//! across the corpus) in place of document frequency, and the "cosine"
//! normalization step divides by `√|d|` (or `√|q|`) rather than the true
//! Euclidean norm of the weight vector.

use crate::error::QueryError;
use crate::posting::Posting;
use std::collections::HashMap;

/// Which SMART weighting scheme to score with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartNotation {
    LncLtc,
    BnnBnc,
}

impl std::str::FromStr for SmartNotation {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lnc.ltc" => Ok(SmartNotation::LncLtc),
            "bnn.bnc" => Ok(SmartNotation::BnnBnc),
            other => Err(QueryError::UnknownSmartNotation(other.to_string())),
        }
    }
}

/// Parse a SMART notation string under the "unknown SMART notation" query-time
/// policy: log a warning and return `None` instead of surfacing a hard
/// error, so the caller can fall back to an empty result rather than abort.
pub fn parse_or_warn(raw: &str) -> Option<SmartNotation> {
    match raw.parse::<SmartNotation>() {
        Ok(notation) => Some(notation),
        Err(err) => {
            tracing::warn!(%err, "unknown SMART notation");
            None
        }
    }
}

fn idf(total_docs: u32, collection_frequency: u64) -> f32 {
    if collection_frequency == 0 {
        return 0.0;
    }
    (total_docs as f32 / collection_frequency as f32).ln()
}

/// Score `doc_id` against `query_terms` under `notation`.
pub fn score(
    query_terms: &[String],
    doc_id: u32,
    doc_len: f32,
    total_docs: u32,
    postings: &HashMap<String, Vec<Posting>>,
    collection_frequency: &HashMap<String, u64>,
    notation: SmartNotation,
) -> f32 {
    let mut query_tf: HashMap<&str, u32> = HashMap::new();
    for term in query_terms {
        *query_tf.entry(term.as_str()).or_insert(0) += 1;
    }

    let doc_norm = if doc_len > 0.0 { doc_len.sqrt() } else { 1.0 };

    // `bnn.bnc`'s query norm is `√|unique terms in query|`; `lnc.ltc`'s is
    // `√Σ w_q(t)²`, the Euclidean norm of the (unnormalized) per-unique-term
    // query weight vector. Both are query-only: independent of which
    // documents the query is scored against.
    let query_norm = match notation {
        SmartNotation::BnnBnc => {
            let unique = query_tf.len() as f32;
            if unique > 0.0 { unique.sqrt() } else { 1.0 }
        }
        SmartNotation::LncLtc => {
            let sum_of_squares: f32 = query_tf
                .iter()
                .map(|(term, &qtf)| {
                    let cf = collection_frequency.get(*term).copied().unwrap_or(0);
                    let weight = (if qtf > 0 { 1.0 + (qtf as f32).ln() } else { 0.0 }) * idf(total_docs, cf);
                    weight * weight
                })
                .sum();
            if sum_of_squares > 0.0 { sum_of_squares.sqrt() } else { 1.0 }
        }
    };

    let mut total = 0.0;
    for (term, &qtf) in &query_tf {
        let Some(list) = postings.get(*term) else { continue };
        let Some(posting) = list.iter().find(|p| p.doc_id == doc_id) else { continue };
        let tf = posting.entry.term_frequency();
        let cf = collection_frequency.get(*term).copied().unwrap_or(0);

        let (doc_weight, query_weight) = match notation {
            SmartNotation::LncLtc => {
                let doc_weight = if tf > 0 { 1.0 + (tf as f32).ln() } else { 0.0 } / doc_norm;
                let query_tf_weight = if qtf > 0 { 1.0 + (qtf as f32).ln() } else { 0.0 };
                let query_weight = query_tf_weight * idf(total_docs, cf) / query_norm;
                (doc_weight, query_weight)
            }
            SmartNotation::BnnBnc => {
                let doc_weight = if tf > 0 { 1.0 } else { 0.0 };
                let query_weight = if qtf > 0 { 1.0 } else { 0.0 } / query_norm;
                (doc_weight, query_weight)
            }
        };

        total += doc_weight * query_weight;
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
    fn lnc_ltc_query_norm_is_non_negative() {
        let mut postings = HashMap::new();
        postings.insert("fox".to_string(), list(&[(0, 3)]));
        let mut cf = HashMap::new();
        cf.insert("fox".to_string(), 5u64);
        let terms = vec!["fox".to_string()];
        let result = score(&terms, 0, 4.0, 10, &postings, &cf, SmartNotation::LncLtc);
        assert!(result >= 0.0);
    }

    #[test]
    fn bnn_bnc_ignores_term_frequency_magnitude() {
        let mut postings = HashMap::new();
        postings.insert("fox".to_string(), list(&[(0, 1), (1, 50)]));
        let cf = HashMap::new();
        let terms = vec!["fox".to_string()];
        let low = score(&terms, 0, 1.0, 2, &postings, &cf, SmartNotation::BnnBnc);
        let high = score(&terms, 1, 1.0, 2, &postings, &cf, SmartNotation::BnnBnc);
        assert_eq!(low, high);
    }

    #[test]
    fn lnc_ltc_query_norm_is_sum_of_squared_query_weights_not_raw_token_count() {
        let mut postings = HashMap::new();
        postings.insert("fox".to_string(), list(&[(0, 3)]));
        postings.insert("wolf".to_string(), list(&[(1, 5)]));
        let mut cf = HashMap::new();
        cf.insert("fox".to_string(), 4u64);
        cf.insert("wolf".to_string(), 2u64);
        // "fox" repeated: if query_norm used raw token count (3 tokens) it
        // would be sqrt(3); the correct norm is over the two *unique* terms'
        // weights instead.
        let terms = vec!["fox".to_string(), "fox".to_string(), "wolf".to_string()];

        let total_docs = 10;
        let doc_len = 9.0;
        let result = score(&terms, 0, doc_len, total_docs, &postings, &cf, SmartNotation::LncLtc);

        let idf_fox = (total_docs as f32 / 4.0).ln();
        let idf_wolf = (total_docs as f32 / 2.0).ln();
        let w_fox = (1.0 + 2.0_f32.ln()) * idf_fox;
        let w_wolf = (1.0 + 1.0_f32.ln()) * idf_wolf;
        let query_norm = (w_fox * w_fox + w_wolf * w_wolf).sqrt();
        let doc_norm = doc_len.sqrt();
        let doc_weight_fox = (1.0 + 3.0_f32.ln()) / doc_norm;
        // doc 0 has no "wolf" posting, so only "fox" contributes to the dot
        // product even though "wolf" still contributed to query_norm above.
        let expected = doc_weight_fox * (w_fox / query_norm);

        assert!((result - expected).abs() < 1e-5, "{result} vs {expected}");
    }

    #[test]
    fn bnn_bnc_query_norm_uses_unique_term_count_not_raw_token_count() {
        let mut postings = HashMap::new();
        postings.insert("fox".to_string(), list(&[(0, 1)]));
        let cf = HashMap::new();
        let terms = vec!["fox".to_string(), "fox".to_string()];
        let result = score(&terms, 0, 1.0, 5, &postings, &cf, SmartNotation::BnnBnc);
        // One unique term, so query_norm = sqrt(1) = 1, not sqrt(2).
        let expected = 1.0;
        assert!((result - expected).abs() < 1e-6, "{result} vs {expected}");
    }

    #[test]
    fn from_str_rejects_unknown_notation() {
        assert!("jaccard".parse::<SmartNotation>().is_err());
    }

    #[test]
    fn parse_or_warn_falls_back_to_none_on_unrecognized_notation() {
        assert_eq!(parse_or_warn("lnc.ltc"), Some(SmartNotation::LncLtc));
        assert_eq!(parse_or_warn("jaccard"), None);
    }
}
