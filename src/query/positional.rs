//! Phrase and proximity predicates over per-term position lists.
//!
//! Both operate on the same gathered `(term, doc_id) -> positions` map the
//! evaluator builds in one pass over `index.txt`, rather than rescanning
//! the posting list once per candidate document.

use super::SearchType;
use std::collections::HashMap;

/// Does `doc_id` satisfy `search_type` for `query_terms`, given every
/// gathered `(term, doc_id) -> positions` pair needed for this query?
///
/// `SearchType::Standard` always matches (no positional constraint).
pub fn matches(
    positions: &HashMap<(String, u32), Vec<u32>>,
    query_terms: &[String],
    doc_id: u32,
    search_type: SearchType,
) -> bool {
    match search_type {
        SearchType::Standard => true,
        SearchType::Phrase => phrase_match(positions, query_terms, doc_id),
        SearchType::Proximity { max_distance } => {
            proximity_match(positions, query_terms, doc_id, max_distance)
        }
    }
}

/// A phrase match requires a single starting position `p` in the first
/// query term's position list such that `p+1, p+2, ..., p+n-1` all appear
/// in the following terms' lists, in order — not just independently
/// satisfied adjacent pairs.
fn phrase_match(
    positions: &HashMap<(String, u32), Vec<u32>>,
    query_terms: &[String],
    doc_id: u32,
) -> bool {
    let Some(first_term) = query_terms.first() else { return false };
    let Some(first_positions) = positions.get(&(first_term.clone(), doc_id)) else { return false };

    'start: for &start in first_positions {
        for (offset, term) in query_terms.iter().enumerate().skip(1) {
            let Some(term_positions) = positions.get(&(term.clone(), doc_id)) else { continue 'start };
            let expected = start + offset as u32;
            if !term_positions.contains(&expected) {
                continue 'start;
            }
        }
        return true;
    }
    false
}

/// A proximity match requires at least two *distinct* query terms to have
/// occurrences within `max_distance` of each other — not that every term
/// cluster around a common anchor.
fn proximity_match(
    positions: &HashMap<(String, u32), Vec<u32>>,
    query_terms: &[String],
    doc_id: u32,
    max_distance: u32,
) -> bool {
    for i in 0..query_terms.len() {
        let Some(positions_i) = positions.get(&(query_terms[i].clone(), doc_id)) else { continue };
        for term_j in &query_terms[i + 1..] {
            let Some(positions_j) = positions.get(&(term_j.clone(), doc_id)) else { continue };
            for &p in positions_i {
                if positions_j.iter().any(|&q| p.abs_diff(q) <= max_distance) {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions_map(entries: &[(&str, u32, &[u32])]) -> HashMap<(String, u32), Vec<u32>> {
        entries
            .iter()
            .map(|&(term, doc_id, positions)| ((term.to_string(), doc_id), positions.to_vec()))
            .collect()
    }

    #[test]
    fn phrase_requires_coherent_alignment_not_just_adjacency() {
        // "quick brown" where "quick" is at 0 and 5, "brown" only at 1.
        // Independently-satisfied adjacency would wrongly pass at (0,1)
        // since 1 == 0+1; this is in fact a true coherent match.
        let positions = positions_map(&[("quick", 0, &[0, 5]), ("brown", 0, &[1])]);
        let terms = vec!["quick".to_string(), "brown".to_string()];
        assert!(phrase_match(&positions, &terms, 0));
    }

    #[test]
    fn phrase_rejects_out_of_order_terms() {
        // "brown" appears before "quick"; no coherent forward alignment exists.
        let positions = positions_map(&[("quick", 0, &[5]), ("brown", 0, &[1])]);
        let terms = vec!["quick".to_string(), "brown".to_string()];
        assert!(!phrase_match(&positions, &terms, 0));
    }

    #[test]
    fn three_term_phrase_requires_all_positions_consecutive() {
        let positions =
            positions_map(&[("the", 0, &[0, 10]), ("quick", 0, &[1, 11]), ("fox", 0, &[2])]);
        let terms = vec!["the".to_string(), "quick".to_string(), "fox".to_string()];
        assert!(phrase_match(&positions, &terms, 0));
    }

    #[test]
    fn proximity_matches_within_max_distance() {
        let positions = positions_map(&[("cat", 0, &[0]), ("dog", 0, &[4])]);
        let terms = vec!["cat".to_string(), "dog".to_string()];
        assert!(proximity_match(&positions, &terms, 0, 4));
        assert!(!proximity_match(&positions, &terms, 0, 3));
    }

    #[test]
    fn proximity_needs_only_one_close_pair_not_all_terms() {
        // "fox" is far from both, but "quick" and "brown" are adjacent, so
        // the existential pair requirement is still satisfied.
        let positions = positions_map(&[("quick", 0, &[0]), ("brown", 0, &[1]), ("fox", 0, &[50])]);
        let terms = vec!["quick".to_string(), "brown".to_string(), "fox".to_string()];
        assert!(proximity_match(&positions, &terms, 0, 1));
    }

    #[test]
    fn proximity_zero_requires_exact_same_position() {
        let positions = positions_map(&[("cat", 0, &[2]), ("dog", 0, &[2])]);
        let terms = vec!["cat".to_string(), "dog".to_string()];
        assert!(proximity_match(&positions, &terms, 0, 0));
    }
}
