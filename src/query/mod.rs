//! Query evaluator: eager load of index summary artifacts, on-demand
//! streaming scan of the posting list, ranking, and positional search.

pub mod bm25;
pub mod positional;
pub mod tfidf;

use crate::artifacts::{self, DocsInfo};
use crate::error::QueryError;
use crate::posting::{self, Posting};
use crate::tokenizer::Tokenizer;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub use bm25::Bm25Params;
pub use tfidf::SmartNotation;

/// Which scoring model to use for a query.
#[derive(Debug, Clone, Copy)]
pub enum RankingModel {
    Bm25(Bm25Params),
    TfIdf(SmartNotation),
}

/// How to interpret the query terms beyond simple term matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    /// Rank by the configured scoring model only.
    Standard,
    /// Additionally require all query terms to appear as one coherent
    /// phrase in the document.
    Phrase,
    /// Additionally require all query terms to appear within
    /// `max_distance` token positions of each other.
    Proximity { max_distance: u32 },
}

/// A single scored and ranked result.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub pmid: i64,
    pub doc_id: u32,
    pub score: f32,
}

/// Holds the eagerly loaded summary artifacts for one built index, and
/// streams the posting list per query.
pub struct Evaluator {
    index_folder: PathBuf,
    docs_info: DocsInfo,
    docs_len: HashMap<u32, u32>,
    doc_mapping: HashMap<u32, i64>,
}

impl Evaluator {
    /// Load the summary artifacts for `index_folder`. Does not read
    /// `index.txt`/`term_frequencies.txt` yet; those are scanned per query.
    pub fn open(index_folder: &Path) -> Result<Self, QueryError> {
        let docs_info = artifacts::load_docs_info(&index_folder.join("docs_info.txt"))?;
        let docs_len = artifacts::load_docs_len(&index_folder.join("docs_len.txt"))?;
        let doc_mapping = artifacts::load_doc_mapping(&index_folder.join("doc_mapping.txt"))?;
        Ok(Self { index_folder: index_folder.to_path_buf(), docs_info, docs_len, doc_mapping })
    }

    /// Run one ranked query, returning up to `top_k` results ordered by
    /// descending score, ties broken by ascending `doc_id`.
    pub fn query(
        &self,
        tokenizer: &Tokenizer,
        query_text: &str,
        model: RankingModel,
        search_type: SearchType,
        top_k: usize,
    ) -> Result<Vec<RankedResult>, QueryError> {
        let query_terms = tokenizer.tokenize_query(query_text);
        let unique_terms: Vec<String> = {
            let mut seen = HashSet::new();
            query_terms.iter().filter(|t| seen.insert((*t).clone())).cloned().collect()
        };
        if unique_terms.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let gathered = self.gather_postings(&unique_terms)?;

        // Standard ranking scores the union of postings across query terms
        // (any term may contribute). Phrase/proximity narrow this to the
        // intersection first, per the candidate-set rule in §4.J, then
        // apply the positional predicate.
        let mut candidates: HashSet<u32> = HashSet::new();
        if search_type == SearchType::Standard {
            for postings in gathered.postings.values() {
                candidates.extend(postings.iter().map(|p| p.doc_id));
            }
        } else {
            let per_term_doc_ids: Option<Vec<HashSet<u32>>> = unique_terms
                .iter()
                .map(|term| {
                    gathered
                        .postings
                        .get(term)
                        .map(|list| list.iter().map(|p| p.doc_id).collect::<HashSet<u32>>())
                })
                .collect();
            // A term absent from the index entirely means no document can
            // contain every query term, so the intersection is empty.
            if let Some(mut sets) = per_term_doc_ids.map(|v| v.into_iter()) {
                if let Some(first) = sets.next() {
                    candidates = sets.fold(first, |acc, set| acc.intersection(&set).copied().collect());
                }
            }
            candidates.retain(|&doc_id| {
                positional::matches(&gathered.positions, &unique_terms, doc_id, search_type)
            });
        }

        let mut scored: Vec<RankedResult> = candidates
            .into_iter()
            .map(|doc_id| {
                let score = self.score(&query_terms, &unique_terms, &gathered, doc_id, model);
                RankedResult {
                    doc_id,
                    pmid: self.doc_mapping.get(&doc_id).copied().unwrap_or(-1),
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then(a.doc_id.cmp(&b.doc_id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    /// `query_terms` (with duplicates) drives TF-IDF, which weights a
    /// repeated query term by its query-side term frequency; `unique_terms`
    /// drives BM25, which scores each matching index term once regardless
    /// of how many times the query repeats it, matching boolean term-set
    /// membership rather than query-side term-frequency weighting.
    fn score(
        &self,
        query_terms: &[String],
        unique_terms: &[String],
        gathered: &GatheredPostings,
        doc_id: u32,
        model: RankingModel,
    ) -> f32 {
        let doc_len = self.docs_len.get(&doc_id).copied().unwrap_or(0) as f32;
        match model {
            RankingModel::Bm25(params) => bm25::score(
                unique_terms,
                doc_id,
                doc_len,
                self.docs_info.avgdl,
                self.docs_info.total_docs,
                &gathered.postings,
                &gathered.collection_frequency,
                params,
            ),
            RankingModel::TfIdf(notation) => tfidf::score(
                query_terms,
                doc_id,
                doc_len,
                self.docs_info.total_docs,
                &gathered.postings,
                &gathered.collection_frequency,
                notation,
            ),
        }
    }

    /// Scan `index.txt` and `term_frequencies.txt` once, collecting every
    /// posting list and collection frequency needed for `terms`, plus (when
    /// positional) every position list for `(term, doc_id)` pairs — so
    /// phrase/proximity search never rescans the index per candidate.
    fn gather_postings(&self, terms: &[String]) -> Result<GatheredPostings, QueryError> {
        let wanted: HashSet<&str> = terms.iter().map(String::as_str).collect();
        let index_path = self.index_folder.join("index.txt");
        let tf_path = self.index_folder.join("term_frequencies.txt");

        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let file = File::open(&index_path)
            .map_err(|source| QueryError::MissingArtifact { path: index_path.clone(), source })?;
        for line in BufReader::new(file).lines() {
            let line = line
                .map_err(|source| QueryError::MissingArtifact { path: index_path.clone(), source })?;
            let Some((term, parsed)) = posting::parse_line(&line) else { continue };
            if wanted.contains(term) {
                postings.insert(term.to_string(), parsed);
            }
            if postings.len() == wanted.len() {
                break;
            }
        }

        let mut collection_frequency: HashMap<String, u64> = HashMap::new();
        let tf_file = File::open(&tf_path)
            .map_err(|source| QueryError::MissingArtifact { path: tf_path.clone(), source })?;
        for line in BufReader::new(tf_file).lines() {
            let line =
                line.map_err(|source| QueryError::MissingArtifact { path: tf_path.clone(), source })?;
            let Some((term, cf_str)) = line.split_once(':') else { continue };
            if wanted.contains(term) {
                if let Ok(cf) = cf_str.parse() {
                    collection_frequency.insert(term.to_string(), cf);
                }
            }
            if collection_frequency.len() == wanted.len() {
                break;
            }
        }

        let mut positions: HashMap<(String, u32), Vec<u32>> = HashMap::new();
        for (term, list) in &postings {
            for p in list {
                if let Some(pos) = p.entry.positions() {
                    positions.insert((term.clone(), p.doc_id), pos.to_vec());
                }
            }
        }

        Ok(GatheredPostings { postings, collection_frequency, positions })
    }
}

struct GatheredPostings {
    postings: HashMap<String, Vec<Posting>>,
    collection_frequency: HashMap<String, u64>,
    positions: HashMap<(String, u32), Vec<u32>>,
}
