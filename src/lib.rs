//! A SPIMI (Single-Pass In-Memory Indexing) inverted-index builder and
//! ranked retrieval engine.
//!
//! Two pipelines share one on-disk index format:
//!
//! - **Building** (`builder`, `block`, `merge`, `memory`, `corpus`,
//!   `tokenizer`): stream a line-delimited JSON corpus, tokenize, buffer
//!   postings in memory, flush sorted blocks under memory pressure, and
//!   k-way merge the blocks into a single global index plus a handful of
//!   small summary artifacts.
//! - **Querying** (`query`): load the summary artifacts, stream the global
//!   index once per query, score candidates with BM25 or SMART-notation
//!   TF-IDF, optionally filter by phrase or proximity, and return a
//!   top-k ranked list translated back to the corpus's external ids.
//!
//! `eval` computes retrieval-quality metrics over a gold-standard/run file
//! pair and is independent of both pipelines.

pub mod artifacts;
pub mod block;
pub mod builder;
pub mod corpus;
pub mod error;
pub mod eval;
pub mod memory;
pub mod merge;
pub mod posting;
pub mod query;
pub mod tokenizer;

/// Common imports for building and querying an index.
pub mod prelude {
    pub use crate::builder::{build, BuildConfig};
    pub use crate::error::{BuildError, QueryError};
    pub use crate::posting::IndexMode;
    pub use crate::query::{Bm25Params, Evaluator, RankedResult, RankingModel, SearchType, SmartNotation};
    pub use crate::tokenizer::{Tokenizer, TokenizerConfig};
}
