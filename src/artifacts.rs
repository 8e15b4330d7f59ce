//! Small index-summary artifacts: `docs_len.txt`, `docs_info.txt`,
//! `doc_mapping.txt`, and the advisory `index_stats.txt`.
//!
//! `index.txt` and `term_frequencies.txt` are handled by
//! [`crate::merge`], since they are produced and consumed as streams
//! rather than eagerly loaded structures.

use crate::error::QueryError;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Append one `<doc_id>:<length>` line. Called once per document during
/// indexing, in insertion order.
pub fn append_doc_length(
    writer: &mut impl Write,
    doc_id: u32,
    length: u32,
) -> std::io::Result<()> {
    writeln!(writer, "{doc_id}:{length}")
}

/// Write `docs_info.txt`: `total_docs:<N>` then `avgdl:<floor(ΣL/N)>`.
///
/// An empty corpus writes `avgdl:0` by convention (division by zero is
/// avoided rather than propagated).
pub fn write_docs_info(path: &Path, total_docs: u32, total_length: u64) -> std::io::Result<()> {
    let avgdl = if total_docs == 0 { 0 } else { total_length / total_docs as u64 };
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "total_docs:{total_docs}")?;
    writeln!(writer, "avgdl:{avgdl}")?;
    writer.flush()
}

/// Write `doc_mapping.txt`: `<pmid>:<doc_id>` per document, insertion order.
pub fn write_doc_mapping(path: &Path, mapping: &[(i64, u32)]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (pmid, doc_id) in mapping {
        writeln!(writer, "{pmid}:{doc_id}")?;
    }
    writer.flush()
}

/// Global statistics loaded eagerly by the query evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocsInfo {
    pub total_docs: u32,
    pub avgdl: f32,
}

pub fn load_docs_info(path: &Path) -> Result<DocsInfo, QueryError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| QueryError::MissingArtifact { path: path.to_path_buf(), source })?;
    let mut lines = content.lines();
    let total_docs = parse_kv_line(path, lines.next(), "total_docs")?;
    let avgdl = parse_kv_line(path, lines.next(), "avgdl")?;
    Ok(DocsInfo { total_docs, avgdl })
}

fn parse_kv_line<T: std::str::FromStr>(
    path: &Path,
    line: Option<&str>,
    expected_key: &str,
) -> Result<T, QueryError> {
    let line = line.ok_or_else(|| QueryError::MalformedArtifact {
        path: path.to_path_buf(),
        reason: format!("missing {expected_key} line"),
    })?;
    let (key, value) = line.split_once(':').ok_or_else(|| QueryError::MalformedArtifact {
        path: path.to_path_buf(),
        reason: format!("line {line:?} has no ':'"),
    })?;
    if key != expected_key {
        return Err(QueryError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: format!("expected key {expected_key}, found {key}"),
        });
    }
    value.parse().map_err(|_| QueryError::MalformedArtifact {
        path: path.to_path_buf(),
        reason: format!("could not parse value {value:?} for {expected_key}"),
    })
}

/// `doc_id -> length` loaded eagerly by the query evaluator.
pub fn load_docs_len(path: &Path) -> Result<HashMap<u32, u32>, QueryError> {
    let file = File::open(path)
        .map_err(|source| QueryError::MissingArtifact { path: path.to_path_buf(), source })?;
    let mut lengths = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| QueryError::MissingArtifact {
            path: path.to_path_buf(),
            source,
        })?;
        let (doc_id, length) = line.split_once(':').ok_or_else(|| QueryError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: format!("line {line:?} has no ':'"),
        })?;
        let doc_id: u32 = doc_id.parse().map_err(|_| QueryError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: format!("bad doc_id {doc_id:?}"),
        })?;
        let length: u32 = length.parse().map_err(|_| QueryError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: format!("bad length {length:?}"),
        })?;
        lengths.insert(doc_id, length);
    }
    Ok(lengths)
}

/// `doc_id -> pmid` loaded eagerly by the query evaluator (bijective with
/// the build-time `pmid -> doc_id` mapping).
pub fn load_doc_mapping(path: &Path) -> Result<HashMap<u32, i64>, QueryError> {
    let file = File::open(path)
        .map_err(|source| QueryError::MissingArtifact { path: path.to_path_buf(), source })?;
    let mut mapping = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| QueryError::MissingArtifact {
            path: path.to_path_buf(),
            source,
        })?;
        let (pmid, doc_id) = line.split_once(':').ok_or_else(|| QueryError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: format!("line {line:?} has no ':'"),
        })?;
        let pmid: i64 = pmid.parse().map_err(|_| QueryError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: format!("bad pmid {pmid:?}"),
        })?;
        let doc_id: u32 = doc_id.parse().map_err(|_| QueryError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: format!("bad doc_id {doc_id:?}"),
        })?;
        mapping.insert(doc_id, pmid);
    }
    Ok(mapping)
}

/// Free-form human-readable build statistics (advisory; not consumed by
/// the query evaluator).
pub struct IndexStats {
    pub index_size_bytes: u64,
    pub indexing_seconds: f64,
    pub num_blocks: u32,
    pub merge_seconds: f64,
    pub total_seconds: f64,
}

pub fn write_index_stats(path: &Path, stats: &IndexStats) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "INDEX STATISTICS")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "Total index size on disk: {:.2} MB",
        stats.index_size_bytes as f64 / 1024.0 / 1024.0
    )?;
    writeln!(writer, "Total indexing time: {:.3} s", stats.indexing_seconds)?;
    writeln!(writer, "Number of blocks written before merging: {}", stats.num_blocks)?;
    writeln!(writer, "Merging time (last SPIMI step): {:.3} s", stats.merge_seconds)?;
    writeln!(writer, "Total time: {:.3} s", stats.total_seconds)?;
    writer.flush()
}
