//! The in-memory posting buffer for the current SPIMI block, and the
//! on-disk block format it is flushed to.
//!
//! Block lines: `<term>;<posting>(;<posting>)*`, UTF-8, LF-terminated,
//! sorted ascending by term. Positional postings are `<doc_id>:<pos>,...`;
//! frequency postings are `<doc_id>,<tf>`.

use crate::error::BuildError;
use crate::posting::{IndexMode, Posting, PostingEntry};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Accumulates `term -> (doc_id -> posting)` for the current block.
///
/// Using a `BTreeMap` keyed by term gives ascending-term iteration for free
/// at flush time, matching the block format's sort requirement.
pub struct PostingBuffer {
    mode: IndexMode,
    postings: BTreeMap<String, BTreeMap<u32, PostingEntry>>,
}

impl PostingBuffer {
    pub fn new(mode: IndexMode) -> Self {
        Self { mode, postings: BTreeMap::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Insert or overwrite the `(doc_id -> ...)` entry for `term`.
    ///
    /// Callers within a single block must supply strictly increasing
    /// `doc_id`s across successive calls for a given term, and `positions`
    /// sorted ascending (both hold by construction when fed from
    /// [`crate::builder`]'s per-document token scan).
    pub fn add_term(&mut self, term: &str, doc_id: u32, positions: Vec<u32>) {
        let entry = match self.mode {
            IndexMode::Positional => PostingEntry::Positional(positions),
            IndexMode::Frequency => PostingEntry::Frequency(positions.len() as u32),
        };
        self.postings.entry(term.to_string()).or_default().insert(doc_id, entry);
    }

    /// Serialize the buffer, sorted by term, to a new block file, then
    /// clear it.
    pub fn flush(&mut self, folder: &Path, block_counter: u32) -> Result<PathBuf, BuildError> {
        let path = folder.join(format!("block_{block_counter}.txt"));
        self.write_to(&path)?;
        self.clear();
        Ok(path)
    }

    fn write_to(&self, path: &Path) -> Result<(), BuildError> {
        let file = File::create(path)
            .map_err(|source| BuildError::Io { path: path.to_path_buf(), source })?;
        let mut writer = BufWriter::new(file);
        for (term, by_doc) in &self.postings {
            let postings: Vec<Posting> = by_doc
                .iter()
                .map(|(&doc_id, entry)| Posting { doc_id, entry: entry.clone() })
                .collect();
            let line = crate::posting::format_line(term, &postings);
            writeln!(writer, "{line}")
                .map_err(|source| BuildError::Io { path: path.to_path_buf(), source })?;
        }
        writer.flush().map_err(|source| BuildError::Io { path: path.to_path_buf(), source })
    }

    /// Reset the buffer without writing anything.
    pub fn clear(&mut self) {
        self.postings.clear();
    }
}
