//! External k-way merge of SPIMI blocks into the final `index.txt` and
//! `term_frequencies.txt`.
//!
//! Blocks are merged by ascending term, comparing the full term string (not
//! just its first character, as the Python original did) so that terms
//! sharing a prefix but differing later (`"cat"` vs `"catalog"`) are never
//! conflated. Merged output is buffered in memory and spilled to
//! `index<k>.txt` files when the memory monitor reports pressure above
//! threshold, then concatenated into `index.txt` once the merge completes.

use crate::error::BuildError;
use crate::memory::{MemoryMonitor, PressureSource};
use crate::posting::{self, Posting};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Paths to the two artifacts this merge step produces.
pub struct MergeOutput {
    pub index_path: PathBuf,
    pub term_frequencies_path: PathBuf,
}

/// One block's cursor: its reader and the most recently read, not-yet-
/// consumed line (already parsed).
struct BlockCursor {
    reader: BufReader<File>,
    path: PathBuf,
    current: Option<(String, Vec<Posting>)>,
}

impl BlockCursor {
    fn open(path: &Path) -> Result<Self, BuildError> {
        let file =
            File::open(path).map_err(|source| BuildError::Io { path: path.to_path_buf(), source })?;
        let mut cursor = BlockCursor { reader: BufReader::new(file), path: path.to_path_buf(), current: None };
        cursor.advance()?;
        Ok(cursor)
    }

    /// Read the next line into `current`, parsing it; `None` at EOF.
    fn advance(&mut self) -> Result<(), BuildError> {
        let mut line = String::new();
        let bytes_read = self
            .reader
            .read_line(&mut line)
            .map_err(|source| BuildError::Io { path: self.path.clone(), source })?;
        if bytes_read == 0 {
            self.current = None;
            return Ok(());
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        let (term, postings) = posting::parse_line(trimmed).ok_or_else(|| BuildError::MalformedBlockLine {
            path: self.path.clone(),
            line: trimmed.to_string(),
        })?;
        self.current = Some((term.to_string(), postings));
        Ok(())
    }
}

/// A heap entry ordered by term so the heap pops the lexicographically
/// smallest term first (min-heap via `Reverse`), with `cursor_index` as an
/// explicit tie-breaker: blocks are opened in ascending doc-id order, so
/// ties broken by ascending `cursor_index` keep `indices_at_term` (and thus
/// `merged`) in ascending doc-id order too, rather than depending on
/// `BinaryHeap`'s unspecified order among equal-priority elements.
struct HeapEntry {
    term: String,
    cursor_index: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term && self.cursor_index == other.cursor_index
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.term.cmp(&other.term).then_with(|| self.cursor_index.cmp(&other.cursor_index))
    }
}

/// Merge `block_paths` (each already sorted ascending by term) into
/// `index.txt` and `term_frequencies.txt` under `output_folder`, spilling
/// through `index<k>.txt` intermediates when memory pressure demands it.
///
/// Deletes the block files on success.
pub fn merge_blocks<P: PressureSource>(
    block_paths: &[PathBuf],
    output_folder: &Path,
    monitor: &mut MemoryMonitor<P>,
) -> Result<MergeOutput, BuildError> {
    let term_frequencies_path = output_folder.join("term_frequencies.txt");
    let mut tf_writer = BufWriter::new(
        File::create(&term_frequencies_path)
            .map_err(|source| BuildError::Io { path: term_frequencies_path.clone(), source })?,
    );

    let mut cursors: Vec<BlockCursor> =
        block_paths.iter().map(|p| BlockCursor::open(p)).collect::<Result<_, _>>()?;

    let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();
    for (index, cursor) in cursors.iter().enumerate() {
        if let Some((term, _)) = &cursor.current {
            heap.push(Reverse(HeapEntry { term: term.clone(), cursor_index: index }));
        }
    }

    let mut spill_paths: Vec<PathBuf> = Vec::new();
    let mut buffer = String::new();
    let mut spill_counter: u32 = 0;

    while let Some(Reverse(HeapEntry { term, cursor_index: first_index })) = heap.pop() {
        // Gather every cursor currently positioned on this term (there may
        // be several, one per block that saw the term), merge their
        // postings, and advance each past it.
        let mut merged: Vec<Posting> = Vec::new();
        let mut indices_at_term = vec![first_index];
        // Drain any other heap entries that also match this term before
        // touching cursors, so we only read `current` once per cursor.
        while let Some(Reverse(top)) = heap.peek() {
            if top.term == term {
                let Reverse(entry) = heap.pop().unwrap();
                indices_at_term.push(entry.cursor_index);
            } else {
                break;
            }
        }

        for &index in &indices_at_term {
            if let Some((_, postings)) = cursors[index].current.take() {
                merged.extend(postings);
            }
        }

        for &index in &indices_at_term {
            cursors[index].advance()?;
            if let Some((next_term, _)) = &cursors[index].current {
                heap.push(Reverse(HeapEntry { term: next_term.clone(), cursor_index: index }));
            }
        }

        let collection_frequency = posting::collection_frequency(&merged);
        writeln!(tf_writer, "{term}:{collection_frequency}")
            .map_err(|source| BuildError::Io { path: term_frequencies_path.clone(), source })?;

        let line = posting::format_line(&term, &merged);
        buffer.push_str(&line);
        buffer.push('\n');

        if monitor.over_threshold() {
            let spill_path = output_folder.join(format!("index{spill_counter}.txt"));
            write_and_clear(&spill_path, &mut buffer)?;
            spill_paths.push(spill_path);
            spill_counter += 1;
        }
    }
    tf_writer.flush().map_err(|source| BuildError::Io { path: term_frequencies_path.clone(), source })?;

    if !buffer.is_empty() {
        let spill_path = output_folder.join(format!("index{spill_counter}.txt"));
        write_and_clear(&spill_path, &mut buffer)?;
        spill_paths.push(spill_path);
    }

    let index_path = output_folder.join("index.txt");
    concatenate_spills(&spill_paths, &index_path)?;

    for path in &spill_paths {
        let _ = std::fs::remove_file(path);
    }
    for cursor in cursors {
        let _ = std::fs::remove_file(&cursor.path);
    }

    Ok(MergeOutput { index_path, term_frequencies_path })
}

fn write_and_clear(path: &Path, buffer: &mut String) -> Result<(), BuildError> {
    let mut writer = BufWriter::new(
        File::create(path).map_err(|source| BuildError::Io { path: path.to_path_buf(), source })?,
    );
    writer
        .write_all(buffer.as_bytes())
        .map_err(|source| BuildError::Io { path: path.to_path_buf(), source })?;
    writer.flush().map_err(|source| BuildError::Io { path: path.to_path_buf(), source })?;
    buffer.clear();
    Ok(())
}

/// Spills are produced in ascending term order (the merge never revisits a
/// term once popped), so concatenating them in emission order is a valid
/// fully sorted `index.txt`.
fn concatenate_spills(spill_paths: &[PathBuf], index_path: &Path) -> Result<(), BuildError> {
    let mut writer = BufWriter::new(
        File::create(index_path).map_err(|source| BuildError::Io { path: index_path.to_path_buf(), source })?,
    );
    for spill_path in spill_paths {
        let mut reader = BufReader::new(
            File::open(spill_path)
                .map_err(|source| BuildError::Io { path: spill_path.clone(), source })?,
        );
        std::io::copy(&mut reader, &mut writer)
            .map_err(|source| BuildError::Io { path: spill_path.clone(), source })?;
    }
    writer.flush().map_err(|source| BuildError::Io { path: index_path.to_path_buf(), source })
}
