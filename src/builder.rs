//! SPIMI build orchestration: ties the tokenizer, corpus reader, posting
//! buffer, memory monitor, merger, and artifact writers into one indexing
//! pass.

use crate::artifacts::{self, IndexStats};
use crate::block::PostingBuffer;
use crate::corpus;
use crate::error::BuildError;
use crate::memory::{MemoryMonitor, PressureSource, SystemMemoryMonitor};
use crate::merge;
use crate::posting::IndexMode;
use crate::tokenizer::Tokenizer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Configuration for a single build run.
pub struct BuildConfig {
    pub corpus_path: PathBuf,
    pub output_folder: PathBuf,
    pub mode: IndexMode,
    pub memory_threshold: f32,
}

/// Build a SPIMI index from `config.corpus_path` into `config.output_folder`,
/// using the default `sysinfo`-backed memory monitor.
pub fn build(config: &BuildConfig, tokenizer: &Tokenizer) -> Result<(), BuildError> {
    let monitor = MemoryMonitor::new(SystemMemoryMonitor::new(), config.memory_threshold);
    build_with_monitor(config, tokenizer, monitor)
}

/// Build with an injected [`PressureSource`], for deterministic tests.
pub fn build_with_monitor<P: PressureSource>(
    config: &BuildConfig,
    tokenizer: &Tokenizer,
    mut monitor: MemoryMonitor<P>,
) -> Result<(), BuildError> {
    let started = Instant::now();
    prepare_output_folder(&config.output_folder)?;

    let mut reader = corpus::Reader::open(&config.corpus_path)
        .map_err(|source| BuildError::CorpusUnreadable { path: config.corpus_path.clone(), source })?;

    let mut buffer = PostingBuffer::new(config.mode);
    let mut seen_pmids: HashMap<i64, u32> = HashMap::new();
    let mut doc_mapping: Vec<(i64, u32)> = Vec::new();
    let mut doc_lengths: Vec<(u32, u32)> = Vec::new();
    let mut block_paths: Vec<PathBuf> = Vec::new();
    let mut next_doc_id: u32 = 0;
    let mut total_length: u64 = 0;

    while let Some(record) = reader.read() {
        if seen_pmids.contains_key(&record.pmid) {
            tracing::warn!(pmid = record.pmid, "duplicate pmid, keeping first occurrence");
            continue;
        }
        let doc_id = next_doc_id;
        next_doc_id += 1;
        seen_pmids.insert(record.pmid, doc_id);
        doc_mapping.push((record.pmid, doc_id));

        let tokens = tokenizer.tokenize(&record.text);
        doc_lengths.push((doc_id, tokens.len() as u32));
        total_length += tokens.len() as u64;

        let mut positions_by_term: HashMap<&str, Vec<u32>> = HashMap::new();
        for (position, token) in tokens.iter().enumerate() {
            positions_by_term.entry(token.as_str()).or_default().push(position as u32);
        }
        for (term, positions) in positions_by_term {
            buffer.add_term(term, doc_id, positions);
        }

        if monitor.over_threshold() && !buffer.is_empty() {
            let path = buffer.flush(&config.output_folder, block_paths.len() as u32)?;
            tracing::info!(block = %path.display(), "flushed SPIMI block");
            block_paths.push(path);
        }
    }

    if !buffer.is_empty() {
        let path = buffer.flush(&config.output_folder, block_paths.len() as u32)?;
        block_paths.push(path);
    }

    let indexing_elapsed = started.elapsed();
    let merge_started = Instant::now();
    let merge_output = merge::merge_blocks(&block_paths, &config.output_folder, &mut monitor)?;
    let merge_elapsed = merge_started.elapsed();

    let docs_len_path = config.output_folder.join("docs_len.txt");
    write_docs_len(&docs_len_path, &doc_lengths)?;

    let docs_info_path = config.output_folder.join("docs_info.txt");
    artifacts::write_docs_info(&docs_info_path, next_doc_id, total_length)
        .map_err(|source| BuildError::Io { path: docs_info_path.clone(), source })?;

    let doc_mapping_path = config.output_folder.join("doc_mapping.txt");
    artifacts::write_doc_mapping(&doc_mapping_path, &doc_mapping)
        .map_err(|source| BuildError::Io { path: doc_mapping_path.clone(), source })?;

    let index_size = std::fs::metadata(&merge_output.index_path)
        .map(|m| m.len())
        .unwrap_or(0);
    let stats_path = config.output_folder.join("index_stats.txt");
    artifacts::write_index_stats(
        &stats_path,
        &IndexStats {
            index_size_bytes: index_size,
            indexing_seconds: indexing_elapsed.as_secs_f64(),
            num_blocks: block_paths.len() as u32,
            merge_seconds: merge_elapsed.as_secs_f64(),
            total_seconds: started.elapsed().as_secs_f64(),
        },
    )
    .map_err(|source| BuildError::Io { path: stats_path.clone(), source })?;

    tracing::info!(
        total_docs = next_doc_id,
        blocks = block_paths.len(),
        "SPIMI build complete"
    );
    Ok(())
}

/// Clear the output folder if it exists, then recreate it, so a build never
/// mixes artifacts with a previous run.
fn prepare_output_folder(path: &Path) -> Result<(), BuildError> {
    if path.exists() {
        std::fs::remove_dir_all(path)
            .map_err(|source| BuildError::OutputFolder { path: path.to_path_buf(), source })?;
    }
    std::fs::create_dir_all(path)
        .map_err(|source| BuildError::OutputFolder { path: path.to_path_buf(), source })
}

fn write_docs_len(path: &Path, doc_lengths: &[(u32, u32)]) -> Result<(), BuildError> {
    let file = std::fs::File::create(path)
        .map_err(|source| BuildError::Io { path: path.to_path_buf(), source })?;
    let mut writer = std::io::BufWriter::new(file);
    for &(doc_id, length) in doc_lengths {
        artifacts::append_doc_length(&mut writer, doc_id, length)
            .map_err(|source| BuildError::Io { path: path.to_path_buf(), source })?;
    }
    use std::io::Write;
    writer.flush().map_err(|source| BuildError::Io { path: path.to_path_buf(), source })
}
