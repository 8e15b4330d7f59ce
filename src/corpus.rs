//! Corpus source: a lazy sequence of `(pmid, text)` records read from a
//! line-delimited JSON file.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// A single parsed corpus record.
pub struct CorpusRecord {
    pub pmid: i64,
    pub text: String,
}

/// Reads corpus records lazily from a line-delimited JSON file.
///
/// Malformed lines are skipped with a logged warning rather than aborting
/// the read, matching the "log and skip" policy for corpus parse errors.
pub struct Reader {
    lines: Lines<BufReader<File>>,
}

impl Reader {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self { lines: BufReader::new(file).lines() })
    }

    /// Read the next valid record, skipping malformed lines.
    ///
    /// Returns `None` once the underlying file is exhausted.
    pub fn read(&mut self) -> Option<CorpusRecord> {
        loop {
            let line = match self.lines.next()? {
                Ok(l) => l,
                Err(err) => {
                    tracing::warn!(%err, "corpus line could not be read");
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(&line) {
                Ok(record) => return Some(record),
                Err(err) => {
                    tracing::warn!(%err, line = %line, "skipping malformed corpus line");
                    continue;
                }
            }
        }
    }
}

fn parse_record(line: &str) -> Result<CorpusRecord, serde_json::Error> {
    #[derive(Deserialize)]
    struct Raw {
        pmid: i64,
        title: String,
        #[serde(rename = "abstract")]
        abstract_text: String,
    }
    let raw: Raw = serde_json::from_str(line)?;
    Ok(CorpusRecord { pmid: raw.pmid, text: format!("{} {}", raw.title, raw.abstract_text) })
}

impl Iterator for Reader {
    type Item = CorpusRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_title_and_abstract_joined_with_space() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"pmid":1,"title":"the quick","abstract":"brown fox"}}"#).unwrap();
        let mut reader = Reader::open(file.path()).unwrap();
        let rec = reader.read().unwrap();
        assert_eq!(rec.pmid, 1);
        assert_eq!(rec.text, "the quick brown fox");
        assert!(reader.read().is_none());
    }

    #[test]
    fn skips_malformed_lines_without_aborting() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"pmid":2,"title":"a","abstract":"b"}}"#).unwrap();
        let mut reader = Reader::open(file.path()).unwrap();
        let rec = reader.read().unwrap();
        assert_eq!(rec.pmid, 2);
    }
}
