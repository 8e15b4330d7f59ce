//! Error types for index building and querying.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while building a SPIMI index.
#[derive(Debug)]
pub enum BuildError {
    /// The output folder could not be created or emptied before a build.
    OutputFolder { path: PathBuf, source: std::io::Error },
    /// A block or merge file could not be read or written.
    Io { path: PathBuf, source: std::io::Error },
    /// The corpus file itself could not be opened.
    CorpusUnreadable { path: PathBuf, source: std::io::Error },
    /// A block line could not be parsed during merge.
    MalformedBlockLine { path: PathBuf, line: String },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::OutputFolder { path, source } => {
                write!(f, "could not prepare output folder {}: {source}", path.display())
            }
            BuildError::Io { path, source } => {
                write!(f, "I/O error on {}: {source}", path.display())
            }
            BuildError::CorpusUnreadable { path, source } => {
                write!(f, "could not open corpus {}: {source}", path.display())
            }
            BuildError::MalformedBlockLine { path, line } => {
                write!(f, "malformed block line in {}: {line:?}", path.display())
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Errors that can occur while answering a query against a built index.
#[derive(Debug)]
pub enum QueryError {
    /// A required index artifact is missing or unreadable.
    MissingArtifact { path: PathBuf, source: std::io::Error },
    /// An index artifact exists but its contents are malformed.
    MalformedArtifact { path: PathBuf, reason: String },
    /// The query was empty after tokenization.
    EmptyQuery,
    /// The requested SMART notation is not recognized.
    UnknownSmartNotation(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::MissingArtifact { path, source } => {
                write!(f, "missing or unreadable index artifact {}: {source}", path.display())
            }
            QueryError::MalformedArtifact { path, reason } => {
                write!(f, "malformed index artifact {}: {reason}", path.display())
            }
            QueryError::EmptyQuery => write!(f, "query is empty after tokenization"),
            QueryError::UnknownSmartNotation(notation) => {
                write!(f, "unknown SMART notation: {notation}")
            }
        }
    }
}

impl std::error::Error for QueryError {}
