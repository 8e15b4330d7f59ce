//! Deterministic text tokenization.
//!
//! The pipeline runs, in order: regex extraction, optional lowercasing,
//! minimum-length filtering, stopword filtering, and optional stemming.
//! It is pure — the same input always produces the same output.

use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

/// Default token-extraction pattern: one or more ASCII letters.
pub const DEFAULT_REGEX: &str = "[a-zA-Z]+";

/// Tokenizer configuration and compiled state.
pub struct Tokenizer {
    regex: TokenRegex,
    lowercase: bool,
    min_length: usize,
    stopwords: HashSet<String>,
    stemmer: Option<Stemmer>,
}

/// Minimal anchored-match extractor for the default alphabetic pattern and
/// arbitrary externally-supplied patterns, avoiding a full regex dependency
/// for the common case while still accepting a configured pattern string.
enum TokenRegex {
    /// Fast path: runs of ASCII alphabetic characters (the default pattern).
    AsciiAlpha,
    /// General path: delegates to the `regex` crate for any other pattern.
    Compiled(regex::Regex),
}

impl TokenRegex {
    fn new(pattern: &str) -> Self {
        if pattern == DEFAULT_REGEX || pattern == "[a-zA-Z]{1,}" {
            TokenRegex::AsciiAlpha
        } else {
            match regex::Regex::new(pattern) {
                Ok(re) => TokenRegex::Compiled(re),
                Err(_) => TokenRegex::AsciiAlpha,
            }
        }
    }

    fn find_all<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            TokenRegex::AsciiAlpha => {
                let mut out = Vec::new();
                let mut start = None;
                for (i, c) in text.char_indices() {
                    if c.is_ascii_alphabetic() {
                        if start.is_none() {
                            start = Some(i);
                        }
                    } else if let Some(s) = start.take() {
                        out.push(&text[s..i]);
                    }
                }
                if let Some(s) = start {
                    out.push(&text[s..]);
                }
                out
            }
            TokenRegex::Compiled(re) => re.find_iter(text).map(|m| m.as_str()).collect(),
        }
    }
}

/// Tokenizer construction parameters.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    pub regex: String,
    pub lowercase: bool,
    pub min_length: usize,
    pub stopwords: Vec<String>,
    pub stem: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            regex: DEFAULT_REGEX.to_string(),
            lowercase: true,
            min_length: 0,
            stopwords: Vec::new(),
            stem: false,
        }
    }
}

impl Tokenizer {
    /// Build a tokenizer from explicit configuration.
    ///
    /// Stopwords are themselves lowercased and filtered by `min_length`,
    /// matching how the original collection loads its stopword file.
    pub fn new(config: TokenizerConfig) -> Self {
        let stopwords = config
            .stopwords
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| w.len() >= config.min_length)
            .collect();

        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        Self {
            regex: TokenRegex::new(&config.regex),
            lowercase: config.lowercase,
            min_length: config.min_length,
            stopwords,
            stemmer,
        }
    }

    /// The full indexing-time pipeline: regex, lowercase, min-length,
    /// stopwords, stem.
    pub fn tokenize(&self, content: &str) -> Vec<String> {
        let mut words: Vec<String> = self
            .regex
            .find_all(content)
            .into_iter()
            .map(|w| w.to_string())
            .collect();

        if self.lowercase {
            for w in &mut words {
                *w = w.to_lowercase();
            }
        }

        if self.min_length > 0 {
            words.retain(|w| w.len() >= self.min_length);
        }

        if !self.stopwords.is_empty() {
            words.retain(|w| !self.stopwords.contains(w));
        }

        if let Some(stemmer) = &self.stemmer {
            for w in &mut words {
                *w = stemmer.stem(w).to_string();
            }
        }

        words
    }

    /// The simpler query-time pipeline used by the search path: lowercase
    /// and split on whitespace, with none of the indexing-time filtering.
    ///
    /// This mirrors a divergence in the system this crate's design is
    /// grounded on, where the query path never reuses the indexing
    /// tokenizer. Kept distinct (rather than unified) so query results stay
    /// reproducible against indexes built with any stopword/min-length
    /// configuration.
    pub fn tokenize_query(&self, text: &str) -> Vec<String> {
        text.to_lowercase().split_whitespace().map(str::to_string).collect()
    }
}

/// Load a stopword list, one word per line, ignoring blank lines.
pub fn load_stopwords(path: &std::path::Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}
