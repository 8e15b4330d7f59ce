//! The posting and posting-list data model shared by the builder and the
//! query engine.

/// One posting form, chosen once per build (never mixed within an index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingEntry {
    /// Document frequency only: the count of occurrences in the document.
    Frequency(u32),
    /// Strictly ascending 0-based token offsets within the document.
    Positional(Vec<u32>),
}

impl PostingEntry {
    /// The term frequency this entry contributes, regardless of form.
    pub fn term_frequency(&self) -> u32 {
        match self {
            PostingEntry::Frequency(tf) => *tf,
            PostingEntry::Positional(positions) => positions.len() as u32,
        }
    }

    /// The token positions this entry carries, if built in positional mode.
    pub fn positions(&self) -> Option<&[u32]> {
        match self {
            PostingEntry::Frequency(_) => None,
            PostingEntry::Positional(positions) => Some(positions),
        }
    }
}

/// A single `(doc_id, posting)` pair as read back from a posting list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: u32,
    pub entry: PostingEntry,
}

/// Whether an index stores frequency-only or positional postings. Selected
/// once at build time and never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    Frequency,
    Positional,
}

/// Serialize a single `<term>;<posting>(;<posting>)*` line.
///
/// Postings must already be sorted ascending by `doc_id`; this function
/// does not sort them.
pub fn format_line(term: &str, postings: &[Posting]) -> String {
    let mut line = String::with_capacity(term.len() + postings.len() * 8);
    line.push_str(term);
    for posting in postings {
        line.push(';');
        line.push_str(&posting.doc_id.to_string());
        match &posting.entry {
            PostingEntry::Frequency(tf) => {
                line.push(',');
                line.push_str(&tf.to_string());
            }
            PostingEntry::Positional(positions) => {
                line.push(':');
                let joined = positions.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
                line.push_str(&joined);
            }
        }
    }
    line
}

/// Parse a `<term>;<posting>(;<posting>)*` line (without its trailing
/// newline) back into a term and its postings.
///
/// Returns `None` if the line has no `;`-separated postings segment.
pub fn parse_line(line: &str) -> Option<(&str, Vec<Posting>)> {
    let mut parts = line.splitn(2, ';');
    let term = parts.next()?;
    let rest = parts.next()?;
    let mut postings = Vec::new();
    for segment in rest.split(';') {
        postings.push(parse_posting(segment)?);
    }
    Some((term, postings))
}

/// Parse one `doc_id:pos,pos,...` or `doc_id,tf` posting segment.
pub fn parse_posting(segment: &str) -> Option<Posting> {
    if let Some((doc_id_str, positions_str)) = segment.split_once(':') {
        let doc_id: u32 = doc_id_str.parse().ok()?;
        let positions: Vec<u32> =
            positions_str.split(',').map(str::parse).collect::<Result<_, _>>().ok()?;
        Some(Posting { doc_id, entry: PostingEntry::Positional(positions) })
    } else {
        let (doc_id_str, tf_str) = segment.split_once(',')?;
        let doc_id: u32 = doc_id_str.parse().ok()?;
        let tf: u32 = tf_str.parse().ok()?;
        Some(Posting { doc_id, entry: PostingEntry::Frequency(tf) })
    }
}

/// Collection frequency (`Σ tf`) contributed by a set of postings.
pub fn collection_frequency(postings: &[Posting]) -> u64 {
    postings.iter().map(|p| p.entry.term_frequency() as u64).sum()
}
