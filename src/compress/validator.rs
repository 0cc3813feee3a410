//! Candidate validation.
//!
//! A backend producing a file is not the same as a backend producing a
//! usable result. Every candidate passes through here before it can replace
//! the input: it must exist, look like a PDF with at least one readable
//! page, and be strictly smaller than the input.

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Why a candidate was turned down. Part of the public contract: callers
/// decide from the reason whether to try the next backend or give up.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("candidate file does not exist")]
    Missing,

    #[error("candidate file is empty")]
    Empty,

    #[error("candidate is not a well-formed PDF: {0}")]
    Malformed(String),

    #[error("no size improvement ({candidate} bytes vs {original} original)")]
    NoImprovement { candidate: u64, original: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Inspect a candidate file against the original input size.
///
/// Checks run in order and short-circuit on the first failure: existence,
/// structural sanity (header and trailer markers, readable page count via
/// lopdf), then strict size improvement. An equal or larger candidate is a
/// `NoImprovement` rejection, not an error; the input may simply already be
/// as small as it gets.
pub fn validate(input_size: u64, candidate: &Path) -> Verdict {
    let metadata = match fs::metadata(candidate) {
        Ok(m) => m,
        Err(_) => return Verdict::Reject(RejectReason::Missing),
    };
    if metadata.len() == 0 {
        return Verdict::Reject(RejectReason::Empty);
    }

    let bytes = match fs::read(candidate) {
        Ok(b) => b,
        Err(e) => return Verdict::Reject(RejectReason::Malformed(e.to_string())),
    };

    if !bytes.starts_with(b"%PDF-") {
        return Verdict::Reject(RejectReason::Malformed("missing %PDF header".into()));
    }
    if !has_eof_marker(&bytes) {
        return Verdict::Reject(RejectReason::Malformed("missing %%EOF trailer".into()));
    }

    match lopdf::Document::load_mem(&bytes) {
        Ok(doc) => {
            if doc.get_pages().is_empty() {
                return Verdict::Reject(RejectReason::Malformed("document has no pages".into()));
            }
        }
        Err(e) => return Verdict::Reject(RejectReason::Malformed(e.to_string())),
    }

    let candidate_size = metadata.len();
    if candidate_size >= input_size {
        return Verdict::Reject(RejectReason::NoImprovement {
            candidate: candidate_size,
            original: input_size,
        });
    }

    Verdict::Accept
}

/// %%EOF must appear near the end; some writers pad with whitespace after it.
fn has_eof_marker(bytes: &[u8]) -> bool {
    let tail_start = bytes.len().saturating_sub(1024);
    bytes[tail_start..]
        .windows(5)
        .any(|window| window == b"%%EOF")
}
