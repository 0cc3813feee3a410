use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::compress::validator::RejectReason;
use crate::error::CompressError;
use crate::model::{BackendKind, ResolvedParameters};

/// Why a backend execution did not produce a usable candidate.
///
/// Distinct from a validation rejection: these are failures of the backend
/// itself, not judgments about its output.
#[derive(Clone, Debug, Error)]
pub enum AttemptFailure {
    #[error("failed to launch {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("exited with {}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Internal(String),
}

/// Where one attempt ended up.
#[derive(Clone, Debug)]
pub enum AttemptStatus {
    /// Candidate passed validation and became the final output
    Accepted,
    /// Backend ran but the validator turned its candidate down
    Rejected(RejectReason),
    /// Backend did not produce a candidate at all
    Failed(AttemptFailure),
}

/// Execution record for one backend within one request.
#[derive(Clone, Debug)]
pub struct CompressionAttempt {
    pub backend: BackendKind,
    pub parameters: ResolvedParameters,
    /// Final location of the candidate, set only once accepted
    pub candidate: Option<PathBuf>,
    pub duration: Duration,
    pub status: AttemptStatus,
}

/// Terminal status of orchestrating one request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// A backend produced a valid, strictly smaller file
    Success,
    /// Every candidate was structurally fine but no smaller than the input
    NoImprovement,
    /// No backend could be tried, or every tried backend failed outright
    AllBackendsFailed,
    /// The input is missing, unreadable, or not a PDF
    InvalidInput,
}

/// Everything the engine has to say about one request: the terminal status,
/// the full ordered list of attempts for diagnostics, and the size delta.
#[derive(Debug)]
pub struct CompressionOutcome {
    pub status: OutcomeStatus,
    /// Index into `attempts` of the accepted attempt (Success only)
    pub winner: Option<usize>,
    /// Attempt records in the order backends were actually tried
    pub attempts: Vec<CompressionAttempt>,
    pub original_size: u64,
    /// Size of the written output on Success; equals `original_size` otherwise
    pub final_size: u64,
}

impl CompressionOutcome {
    pub fn winning_attempt(&self) -> Option<&CompressionAttempt> {
        self.winner.and_then(|i| self.attempts.get(i))
    }

    /// Size reduction as a percentage of the original size.
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        100.0 - (self.final_size as f64 / self.original_size as f64 * 100.0)
    }
}

/// One batch entry: the input that entered the batch and what became of it.
///
/// Request-level setup failures (bad overrides, scratch/output write errors)
/// surface as `Err`; everything else, including invalid inputs and backend
/// failures, is encoded in the outcome status.
#[derive(Debug)]
pub struct BatchEntry {
    pub input: PathBuf,
    pub outcome: Result<CompressionOutcome, CompressError>,
}

/// Per-file outcomes for a batch, in the same order the requests were given,
/// regardless of completion order. Never partially populated.
#[derive(Debug, Default)]
pub struct BatchResult {
    entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn new(entries: Vec<BatchEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter()
    }

    /// Number of entries that did not end in Success or NoImprovement.
    pub fn failure_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| match &e.outcome {
                Ok(o) => matches!(
                    o.status,
                    OutcomeStatus::AllBackendsFailed | OutcomeStatus::InvalidInput
                ),
                Err(_) => true,
            })
            .count()
    }
}

impl IntoIterator for BatchResult {
    type Item = BatchEntry;
    type IntoIter = std::vec::IntoIter<BatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
