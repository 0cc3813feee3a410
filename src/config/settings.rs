use std::num::NonZeroUsize;
use std::time::Duration;

use super::defaults::DEFAULT_BACKEND_TIMEOUT_SECS;
use crate::cli::Args;

/// Runtime settings shared by every request in a run.
///
/// Per-file choices (tier, overrides, backend toggles) live on the
/// `CompressionRequest`; this struct carries the knobs that apply to the
/// whole process.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Wall-clock limit for one backend execution
    pub backend_timeout: Duration,
    /// Worker count for batch runs (None = host CPU count)
    pub jobs: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            jobs: None,
        }
    }
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_args(args: &Args) -> Self {
        Self {
            backend_timeout: Duration::from_secs(args.timeout),
            jobs: args.jobs,
        }
    }

    /// Effective worker count for a batch of `batch_len` requests.
    pub fn worker_count(&self, batch_len: usize) -> usize {
        let configured = self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        });
        configured.clamp(1, batch_len.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count_bounded_by_batch() {
        let settings = Settings {
            jobs: Some(8),
            ..Settings::default()
        };
        assert_eq!(settings.worker_count(3), 3);
        assert_eq!(settings.worker_count(100), 8);
    }

    #[test]
    fn test_worker_count_never_zero() {
        let settings = Settings {
            jobs: Some(0),
            ..Settings::default()
        };
        assert_eq!(settings.worker_count(5), 1);
        assert_eq!(settings.worker_count(0), 1);
    }
}
