pub mod cli;
pub mod compress;
pub mod config;
pub mod error;
pub mod model;
pub mod probe;

pub use compress::{CancelToken, RejectReason, Verdict};
pub use config::Settings;
pub use error::{CompressError, ConfigError, PresetError};
pub use model::{
    BackendDescriptor, BackendKind, BackendSet, BatchResult, CompressionOutcome,
    CompressionRequest, OutcomeStatus, Overrides, QualityTier,
};
pub use probe::{probe_backends, refresh_backends};

/// Compress a single file.
///
/// This is the recommended entry point for library consumers. Backends are
/// detected on first use and the result is cached for the process lifetime;
/// call [`refresh_backends`] to force re-detection.
///
/// # Example
///
/// ```no_run
/// use pdf_squash::{compress_one, CompressionRequest, OutcomeStatus, QualityTier, Settings};
///
/// let request = CompressionRequest::new("big.pdf", "big_compressed.pdf", QualityTier::Medium);
/// let outcome = compress_one(&request, &Settings::default()).unwrap();
///
/// match outcome.status {
///     OutcomeStatus::Success => println!(
///         "{} -> {} bytes",
///         outcome.original_size, outcome.final_size
///     ),
///     OutcomeStatus::NoImprovement => println!("already as small as it gets"),
///     status => eprintln!("compression failed: {:?}", status),
/// }
/// ```
pub fn compress_one(
    request: &CompressionRequest,
    settings: &Settings,
) -> Result<CompressionOutcome, CompressError> {
    let backends = probe_backends();
    compress::compress_one(request, &backends, settings)
}

/// Compress a collection of files over a bounded worker pool.
///
/// Every request that enters the batch gets exactly one entry in the result,
/// in input order; one bad file never aborts its siblings.
pub fn compress_batch(requests: Vec<CompressionRequest>, settings: &Settings) -> BatchResult {
    let backends = probe_backends();
    compress::compress_batch(requests, &backends, settings)
}

/// [`compress_batch`] with a caller-held cancellation token: scheduling
/// stops and in-flight backend subprocesses are terminated once it fires.
pub fn compress_batch_with_cancel(
    requests: Vec<CompressionRequest>,
    settings: &Settings,
    cancel: &CancelToken,
) -> BatchResult {
    let backends = probe_backends();
    compress::compress_batch_with_cancel(requests, &backends, settings, cancel)
}
