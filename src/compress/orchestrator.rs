//! Per-request orchestration.
//!
//! Tries the enabled, available backends in priority order, validates each
//! candidate, and stops at the first acceptance. Backend attempts are
//! strictly sequential: once an earlier backend is accepted, running a later
//! one is wasted work.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use super::backends;
use super::exec::CancelToken;
use super::preset;
use super::validator::{self, RejectReason, Verdict};
use crate::config::Settings;
use crate::error::CompressError;
use crate::model::{
    AttemptStatus, BackendKind, BackendSet, CompressionAttempt, CompressionOutcome,
    CompressionRequest, OutcomeStatus,
};

/// Compress one file according to its request.
///
/// Returns `Err` only for request-level setup problems (bad overrides,
/// scratch or output write failures). Everything else, including an invalid
/// input and every flavor of backend failure, is reported through the
/// outcome status and its attempt records.
pub fn compress_one(
    request: &CompressionRequest,
    backends: &BackendSet,
    settings: &Settings,
) -> Result<CompressionOutcome, CompressError> {
    compress_one_cancellable(request, backends, settings, &CancelToken::new())
}

/// Same as [`compress_one`], observing a cancellation token between backend
/// attempts and inside subprocess waits.
pub fn compress_one_cancellable(
    request: &CompressionRequest,
    backends: &BackendSet,
    settings: &Settings,
    cancel: &CancelToken,
) -> Result<CompressionOutcome, CompressError> {
    let original_size = match inspect_input(&request.input) {
        Ok(size) => size,
        Err(reason) => {
            log::warn!("Rejecting input {}: {}", request.input.display(), reason);
            return Ok(CompressionOutcome {
                status: OutcomeStatus::InvalidInput,
                winner: None,
                attempts: Vec::new(),
                original_size: 0,
                final_size: 0,
            });
        }
    };

    // Overrides are range-checked once, up front; a bad request never
    // reaches a backend.
    let params = preset::resolve(request.tier, &request.overrides)?;

    let mut attempts: Vec<CompressionAttempt> = Vec::new();
    let mut saw_no_improvement = false;

    for descriptor in backends.available() {
        if cancel.is_cancelled() {
            if attempts.is_empty() {
                return Err(CompressError::Cancelled);
            }
            break;
        }
        if !backend_enabled(request, descriptor.kind) {
            log::debug!("Skipping {} (disabled by request)", descriptor.kind);
            continue;
        }

        // Unique scratch location per attempt, next to the output so the
        // accepted candidate can be renamed into place.
        let scratch_dir = scratch_dir_for(&request.output)?;
        let scratch = scratch_dir.path().join("candidate.pdf");

        log::debug!(
            "Trying {} on {} ({} bytes)",
            descriptor.kind,
            request.input.display(),
            original_size
        );

        let started = Instant::now();
        let result = backends::attempt(
            descriptor,
            &request.input,
            &params,
            &scratch,
            settings.backend_timeout,
            cancel,
        );
        let duration = started.elapsed();

        match result {
            Err(failure) => {
                log::warn!(
                    "{} failed on {}: {}",
                    descriptor.kind,
                    request.input.display(),
                    failure
                );
                attempts.push(CompressionAttempt {
                    backend: descriptor.kind,
                    parameters: params,
                    candidate: None,
                    duration,
                    status: AttemptStatus::Failed(failure),
                });
            }
            Ok(()) => match validator::validate(original_size, &scratch) {
                Verdict::Accept => {
                    let final_size = persist_candidate(&scratch, &request.output).map_err(
                        |source| CompressError::OutputWrite {
                            path: request.output.clone(),
                            source,
                        },
                    )?;
                    log::info!(
                        "{}: {} -> {} bytes via {}",
                        request.input.display(),
                        original_size,
                        final_size,
                        descriptor.kind
                    );
                    attempts.push(CompressionAttempt {
                        backend: descriptor.kind,
                        parameters: params,
                        candidate: Some(request.output.clone()),
                        duration,
                        status: AttemptStatus::Accepted,
                    });
                    let winner = attempts.len() - 1;
                    return Ok(CompressionOutcome {
                        status: OutcomeStatus::Success,
                        winner: Some(winner),
                        attempts,
                        original_size,
                        final_size,
                    });
                }
                Verdict::Reject(reason) => {
                    if matches!(reason, RejectReason::NoImprovement { .. }) {
                        saw_no_improvement = true;
                    }
                    log::debug!(
                        "{} candidate rejected for {}: {}",
                        descriptor.kind,
                        request.input.display(),
                        reason
                    );
                    attempts.push(CompressionAttempt {
                        backend: descriptor.kind,
                        parameters: params,
                        candidate: None,
                        duration,
                        status: AttemptStatus::Rejected(reason),
                    });
                }
            },
        }
    }

    // A no-improvement rejection means the input may already be optimally
    // sized, which is a different answer than "everything broke".
    let status = if saw_no_improvement {
        OutcomeStatus::NoImprovement
    } else {
        OutcomeStatus::AllBackendsFailed
    };

    Ok(CompressionOutcome {
        status,
        winner: None,
        attempts,
        original_size,
        final_size: original_size,
    })
}

fn backend_enabled(request: &CompressionRequest, kind: BackendKind) -> bool {
    match kind {
        BackendKind::Ghostscript => request.use_ghostscript,
        BackendKind::Qpdf => request.use_qpdf,
        BackendKind::Builtin => request.allow_fallback,
    }
}

/// Basic input validity: the file must exist, be readable, be non-empty,
/// and start with a PDF header. Returns its size.
fn inspect_input(input: &Path) -> Result<u64, String> {
    let metadata = fs::metadata(input).map_err(|e| e.to_string())?;
    if !metadata.is_file() {
        return Err("not a regular file".into());
    }
    if metadata.len() == 0 {
        return Err("file is empty".into());
    }

    let mut header = [0u8; 5];
    let mut file = fs::File::open(input).map_err(|e| e.to_string())?;
    file.read_exact(&mut header).map_err(|e| e.to_string())?;
    if &header != b"%PDF-" {
        return Err("missing %PDF header".into());
    }

    Ok(metadata.len())
}

fn scratch_dir_for(output: &Path) -> Result<tempfile::TempDir, CompressError> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::temp_dir(),
    };
    tempfile::Builder::new()
        .prefix(".pdf-squash-")
        .tempdir_in(&parent)
        .map_err(|source| CompressError::Scratch {
            dir: parent,
            source,
        })
}

/// Move the accepted candidate into place and report its size. Rename when
/// possible, copy when the scratch dir and output live on different
/// filesystems.
fn persist_candidate(scratch: &Path, output: &Path) -> std::io::Result<u64> {
    if fs::rename(scratch, output).is_err() {
        fs::copy(scratch, output)?;
    }
    Ok(fs::metadata(output)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BackendDescriptor, QualityTier};

    fn builtin_only() -> BackendSet {
        BackendSet::new(vec![
            BackendDescriptor::unavailable(BackendKind::Ghostscript),
            BackendDescriptor::unavailable(BackendKind::Qpdf),
            BackendDescriptor {
                kind: BackendKind::Builtin,
                available: true,
                version: None,
                program: None,
            },
        ])
    }

    fn none_available() -> BackendSet {
        BackendSet::new(
            BackendKind::ALL
                .into_iter()
                .map(BackendDescriptor::unavailable)
                .collect(),
        )
    }

    #[test]
    fn test_missing_input_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let request = CompressionRequest::new(
            dir.path().join("missing.pdf"),
            dir.path().join("out.pdf"),
            QualityTier::Medium,
        );
        let outcome =
            compress_one(&request, &builtin_only(), &Settings::default()).unwrap();
        assert_eq!(outcome.status, OutcomeStatus::InvalidInput);
        assert!(outcome.attempts.is_empty());
    }

    #[test]
    fn test_non_pdf_input_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("junk.pdf");
        fs::write(&input, b"plain text, no header").unwrap();

        let request = CompressionRequest::new(
            input,
            dir.path().join("out.pdf"),
            QualityTier::Medium,
        );
        let outcome =
            compress_one(&request, &builtin_only(), &Settings::default()).unwrap();
        assert_eq!(outcome.status, OutcomeStatus::InvalidInput);
    }

    #[test]
    fn test_no_backends_available() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        fs::write(&input, b"%PDF-1.4 pretend content\n%%EOF").unwrap();

        let request = CompressionRequest::new(
            input,
            dir.path().join("out.pdf"),
            QualityTier::Medium,
        );
        let outcome =
            compress_one(&request, &none_available(), &Settings::default()).unwrap();
        assert_eq!(outcome.status, OutcomeStatus::AllBackendsFailed);
        assert!(outcome.attempts.is_empty());
    }

    #[test]
    fn test_disabled_backends_are_skipped_without_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        fs::write(&input, b"%PDF-1.4 pretend content\n%%EOF").unwrap();

        let mut request = CompressionRequest::new(
            input,
            dir.path().join("out.pdf"),
            QualityTier::Medium,
        );
        request.allow_fallback = false;

        let outcome =
            compress_one(&request, &builtin_only(), &Settings::default()).unwrap();
        assert_eq!(outcome.status, OutcomeStatus::AllBackendsFailed);
        assert!(outcome.attempts.is_empty());
    }

    #[test]
    fn test_bad_override_is_a_request_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        fs::write(&input, b"%PDF-1.4 pretend content\n%%EOF").unwrap();

        let mut request = CompressionRequest::new(
            input,
            dir.path().join("out.pdf"),
            QualityTier::Medium,
        );
        request.overrides.max_dpi = Some(0);

        let result = compress_one(&request, &builtin_only(), &Settings::default());
        assert!(matches!(result, Err(CompressError::Preset(_))));
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        fs::write(&input, b"%PDF-1.4 pretend content\n%%EOF").unwrap();

        let request = CompressionRequest::new(
            input,
            dir.path().join("out.pdf"),
            QualityTier::Medium,
        );
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = compress_one_cancellable(
            &request,
            &builtin_only(),
            &Settings::default(),
            &cancel,
        );
        assert!(matches!(result, Err(CompressError::Cancelled)));
    }
}
