//! Batch coordination.
//!
//! Files in a batch are independent, so they run on a bounded worker pool.
//! Within one file, backend attempts stay strictly sequential (see the
//! orchestrator). Results are slotted by request index, so reporting order
//! always matches input order no matter which worker finished first.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::exec::CancelToken;
use super::orchestrator;
use crate::config::Settings;
use crate::error::CompressError;
use crate::model::{BackendSet, BatchEntry, BatchResult, CompressionOutcome, CompressionRequest};

/// Run every request to completion and report one outcome per request.
///
/// A corrupt or failing input never aborts its siblings: its entry carries
/// the error or failure status and the rest of the batch proceeds.
pub fn compress_batch(
    requests: Vec<CompressionRequest>,
    backends: &BackendSet,
    settings: &Settings,
) -> BatchResult {
    compress_batch_with_cancel(requests, backends, settings, &CancelToken::new())
}

/// Same as [`compress_batch`] with a caller-held cancellation token.
///
/// Once the token fires, no new request is started and in-flight backend
/// subprocesses are terminated rather than abandoned. Requests that never
/// started still get an entry (a `Cancelled` error) so the result stays 1:1
/// with the input list.
pub fn compress_batch_with_cancel(
    requests: Vec<CompressionRequest>,
    backends: &BackendSet,
    settings: &Settings,
    cancel: &CancelToken,
) -> BatchResult {
    let total = requests.len();
    if total == 0 {
        return BatchResult::default();
    }

    let workers = settings.worker_count(total);
    log::info!("Processing {} file(s) with {} worker(s)", total, workers);

    let next = AtomicUsize::new(0);
    let mut slots: Vec<Option<Result<CompressionOutcome, CompressError>>> =
        (0..total).map(|_| None).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let requests = &requests;
                let next = &next;
                scope.spawn(move || {
                    let mut completed = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        if index >= total {
                            break;
                        }
                        let outcome = if cancel.is_cancelled() {
                            Err(CompressError::Cancelled)
                        } else {
                            orchestrator::compress_one_cancellable(
                                &requests[index],
                                backends,
                                settings,
                                cancel,
                            )
                        };
                        completed.push((index, outcome));
                    }
                    completed
                })
            })
            .collect();

        for handle in handles {
            let completed = handle.join().expect("batch worker panicked");
            for (index, outcome) in completed {
                slots[index] = Some(outcome);
            }
        }
    });

    let entries = requests
        .into_iter()
        .zip(slots)
        .map(|(request, outcome)| BatchEntry {
            input: request.input,
            // Every index below `total` was claimed by exactly one worker
            outcome: outcome.expect("batch slot left unfilled"),
        })
        .collect();

    BatchResult::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BackendDescriptor, BackendKind, OutcomeStatus, QualityTier};
    use std::fs;

    fn none_available() -> BackendSet {
        BackendSet::new(
            BackendKind::ALL
                .into_iter()
                .map(BackendDescriptor::unavailable)
                .collect(),
        )
    }

    fn request_for(dir: &std::path::Path, name: &str, body: &[u8]) -> CompressionRequest {
        let input = dir.join(name);
        fs::write(&input, body).unwrap();
        let output = dir.join(format!("{name}.out"));
        CompressionRequest::new(input, output, QualityTier::Medium)
    }

    #[test]
    fn test_empty_batch() {
        let result = compress_batch(Vec::new(), &none_available(), &Settings::default());
        assert!(result.is_empty());
    }

    #[test]
    fn test_batch_preserves_order_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let requests = vec![
            request_for(dir.path(), "a.pdf", b"%PDF-1.4 content\n%%EOF"),
            request_for(dir.path(), "b.pdf", b"garbage, not a pdf"),
            request_for(dir.path(), "c.pdf", b"%PDF-1.4 content\n%%EOF"),
        ];
        let inputs: Vec<_> = requests.iter().map(|r| r.input.clone()).collect();

        let result = compress_batch(requests, &none_available(), &Settings::default());

        assert_eq!(result.len(), 3);
        let entries: Vec<_> = result.iter().collect();
        for (entry, expected) in entries.iter().zip(&inputs) {
            assert_eq!(&entry.input, expected);
        }
        assert_eq!(
            entries[0].outcome.as_ref().unwrap().status,
            OutcomeStatus::AllBackendsFailed
        );
        assert_eq!(
            entries[1].outcome.as_ref().unwrap().status,
            OutcomeStatus::InvalidInput
        );
        assert_eq!(
            entries[2].outcome.as_ref().unwrap().status,
            OutcomeStatus::AllBackendsFailed
        );
    }

    #[test]
    fn test_cancelled_batch_still_yields_full_result_set() {
        let dir = tempfile::tempdir().unwrap();
        let requests = vec![
            request_for(dir.path(), "a.pdf", b"%PDF-1.4 content\n%%EOF"),
            request_for(dir.path(), "b.pdf", b"%PDF-1.4 content\n%%EOF"),
        ];

        let cancel = CancelToken::new();
        cancel.cancel();

        let result = compress_batch_with_cancel(
            requests,
            &none_available(),
            &Settings::default(),
            &cancel,
        );

        assert_eq!(result.len(), 2);
        for entry in result.iter() {
            assert!(matches!(entry.outcome, Err(CompressError::Cancelled)));
        }
    }
}
