//! Backend adapters.
//!
//! One module per compression strategy behind a single `attempt` contract.
//! The backend set is closed and known at design time, so dispatch is a
//! plain match on `BackendKind` rather than trait objects.
//!
//! Adapters never touch the input file and never panic past their boundary:
//! every failure mode (spawn error, non-zero exit, timeout, cancellation,
//! parse error) folds into an `AttemptFailure`. Judging the candidate they
//! produce is the validator's job, not theirs.

pub mod builtin;
pub mod ghostscript;
pub mod qpdf;

use std::path::Path;
use std::time::Duration;

use crate::compress::exec::CancelToken;
use crate::model::{AttemptFailure, BackendDescriptor, BackendKind, ResolvedParameters};

/// Run one backend against `input`, writing the candidate to `scratch`.
pub fn attempt(
    descriptor: &BackendDescriptor,
    input: &Path,
    params: &ResolvedParameters,
    scratch: &Path,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<(), AttemptFailure> {
    match descriptor.kind {
        BackendKind::Ghostscript => {
            let program = descriptor.program.as_deref().unwrap_or("gs");
            ghostscript::attempt(program, input, params, scratch, timeout, cancel)
        }
        BackendKind::Qpdf => {
            let program = descriptor.program.as_deref().unwrap_or("qpdf");
            qpdf::attempt(program, input, params, scratch, timeout, cancel)
        }
        BackendKind::Builtin => builtin::attempt(input, scratch),
    }
}

pub(crate) fn failure_from_exec(
    program: &str,
    error: crate::compress::exec::ExecError,
) -> AttemptFailure {
    use crate::compress::exec::ExecError;
    match error {
        ExecError::Spawn(e) => AttemptFailure::Spawn {
            program: program.to_string(),
            message: e.to_string(),
        },
        ExecError::TimedOut(t) => AttemptFailure::TimedOut(t),
        ExecError::Cancelled => AttemptFailure::Cancelled,
        ExecError::Wait(e) => AttemptFailure::Internal(e.to_string()),
    }
}
