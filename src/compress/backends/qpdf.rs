//! qpdf adapter.
//!
//! Structural recompression: re-deflates stream data and packs objects into
//! object streams. Safer than Ghostscript (never touches image pixels) with
//! correspondingly smaller size reductions.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use super::failure_from_exec;
use crate::compress::exec::{run_with_timeout, CancelToken};
use crate::model::{AttemptFailure, ResolvedParameters};

/// qpdf reserves exit code 3 for "succeeded with warnings"; the output file
/// is still written and usable.
const EXIT_WITH_WARNINGS: i32 = 3;

pub fn attempt(
    program: &str,
    input: &Path,
    params: &ResolvedParameters,
    scratch: &Path,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<(), AttemptFailure> {
    let mut cmd = Command::new(program);
    cmd.args([
        "--compress-streams=y",
        "--recompress-flate",
        "--compression-level=9",
        "--object-streams=generate",
    ]);

    if params.aggressive {
        // Merging per-page content arrays lets more data share one stream
        cmd.arg("--coalesce-contents");
    }

    cmd.arg(input);
    cmd.arg(scratch);

    log::debug!("Running qpdf: {:?}", cmd);

    let output =
        run_with_timeout(&mut cmd, timeout, Some(cancel)).map_err(|e| failure_from_exec(program, e))?;

    match output.status.code() {
        Some(0) => Ok(()),
        Some(EXIT_WITH_WARNINGS) => {
            log::warn!(
                "qpdf finished with warnings on {}: {}",
                input.display(),
                output.stderr.trim()
            );
            Ok(())
        }
        code => Err(AttemptFailure::NonZeroExit {
            code,
            stderr: output.stderr.trim().to_string(),
        }),
    }
}
