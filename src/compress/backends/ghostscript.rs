//! Ghostscript adapter.
//!
//! Rewrites the whole document through the pdfwrite device. Highest
//! compression potential of the three backends and the highest risk of
//! visual degradation at the Low tier.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use super::failure_from_exec;
use crate::compress::exec::{run_with_timeout, CancelToken};
use crate::model::{AttemptFailure, ResolvedParameters};

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
        "-sDEVICE=pdfwrite",
        "-dCompatibilityLevel=1.4",
        "-dNOPAUSE",
        "-dQUIET",
        "-dBATCH",
        "-dSAFER",
        "-dAutoRotatePages=/None",
    ]);
    cmd.arg(format!("-dPDFSETTINGS={}", distiller_preset(params)));

    if params.downsample_images {
        cmd.args([
            "-dDownsampleColorImages=true",
            "-dDownsampleGrayImages=true",
            "-dDownsampleMonoImages=true",
            "-dColorImageDownsampleType=/Bicubic",
            "-dGrayImageDownsampleType=/Bicubic",
            "-dMonoImageDownsampleType=/Subsample",
        ]);
        cmd.arg(format!("-dColorImageResolution={}", params.max_dpi));
        cmd.arg(format!("-dGrayImageResolution={}", params.max_dpi));
        cmd.arg(format!("-dMonoImageResolution={}", params.max_dpi));
    }

    cmd.arg(format!("-sOutputFile={}", scratch.display()));

    if params.lossy_recode {
        // JPEG quality goes in through distiller params; -dJPEGQ only
        // applies to raster devices, not pdfwrite.
        cmd.arg("-c");
        cmd.arg(format!(
            "<< /ColorACSImageDict << /QFactor {:.2} /Blend 1 /HSamples [1 1 1 1] /VSamples [1 1 1 1] >> >> setdistillerparams",
            q_factor(params.image_quality)
        ));
        cmd.arg("-f");
    }

    cmd.arg(input);

    log::debug!("Running ghostscript: {:?}", cmd);

    let output =
        run_with_timeout(&mut cmd, timeout, Some(cancel)).map_err(|e| failure_from_exec(program, e))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(AttemptFailure::NonZeroExit {
            code: output.status.code(),
            stderr: trim_diagnostic(&output.stderr),
        })
    }
}

/// The distiller preset closest to the resolved parameters. The explicit
/// resolution flags above override whatever the preset would pick.
fn distiller_preset(params: &ResolvedParameters) -> &'static str {
    if params.aggressive {
        "/screen"
    } else if params.lossy_recode {
        "/ebook"
    } else {
        "/printer"
    }
}

/// Map a 1-100 quality to a distiller QFactor (lower is better quality).
fn q_factor(quality: u8) -> f32 {
    ((100 - quality.min(100)) as f32 / 50.0 + 0.1).clamp(0.1, 2.4)
}

fn trim_diagnostic(stderr: &str) -> String {
    // Ghostscript can be extremely chatty on broken files
    const MAX: usize = 2000;
    let trimmed = stderr.trim();
    if trimmed.len() <= MAX {
        return trimmed.to_string();
    }
    let mut end = MAX;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_follows_parameters() {
        let mut params = ResolvedParameters {
            max_dpi: 300,
            image_quality: 90,
            downsample_images: true,
            lossy_recode: false,
            aggressive: false,
        };
        assert_eq!(distiller_preset(&params), "/printer");

        params.lossy_recode = true;
        assert_eq!(distiller_preset(&params), "/ebook");

        params.aggressive = true;
        assert_eq!(distiller_preset(&params), "/screen");
    }

    #[test]
    fn test_q_factor_monotonic() {
        assert!(q_factor(90) < q_factor(75));
        assert!(q_factor(75) < q_factor(50));
        assert!(q_factor(1) <= 2.4);
        assert!(q_factor(100) >= 0.1);
    }
}
