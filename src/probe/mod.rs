//! Backend detection.
//!
//! Each external tool is probed with a short version query under a hard
//! timeout; a missing or unresponsive tool is a normal outcome recorded as
//! `available: false`, never an error. Results are cached for the process
//! lifetime so a batch run sees one consistent backend set; `refresh_backends`
//! forces re-detection between batches.

use std::process::Command;
use std::sync::Mutex;
use std::time::Duration;

use crate::compress::exec::{run_with_timeout, ExecError};
use crate::config::defaults::PROBE_TIMEOUT_SECS;
use crate::model::{BackendDescriptor, BackendKind, BackendSet};

static CACHE: Mutex<Option<BackendSet>> = Mutex::new(None);

/// Candidate executable names for Ghostscript, most specific first.
/// Windows installs name the console binary by word size.
#[cfg(windows)]
const GHOSTSCRIPT_PROGRAMS: &[&str] = &["gswin64c", "gswin32c", "gs"];
#[cfg(not(windows))]
const GHOSTSCRIPT_PROGRAMS: &[&str] = &["gs"];

const QPDF_PROGRAMS: &[&str] = &["qpdf"];

/// Probed backend set, computed once per process and then served from cache.
pub fn probe_backends() -> BackendSet {
    let mut cache = CACHE.lock().expect("probe cache lock poisoned");
    if let Some(set) = cache.as_ref() {
        return set.clone();
    }
    let set = probe();
    *cache = Some(set.clone());
    set
}

/// Drop the cached result and probe again. Must not be called while a batch
/// is running against the previous set.
pub fn refresh_backends() -> BackendSet {
    let set = probe();
    let mut cache = CACHE.lock().expect("probe cache lock poisoned");
    *cache = Some(set.clone());
    set
}

/// Uncached detection pass over every known backend.
pub fn probe() -> BackendSet {
    BackendSet::new(vec![
        detect_external(BackendKind::Ghostscript, GHOSTSCRIPT_PROGRAMS),
        detect_external(BackendKind::Qpdf, QPDF_PROGRAMS),
        builtin_descriptor(),
    ])
}

fn builtin_descriptor() -> BackendDescriptor {
    BackendDescriptor {
        kind: BackendKind::Builtin,
        available: true,
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        program: None,
    }
}

fn detect_external(kind: BackendKind, programs: &[&str]) -> BackendDescriptor {
    let timeout = Duration::from_secs(PROBE_TIMEOUT_SECS);

    for program in programs {
        let mut cmd = Command::new(program);
        cmd.arg("--version");

        match run_with_timeout(&mut cmd, timeout, None) {
            Ok(output) if output.status.success() => {
                let version = output
                    .stdout
                    .lines()
                    .next()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from);
                log::debug!(
                    "Found {} as '{}' ({})",
                    kind,
                    program,
                    version.as_deref().unwrap_or("unknown version")
                );
                return BackendDescriptor {
                    kind,
                    available: true,
                    version,
                    program: Some((*program).to_string()),
                };
            }
            Ok(output) => {
                log::debug!(
                    "{} '{}' exited with {} during probe",
                    kind,
                    program,
                    output.status
                );
            }
            Err(ExecError::TimedOut(t)) => {
                log::warn!("{} '{}' did not answer a version query within {:?}", kind, program, t);
            }
            Err(e) => {
                log::debug!("{} '{}' not usable: {}", kind, program, e);
            }
        }
    }

    BackendDescriptor::unavailable(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_always_lists_every_backend() {
        let set = probe();
        for kind in BackendKind::ALL {
            assert!(set.get(kind).is_some(), "{} missing from probe result", kind);
        }
    }

    #[test]
    fn test_builtin_always_available() {
        let set = probe();
        assert!(set.is_available(BackendKind::Builtin));
        assert!(set.get(BackendKind::Builtin).unwrap().program.is_none());
    }

    #[test]
    fn test_missing_tool_is_not_an_error() {
        let descriptor = detect_external(BackendKind::Qpdf, &["no-such-tool-pdfsq"]);
        assert!(!descriptor.available);
        assert!(descriptor.version.is_none());
    }

    #[test]
    fn test_cache_is_stable() {
        let first = probe_backends();
        let second = probe_backends();
        assert_eq!(first.iter().count(), second.iter().count());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.available, b.available);
        }
    }
}
