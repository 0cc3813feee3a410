use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use pdf_squash::cli::Args;
use pdf_squash::config::Settings;
use pdf_squash::model::{BackendKind, BatchEntry, CompressionRequest, OutcomeStatus};
use pdf_squash::{compress_batch, probe_backends};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let inputs = args
        .collect_inputs()
        .with_context(|| "Failed to collect input files")?;

    log::info!("Found {} input file(s)", inputs.len());

    let backends = probe_backends();
    for descriptor in backends.iter() {
        log::info!(
            "Backend {}: {}",
            descriptor.kind,
            if descriptor.available {
                descriptor.version.as_deref().unwrap_or("available")
            } else {
                "not found"
            }
        );
    }
    if args.use_ghostscript() && !backends.is_available(BackendKind::Ghostscript) {
        log::warn!(
            "Ghostscript not found; image downsampling is unavailable \
             (install it from ghostscript.com/releases for best results)"
        );
    }

    let requests = build_requests(&args, inputs)?;

    let settings = Settings::from_args(&args);
    let result = compress_batch(requests, &settings);

    for entry in result.iter() {
        report_entry(entry);
    }

    let failures = result.failure_count();
    if failures > 0 {
        anyhow::bail!("{} of {} file(s) failed", failures, result.len());
    }

    Ok(())
}

fn build_requests(args: &Args, inputs: Vec<PathBuf>) -> Result<Vec<CompressionRequest>> {
    let single_input = inputs.len() == 1;
    let output_dir = match &args.output {
        Some(path) if !single_input => {
            if !path.is_dir() {
                return Err(pdf_squash::ConfigError::OutputNotDirectory.into());
            }
            Some(path.clone())
        }
        _ => None,
    };

    let mut requests = Vec::with_capacity(inputs.len());
    for input in inputs {
        let output = if let Some(dir) = &output_dir {
            let name = input
                .file_name()
                .with_context(|| format!("Input has no file name: {}", input.display()))?;
            dir.join(name)
        } else if single_input {
            args.output
                .clone()
                .unwrap_or_else(|| Args::default_output_for(&input))
        } else {
            Args::default_output_for(&input)
        };

        if output == input {
            anyhow::bail!(
                "Refusing to overwrite {} in place; pick a different output",
                input.display()
            );
        }

        let mut request = CompressionRequest::new(input, output, args.quality);
        request.overrides.max_dpi = args.max_dpi;
        request.overrides.image_quality = args.image_quality;
        request.use_ghostscript = args.use_ghostscript();
        request.use_qpdf = args.use_qpdf();
        request.allow_fallback = args.allow_fallback();
        requests.push(request);
    }

    Ok(requests)
}

fn report_entry(entry: &BatchEntry) {
    let input = entry.input.display();
    match &entry.outcome {
        Ok(outcome) => match outcome.status {
            OutcomeStatus::Success => {
                let backend = outcome
                    .winning_attempt()
                    .map(|a| a.backend.name())
                    .unwrap_or("unknown");
                println!(
                    "{}: {} -> {} ({:.1}% smaller, via {})",
                    input,
                    format_size(outcome.original_size),
                    format_size(outcome.final_size),
                    outcome.reduction_percent(),
                    backend
                );
            }
            OutcomeStatus::NoImprovement => {
                println!(
                    "{}: already compact at {}, left unchanged",
                    input,
                    format_size(outcome.original_size)
                );
            }
            OutcomeStatus::InvalidInput => {
                eprintln!("{}: not a readable PDF, skipped", input);
            }
            OutcomeStatus::AllBackendsFailed => {
                eprintln!("{}: every compression backend failed", input);
            }
        },
        Err(e) => {
            eprintln!("{}: {}", input, e);
        }
    }
}

fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    const KB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes >= MB {
        format!("{:.2} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{bytes:.0} B")
    }
}
