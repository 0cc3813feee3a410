use clap::Parser;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::defaults::{DEFAULT_BACKEND_TIMEOUT_SECS, OUTPUT_SUFFIX};
use crate::error::ConfigError;
use crate::model::QualityTier;

#[derive(Parser, Debug)]
#[command(name = "pdf-squash")]
#[command(
    author,
    version,
    about = "Shrink PDF files with Ghostscript, qpdf, or a built-in lossless fallback"
)]
pub struct Args {
    /// Input PDF files or directories (directories are searched recursively)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file (single input) or directory (defaults to
    /// <input>_compressed.pdf next to each input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Compression quality tier
    #[arg(short = 'q', long, value_enum, default_value = "medium")]
    pub quality: QualityTier,

    /// Override the image DPI cap for the chosen tier
    #[arg(long)]
    pub max_dpi: Option<u32>,

    /// Override the JPEG quality (1-100) for the chosen tier
    #[arg(long)]
    pub image_quality: Option<u8>,

    /// Do not use Ghostscript even if installed
    #[arg(long)]
    pub no_ghostscript: bool,

    /// Do not use qpdf even if installed
    #[arg(long)]
    pub no_qpdf: bool,

    /// Do not fall back to the built-in lossless compressor
    #[arg(long)]
    pub no_fallback: bool,

    /// Number of files to process in parallel (defaults to CPU count)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Per-backend timeout in seconds
    #[arg(long, default_value_t = DEFAULT_BACKEND_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn use_ghostscript(&self) -> bool {
        !self.no_ghostscript
    }

    pub fn use_qpdf(&self) -> bool {
        !self.no_qpdf
    }

    pub fn allow_fallback(&self) -> bool {
        !self.no_fallback
    }

    /// Default output path for one input: same directory, stem suffixed
    /// with "_compressed".
    pub fn default_output_for(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.pdf"))
    }

    /// Expand the input arguments to a flat list of PDF files.
    ///
    /// Files are taken as-is; directories are walked recursively and any
    /// file with a .pdf extension is picked up, sorted for a stable order.
    pub fn collect_inputs(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files = Vec::new();

        for input in &self.inputs {
            if input.is_file() {
                files.push(input.clone());
            } else if input.is_dir() {
                let mut found: Vec<PathBuf> = WalkDir::new(input)
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .filter(|path| is_pdf_path(path))
                    .collect();
                if found.is_empty() {
                    return Err(ConfigError::EmptyDirectory(input.clone()));
                }
                found.sort();
                files.extend(found);
            } else {
                return Err(ConfigError::MissingInput(input.clone()));
            }
        }

        Ok(files)
    }
}

fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_output_name() {
        let out = Args::default_output_for(Path::new("/tmp/report.pdf"));
        assert_eq!(out, PathBuf::from("/tmp/report_compressed.pdf"));
    }

    #[test]
    fn test_default_output_keeps_directory() {
        let out = Args::default_output_for(Path::new("docs/scan.PDF"));
        assert_eq!(out, PathBuf::from("docs/scan_compressed.pdf"));
    }

    #[test]
    fn test_pdf_extension_case_insensitive() {
        assert!(is_pdf_path(Path::new("a.pdf")));
        assert!(is_pdf_path(Path::new("a.PDF")));
        assert!(!is_pdf_path(Path::new("a.txt")));
        assert!(!is_pdf_path(Path::new("pdf")));
    }

    #[test]
    fn test_collect_inputs_expands_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"x").unwrap();
        fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let args = Args::parse_from(["pdf-squash", dir.path().to_str().unwrap()]);
        let inputs = args.collect_inputs().unwrap();

        assert_eq!(inputs.len(), 2);
        assert!(inputs[0].ends_with("a.pdf"));
        assert!(inputs[1].ends_with("b.pdf"));
    }

    #[test]
    fn test_collect_inputs_missing_path() {
        let args = Args::parse_from(["pdf-squash", "/no/such/file.pdf"]);
        assert!(matches!(
            args.collect_inputs(),
            Err(ConfigError::MissingInput(_))
        ));
    }

    #[test]
    fn test_backend_toggles() {
        let args = Args::parse_from(["pdf-squash", "--no-qpdf", "in.pdf"]);
        assert!(args.use_ghostscript());
        assert!(!args.use_qpdf());
        assert!(args.allow_fallback());
    }
}
