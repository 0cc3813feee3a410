use clap::ValueEnum;
use std::path::PathBuf;

/// Named quality preset controlling the aggressiveness/fidelity tradeoff.
///
/// Maps to Ghostscript's distiller presets: High is roughly `/printer`,
/// Medium `/ebook`, Low `/screen`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum, Default)]
pub enum QualityTier {
    /// 300 dpi images, lossless stream recompression only
    High,
    /// 150 dpi images, lossy image recode allowed
    #[default]
    Medium,
    /// 96 dpi images, aggressive lossy recompression
    Low,
}

/// Explicit per-request overrides of the tier defaults.
///
/// Each field that is set wins over the corresponding tier value.
/// Out-of-range values are rejected when parameters are resolved,
/// before any backend runs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Cap on image resolution in DPI (must be 1 or greater)
    pub max_dpi: Option<u32>,
    /// JPEG quality for lossy image recoding (1-100)
    pub image_quality: Option<u8>,
}

/// One compression job: an input PDF, where the result goes, and how
/// aggressively to compress it. Immutable once constructed.
#[derive(Clone, Debug)]
pub struct CompressionRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub tier: QualityTier,
    pub overrides: Overrides,
    pub use_ghostscript: bool,
    pub use_qpdf: bool,
    /// Allow the built-in lossless backend as a last resort
    pub allow_fallback: bool,
}

impl CompressionRequest {
    /// Create a request with all backends enabled and no overrides.
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        tier: QualityTier,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            tier,
            overrides: Overrides::default(),
            use_ghostscript: true,
            use_qpdf: true,
            allow_fallback: true,
        }
    }
}
