//! Quality tier to parameter mapping.

use crate::config::defaults::*;
use crate::error::PresetError;
use crate::model::{Overrides, QualityTier, ResolvedParameters};

/// Resolve a quality tier and optional overrides into concrete backend
/// parameters.
///
/// Pure function: the same (tier, overrides) pair always yields the same
/// parameters. Overrides win field by field over the tier defaults and are
/// range-checked here, before any backend is invoked, so a bad value never
/// reaches a subprocess command line.
pub fn resolve(
    tier: QualityTier,
    overrides: &Overrides,
) -> Result<ResolvedParameters, PresetError> {
    let mut params = tier_defaults(tier);

    if let Some(dpi) = overrides.max_dpi {
        if dpi == 0 {
            return Err(PresetError::InvalidDpi(dpi));
        }
        params.max_dpi = dpi;
    }

    if let Some(quality) = overrides.image_quality {
        if !(1..=100).contains(&quality) {
            return Err(PresetError::InvalidQuality(quality));
        }
        params.image_quality = quality;
    }

    Ok(params)
}

fn tier_defaults(tier: QualityTier) -> ResolvedParameters {
    match tier {
        QualityTier::High => ResolvedParameters {
            max_dpi: HIGH_MAX_DPI,
            image_quality: HIGH_IMAGE_QUALITY,
            downsample_images: true,
            lossy_recode: false,
            aggressive: false,
        },
        QualityTier::Medium => ResolvedParameters {
            max_dpi: MEDIUM_MAX_DPI,
            image_quality: MEDIUM_IMAGE_QUALITY,
            downsample_images: true,
            lossy_recode: true,
            aggressive: false,
        },
        QualityTier::Low => ResolvedParameters {
            max_dpi: LOW_MAX_DPI,
            image_quality: LOW_IMAGE_QUALITY,
            downsample_images: true,
            lossy_recode: true,
            aggressive: true,
        },
    }
}
