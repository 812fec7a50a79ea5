//! Resample-discrepancy detection (RDR).
//!
//! Text crafted to dodge recognition (rendered at a specific scale or
//! antialiasing, or conversely readable only after a particular transform)
//! is inconsistently detectable under benign geometric perturbation. RDR
//! resamples the image a few times at random scales and interpolation
//! methods and measures how consistently suspicious text survives.

use image::imageops::FilterType;
use image::DynamicImage;
use rand::Rng;

use crate::ocr::{contains_keyword, TextRecognizer};

/// Interpolation methods drawn uniformly per trial.
const FILTERS: [FilterType; 3] = [FilterType::Nearest, FilterType::Triangle, FilterType::CatmullRom];

/// Consistency fraction below which suspicious text is considered fragile.
const FRAGILE_FRACTION: f32 = 0.7;

/// Configuration for the resample trials.
#[derive(Debug, Clone)]
pub struct RdrConfig {
    /// Number of independent resample trials.
    pub trials: u32,
    /// Lower bound of the uniform scale factor.
    pub min_scale: f32,
    /// Upper bound of the uniform scale factor.
    pub max_scale: f32,
    /// Minimum resized dimension, in pixels.
    pub min_side: u32,
}

impl Default for RdrConfig {
    fn default() -> Self {
        Self {
            trials: 5,
            min_scale: 0.6,
            max_scale: 1.3,
            min_side: 32,
        }
    }
}

/// Aggregate outcome of the resample trials.
#[derive(Debug, Clone, Default)]
pub struct RdrOutcome {
    /// Discrepancy score in `[0, 1]`.
    pub score: f32,
    /// Suspicious texts actually observed across trials.
    pub examples: Vec<String>,
}

/// Run the resample trials and score suspicious-text consistency.
///
/// Each trial resizes the image by a random factor with a random
/// interpolation method and runs plain-text recognition on the result.
/// A trial that fails or returns no text is excluded from the denominator.
///
/// Let `frac` be the fraction of text-bearing trials whose text matched a
/// suspicious keyword:
/// - `frac == 0` (or no trial returned text): score 0
/// - `0 < frac < 0.7`: score `0.5 + 0.5*(1 - frac)`; low-but-nonzero
///   consistency is the *most* suspicious case, indicating deliberately
///   fragile text
/// - `frac >= 0.7`: score `0.4 * frac`; robustly consistent suspicious
///   text, flagged but less alarming
///
/// Trials are order-insensitive; the randomness source is injected so tests
/// can pin deterministic sequences.
pub fn resample_discrepancy<R: Rng>(
    image: &DynamicImage,
    recognizer: &dyn TextRecognizer,
    config: &RdrConfig,
    rng: &mut R,
) -> RdrOutcome {
    let mut texts = Vec::new();

    for _ in 0..config.trials {
        let scale = rng.gen_range(config.min_scale..config.max_scale);
        let filter = FILTERS[rng.gen_range(0..FILTERS.len())];

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let new_w = (image.width() as f32 * scale).floor().max(0.0) as u32;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let new_h = (image.height() as f32 * scale).floor().max(0.0) as u32;
        let resized =
            image.resize_exact(new_w.max(config.min_side), new_h.max(config.min_side), filter);

        // A failed trial is excluded from the denominator, not propagated.
        if let Ok(text) = recognizer.recognize_plain(&resized) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                texts.push(trimmed.to_string());
            }
        }
    }

    if texts.is_empty() {
        return RdrOutcome::default();
    }

    let suspicious: Vec<String> = texts
        .iter()
        .filter(|t| contains_keyword(t))
        .cloned()
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let frac = suspicious.len() as f32 / texts.len() as f32;

    let score = if suspicious.is_empty() {
        0.0
    } else if frac < FRAGILE_FRACTION {
        0.5 + 0.5 * (1.0 - frac)
    } else {
        0.4 * frac
    };

    RdrOutcome {
        score,
        examples: suspicious,
    }
}
