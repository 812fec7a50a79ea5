//! Statistical analyzers for steganography screening.
//!
//! Three pixel-domain scores computed from the grayscale plane:
//! 1. **Global entropy**: Shannon entropy of the 256-bin intensity histogram
//! 2. **LSB entropy**: binary entropy of the least-significant-bit plane
//! 3. **Blockiness**: discontinuity at the 8-pixel JPEG block grid

use image::GrayImage;

/// Guard against `log2(0)` on degenerate probability values.
const LOG_EPSILON: f32 = 1e-12;

/// Normalization floor for the blockiness denominator.
const MAD_EPSILON: f32 = 1e-6;

/// Shannon entropy of the intensity histogram, in bits.
///
/// Builds a 256-bin histogram, normalizes to probabilities and sums
/// `-p * log2(p)` over the non-empty bins. Range `[0, 8]`.
#[must_use]
pub fn global_entropy(gray: &GrayImage) -> f32 {
    let mut hist = [0u64; 256];
    for px in gray.pixels() {
        hist[px[0] as usize] += 1;
    }
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let total = total as f32;

    hist.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f32 / total;
            -p * (p + LOG_EPSILON).log2()
        })
        .sum()
}

/// Binary entropy of the least-significant-bit plane.
///
/// Let `p1` be the fraction of pixels whose LSB is set. Returns
/// `-p1*log2(p1) - (1-p1)*log2(1-p1)`, and exactly `0.0` when `p1` is
/// 0 or 1 (a uniform LSB plane carries no hidden information).
///
/// Genuine images have skewed LSB distributions; LSB-substitution
/// embedding pushes `p1` toward 0.5 and this score toward 1.
#[must_use]
pub fn lsb_entropy(gray: &GrayImage) -> f32 {
    let total = u64::from(gray.width()) * u64::from(gray.height());
    if total == 0 {
        return 0.0;
    }
    let ones = gray.pixels().filter(|px| px[0] & 1 == 1).count() as u64;
    #[allow(clippy::cast_precision_loss)]
    let p1 = ones as f32 / total as f32;
    if p1 == 0.0 || p1 == 1.0 {
        return 0.0;
    }
    -(p1 * p1.log2() + (1.0 - p1) * (1.0 - p1).log2())
}

/// Discontinuity at the 8-pixel block grid, normalized by image contrast.
///
/// Measures the mean absolute pixel difference across every 8th column and
/// row boundary (the JPEG block grid), divided by the image's overall mean
/// absolute deviation from its mean. DCT-domain tampering or re-compression
/// disturbs block-boundary continuity and raises this score.
///
/// Returns exactly `0.0` when either dimension is below 16 pixels
/// (not enough blocks to measure).
#[must_use]
pub fn blockiness(gray: &GrayImage) -> f32 {
    let w = gray.width();
    let h = gray.height();
    if w < 16 || h < 16 {
        return 0.0;
    }

    let at = |x: u32, y: u32| f32::from(gray.get_pixel(x, y)[0]);

    let mut boundary_diffs = Vec::new();
    for x in (8..w).step_by(8) {
        let mut sum = 0.0_f32;
        for y in 0..h {
            sum += (at(x, y) - at(x - 1, y)).abs();
        }
        #[allow(clippy::cast_precision_loss)]
        boundary_diffs.push(sum / h as f32);
    }
    for y in (8..h).step_by(8) {
        let mut sum = 0.0_f32;
        for x in 0..w {
            sum += (at(x, y) - at(x, y - 1)).abs();
        }
        #[allow(clippy::cast_precision_loss)]
        boundary_diffs.push(sum / w as f32);
    }
    if boundary_diffs.is_empty() {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = (u64::from(w) * u64::from(h)) as f32;
    let mean = gray.pixels().map(|px| f32::from(px[0])).sum::<f32>() / n;
    let mad = gray.pixels().map(|px| (f32::from(px[0]) - mean).abs()).sum::<f32>() / n;

    #[allow(clippy::cast_precision_loss)]
    let boundary_mean = boundary_diffs.iter().sum::<f32>() / boundary_diffs.len() as f32;
    boundary_mean / (mad + MAD_EPSILON)
}
