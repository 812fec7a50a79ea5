//! Orthonormal 8x8 block transform.
//!
//! Forward and inverse DCT-II applied independently to 8x8 pixel blocks,
//! matching the transform used by block-based compression schemes. The
//! orthonormal scaling makes `inverse(forward(x)) == x` in exact arithmetic.

use std::f32::consts::PI;

/// Block side length in pixels.
pub const BLOCK: usize = 8;

fn scale(u: usize) -> f32 {
    if u == 0 {
        1.0 / std::f32::consts::SQRT_2
    } else {
        1.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn basis(u: usize, x: usize) -> f32 {
    ((2.0 * x as f32 + 1.0) * u as f32 * PI / 16.0).cos()
}

/// Forward DCT-II of one 8x8 block in row-major order.
///
/// Output index `u * 8 + v` holds the coefficient for vertical frequency
/// `u` and horizontal frequency `v`; index 0 is the DC term.
#[must_use]
pub fn forward_8x8(block: &[f32; BLOCK * BLOCK]) -> [f32; BLOCK * BLOCK] {
    let mut out = [0.0_f32; BLOCK * BLOCK];
    for u in 0..BLOCK {
        for v in 0..BLOCK {
            let mut sum = 0.0_f32;
            for r in 0..BLOCK {
                for c in 0..BLOCK {
                    sum += block[r * BLOCK + c] * basis(u, r) * basis(v, c);
                }
            }
            out[u * BLOCK + v] = 0.25 * scale(u) * scale(v) * sum;
        }
    }
    out
}

/// Inverse DCT-II of one 8x8 coefficient block in row-major order.
#[must_use]
pub fn inverse_8x8(coeffs: &[f32; BLOCK * BLOCK]) -> [f32; BLOCK * BLOCK] {
    let mut out = [0.0_f32; BLOCK * BLOCK];
    for r in 0..BLOCK {
        for c in 0..BLOCK {
            let mut sum = 0.0_f32;
            for u in 0..BLOCK {
                for v in 0..BLOCK {
                    sum += scale(u) * scale(v) * coeffs[u * BLOCK + v] * basis(u, r) * basis(v, c);
                }
            }
            out[r * BLOCK + c] = 0.25 * sum;
        }
    }
    out
}
