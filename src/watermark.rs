//! Coefficient-parity watermark embedding.
//!
//! Embeds one message bit per 8x8 luma block by forcing the rounded value
//! of the (row 1, col 0) transform coefficient to the bit's parity. The
//! message is base64-encoded before embedding so the recovered bit string
//! decodes unambiguously. Not cryptographically authenticated: lossy
//! re-encoding or resizing after embedding corrupts the payload.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::dct::{forward_8x8, inverse_8x8, BLOCK};
use crate::error::{Error, Result};

/// Default coefficient-adjustment magnitude.
pub const DEFAULT_ALPHA: i32 = 4;

/// Flat index of the parity-carrying coefficient (row 1, col 0).
const PARITY_COEFF: usize = BLOCK;

/// A successfully embedded watermark.
#[derive(Debug, Clone)]
pub struct EmbeddedWatermark {
    /// The watermarked image, re-encoded as lossless PNG.
    pub png: Vec<u8>,
    /// The base64 form of the message that was embedded.
    ///
    /// An extractor re-reading the coefficient parities recovers the bits
    /// of this string.
    pub message_b64: String,
}

/// A single float plane with row-major storage.
#[derive(Debug, Clone)]
struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    fn blocks_wide(&self) -> usize {
        self.width / BLOCK
    }

    fn blocks_tall(&self) -> usize {
        self.height / BLOCK
    }
}

/// BT.601 full-range RGB -> YCbCr, returning (luma, cb, cr) planes.
fn rgb_to_ycbcr(img: &RgbImage) -> (Plane, Plane, Plane) {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let mut y = Vec::with_capacity(width * height);
    let mut cb = Vec::with_capacity(width * height);
    let mut cr = Vec::with_capacity(width * height);

    for px in img.pixels() {
        let r = f32::from(px[0]);
        let g = f32::from(px[1]);
        let b = f32::from(px[2]);
        y.push(0.299 * r + 0.587 * g + 0.114 * b);
        cb.push(-0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0);
        cr.push(0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0);
    }

    let plane = |data| Plane {
        width,
        height,
        data,
    };
    (plane(y), plane(cb), plane(cr))
}

/// BT.601 full-range YCbCr -> RGB image, rounding each channel to u8.
fn ycbcr_to_rgb(y: &Plane, cb: &Plane, cr: &Plane) -> RgbImage {
    #[allow(clippy::cast_possible_truncation)]
    let (width, height) = (y.width as u32, y.height as u32);
    let mut img = RgbImage::new(width, height);
    for (x, yy, px) in img.enumerate_pixels_mut() {
        let (xi, yi) = (x as usize, yy as usize);
        let luma = y.at(xi, yi);
        let dcb = cb.at(xi, yi) - 128.0;
        let dcr = cr.at(xi, yi) - 128.0;
        let r = luma + 1.402 * dcr;
        let g = luma - 0.344_136 * dcb - 0.714_136 * dcr;
        let b = luma + 1.772 * dcb;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        *px = image::Rgb([to_u8(r), to_u8(g), to_u8(b)]);
    }
    img
}

/// Mirror an out-of-range coordinate back into `[0, n)` (reflect padding).
fn mirror(i: usize, n: usize) -> usize {
    if i < n {
        return i;
    }
    if n == 1 {
        return 0;
    }
    let period = 2 * n - 2;
    let r = i % period;
    if r < n {
        r
    } else {
        period - r
    }
}

/// Reflect-pad a plane so both dimensions are multiples of the block size.
fn pad_to_blocks(plane: &Plane) -> Plane {
    let pad_w = (BLOCK - plane.width % BLOCK) % BLOCK;
    let pad_h = (BLOCK - plane.height % BLOCK) % BLOCK;
    if pad_w == 0 && pad_h == 0 {
        return plane.clone();
    }

    let width = plane.width + pad_w;
    let height = plane.height + pad_h;
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        let sy = mirror(y, plane.height);
        for x in 0..width {
            data.push(plane.at(mirror(x, plane.width), sy));
        }
    }
    Plane {
        width,
        height,
        data,
    }
}

/// Crop a padded plane back to the given dimensions.
fn crop(plane: &Plane, width: usize, height: usize) -> Plane {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(plane.at(x, y));
        }
    }
    Plane {
        width,
        height,
        data,
    }
}

/// Base64-encode a message and expand it to its MSB-first bit string.
///
/// Returns the base64 form plus one `0`/`1` byte per bit (8 bits per
/// encoded character). An empty message yields an empty bit vector.
#[must_use]
pub fn message_bits(message: &str) -> (String, Vec<u8>) {
    let encoded = BASE64.encode(message.as_bytes());
    let mut bits = Vec::with_capacity(encoded.len() * 8);
    for byte in encoded.bytes() {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    (encoded, bits)
}

/// Effective parity step: mismatched parity needs an odd adjustment, so an
/// even magnitude is bumped by one.
fn parity_step(alpha: i32) -> i32 {
    if alpha % 2 == 0 {
        alpha + 1
    } else {
        alpha
    }
}

/// Embed bits into the padded luma plane, one per block in row-major order.
///
/// Stops when bits or blocks run out, whichever comes first.
fn embed_bits(plane: &mut Plane, bits: &[u8], alpha: i32) {
    let step = parity_step(alpha);
    let mut bit_idx = 0usize;

    'blocks: for br in 0..plane.blocks_tall() {
        for bc in 0..plane.blocks_wide() {
            if bit_idx >= bits.len() {
                break 'blocks;
            }
            let mut block = [0.0_f32; BLOCK * BLOCK];
            for r in 0..BLOCK {
                for c in 0..BLOCK {
                    block[r * BLOCK + c] = plane.at(bc * BLOCK + c, br * BLOCK + r);
                }
            }

            let mut coeffs = forward_8x8(&block);
            #[allow(clippy::cast_possible_truncation)]
            let rounded = coeffs[PARITY_COEFF].round() as i32;
            let bit = i32::from(bits[bit_idx]);
            if rounded.rem_euclid(2) != bit {
                let adjusted = if rounded >= 0 {
                    rounded + step
                } else {
                    rounded - step
                };
                #[allow(clippy::cast_precision_loss)]
                {
                    coeffs[PARITY_COEFF] = adjusted as f32;
                }
                let rebuilt = inverse_8x8(&coeffs);
                for r in 0..BLOCK {
                    for c in 0..BLOCK {
                        plane.set(bc * BLOCK + c, br * BLOCK + r, rebuilt[r * BLOCK + c]);
                    }
                }
            }
            bit_idx += 1;
        }
    }
}

/// Read back the first `count` coefficient parities from a padded plane.
fn read_bits(plane: &Plane, count: usize) -> Vec<u8> {
    let mut bits = Vec::with_capacity(count);
    'blocks: for br in 0..plane.blocks_tall() {
        for bc in 0..plane.blocks_wide() {
            if bits.len() >= count {
                break 'blocks;
            }
            let mut block = [0.0_f32; BLOCK * BLOCK];
            for r in 0..BLOCK {
                for c in 0..BLOCK {
                    block[r * BLOCK + c] = plane.at(bc * BLOCK + c, br * BLOCK + r);
                }
            }
            let coeffs = forward_8x8(&block);
            #[allow(clippy::cast_possible_truncation)]
            let rounded = coeffs[PARITY_COEFF].round() as i32;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            bits.push(rounded.rem_euclid(2) as u8);
        }
    }
    bits
}

/// Embed a message into the luma-channel transform coefficients of an image.
///
/// Decodes the input, converts to YCbCr, reflect-pads the luma plane to
/// 8-pixel multiples and writes the base64-encoded message's bits into the
/// per-block coefficient parities, truncating to the available block count.
/// The chroma planes pass through untouched and the result is re-encoded
/// as lossless PNG.
///
/// # Errors
///
/// - [`Error::Decode`] if the input bytes are not a decodable image.
/// - [`Error::WatermarkPrecondition`] if the message encodes to zero bits
///   or the host yields zero usable blocks.
/// - [`Error::Image`] if PNG re-encoding fails.
pub fn embed_watermark(image_bytes: &[u8], message: &str, alpha: i32) -> Result<EmbeddedWatermark> {
    let rgb = image::load_from_memory(image_bytes)
        .map_err(Error::Decode)?
        .to_rgb8();

    let (luma, cb, cr) = rgb_to_ycbcr(&rgb);
    let original_w = luma.width;
    let original_h = luma.height;

    let mut padded = pad_to_blocks(&luma);
    let capacity = padded.blocks_wide() * padded.blocks_tall();
    if capacity == 0 {
        return Err(Error::WatermarkPrecondition(
            "host image yields zero usable 8x8 blocks".to_string(),
        ));
    }

    let (message_b64, mut bits) = message_bits(message);
    bits.truncate(capacity);
    if bits.is_empty() {
        return Err(Error::WatermarkPrecondition(
            "message encodes to zero bits".to_string(),
        ));
    }

    embed_bits(&mut padded, &bits, alpha);

    let watermarked_luma = crop(&padded, original_w, original_h);
    let out_img = ycbcr_to_rgb(&watermarked_luma, &cb, &cr);

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(out_img)
        .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(EmbeddedWatermark { png, message_b64 })
}

/// Read back the first `count` embedded coefficient parities from an image.
///
/// Verification counterpart to [`embed_watermark`]: recomputes the luma
/// plane, applies the same padding and returns the rounded-coefficient
/// parities in block order. A full extractor (parity bits back to message
/// text) is out of scope.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the input bytes are not a decodable image.
pub fn recover_bits(image_bytes: &[u8], count: usize) -> Result<Vec<u8>> {
    let rgb = image::load_from_memory(image_bytes)
        .map_err(Error::Decode)?
        .to_rgb8();
    let (luma, _, _) = rgb_to_ycbcr(&rgb);
    let padded = pad_to_blocks(&luma);
    Ok(read_bits(&padded, count))
}
