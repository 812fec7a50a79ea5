//! Text recognition interface and keyword extraction.
//!
//! The recognition engine itself is a black box behind [`TextRecognizer`]:
//! any backend that can report per-region strings with bounding boxes
//! satisfies the contract. This module owns the suspicious-keyword matching
//! applied to whatever the backend returns.

use image::DynamicImage;

use crate::error::Result;

/// Keywords whose presence in recognized text marks a region as suspicious.
///
/// Matched case-insensitively as substrings.
pub const SUSPICIOUS_KEYWORDS: [&str; 9] = [
    "ignore",
    "download",
    "secret",
    "password",
    "execute",
    "run",
    "open",
    "leak",
    "exfiltrate",
];

/// One recognized text region with its bounding box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRegion {
    /// The recognized text.
    pub text: String,
    /// Left edge of the bounding box, in pixels.
    pub left: u32,
    /// Top edge of the bounding box, in pixels.
    pub top: u32,
    /// Width of the bounding box, in pixels.
    pub width: u32,
    /// Height of the bounding box, in pixels.
    pub height: u32,
}

/// A pluggable text-recognition backend.
///
/// Implementations must tolerate arbitrarily resized or degenerate images
/// and fail cleanly with [`crate::Error::Recognition`] rather than panic:
/// the analysis pipeline treats a failed call as "no text recognized".
pub trait TextRecognizer: Send + Sync {
    /// Recognize text regions with bounding boxes in one image.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Recognition`] if the backend fails.
    fn recognize_regions(&self, image: &DynamicImage) -> Result<Vec<OcrRegion>>;

    /// Recognize concatenated plain text with no layout information.
    ///
    /// The default implementation joins the region texts with spaces.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Recognition`] if the backend fails.
    fn recognize_plain(&self, image: &DynamicImage) -> Result<String> {
        let regions = self.recognize_regions(image)?;
        Ok(regions
            .into_iter()
            .map(|r| r.text)
            .collect::<Vec<_>>()
            .join(" "))
    }
}

/// Default backend that recognizes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextRecognizer;

impl TextRecognizer for NoTextRecognizer {
    fn recognize_regions(&self, _image: &DynamicImage) -> Result<Vec<OcrRegion>> {
        Ok(Vec::new())
    }
}

/// Whether text contains any suspicious keyword (case-insensitive substring).
#[must_use]
pub fn contains_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    SUSPICIOUS_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Output of one recognition pass over the original image.
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    /// All non-empty recognized strings, in region order.
    pub texts: Vec<String>,
    /// The subset of regions whose text matched at least one keyword.
    pub suspicious: Vec<OcrRegion>,
}

/// Run the recognizer once and split out the keyword-matching regions.
///
/// Empty or whitespace-only regions are dropped. A failing recognizer call
/// is absorbed as "no text recognized" rather than propagated.
pub fn extract_text(recognizer: &dyn TextRecognizer, image: &DynamicImage) -> ExtractedText {
    let regions = recognizer.recognize_regions(image).unwrap_or_default();

    let mut out = ExtractedText::default();
    for region in regions {
        let trimmed = region.text.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.texts.push(trimmed.to_string());
        if contains_keyword(trimmed) {
            out.suspicious.push(region);
        }
    }
    out
}
