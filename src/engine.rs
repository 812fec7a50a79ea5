//! Analysis pipeline orchestration.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::metadata::{scan_metadata, MetadataReader, NoMetadata};
use crate::ocr::{extract_text, NoTextRecognizer, TextRecognizer};
use crate::policy::{Decision, PolicyConfig};
use crate::rdr::{resample_discrepancy, RdrConfig};
use crate::stats;
use crate::watermark::{embed_watermark, DEFAULT_ALPHA};

/// Options controlling one analysis invocation.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Attempt watermark embedding when the verdict is ALLOW.
    pub watermark: bool,
    /// Message to embed when watermarking.
    pub watermark_message: String,
    /// Coefficient-adjustment magnitude for embedding.
    pub alpha: i32,
    /// Reserved component-count parameter for future multi-coefficient
    /// embedding; ignored by the single-coefficient strategy.
    pub components: u32,
    /// Resample-trial configuration.
    pub rdr: RdrConfig,
    /// Scoring weights and thresholds.
    pub policy: PolicyConfig,
    /// Seed for the resample randomness; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            watermark: false,
            watermark_message: "stegoshield-demo".to_string(),
            alpha: DEFAULT_ALPHA,
            components: 0,
            rdr: RdrConfig::default(),
            policy: PolicyConfig::default(),
            seed: None,
        }
    }
}

fn serialize_base64<S: Serializer>(bytes: &Option<Vec<u8>>, ser: S) -> std::result::Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => ser.serialize_some(&BASE64.encode(b)),
        None => ser.serialize_none(),
    }
}

/// Aggregate analysis record for one image.
///
/// Constructed once per invocation and immutable after return. Serializes
/// to the caller-facing JSON shape, with the watermarked image transported
/// as base64.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// SHA-256 hex digest of the input bytes.
    pub identifier: String,
    /// Deduplicated metadata suspicion labels.
    pub metadata_flags: Vec<String>,
    /// Binary entropy of the LSB plane, `[0, 1]`.
    pub lsb_entropy: f32,
    /// Shannon entropy of the intensity histogram, `[0, 8]`.
    pub global_entropy: f32,
    /// Block-grid discontinuity score.
    pub blockiness: f32,
    /// All recognized strings from the original image.
    pub ocr_texts: Vec<String>,
    /// Recognized strings that matched a suspicious keyword.
    pub ocr_suspicious: Vec<String>,
    /// Resample-discrepancy score, `[0, 1]`.
    pub rdr_score: f32,
    /// Suspicious texts observed across resample trials.
    pub rdr_examples: Vec<String>,
    /// Composite steganography score, clamped to `[0, 1]`.
    pub stego_score: f32,
    /// Final three-tier verdict.
    pub decision: Decision,
    /// Watermarked image bytes (PNG), present only after a successful embed.
    #[serde(
        rename = "watermarked_base64",
        serialize_with = "serialize_base64",
        skip_serializing_if = "Option::is_none"
    )]
    pub watermarked_png: Option<Vec<u8>>,
    /// Base64 form of the embedded message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark_message: Option<String>,
    /// Description of a non-fatal embedding failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark_error: Option<String>,
}

/// Result of analyzing one file from a batch.
#[derive(Debug)]
pub struct FileOutcome {
    /// Path of the analyzed file.
    pub path: PathBuf,
    /// The analysis, or the fatal error that prevented it.
    pub report: Result<AnalysisResult>,
}

/// The screening engine holding the pluggable collaborators.
///
/// Create once and reuse: invocations share no mutable state, so one engine
/// may serve many images in parallel.
pub struct StegoEngine {
    recognizer: Box<dyn TextRecognizer>,
    metadata: Box<dyn MetadataReader>,
}

impl Default for StegoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StegoEngine {
    /// Create an engine with no-op recognition and metadata backends.
    #[must_use]
    pub fn new() -> Self {
        Self {
            recognizer: Box::new(NoTextRecognizer),
            metadata: Box::new(NoMetadata),
        }
    }

    /// Replace the text-recognition backend.
    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    /// Replace the metadata backend.
    #[must_use]
    pub fn with_metadata_reader(mut self, reader: Box<dyn MetadataReader>) -> Self {
        self.metadata = reader;
        self
    }

    /// Analyze one image and, when permitted and requested, watermark it.
    ///
    /// Collaborator failures (recognition, metadata) are absorbed locally;
    /// a failed embed is attached as [`AnalysisResult::watermark_error`]
    /// without discarding the analysis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the bytes are not a decodable image,
    /// the only fatal analysis error.
    pub fn analyze(&self, image_bytes: &[u8], opts: &AnalyzeOptions) -> Result<AnalysisResult> {
        let decoded = image::load_from_memory(image_bytes).map_err(Error::Decode)?;
        let gray = decoded.to_luma8();

        let identifier = sha256_hex(image_bytes);

        let tag_map = self.metadata.read(image_bytes).unwrap_or_default();
        let metadata_flags: Vec<String> = scan_metadata(&tag_map).into_iter().collect();

        let lsb_entropy = stats::lsb_entropy(&gray);
        let global_entropy = stats::global_entropy(&gray);
        let blockiness = stats::blockiness(&gray);

        let extracted = extract_text(self.recognizer.as_ref(), &decoded);

        let mut rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let rdr = resample_discrepancy(&decoded, self.recognizer.as_ref(), &opts.rdr, &mut rng);

        let stego_score = opts.policy.stego_score(
            lsb_entropy,
            global_entropy,
            blockiness,
            !metadata_flags.is_empty(),
        );
        let decision = opts
            .policy
            .decide(stego_score, rdr.score, !extracted.suspicious.is_empty());

        let mut result = AnalysisResult {
            identifier,
            metadata_flags,
            lsb_entropy,
            global_entropy,
            blockiness,
            ocr_texts: extracted.texts,
            ocr_suspicious: extracted.suspicious.into_iter().map(|r| r.text).collect(),
            rdr_score: rdr.score,
            rdr_examples: rdr.examples,
            stego_score,
            decision,
            watermarked_png: None,
            watermark_message: None,
            watermark_error: None,
        };

        if opts.watermark && result.decision == Decision::Allow {
            match embed_watermark(image_bytes, &opts.watermark_message, opts.alpha) {
                Ok(embedded) => {
                    result.watermarked_png = Some(embedded.png);
                    result.watermark_message = Some(embedded.message_b64);
                }
                Err(e) => result.watermark_error = Some(e.to_string()),
            }
        }

        Ok(result)
    }

    /// Analyze a single image file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or any error from
    /// [`StegoEngine::analyze`].
    pub fn analyze_file(&self, path: &Path, opts: &AnalyzeOptions) -> Result<AnalysisResult> {
        let bytes = std::fs::read(path)?;
        self.analyze(&bytes, opts)
    }

    /// Analyze all supported images in a directory.
    ///
    /// Files are processed in parallel when the `cli` feature is enabled
    /// (via rayon); invocations share no mutable state.
    #[must_use]
    pub fn analyze_directory(&self, dir: &Path, opts: &AnalyzeOptions) -> Vec<FileOutcome> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
            Ok(rd) => {
                let mut paths: Vec<PathBuf> = rd
                    .filter_map(std::result::Result::ok)
                    .map(|e| e.path())
                    .filter(|p| p.is_file() && is_supported_image(p))
                    .collect();
                paths.sort();
                paths
            }
            Err(e) => {
                return vec![FileOutcome {
                    path: dir.to_path_buf(),
                    report: Err(Error::Io(e)),
                }];
            }
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries
                .par_iter()
                .map(|path| FileOutcome {
                    path: path.clone(),
                    report: self.analyze_file(path, opts),
                })
                .collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries
                .iter()
                .map(|path| FileOutcome {
                    path: path.clone(),
                    report: self.analyze_file(path, opts),
                })
                .collect()
        }
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// SHA-256 hex digest of a byte slice.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
