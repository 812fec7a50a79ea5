//! Screen images for steganography and embedded instructions, and watermark
//! the clean ones.
//!
//! An image is scored by a set of statistical analyzers (global entropy,
//! LSB-plane entropy, block-grid discontinuity), a metadata suspicion scan,
//! keyword matching over recognized text and a resample-discrepancy check
//! that measures how consistently suspicious text survives random resizing.
//! The weighted verdict is one of ALLOW, SUSPICIOUS or BLOCK; images judged
//! clean can be watermarked by flipping 8x8 luma transform-coefficient
//! parities to carry a base64-encoded message.
//!
//! # Quick Start
//!
//! ```no_run
//! use stegoshield::{AnalyzeOptions, StegoEngine};
//!
//! let engine = StegoEngine::new();
//! let bytes = std::fs::read("photo.png").unwrap();
//! let report = engine.analyze(&bytes, &AnalyzeOptions::default()).unwrap();
//! println!("{} -> {}", report.identifier, report.decision);
//! ```
//!
//! # Collaborators
//!
//! Text recognition and metadata extraction are pluggable backends behind
//! the [`TextRecognizer`] and [`MetadataReader`] traits; the defaults
//! recognize nothing, which still exercises the statistical analyzers.
//! Resample randomness is injectable through [`AnalyzeOptions::seed`] so
//! trial sequences can be pinned in tests.
//!
//! # Watermarking
//!
//! ```no_run
//! use stegoshield::watermark::embed_watermark;
//!
//! let bytes = std::fs::read("clean.png").unwrap();
//! let embedded = embed_watermark(&bytes, "stegoshield-demo", 4).unwrap();
//! std::fs::write("watermarked.png", &embedded.png).unwrap();
//! ```

#![deny(missing_docs)]

pub mod dct;
mod engine;
pub mod error;
pub mod metadata;
pub mod ocr;
pub mod policy;
pub mod rdr;
pub mod stats;
pub mod watermark;

pub use engine::{
    is_supported_image, sha256_hex, AnalysisResult, AnalyzeOptions, FileOutcome, StegoEngine,
};
pub use error::{Error, Result};
pub use metadata::{MetaValue, MetadataMap, MetadataReader, NoMetadata};
pub use ocr::{NoTextRecognizer, OcrRegion, TextRecognizer};
pub use policy::{Decision, PolicyConfig};
pub use rdr::RdrConfig;
