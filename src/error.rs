//! Error types for the stegoshield crate.

/// Errors that can occur during analysis and watermark embedding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input bytes are not a decodable raster image.
    ///
    /// This is the only fatal analysis-stage error: everything else is
    /// absorbed locally so a single bad tag or recognition call never
    /// aborts the overall decision.
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),

    /// Watermark embedding preconditions were not met: the message encodes
    /// to zero bits, or the host image yields zero usable 8x8 blocks.
    #[error("watermark precondition failed: {0}")]
    WatermarkPrecondition(String),

    /// A text-recognition backend call failed.
    ///
    /// Callers in the analysis pipeline treat this as "no text recognized".
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// A metadata backend call failed.
    ///
    /// Callers in the analysis pipeline treat this as "no tags found".
    #[error("metadata read failed: {0}")]
    Metadata(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred during image processing (resize, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
