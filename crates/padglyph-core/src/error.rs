//! Error types shared by the database subsystem

use thiserror::Error;

/// Failures reported by decoding, lookup and queries
#[derive(Error, Debug)]
pub enum ArtError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Bogus data: {0}")]
    BogusData(String),
    #[error("Unexpected end of data")]
    UnexpectedEndOfData,
    #[error(
        "Unsupported data version {found} (newest understood is {supported}); \
         upgrade your copy of padglyph?"
    )]
    UnsupportedVersion { found: u16, supported: u16 },
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("No image available")]
    NoImageAvailable,
    #[error("Not initialized")]
    NotInitialized,
    #[error("Couldn't find any usable images for {0:?}; maybe nothing was loaded?")]
    NotFound(String),
}

impl From<std::collections::TryReserveError> for ArtError {
    fn from(_: std::collections::TryReserveError) -> Self {
        ArtError::OutOfMemory
    }
}

/// A recoverable problem with a single control item.
///
/// These are reported while flattening a device and never abort it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemIssue {
    #[error("{device}: item {item:?} has no '_<variant>' suffix")]
    MissingSeparator { device: String, item: String },
    #[error("{device}: item {item:?} has a malformed variant suffix")]
    BadVariant { device: String, item: String },
    #[error("{device}: item {item:?} uses variant {variant}, limit is {limit}")]
    VariantOutOfRange {
        device: String,
        item: String,
        variant: u32,
        limit: usize,
    },
    #[error("{device}: item {item:?} does not name a known control")]
    UnknownControl { device: String, item: String },
}
