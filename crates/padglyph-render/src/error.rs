//! Error types for image handles and rendering

use padglyph_core::ArtError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Art(#[from] ArtError),
    #[error("Rasterizer error: {0}")]
    Rasterizer(String),
}

impl RenderError {
    /// The underlying database error, if any
    pub fn as_art(&self) -> Option<&ArtError> {
        match self {
            RenderError::Art(e) => Some(e),
            RenderError::Rasterizer(_) => None,
        }
    }
}
