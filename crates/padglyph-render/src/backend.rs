//! Pluggable vector graphics backends

use padglyph_core::RenderConfig;

use crate::error::RenderError;
use crate::surface::Surface;

/// Unit and dpi hints handed to the parser
#[derive(Debug, Clone, PartialEq)]
pub struct ParseHints {
    pub units: String,
    pub dpi: f32,
}

impl Default for ParseHints {
    fn default() -> Self {
        Self {
            units: "px".to_string(),
            dpi: 96.0,
        }
    }
}

impl From<&RenderConfig> for ParseHints {
    fn from(config: &RenderConfig) -> Self {
        Self {
            units: config.units.clone(),
            dpi: config.dpi,
        }
    }
}

/// Parses SVG text into scenes and rasterizes them.
///
/// Each device handle owns one rasterizer and one scene per filled slot.
pub trait VectorBackend {
    type Scene;
    type Rasterizer;

    fn create_rasterizer(&self) -> Result<Self::Rasterizer, RenderError>;

    fn parse_hints(&self) -> ParseHints {
        ParseHints::default()
    }

    /// Parse `source`, which is a private copy the parser may consume.
    ///
    /// Returns `None` if the text isn't usable.
    fn parse(&self, source: String, units: &str, dpi: f32) -> Option<Self::Scene>;

    /// Width of the scene in the parser's output units
    fn natural_width(&self, scene: &Self::Scene) -> f32;

    /// Draw `scene` into `surface`, translated by `(tx, ty)` then scaled
    fn rasterize(
        &self,
        rasterizer: &mut Self::Rasterizer,
        scene: &Self::Scene,
        tx: f32,
        ty: f32,
        scale: f32,
        surface: &mut Surface,
    ) -> Result<(), RenderError>;
}
