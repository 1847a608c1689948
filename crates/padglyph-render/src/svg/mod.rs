//! Built-in SVG backend
//!
//! Understands the subset of SVG that controller art uses: flat fills and
//! strokes on rects, circles, ellipses, lines, polygons and paths, grouped
//! with inherited paint and transform, styled by presentation attributes,
//! `style="..."` and embedded `<style>` sheets. Gradients and text are
//! ignored.

mod css;
mod parse;
pub mod render;
pub mod style;

use kurbo::{Affine, BezPath};
use peniko::Fill;

use crate::backend::{ParseHints, VectorBackend};
use crate::error::RenderError;
use crate::surface::Surface;

use render::CpuRasterizer;
use style::Rgba;

/// One filled outline, in scene units. Strokes arrive already outlined.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledPath {
    pub path: BezPath,
    pub color: Rgba,
    pub rule: Fill,
}

/// A parsed document
#[derive(Debug, Clone, PartialEq)]
pub struct SvgScene {
    pub width: f64,
    pub height: f64,
    pub shapes: Vec<FilledPath>,
}

/// Pure-Rust backend built on quick-xml, kurbo and vello_cpu
#[derive(Debug, Clone, Default)]
pub struct BasicSvg {
    hints: ParseHints,
}

impl BasicSvg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hints(hints: ParseHints) -> Self {
        Self { hints }
    }

    /// Parse with this backend's own hints
    pub fn parse_str(&self, source: &str) -> Option<SvgScene> {
        parse::parse_document(source, &self.hints.units, self.hints.dpi)
    }
}

impl VectorBackend for BasicSvg {
    type Scene = SvgScene;
    type Rasterizer = CpuRasterizer;

    fn create_rasterizer(&self) -> Result<Self::Rasterizer, RenderError> {
        Ok(CpuRasterizer::new())
    }

    fn parse_hints(&self) -> ParseHints {
        self.hints.clone()
    }

    fn parse(&self, source: String, units: &str, dpi: f32) -> Option<Self::Scene> {
        parse::parse_document(&source, units, dpi)
    }

    fn natural_width(&self, scene: &Self::Scene) -> f32 {
        scene.width as f32
    }

    fn rasterize(
        &self,
        rasterizer: &mut Self::Rasterizer,
        scene: &Self::Scene,
        tx: f32,
        ty: f32,
        scale: f32,
        surface: &mut Surface,
    ) -> Result<(), RenderError> {
        let transform = Affine::translate((f64::from(tx), f64::from(ty)))
            * Affine::scale(f64::from(scale));
        rasterizer.fill(surface, &scene.shapes, transform)
    }
}
