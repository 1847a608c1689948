//! Scene rasterization on the vello CPU renderer

use std::fmt;

use kurbo::{Affine, BezPath, PathEl};
use peniko::Color;
use tracing::trace;
use vello_cpu::kurbo::{Affine as CpuAffine, BezPath as CpuPath, PathEl as CpuEl, Point};
use vello_cpu::{Pixmap, RenderContext};

use super::FilledPath;
use crate::error::RenderError;
use crate::surface::Surface;

/// Reusable vello_cpu render context.
///
/// The context is rebuilt whenever the target size changes and reset
/// between draws otherwise.
#[derive(Default)]
pub struct CpuRasterizer {
    ctx: Option<(u16, u16, RenderContext)>,
}

impl fmt::Debug for CpuRasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpuRasterizer")
            .field("size", &self.ctx.as_ref().map(|(w, h, _)| (*w, *h)))
            .finish()
    }
}

impl CpuRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn context(&mut self, width: u16, height: u16) -> &mut RenderContext {
        if !matches!(&self.ctx, Some((w, h, _)) if (*w, *h) == (width, height)) {
            self.ctx = None;
        }
        let (_, _, ctx) = self
            .ctx
            .get_or_insert_with(|| (width, height, RenderContext::new(width, height)));
        ctx.reset();
        ctx
    }

    /// Fill `shapes` through `transform` and composite them over `surface`
    pub fn fill(
        &mut self,
        surface: &mut Surface,
        shapes: &[FilledPath],
        transform: Affine,
    ) -> Result<(), RenderError> {
        let too_large = |_| {
            RenderError::Rasterizer(format!(
                "{}x{} surface is too large",
                surface.width(),
                surface.height()
            ))
        };
        let width = u16::try_from(surface.width()).map_err(too_large)?;
        let height = u16::try_from(surface.height()).map_err(too_large)?;
        if width == 0 || height == 0 || shapes.is_empty() {
            return Ok(());
        }

        let ctx = self.context(width, height);
        ctx.set_transform(CpuAffine::new(transform.as_coeffs()));
        for shape in shapes {
            let [r, g, b, a] = shape.color;
            ctx.set_paint(Color::from_rgba8(r, g, b, a));
            ctx.set_fill_rule(shape.rule);
            ctx.fill_path(&cpu_path(&shape.path));
        }
        ctx.flush();

        let mut pixmap = Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);

        let row = usize::from(width);
        let mut painted = 0usize;
        for (i, px) in pixmap.take_unpremultiplied().into_iter().enumerate() {
            if px.a == 0 {
                continue;
            }
            let (x, y) = ((i % row) as u32, (i / row) as u32);
            surface.blend(x, y, [px.r, px.g, px.b, px.a], 1.0);
            painted += 1;
        }
        trace!(shapes = shapes.len(), painted, "Rasterized scene");
        Ok(())
    }
}

fn cpu_path(path: &BezPath) -> CpuPath {
    let pt = |p: kurbo::Point| Point::new(p.x, p.y);
    path.elements()
        .iter()
        .map(|el| match *el {
            PathEl::MoveTo(p) => CpuEl::MoveTo(pt(p)),
            PathEl::LineTo(p) => CpuEl::LineTo(pt(p)),
            PathEl::QuadTo(a, b) => CpuEl::QuadTo(pt(a), pt(b)),
            PathEl::CurveTo(a, b, c) => CpuEl::CurveTo(pt(a), pt(b), pt(c)),
            PathEl::ClosePath => CpuEl::ClosePath,
        })
        .collect()
}
