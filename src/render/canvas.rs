//! Vector drawing on top of `vello_cpu`.

use kurbo::{BezPath, Circle, PathEl, Point, Rect, Shape as _, Stroke, StrokeOpts};

use crate::foundation::error::{HudError, HudResult};

const TOLERANCE: f64 = 0.1;

/// Straight-alpha RGBA8 colour.
pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];
pub const BLACK: Rgba = [0, 0, 0, 255];
pub const YELLOW: Rgba = [255, 255, 0, 255];
pub const BLUE: Rgba = [0, 0, 255, 255];

/// Reusable `vello_cpu` context for one vector layer per frame.
///
/// The context is kept across frames and only recreated when the output size changes.
#[derive(Default)]
pub struct VectorLayer {
    ctx: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for VectorLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorLayer")
            .field("size", &self.ctx.as_ref().map(|c| (c.width(), c.height())))
            .finish()
    }
}

impl VectorLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh transparent layer of `width x height`.
    pub fn begin(&mut self, width: u32, height: u32) -> HudResult<()> {
        let (w, h) = to_u16_size(width, height)?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx = Some(ctx);
        Ok(())
    }

    fn ctx(&mut self) -> HudResult<&mut vello_cpu::RenderContext> {
        self.ctx
            .as_mut()
            .ok_or_else(|| HudError::validation("vector layer used before begin()"))
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) -> HudResult<()> {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Ok(());
        }
        let ctx = self.ctx()?;
        ctx.set_paint(paint(color));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
        Ok(())
    }

    pub fn fill_path(&mut self, path: &BezPath, color: Rgba) -> HudResult<()> {
        let cpu_path = bezpath_to_cpu(path);
        let ctx = self.ctx()?;
        ctx.set_paint(paint(color));
        ctx.fill_path(&cpu_path);
        Ok(())
    }

    /// Stroke by filling the stroke outline.
    pub fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba) -> HudResult<()> {
        let outline = kurbo::stroke(
            path.iter(),
            &Stroke::new(width),
            &StrokeOpts::default(),
            TOLERANCE,
        );
        self.fill_path(&outline, color)
    }

    pub fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) -> HudResult<()> {
        self.fill_path(&Circle::new(center, radius).to_path(TOLERANCE), color)
    }

    /// Axis-aligned frame of `width` px drawn inside `rect`.
    pub fn frame_rect(&mut self, rect: Rect, width: f64, color: Rgba) -> HudResult<()> {
        let w = width.min(rect.width() / 2.0).min(rect.height() / 2.0);
        self.fill_rect(Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + w), color)?;
        self.fill_rect(Rect::new(rect.x0, rect.y1 - w, rect.x1, rect.y1), color)?;
        self.fill_rect(Rect::new(rect.x0, rect.y0 + w, rect.x0 + w, rect.y1 - w), color)?;
        self.fill_rect(Rect::new(rect.x1 - w, rect.y0 + w, rect.x1, rect.y1 - w), color)
    }

    /// Fill glyphs positioned relative to `origin`.
    pub fn fill_glyphs(
        &mut self,
        font: &vello_cpu::peniko::FontData,
        font_size: f32,
        origin: Point,
        color: Rgba,
        glyphs: impl Iterator<Item = vello_cpu::Glyph>,
    ) -> HudResult<()> {
        let ctx = self.ctx()?;
        // Glyph runs capture the transform when the builder is created.
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((origin.x, origin.y)));
        ctx.set_paint(paint(color));
        ctx.glyph_run(font).font_size(font_size).fill_glyphs(glyphs);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    /// Rasterise everything drawn since [`VectorLayer::begin`] into premultiplied RGBA8.
    pub fn finish(&mut self) -> HudResult<Vec<u8>> {
        let ctx = self.ctx()?;
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(ctx.width(), ctx.height());
        ctx.render_to_pixmap(&mut pixmap);
        Ok(pixmap.data_as_u8_slice().to_vec())
    }
}

fn paint(c: Rgba) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c[0], c[1], c[2], c[3])
}

pub(crate) fn to_u16_size(width: u32, height: u32) -> HudResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| HudError::validation("layer width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| HudError::validation("layer height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(HudError::validation("layer size must be non-zero"));
    }
    Ok((w, h))
}

/// Open polyline through `points`.
pub fn polyline(points: &[Point]) -> BezPath {
    let mut p = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        p.move_to(*first);
        for pt in rest {
            p.line_to(*pt);
        }
    }
    p
}

/// Closed polygon through `points`.
pub fn polygon(points: &[Point]) -> BezPath {
    let mut p = polyline(points);
    if points.len() > 2 {
        p.close_path();
    }
    p
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
