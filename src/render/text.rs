//! HUD text: shaped with parley, filled as `vello_cpu` glyph runs.

use std::path::Path;
use std::sync::Arc;

use kurbo::Point;

use crate::foundation::error::{HudError, HudResult};
use crate::render::canvas::{Rgba, VectorLayer};

/// DejaVu Sans Bold, see `assets/fonts/DejaVu-LICENSE`.
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// RGBA8 brush carried through parley styles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba> for TextBrush {
    fn from(c: Rgba) -> Self {
        Self {
            r: c[0],
            g: c[1],
            b: c[2],
            a: c[3],
        }
    }
}

/// Font bytes shared by every worker's [`TextEngine`].
#[derive(Clone)]
pub struct HudFont {
    bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for HudFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HudFont")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Default for HudFont {
    fn default() -> Self {
        Self::bundled()
    }
}

impl HudFont {
    pub fn bundled() -> Self {
        Self {
            bytes: Arc::new(BUNDLED_FONT.to_vec()),
        }
    }

    /// Load a TTF/OTF file, rejecting bytes that register no font family.
    pub fn from_file(path: &Path) -> HudResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            HudError::input(format!("failed to read font '{}': {e}", path.display()))
        })?;
        let font = Self {
            bytes: Arc::new(bytes),
        };
        TextEngine::new(&font)?;
        Ok(font)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Parley contexts plus the registered HUD family. One engine belongs to one worker.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family: String,
    font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

impl TextEngine {
    pub fn new(font: &HudFont) -> HudResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes.as_ref().clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| HudError::validation("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| HudError::validation("registered font family has no name"))?
            .to_string();
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
            0,
        );
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font: data,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Shape `text` on a single unbounded line.
    pub fn layout(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrush,
    ) -> HudResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(HudError::validation("text size must be finite and > 0"));
        }
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Advance width of `text` at `size_px`.
    pub fn text_width(&mut self, text: &str, size_px: f64) -> HudResult<f64> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let layout = self.layout(text, size_px as f32, TextBrush::default())?;
        Ok(f64::from(layout.width()))
    }

    /// Draw `text` with the top of its line box at `(x, y)`, returning the advance width.
    pub fn draw(
        &mut self,
        layer: &mut VectorLayer,
        text: &str,
        x: f64,
        y: f64,
        size_px: f64,
        color: Rgba,
    ) -> HudResult<f64> {
        if text.is_empty() || size_px <= 0.0 || color[3] == 0 {
            return Ok(0.0);
        }
        let layout = self.layout(text, size_px as f32, TextBrush::from(color))?;
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                layer.fill_glyphs(
                    &self.font,
                    run.run().font_size(),
                    Point::new(x, y),
                    [brush.r, brush.g, brush.b, brush.a],
                    glyphs,
                )?;
            }
        }
        Ok(f64::from(layout.width()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
