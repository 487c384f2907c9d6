//! Fixed HUD geometry, authored at 1080p and scaled linearly.

use crate::layout::config::{Component, ComponentConfig, SpeedUnit};

pub const MARGIN: f64 = 50.0;
pub const VALUE_GLYPH_PX: f64 = 80.0;
pub const LABEL_GLYPH_PX: f64 = 20.0;
pub const MAP_BASE_PX: f64 = 300.0;
pub const MAP_FRAME_PX: f64 = 2.0;
pub const ELEVATION_BASE_PX: f64 = 150.0;

/// `int(val * layout_scale)`, truncating like the reference renderer.
pub fn sc(val: f64, layout_scale: f64) -> i64 {
    (val * layout_scale) as i64
}

/// One numeric readout: value on top, label underneath.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricSlot {
    pub component: Component,
    /// Offset below the top margin at 1080p.
    pub y_offset: f64,
    pub decimals: usize,
    pub suffix: &'static str,
}

pub const METRIC_SLOTS: [MetricSlot; 5] = [
    MetricSlot {
        component: Component::Speed,
        y_offset: 0.0,
        decimals: 0,
        suffix: "",
    },
    MetricSlot {
        component: Component::Power,
        y_offset: 200.0,
        decimals: 0,
        suffix: "",
    },
    MetricSlot {
        component: Component::Cadence,
        y_offset: 400.0,
        decimals: 0,
        suffix: "",
    },
    MetricSlot {
        component: Component::HeartRate,
        y_offset: 600.0,
        decimals: 0,
        suffix: "",
    },
    MetricSlot {
        component: Component::Gradient,
        y_offset: 800.0,
        decimals: 1,
        suffix: "%",
    },
];

impl MetricSlot {
    pub fn label(&self, unit: SpeedUnit) -> &'static str {
        match self.component {
            Component::Speed => unit.label(),
            Component::Power => "W",
            Component::Cadence => "RPM",
            Component::HeartRate => "BPM",
            Component::Gradient => "GRADIENT",
            Component::Map | Component::Elevation => "",
        }
    }

    /// Top-left of the value text.
    pub fn origin(&self, layout_scale: f64) -> (i64, i64) {
        (
            sc(MARGIN, layout_scale),
            sc(MARGIN, layout_scale) + sc(self.y_offset, layout_scale),
        )
    }

    /// Value text; missing or non-finite values print as zero.
    pub fn format(&self, value: Option<f64>) -> String {
        let v = value.filter(|v| v.is_finite()).unwrap_or(0.0);
        let s = format!("{v:.*}{}", self.decimals, self.suffix);
        // "-0" reads as a glitch on screen.
        match s.strip_prefix('-') {
            Some(rest) if rest.trim_end_matches('%').chars().all(|c| c == '0' || c == '.') => {
                rest.to_string()
            }
            _ => s,
        }
    }
}

/// Pixel rectangle, possibly partially off-canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Square map box anchored top-right.
pub fn map_rect(cfg: &ComponentConfig, layout_scale: f64, output_width: u32) -> PixelRect {
    let size = ((MAP_BASE_PX * cfg.scale * layout_scale) as i64).max(1);
    PixelRect {
        x: i64::from(output_width) - size - sc(MARGIN, layout_scale),
        y: sc(MARGIN, layout_scale),
        width: size as u32,
        height: size as u32,
    }
}

/// Elevation strip spanning the output width minus margins, anchored bottom-left.
pub fn elevation_rect(
    cfg: &ComponentConfig,
    layout_scale: f64,
    output_width: u32,
    output_height: u32,
) -> PixelRect {
    let h = ((ELEVATION_BASE_PX * cfg.scale * layout_scale) as i64).max(1);
    let w = (i64::from(output_width) - sc(2.0 * MARGIN, layout_scale)).max(1);
    PixelRect {
        x: sc(MARGIN, layout_scale),
        y: i64::from(output_height) - h - sc(MARGIN, layout_scale),
        width: w as u32,
        height: h as u32,
    }
}

/// Radius of the position marker on the map.
pub fn marker_radius(cfg: &ComponentConfig, layout_scale: f64) -> f64 {
    ((6.0 * cfg.scale * layout_scale) as i64).max(4) as f64
}

#[cfg(test)]
#[path = "../../tests/unit/layout/hud.rs"]
mod tests;
