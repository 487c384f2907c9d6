use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{HudError, HudResult};

/// Reference output height all HUD geometry is authored against.
pub const REFERENCE_HEIGHT: f64 = 1080.0;

/// Largest accepted component scale.
pub const MAX_SCALE: f64 = 10.0;

/// Per-component switches.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    pub enabled: bool,
    pub scale: f64,
    pub opacity: f64,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scale: 1.0,
            opacity: 1.0,
        }
    }
}

impl ComponentConfig {
    fn validate(&self, name: &str) -> HudResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > MAX_SCALE {
            return Err(HudError::validation(format!(
                "layout.{name}.scale must be in (0, {MAX_SCALE}], got {}",
                self.scale
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(HudError::validation(format!(
                "layout.{name}.opacity must be in [0, 1], got {}",
                self.opacity
            )));
        }
        Ok(())
    }

    /// 8-bit alpha for this component's opacity.
    pub fn alpha_u8(&self) -> u8 {
        (255.0 * self.opacity.clamp(0.0, 1.0)) as u8
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    #[default]
    Mph,
    Kph,
}

impl SpeedUnit {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mph => "MPH",
            Self::Kph => "KM/H",
        }
    }
}

/// HUD components in draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    Speed,
    Power,
    Cadence,
    HeartRate,
    Gradient,
    Map,
    Elevation,
}

impl Component {
    pub const ALL: [Self; 7] = [
        Self::Speed,
        Self::Power,
        Self::Cadence,
        Self::HeartRate,
        Self::Gradient,
        Self::Map,
        Self::Elevation,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Power => "power",
            Self::Cadence => "cadence",
            Self::HeartRate => "heart_rate",
            Self::Gradient => "gradient",
            Self::Map => "map",
            Self::Elevation => "elevation",
        }
    }
}

/// Overlay layout, immutable for the duration of a render job.
///
/// Deserialises from `{"speed": {"enabled": true, "scale": 1.0, "opacity": 1.0}, ...}`; any
/// missing component or field takes its default.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub speed: ComponentConfig,
    pub power: ComponentConfig,
    pub cadence: ComponentConfig,
    pub gradient: ComponentConfig,
    pub heart_rate: ComponentConfig,
    pub map: ComponentConfig,
    pub elevation: ComponentConfig,
    pub speed_unit: SpeedUnit,
}

impl LayoutConfig {
    pub fn from_json_str(json: &str) -> HudResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| HudError::validation(format!("layout JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> HudResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read layout '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Accept either a path to a JSON file or inline JSON.
    pub fn from_arg(arg: &str) -> HudResult<Self> {
        if arg.trim_start().starts_with('{') {
            Self::from_json_str(arg)
        } else {
            Self::from_json_file(Path::new(arg))
        }
    }

    pub fn validate(&self) -> HudResult<()> {
        for c in Component::ALL {
            self.component(c).validate(c.key())?;
        }
        Ok(())
    }

    pub fn component(&self, c: Component) -> &ComponentConfig {
        match c {
            Component::Speed => &self.speed,
            Component::Power => &self.power,
            Component::Cadence => &self.cadence,
            Component::HeartRate => &self.heart_rate,
            Component::Gradient => &self.gradient,
            Component::Map => &self.map,
            Component::Elevation => &self.elevation,
        }
    }

    /// `output_height / 1080`.
    pub fn layout_scale(output_height: u32) -> f64 {
        f64::from(output_height) / REFERENCE_HEIGHT
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/config.rs"]
mod tests;
