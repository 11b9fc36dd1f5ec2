//! Tunables for both engines.
//!
//! Every struct derives `Default` with the values the portfolio page shipped
//! with and is `#[serde(default)]`, so a TOML file only needs the keys it
//! changes:
//!
//! ```toml
//! seed = 7
//!
//! [field]
//! max_count = 80
//! connection_distance = 90.0
//!
//! [trail]
//! burst_cap = 4
//! ```

use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stardrift_platform::Color;

use crate::error::{ConfigError, Result};

/// Finest wave sampling step, in pixels.
pub const MIN_WAVE_STEP: f32 = 1.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed RNG seed; entropy is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub field: FieldConfig,
    pub trail: TrailConfig,
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.field.validate()?;
        self.trail.validate()
    }
}

/// Ambient background field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub max_count: usize,
    /// Viewport pixels per particle when sizing the population.
    pub area_per_particle: f32,
    /// Initial velocity per axis.
    pub velocity: Range<f32>,
    pub size: Range<f32>,
    pub opacity: Range<f32>,
    pub hue: Range<f32>,
    /// Added to the time accumulator once per frame, regardless of frame rate.
    pub time_step: f32,
    pub fade: Color,
    pub drift_amplitude: f32,
    pub drift_frequency: f32,
    pub friction: f32,
    pub pulse_amplitude: f32,
    pub opacity_floor: f32,
    pub hue_wobble: f32,
    pub glow_blur: f32,
    pub connection_distance: f32,
    pub connection_opacity: f32,
    pub pointer_glow_radius: f32,
    pub interaction_radius: f32,
    pub interaction_opacity: f32,
    pub pull_strength: f32,
    pub wave_count: u32,
    pub wave_opacity: f32,
    /// Horizontal sampling step of the wave strokes, in pixels.
    pub wave_step: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            max_count: 150,
            area_per_particle: 8000.0,
            velocity: -0.25..0.25,
            size: 1.0..4.0,
            opacity: 0.2..0.7,
            hue: 220.0..280.0,
            time_step: 0.01,
            fade: Color::rgba(10, 10, 10, 0.05),
            drift_amplitude: 0.1,
            drift_frequency: 0.01,
            friction: 0.99,
            pulse_amplitude: 0.1,
            opacity_floor: 0.1,
            hue_wobble: 10.0,
            glow_blur: 15.0,
            connection_distance: 120.0,
            connection_opacity: 0.2,
            pointer_glow_radius: 150.0,
            interaction_radius: 200.0,
            interaction_opacity: 0.3,
            pull_strength: 0.02,
            wave_count: 3,
            wave_opacity: 0.1,
            wave_step: 10.0,
        }
    }
}

impl FieldConfig {
    pub fn validate(&self) -> Result<()> {
        positive("field.area_per_particle", self.area_per_particle)?;
        friction("field.friction", self.friction)?;
        positive("field.connection_distance", self.connection_distance)?;
        positive("field.interaction_radius", self.interaction_radius)?;
        at_least("field.wave_step", self.wave_step, MIN_WAVE_STEP)?;
        span("field.velocity", &self.velocity)?;
        span("field.size", &self.size)?;
        span("field.opacity", &self.opacity)?;
        span("field.hue", &self.hue)
    }
}

/// Pointer trail overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Minimum pointer displacement (inclusive) before a burst is spawned.
    pub spawn_threshold: f32,
    /// Pixels of displacement per spawned particle.
    pub spawn_scale: f32,
    pub burst_cap: usize,
    /// Half extent of the spawn jitter square.
    pub jitter: f32,
    pub velocity: Range<f32>,
    /// Lifetime in frames.
    pub max_life: Range<u32>,
    pub size: Range<f32>,
    pub hue: Range<f32>,
    pub fade: Color,
    pub friction: f32,
    pub glow_blur: f32,
    pub pointer_glow_radius: f32,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            spawn_threshold: 5.0,
            spawn_scale: 5.0,
            burst_cap: 10,
            jitter: 10.0,
            velocity: -2.0..2.0,
            max_life: 30..90,
            size: 2.0..6.0,
            hue: 240.0..300.0,
            fade: Color::rgba(10, 10, 10, 0.1),
            friction: 0.98,
            glow_blur: 10.0,
            pointer_glow_radius: 50.0,
        }
    }
}

impl TrailConfig {
    pub fn validate(&self) -> Result<()> {
        if self.spawn_threshold < 0.0 || self.spawn_threshold.is_nan() {
            return Err(ConfigError::invalid(
                "trail.spawn_threshold",
                format!("must be non-negative, got {}", self.spawn_threshold),
            ));
        }
        if self.jitter < 0.0 || self.jitter.is_nan() {
            return Err(ConfigError::invalid(
                "trail.jitter",
                format!("must be non-negative, got {}", self.jitter),
            ));
        }
        positive("trail.spawn_scale", self.spawn_scale)?;
        friction("trail.friction", self.friction)?;
        span("trail.velocity", &self.velocity)?;
        span("trail.size", &self.size)?;
        span("trail.hue", &self.hue)?;
        if self.max_life.start == 0 || self.max_life.start >= self.max_life.end {
            return Err(ConfigError::invalid(
                "trail.max_life",
                format!(
                    "expected 1 <= start < end, got {}..{}",
                    self.max_life.start, self.max_life.end
                ),
            ));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn at_least(field: &'static str, value: f32, min: f32) -> Result<()> {
    if value >= min && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be at least {min}, got {value}")))
    }
}

fn friction(field: &'static str, value: f32) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be in (0, 1], got {value}")))
    }
}

fn span(field: &'static str, range: &Range<f32>) -> Result<()> {
    if range.start < range.end && range.start.is_finite() && range.end.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("expected start < end, got {}..{}", range.start, range.end),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            seed = 7

            [field]
            max_count = 80

            [trail]
            burst_cap = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.field.max_count, 80);
        assert_eq!(config.field.area_per_particle, 8000.0);
        assert_eq!(config.trail.burst_cap, 4);
        assert_eq!(config.trail.max_life, 30..90);
    }

    #[test]
    fn serialized_defaults_parse_back() {
        let config = EngineConfig {
            seed: Some(42),
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_zero_area_per_particle() {
        let err = EngineConfig::from_toml_str("[field]\narea_per_particle = 0.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "field.area_per_particle",
                ..
            }
        ));
    }

    #[test]
    fn rejects_subpixel_wave_step() {
        let err = EngineConfig::from_toml_str("[field]\nwave_step = 0.000001\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "field.wave_step",
                ..
            }
        ));
        let config = FieldConfig {
            wave_step: MIN_WAVE_STEP,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_friction_above_one() {
        let config = TrailConfig {
            friction: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_ranges() {
        let config = FieldConfig {
            size: 4.0..1.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("field.size"));

        let config = TrailConfig {
            max_life: 0..10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_errors_surface() {
        assert!(matches!(
            EngineConfig::from_toml_str("[field\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
