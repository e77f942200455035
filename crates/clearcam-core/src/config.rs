//! Engine configuration.

use crate::shapes::ShapeColor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for the annotation engine.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    pub default_zoom: f64,
    /// A drawn shape is only committed when its radius/size exceeds this.
    pub min_shape_extent: f64,
    /// Overlay opacity (0-100) stamped onto new shapes.
    pub default_opacity: u8,
    pub shape_color: ShapeColor,
    /// Saves closer together than this (seconds) replace each other.
    pub saved_time_tolerance: f64,
    pub display_min_width: f64,
    pub display_min_height: f64,
    pub display_max_width: f64,
    pub display_max_height: f64,
    /// Seconds between timeline thumbnail captures.
    pub frame_interval: f64,
    pub sublabels: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_zoom: 25.0,
            max_zoom: 500.0,
            zoom_step: 25.0,
            default_zoom: 100.0,
            min_shape_extent: 5.0,
            default_opacity: 60,
            shape_color: ShapeColor::CONTAMINATION,
            saved_time_tolerance: 0.1,
            display_min_width: 780.0,
            display_min_height: 520.0,
            display_max_width: 960.0,
            display_max_height: 640.0,
            frame_interval: 10.0,
            sublabels: ["Blood", "Smoke", "Fluid", "Tissue"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check that the values are usable together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::Invalid(format!(
                "zoom range {}..{} must be positive and ordered",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.min_zoom..=self.max_zoom).contains(&self.default_zoom) {
            return Err(ConfigError::Invalid(format!(
                "default zoom {} is outside {}..{}",
                self.default_zoom, self.min_zoom, self.max_zoom
            )));
        }
        if self.default_opacity > 100 {
            return Err(ConfigError::Invalid(format!(
                "default opacity {} exceeds 100",
                self.default_opacity
            )));
        }
        if !(self.min_shape_extent >= 0.0 && self.saved_time_tolerance >= 0.0) {
            return Err(ConfigError::Invalid(
                "thresholds must not be negative".to_string(),
            ));
        }
        if !(self.display_min_width > 0.0
            && self.display_min_height > 0.0
            && self.display_max_width >= self.display_min_width
            && self.display_max_height >= self.display_min_height)
        {
            return Err(ConfigError::Invalid(
                "display bounds must be positive with min <= max".to_string(),
            ));
        }
        if !(self.frame_interval > 0.0) {
            return Err(ConfigError::Invalid(
                "frame interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "default_opacity": 80 }"#).unwrap();
        assert_eq!(config.default_opacity, 80);
        assert!((config.min_shape_extent - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.sublabels.len(), 4);
    }

    #[test]
    fn test_invalid_zoom_range() {
        let result = EngineConfig::from_json(r#"{ "min_zoom": 600 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_nan_thresholds_rejected() {
        for config in [
            EngineConfig {
                min_shape_extent: f64::NAN,
                ..EngineConfig::default()
            },
            EngineConfig {
                saved_time_tolerance: f64::NAN,
                ..EngineConfig::default()
            },
            EngineConfig {
                frame_interval: f64::NAN,
                ..EngineConfig::default()
            },
            EngineConfig {
                display_min_width: f64::NAN,
                ..EngineConfig::default()
            },
        ] {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            EngineConfig::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r##"{ "shape_color": "#3b82f6" }"##).unwrap();
        let config = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.shape_color, ShapeColor::SELECTION);
    }
}
