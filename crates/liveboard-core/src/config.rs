//! Tunable constants of the interaction core.

use crate::color::Color;
use serde::{Deserialize, Serialize};

/// Maximum number of layers a board can hold.
pub const MAX_LAYERS: usize = 100;

/// Manhattan distance (canvas units) a press must travel before it becomes a
/// selection net.
pub const SELECTION_NET_THRESHOLD: f64 = 5.0;

/// Width and height of freshly inserted layers.
pub const DEFAULT_LAYER_SIZE: f64 = 100.0;

/// Maximum number of undo steps to keep.
pub const MAX_HISTORY: usize = 100;

/// Settings for a canvas session.
///
/// Every field falls back to its default when missing from JSON, so a
/// partial config file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub max_layers: usize,
    pub selection_net_threshold: f64,
    pub default_layer_size: f64,
    pub max_history: usize,
    /// Fill used for inserted layers until the user picks a color.
    pub default_fill: Color,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            max_layers: MAX_LAYERS,
            selection_net_threshold: SELECTION_NET_THRESHOLD,
            default_layer_size: DEFAULT_LAYER_SIZE,
            max_history: MAX_HISTORY,
            default_fill: Color::white(),
        }
    }
}

impl CanvasConfig {
    /// Deserialize a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the config to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CanvasConfig::default();
        assert_eq!(config.max_layers, 100);
        assert_eq!(config.selection_net_threshold, 5.0);
        assert_eq!(config.default_fill, Color::white());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CanvasConfig::from_json(r#"{ "max_layers": 3 }"#).unwrap();
        assert_eq!(config.max_layers, 3);
        assert_eq!(config.default_layer_size, DEFAULT_LAYER_SIZE);
        assert_eq!(config.max_history, MAX_HISTORY);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = CanvasConfig {
            default_fill: Color::new(1, 2, 3),
            ..CanvasConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(CanvasConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(CanvasConfig::from_json("{ not json").is_err());
    }
}
