use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Geometry tunables for the layout engine. The vertical gap between
/// consecutive steps is not configurable: steps form a continuous trunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal footprint of every problem/step box.
    pub box_width: f32,
    /// Vertical footprint of a problem's header box.
    pub header_height: f32,
    /// Minimum height of a step box.
    pub step_base_height: f32,
    /// Extra height per content line beyond the first.
    pub step_line_height: f32,
    /// Horizontal gap between sibling subtrees and between a trunk edge and
    /// its nearest child subtree.
    pub horizontal_gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            box_width: 400.0,
            header_height: 100.0,
            step_base_height: 150.0,
            step_line_height: 20.0,
            horizontal_gap: 120.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a positive finite dimension, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be a non-negative finite dimension, got {value}")]
    Negative { field: &'static str, value: f32 },
}

impl LayoutConfig {
    /// Non-positive box dimensions or gaps are programmer errors; they are
    /// rejected before a layout pass rather than producing negative-width
    /// geometry inside it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("boxWidth", self.box_width),
            ("headerHeight", self.header_height),
            ("stepBaseHeight", self.step_base_height),
            ("horizontalGap", self.horizontal_gap),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if !self.step_line_height.is_finite() || self.step_line_height < 0.0 {
            return Err(ConfigError::Negative {
                field: "stepLineHeight",
                value: self.step_line_height,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub layout: LayoutConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    box_width: Option<f32>,
    header_height: Option<f32>,
    step_base_height: Option<f32>,
    step_line_height: Option<f32>,
    horizontal_gap: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutConfigFile>,
}

/// Loads a JSON5 config file, overriding defaults field by field. An absent
/// path yields the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();
    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.box_width {
            config.layout.box_width = v;
        }
        if let Some(v) = layout.header_height {
            config.layout.header_height = v;
        }
        if let Some(v) = layout.step_base_height {
            config.layout.step_base_height = v;
        }
        if let Some(v) = layout.step_line_height {
            config.layout.step_line_height = v;
        }
        if let Some(v) = layout.horizontal_gap {
            config.layout.horizontal_gap = v;
        }
    }
    Ok(config)
}
