use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::{InspectError, Result};
use crate::models::ModernBertSize;

/// Hypothesis template used when none is configured. `{}` is replaced by the candidate label.
pub const DEFAULT_HYPOTHESIS_TEMPLATE: &str = "This example is {}.";

/// Where the classifier should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceConfig {
    /// CUDA device 0 when available, otherwise CPU.
    #[default]
    Auto,
    Cpu,
    Cuda(usize),
}

/// How the score chart is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// SVG figure written to [`ChartConfig::output`].
    #[default]
    Svg,
    /// Text bars printed to the terminal.
    Text,
}

/// Settings for the score chart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub kind: ChartKind,
    /// SVG file to write; a file in the system temp directory when unset.
    pub output: Option<PathBuf>,
    /// SVG size in pixels.
    pub image_width: u32,
    pub image_height: u32,
    /// Width in characters of the longest text bar.
    pub width: usize,
    /// Decimals printed after each text bar.
    pub precision: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            kind: ChartKind::Svg,
            output: None,
            image_width: 800,
            image_height: 480,
            width: 40,
            precision: 4,
        }
    }
}

/// Top-level configuration, usually read from a JSON file.
///
/// Every field is optional in the file:
///
/// ```json
/// {
///   "model": "large",
///   "device": { "cuda": 1 },
///   "hypothesis_template": "This post is about {}.",
///   "multi_label": false,
///   "chart": { "kind": "svg", "output": "scores.svg", "image_width": 1024 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    pub model: ModernBertSize,
    pub device: DeviceConfig,
    pub hypothesis_template: String,
    /// Score labels independently instead of normalizing across them.
    pub multi_label: bool,
    pub chart: ChartConfig,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            model: ModernBertSize::Base,
            device: DeviceConfig::Auto,
            hypothesis_template: DEFAULT_HYPOTHESIS_TEMPLATE.to_string(),
            multi_label: false,
            chart: ChartConfig::default(),
        }
    }
}

impl InspectConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| InspectError::Config(format!("invalid config: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            InspectError::Config(format!("failed to read config file {path:?}: {e}"))
        })?;
        Self::from_json_str(&content)
    }
}
