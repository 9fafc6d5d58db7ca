//! Configuration for texpulse.
//!
//! Settings are read once, at controller construction, from `texpulse.toml`:
//!
//! ```toml
//! [progress]
//! enabled = true
//! bar_style = "block-width"
//! bar_width = 20
//! icon_set = "digits"
//! ```
//!
//! Layering is file → environment (`TEXPULSE_DISABLED`) → CLI flags. Enum
//! values fail fast here, never inside the rendering path.

use crate::errors::ConfigError;
use crate::ui::bar::BarStyle;
use crate::ui::icons::IconSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "texpulse.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub progress: ProgressSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bar_style")]
    pub bar_style: String,
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
    #[serde(default = "default_icon_set")]
    pub icon_set: String,
}

impl Default for ProgressSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            bar_style: default_bar_style(),
            bar_width: default_bar_width(),
            icon_set: default_icon_set(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_bar_style() -> String {
    "block-width".to_string()
}

fn default_bar_width() -> usize {
    20
}

fn default_icon_set() -> String {
    "digits".to_string()
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values the CLI may override on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub disabled: bool,
    pub bar_style: Option<String>,
    pub bar_width: Option<usize>,
    pub icon_set: Option<String>,
}

/// Resolved, validated configuration snapshot handed to the monitor and the
/// terminal sink. Captured once; never re-read mid-session.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub enabled: bool,
    pub bar_style: BarStyle,
    pub bar_width: usize,
    pub icon_set: IconSet,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            bar_style: BarStyle::default(),
            bar_width: default_bar_width(),
            icon_set: IconSet::default(),
        }
    }
}

impl MonitorOptions {
    /// Load and validate configuration. An explicit `config_path` must exist;
    /// otherwise `texpulse.toml` in the working directory is used when
    /// present, and built-in defaults when not.
    pub fn resolve(config_path: Option<&Path>, cli: &CliOverrides) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => FileConfig::load(path)?,
            None => {
                let path = Path::new(CONFIG_FILE);
                if path.exists() {
                    FileConfig::load(path)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Self::from_parts(file.progress, std::env::var("TEXPULSE_DISABLED").ok(), cli)
    }

    fn from_parts(
        section: ProgressSection,
        env_disabled: Option<String>,
        cli: &CliOverrides,
    ) -> Result<Self, ConfigError> {
        let enabled = section.enabled && !is_truthy(env_disabled.as_deref()) && !cli.disabled;

        let style_name = cli.bar_style.as_deref().unwrap_or(&section.bar_style);
        let bar_style: BarStyle = style_name.parse()?;

        let icon_name = cli.icon_set.as_deref().unwrap_or(&section.icon_set);
        let icon_set: IconSet = icon_name.parse()?;

        let bar_width = cli.bar_width.unwrap_or(section.bar_width);
        if bar_width == 0 {
            return Err(ConfigError::InvalidBarWidth(bar_width));
        }

        Ok(Self {
            enabled,
            bar_style,
            bar_width,
            icon_set,
        })
    }
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true") | Some("yes"))
}
