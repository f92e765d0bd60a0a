use anyhow::Result;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Codes used when no configuration names any
pub const DEFAULT_CODES: &[&str] = &["Code A", "Code B", "Code C"];

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// How expiration times are shown
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// chrono strftime pattern for the "Until ..." line
    pub time_format: String,
    /// Show times in UTC instead of the local zone
    pub utc: bool,
}

fn default_time_format() -> String {
    "%-I:%M:%S %p".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
            utc: false,
        }
    }
}

/// `[display]` as written in a config file; unset keys leave earlier layers alone
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DisplayLayer {
    #[serde(default)]
    pub time_format: Option<String>,
    #[serde(default)]
    pub utc: Option<bool>,
}

/// One config file on disk
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ConfigLayer {
    #[serde(default)]
    pub codes: Vec<String>,
    #[serde(default)]
    pub display: DisplayLayer,
}

impl ConfigLayer {
    /// Load a single layer from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let layer: ConfigLayer = toml::from_str(&content)?;
        Ok(layer)
    }
}

/// Main configuration structure, resolved from all layers
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub codes: Vec<String>,
    pub display: DisplayConfig,
}

impl Config {
    /// Built-in defaults: the three standard codes
    pub fn with_default_codes() -> Self {
        Self {
            codes: DEFAULT_CODES.iter().map(|c| c.to_string()).collect(),
            display: DisplayConfig::default(),
        }
    }

    /// Load configuration from default paths
    /// Priority: local (.codetrack/config.local.toml) > project (.codetrack/config.toml) > user (~/.codetrack/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = Self::with_default_codes();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".codetrack").join("config.toml");
            if user_config.exists() {
                config.merge(ConfigLayer::load_from(&user_config)?);
            }
        }

        Self::merge_project_layers(&mut config, Path::new("."))?;
        Ok(config)
    }

    fn merge_project_layers(config: &mut Self, root: &Path) -> Result<()> {
        let dir = root.join(".codetrack");
        for name in ["config.toml", "config.local.toml"] {
            let path = dir.join(name);
            if path.exists() {
                log::debug!("loading config layer {}", path.display());
                config.merge(ConfigLayer::load_from(&path)?);
            }
        }
        Ok(())
    }

    /// Merge a file layer into this config (the layer takes priority).
    /// A non-empty code list replaces ours; display keys override only if set.
    pub fn merge(&mut self, other: ConfigLayer) {
        if !other.codes.is_empty() {
            self.codes = other.codes;
        }
        if let Some(time_format) = other.display.time_format {
            self.display.time_format = time_format;
        }
        if let Some(utc) = other.display.utc {
            self.display.utc = utc;
        }
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.codes.is_empty() {
            errors.push(ValidationError {
                field: "codes".to_string(),
                message: "At least one code must be configured".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for (i, code) in self.codes.iter().enumerate() {
            if code.trim().is_empty() {
                errors.push(ValidationError {
                    field: format!("codes[{}]", i),
                    message: "Code name must not be blank".to_string(),
                });
            } else if !seen.insert(code.as_str()) {
                errors.push(ValidationError {
                    field: format!("codes[{}]", i),
                    message: format!("Duplicate code '{}'", code),
                });
            }
        }

        if self.display.time_format.trim().is_empty() {
            errors.push(ValidationError {
                field: "display.time_format".to_string(),
                message: "Time format must not be empty".to_string(),
            });
        } else if StrftimeItems::new(&self.display.time_format).any(|i| matches!(i, Item::Error)) {
            errors.push(ValidationError {
                field: "display.time_format".to_string(),
                message: format!("Invalid time format '{}'", self.display.time_format),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
