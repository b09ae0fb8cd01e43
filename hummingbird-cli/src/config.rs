//! Configuration for the `hummingbird` command-line tool.

use std::path::Path;

use hummingbird_core::GeneratorConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Generator settings, including `[generator.encoder]` and
    /// `[generator.geometry]`.
    pub generator: GeneratorConfig,
    /// Input stream settings.
    pub input: InputConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Input stream settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// One byte per pixel (> 127 = on) instead of one bit per pixel.
    pub grey: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

/// Why [`ToolConfig::load`] fell back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadNote {
    /// No readable file at the path.
    Missing(String),
    /// The file exists but does not parse.
    Invalid(String),
}

impl LoadNote {
    /// Log the note: a missing file is informational, a broken one is not.
    pub fn log(&self) {
        match self {
            Self::Missing(message) => tracing::info!("{message}"),
            Self::Invalid(message) => tracing::warn!("{message}"),
        }
    }
}

impl ToolConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// Runs before the subscriber is installed, so problems are returned
    /// as a note for the caller to log.
    pub fn load(path: &Path) -> (Self, Option<LoadNote>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, None),
                Err(e) => (
                    Self::default(),
                    Some(LoadNote::Invalid(format!(
                        "invalid config {}: {e}; using defaults",
                        path.display()
                    ))),
                ),
            },
            Err(_) => (
                Self::default(),
                Some(LoadNote::Missing(format!(
                    "no config at {}; using defaults",
                    path.display()
                ))),
            ),
        }
    }

    /// Render the default configuration as TOML.
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }
}

// ── Tests ────────────────────────────────────────────────────────
