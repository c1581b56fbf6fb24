//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{DlaError, Result};

/// Full analyzer configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub trace: TraceConfig,
    pub limits: LimitsConfig,
}

/// Preferred rendering of CLI results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human on a terminal, JSON when piped.
    #[default]
    Auto,
    Human,
    Json,
}

impl OutputFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// CLI output preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color: bool,
}

/// Scan narration sinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct TraceConfig {
    /// Narrate every round to stderr in human form.
    pub enabled: bool,
    /// Append one JSON object per scan event to this file.
    pub jsonl_path: Option<PathBuf>,
    /// Used when `jsonl_path` cannot be opened.
    pub jsonl_fallback_path: Option<PathBuf>,
}

/// Size caps applied to scenarios before scanning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_processes: usize,
    pub max_resource_types: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Auto,
            color: true,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_processes: 4_096,
            max_resource_types: 256,
        }
    }
}

impl Config {
    /// Default configuration path (`$HOME/.config/dla/config.toml`).
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
        home_dir.join(".config").join("dla").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| DlaError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str(&raw)?
        } else if path.is_some() {
            return Err(DlaError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults plus env overrides, without reading any config file.
    ///
    /// For commands that must not fail on a broken config file but should
    /// still honor `DLA_OUTPUT_FORMAT` and friends.
    pub fn defaults_with_env() -> Result<Self> {
        Self::defaults_with_env_from(env_var)
    }

    fn defaults_with_env_from<F>(lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        cfg.apply_env_overrides_from(lookup)?;
        Ok(cfg)
    }

    /// Render the effective configuration as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DlaError::Serialization {
            context: "config toml",
            details: e.to_string(),
        })
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("DLA_OUTPUT_FORMAT") {
            self.output.format =
                OutputFormat::parse(&raw).ok_or_else(|| DlaError::ConfigParse {
                    context: "env",
                    details: format!("DLA_OUTPUT_FORMAT={raw:?}: expected auto, human or json"),
                })?;
        }
        if let Some(raw) = lookup("DLA_OUTPUT_COLOR") {
            self.output.color = parse_env_bool("DLA_OUTPUT_COLOR", &raw)?;
        }
        if let Some(raw) = lookup("DLA_TRACE_ENABLED") {
            self.trace.enabled = parse_env_bool("DLA_TRACE_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("DLA_TRACE_JSONL_PATH") {
            self.trace.jsonl_path = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("DLA_MAX_PROCESSES") {
            self.limits.max_processes = parse_env_usize("DLA_MAX_PROCESSES", &raw)?;
        }
        if let Some(raw) = lookup("DLA_MAX_RESOURCE_TYPES") {
            self.limits.max_resource_types = parse_env_usize("DLA_MAX_RESOURCE_TYPES", &raw)?;
        }
        Ok(())
    }

    /// Reject settings no analysis could run under.
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_processes == 0 {
            return Err(DlaError::InvalidConfig {
                details: "limits.max_processes must be > 0".to_string(),
            });
        }
        if self.limits.max_resource_types == 0 {
            return Err(DlaError::InvalidConfig {
                details: "limits.max_resource_types must be > 0".to_string(),
            });
        }
        if self.trace.jsonl_fallback_path.is_some() && self.trace.jsonl_path.is_none() {
            return Err(DlaError::InvalidConfig {
                details: "trace.jsonl_fallback_path requires trace.jsonl_path".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|error| DlaError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| DlaError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
