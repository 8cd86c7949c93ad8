//! Ambient settings read from `jobmux.toml`.
//!
//! Every section is optional; a missing file means defaults. The path can be
//! overridden with `JOBMUX_CONFIG`, in which case the file must exist.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_FILE: &str = "jobmux.toml";
const SETTINGS_ENV: &str = "JOBMUX_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub compiler: CompilerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub run: RunSettings,
}

#[derive(Debug, Deserialize)]
pub struct CompilerSettings {
    /// Program and leading arguments; job arguments are appended.
    #[serde(default = "default_command")]
    pub command: Vec<String>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunSettings {
    /// Exit with failure when any job failed.
    #[serde(default)]
    pub strict_exit: bool,
}

fn default_command() -> Vec<String> {
    ["java", "-jar", "closure-compiler.jar"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

impl Settings {
    /// Loads settings from `JOBMUX_CONFIG` or `./jobmux.toml`.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => {
                let path = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parses a settings file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file '{}'", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Invalid settings file '{}'", path.display()))
    }

    fn from_toml(text: &str) -> anyhow::Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        if settings.compiler.command.is_empty() {
            anyhow::bail!("[compiler] command must name a program");
        }
        Ok(settings)
    }
}
