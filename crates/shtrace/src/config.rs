// shtrace - Shader Debug-Trace Replay
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration file handling

use std::{fs, path::{Path, PathBuf}};

use clap::ValueEnum;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for `shtrace replay`
    pub replay: ReplayConfig,
    /// Settings for `shtrace dump`
    pub dump: DumpConfig,
}

/// How `shtrace replay` advances between pauses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    /// Step into every call
    #[default]
    Step,
    /// Step over calls made from the current frame
    Over,
    /// Run until the current frame returns
    Out,
    /// Run from breakpoint to breakpoint
    Run,
}

/// Replay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Default stepping mode
    pub mode: StepMode,
    /// Lines to pause on
    pub breakpoints: Vec<i32>,
    /// Maximum number of pauses before giving up
    pub max_stops: usize,
    /// Print the visible variables at each pause
    pub show_variables: bool,
}

/// Dump configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Print the numbered shader source before the listing
    pub show_source: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { mode: StepMode::Step, breakpoints: Vec::new(), max_stops: 10_000, show_variables: true }
    }
}

impl Config {
    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("Unable to determine home directory"))?;
        Ok(home.join(".shtrace.toml"))
    }

    /// Load configuration from `path`, or the defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as TOML: {path:?}"))?;

        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {path:?}"))?;

        debug!("Saved configuration to {:?}", path);
        Ok(())
    }
}
