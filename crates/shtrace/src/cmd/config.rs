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

//! Config command - create or show the configuration file

use std::path::Path;

use eyre::{Context, Result};

use crate::{config::Config, ConfigAction};

/// Run a `shtrace config` action against the file at `path`
pub fn config_command(action: &ConfigAction, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                eyre::bail!("Config file already exists at {path:?}; use --force to overwrite");
            }
            Config::default().save_to(path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        ConfigAction::Show => {
            let config = Config::load_from(path)?;
            let content = toml::to_string_pretty(&config)
                .with_context(|| "Failed to serialize config to TOML")?;
            print!("{content}");
        }
    }
    Ok(())
}
