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

//! shtrace - Shader Debug-Trace Replay
//!
//! Inspect, canonicalize and step through recorded shader debug traces.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;

mod cmd;
mod config;

use config::{Config, StepMode};

/// Command-line interface for shtrace
#[derive(Debug, Parser)]
#[command(name = "shtrace")]
#[command(about = "Shader debug-trace replay - inspect and step through recorded shader traces")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ~/.shtrace.toml)
    #[arg(long, global = true, env = "SHTRACE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write logs to a daily-rotated file under the temp directory
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print a human-readable listing of a trace
    Dump {
        /// Trace file in JSON format
        file: PathBuf,

        /// Print the numbered shader source before the listing
        #[arg(long)]
        source: bool,
    },
    /// Replay a trace and print every pause
    Replay {
        /// Trace file in JSON format
        file: PathBuf,

        /// How to advance between pauses
        #[arg(long, value_enum)]
        mode: Option<StepMode>,

        /// Pause on this line; may be repeated
        #[arg(short = 'b', long = "breakpoint", value_name = "LINE")]
        breakpoints: Vec<i32>,

        /// Give up after this many pauses
        #[arg(long)]
        max_stops: Option<usize>,

        /// Do not print variables at each pause
        #[arg(long)]
        no_vars: bool,
    },
    /// Rewrite a trace in canonical form
    Canonicalize {
        /// Trace file in JSON format
        file: PathBuf,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage the configuration file
    Config {
        /// Configuration action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    shtrace_common::logging::init_logging("shtrace", cli.log_file)?;

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        Commands::Dump { file, source } => {
            let config = Config::load_from(&config_path)?;
            cmd::dump_file(&file, source || config.dump.show_source)
        }
        Commands::Replay { file, mode, breakpoints, max_stops, no_vars } => {
            let mut config = Config::load_from(&config_path)?.replay;
            if let Some(mode) = mode {
                config.mode = mode;
            }
            if !breakpoints.is_empty() {
                config.breakpoints = breakpoints;
            }
            if let Some(max_stops) = max_stops {
                config.max_stops = max_stops;
            }
            if no_vars {
                config.show_variables = false;
            }
            cmd::replay_file(&file, &config)
        }
        Commands::Canonicalize { file, output } => cmd::canonicalize_file(&file, output.as_deref()),
        Commands::Config { action } => cmd::config_command(&action, &config_path),
    }
}
