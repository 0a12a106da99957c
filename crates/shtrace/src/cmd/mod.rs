//! Command modules for the shtrace CLI

pub mod canonicalize;
pub mod config;
pub mod dump;
pub mod replay;

pub use canonicalize::canonicalize_file;
pub use config::config_command;
pub use dump::dump_file;
pub use replay::replay_file;

use std::{fs, path::Path};

use eyre::{Context, Result};
use shtrace_common::Trace;
use shtrace_engine::read_trace;

/// Read and parse a trace file
pub(crate) fn load_trace(path: &Path) -> Result<Trace> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read trace file: {path:?}"))?;
    let trace =
        read_trace(&bytes).with_context(|| format!("Failed to parse trace file: {path:?}"))?;
    tracing::info!(
        path = %path.display(),
        events = trace.len(),
        slots = trace.slot_info().len(),
        functions = trace.function_info().len(),
        "Loaded trace"
    );
    Ok(trace)
}
