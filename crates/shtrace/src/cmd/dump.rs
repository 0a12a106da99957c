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

//! Dump command - human-readable trace listing

use std::{
    io::{self, Write},
    path::Path,
};

use eyre::{Context, Result};
use shtrace_engine::DebugTrace;

/// Print the listing of the trace in `path`, optionally preceded by its source
pub fn dump_file(path: &Path, show_source: bool) -> Result<()> {
    let trace = DebugTrace::from(super::load_trace(path)?);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if show_source {
        if let Some(trace) = trace.trace() {
            let width = trace.source().len().to_string().len();
            for (index, line) in trace.source().iter().enumerate() {
                writeln!(out, "{:>width$} | {line}", index + 1)?;
            }
            writeln!(out)?;
        }
    }

    trace.dump(&mut out).wrap_err("Failed to dump trace")?;
    out.flush()?;
    Ok(())
}
