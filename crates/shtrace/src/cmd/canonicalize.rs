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

//! Canonicalize command - rewrite a trace in canonical wire form

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use eyre::{Context, Result};
use shtrace_engine::write_trace;

/// Re-serialize the trace in `path` to `output`, or to stdout
pub fn canonicalize_file(path: &Path, output: Option<&Path>) -> Result<()> {
    let trace = super::load_trace(path)?;

    match output {
        Some(output) => {
            let file = File::create(output)
                .with_context(|| format!("Failed to create output file: {output:?}"))?;
            let mut writer = BufWriter::new(file);
            write_trace(&trace, &mut writer)
                .with_context(|| format!("Failed to write trace to {output:?}"))?;
            writer.flush()?;
            tracing::info!("Wrote canonical trace to {:?}", output);
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_trace(&trace, &mut out).wrap_err("Failed to write trace")?;
            writeln!(out)?;
        }
    }

    Ok(())
}
