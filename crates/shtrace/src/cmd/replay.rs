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

//! Replay command - step through a trace and print every pause

use std::{
    io::{self, Write},
    path::Path,
};

use eyre::{Context, Result};
use itertools::Itertools;
use shtrace_common::Trace;
use shtrace_engine::{PlaybackState, Player, VariableData};

use crate::config::{ReplayConfig, StepMode};

/// Replay the trace in `path` according to `config`
pub fn replay_file(path: &Path, config: &ReplayConfig) -> Result<()> {
    let trace = super::load_trace(path)?.into_shared();
    let mut player = Player::with_trace(trace.clone());
    player.set_breakpoints(config.breakpoints.iter().copied());
    tracing::info!(
        mode = ?config.mode,
        breakpoints = %player.breakpoints().iter().join(", "),
        "Starting replay"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut stops = 0;

    while !player.trace_has_completed() {
        if stops == config.max_stops {
            writeln!(out, "stopped after {stops} pauses at event {}", player.cursor())?;
            return Ok(());
        }

        let position = player.cursor();
        // Stepping over or out of the entry point would finish the whole trace, so the
        // first move always enters the program.
        let mode = match player.state() {
            PlaybackState::NotStarted if config.mode != StepMode::Run => StepMode::Step,
            _ => config.mode,
        };
        match mode {
            StepMode::Step => player.step(),
            StepMode::Over => player.step_over(),
            StepMode::Out => player.step_out(),
            StepMode::Run => player.run(),
        }
        .with_context(|| format!("Replay failed after event {position}"))?;

        if player.trace_has_completed() {
            break;
        }
        stops += 1;

        let line = player.get_current_line().unwrap_or_default();
        let stack = player.call_stack_names().join(" -> ");
        let text = source_line(&trace, line);
        writeln!(out, "line {line} [{stack}]: {text}")?;

        if config.show_variables {
            if let Some(frame) = player.get_stack_depth().checked_sub(1) {
                write_variables(&mut out, &trace, &player.get_local_variables(frame)?, "")?;
            }
            write_variables(&mut out, &trace, &player.get_global_variables(), "global ")?;
        }
    }

    writeln!(out, "trace completed after {stops} pauses")?;
    if config.show_variables {
        write_variables(&mut out, &trace, &player.get_global_variables(), "global ")?;
    }
    out.flush()?;
    Ok(())
}

/// Source text of a 1-based line, trimmed
fn source_line(trace: &Trace, line: i32) -> &str {
    usize::try_from(line)
        .ok()
        .and_then(|line| line.checked_sub(1))
        .and_then(|index| trace.source().get(index))
        .map_or("", |text| text.trim())
}

/// One line per variable; `##` marks values written by the last step
fn write_variables<W: Write>(
    out: &mut W,
    trace: &Trace,
    vars: &[VariableData],
    prefix: &str,
) -> io::Result<()> {
    for var in vars {
        let marker = if var.dirty { "##" } else { "" };
        match trace.slot(var.slot) {
            Some(info) => writeln!(
                out,
                "  {prefix}{marker}{} = {}",
                info.display_name(),
                info.number_kind.value_to_string(var.value)
            )?,
            None => writeln!(out, "  {prefix}{marker}${} = {}", var.slot, var.value)?,
        }
    }
    Ok(())
}
