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

//! Human-readable rendering of a trace.
//!
//! ```text
//! $0 = [main].result (int, L2)
//! F0 = int main()
//!
//! enter int main()
//!   line 3
//!   [main].result = 4
//! exit int main()
//! ```
//!
//! The output is meant for people and logs; it is not a stable format.

use std::io::{self, Write};

use shtrace_common::{FunctionId, SlotDebugInfo, SlotId, Trace, TraceEvent, TraceOp};

/// Indentation stops growing here, whatever the scope deltas say.
const MAX_INDENT: usize = 256;

/// Write the slot table, function table and indented event list of `trace`.
///
/// Events that reference unknown slots or functions are printed with their raw
/// numbers instead of names.
pub fn dump_trace<W: Write>(trace: &Trace, mut out: W) -> io::Result<()> {
    for (index, info) in trace.slot_info().iter().enumerate() {
        writeln!(out, "${index} = {}", describe_slot(info))?;
    }
    for (index, info) in trace.uniform_info().iter().enumerate() {
        writeln!(out, "U{index} = {}", describe_slot(info))?;
    }
    for (index, info) in trace.function_info().iter().enumerate() {
        writeln!(out, "F{index} = {}", info.name)?;
    }
    writeln!(out)?;

    let mut indent = String::new();
    for event in trace.events() {
        match event.op {
            TraceOp::Line => writeln!(out, "{indent}line {}", event.data[0])?,
            TraceOp::Var => writeln!(out, "{indent}{}", describe_write(trace, event))?,
            TraceOp::Enter => {
                writeln!(out, "{indent}enter {}", function_name(trace, event.data[0]))?;
                indent.push_str("  ");
            }
            TraceOp::Exit => {
                shrink(&mut indent, 2);
                writeln!(out, "{indent}exit {}", function_name(trace, event.data[0]))?;
            }
            TraceOp::Scope => {
                let delta = event.data[0];
                if delta < 0 {
                    shrink(&mut indent, delta.unsigned_abs() as usize);
                }
                writeln!(out, "{indent}scope {delta:+}")?;
                if delta > 0 {
                    let room = MAX_INDENT.saturating_sub(indent.len());
                    indent.extend(std::iter::repeat_n(' ', (delta as usize).min(room)));
                }
            }
        }
    }

    Ok(())
}

/// Render `trace` with [`dump_trace`] into a string.
pub fn dump_to_string(trace: &Trace) -> String {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = dump_trace(trace, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

fn shrink(indent: &mut String, by: usize) {
    indent.truncate(indent.len().saturating_sub(by));
}

/// `name (type[shape : slot k/n], L<line>)`
fn describe_slot(info: &SlotDebugInfo) -> String {
    let mut text = format!("{} ({}", info.name, info.number_kind.type_name());
    let count = info.component_count();
    if count > 1 {
        text.push_str(&info.columns.to_string());
        if info.rows != 1 {
            text.push_str(&format!("x{}", info.rows));
        }
        text.push_str(&format!(" : slot {}/{count}", u32::from(info.component_index) + 1));
    }
    text.push_str(&format!(", L{})", info.line));
    text
}

fn describe_write(trace: &Trace, event: &TraceEvent) -> String {
    let bits = event.data[1];
    match SlotId::from_word(event.data[0]).and_then(|slot| trace.slot(slot)) {
        Some(info) => format!("{} = {}", info.display_name(), info.format_value(bits)),
        None => format!("${} = {bits}", event.data[0]),
    }
}

fn function_name(trace: &Trace, word: i32) -> String {
    FunctionId::from_word(word)
        .and_then(|function| trace.function(function))
        .map_or_else(|| format!("F{word}"), |info| info.name.clone())
}
