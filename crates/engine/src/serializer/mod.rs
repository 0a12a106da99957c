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

//! JSON wire format for recorded traces.
//!
//! The format is shared with existing debugger front ends:
//!
//! ```json
//! { "version": "20220209",
//!   "source": ["<line 0>", "<line 1>"],
//!   "slots": [{ "slot": 0, "name": "x", "columns": 1, "rows": 1, "index": 0,
//!               "kind": 0, "line": 2, "retval": 0 }],
//!   "functions": [{ "slot": 0, "name": "half4 main(float2 xy)" }],
//!   "trace": [[2], [0, 2], [1, 0, 1065353216], [3]] }
//! ```
//!
//! Writing always produces the canonical form: trailing zero data words are dropped,
//! `groupIdx` appears only when it differs from `index`, `pos` and `retval` only when
//! set, and `uniforms` only when the trace has any. Reading accepts the canonical form
//! and its looser variants (padded data words, missing optional keys, table entries in
//! any order).

mod error;
mod wire;

pub use error::*;

use std::io::{Read, Write};

use shtrace_common::{
    FunctionDebugInfo, FunctionId, NumberKind, SlotDebugInfo, Trace, TraceEvent, TraceOp,
    EVENT_DATA_WORDS,
};
use tracing::debug;

use wire::{RawFunction, RawSlot, RawTrace, WireTrace};

/// Version tag written into every serialized trace.
pub const TRACE_FORMAT_VERSION: &str = "20220209";

/// Largest slot or function table a reader will grow to.
pub const MAX_TABLE_LEN: usize = 1 << 20;

/// Parse a serialized trace.
///
/// The trace is assembled privately and only returned when the whole input was
/// accepted. Index consistency between events and tables is not checked here; the
/// player reports it as a corrupt trace when it gets there.
pub fn read_trace(bytes: &[u8]) -> Result<Trace, ReadError> {
    let raw: RawTrace = serde_json::from_slice(bytes)?;
    trace_from_raw(raw)
}

/// Parse a serialized trace from a reader.
pub fn read_trace_from<R: Read>(reader: R) -> Result<Trace, ReadError> {
    let raw: RawTrace = serde_json::from_reader(reader)?;
    trace_from_raw(raw)
}

/// Serialize `trace` in canonical form.
pub fn write_trace<W: Write>(trace: &Trace, writer: W) -> Result<(), WriteError> {
    serde_json::to_writer(writer, &WireTrace::new(TRACE_FORMAT_VERSION, trace))?;
    Ok(())
}

/// Serialize `trace` in canonical form into a byte vector.
pub fn to_json_vec(trace: &Trace) -> Result<Vec<u8>, WriteError> {
    Ok(serde_json::to_vec(&WireTrace::new(TRACE_FORMAT_VERSION, trace))?)
}

/// Serialize `trace` in canonical form into a string.
pub fn to_json_string(trace: &Trace) -> Result<String, WriteError> {
    Ok(serde_json::to_string(&WireTrace::new(TRACE_FORMAT_VERSION, trace))?)
}

fn trace_from_raw(raw: RawTrace) -> Result<Trace, ReadError> {
    if let Some(found) = raw.version {
        if found != TRACE_FORMAT_VERSION {
            return Err(ReadError::UnsupportedVersion { found, expected: TRACE_FORMAT_VERSION });
        }
    }

    let slots = read_slot_table("slots", raw.slots)?;
    let uniforms = read_slot_table("uniforms", raw.uniforms.unwrap_or_default())?;
    let functions = read_function_table(raw.functions)?;
    let events = read_events(raw.trace)?;

    debug!(
        source_lines = raw.source.len(),
        slots = slots.len(),
        functions = functions.len(),
        uniforms = uniforms.len(),
        events = events.len(),
        "read serialized trace"
    );

    Ok(Trace::from_parts(raw.source, slots, functions, uniforms, events))
}

/// Validate a table index and make room for it.
fn table_slot<T: Default>(table: &'static str, entries: &mut Vec<T>, index: i32) -> Result<usize, ReadError> {
    let position = usize::try_from(index).map_err(|_| ReadError::NegativeIndex { table, index })?;
    if position >= MAX_TABLE_LEN {
        return Err(ReadError::IndexTooLarge { table, index, limit: MAX_TABLE_LEN });
    }
    // Grow only; indices may arrive in any order.
    if entries.len() <= position {
        entries.resize_with(position + 1, T::default);
    }
    Ok(position)
}

fn read_slot_table(table: &'static str, raw: Vec<RawSlot>) -> Result<Vec<SlotDebugInfo>, ReadError> {
    let mut slots = Vec::with_capacity(raw.len());
    for entry in raw {
        let position = table_slot(table, &mut slots, entry.slot)?;
        let number_kind = NumberKind::try_from(entry.kind).map_err(|_| {
            ReadError::InvalidNumberKind { table, index: entry.slot, kind: entry.kind }
        })?;

        slots[position] = SlotDebugInfo {
            name: entry.name,
            columns: entry.columns,
            rows: entry.rows,
            component_index: entry.index,
            group_index: entry.group_idx.unwrap_or(i32::from(entry.index)),
            number_kind,
            line: entry.line,
            pos: entry.pos,
            fn_return_value: entry.retval.and_then(FunctionId::from_word),
        };
    }
    Ok(slots)
}

fn read_function_table(raw: Vec<RawFunction>) -> Result<Vec<FunctionDebugInfo>, ReadError> {
    let mut functions = Vec::with_capacity(raw.len());
    for entry in raw {
        let position = table_slot("functions", &mut functions, entry.slot)?;
        functions[position] = FunctionDebugInfo::new(entry.name);
    }
    Ok(functions)
}

fn read_events(raw: Vec<Vec<i32>>) -> Result<Vec<TraceEvent>, ReadError> {
    raw.iter()
        .enumerate()
        .map(|(position, entry)| {
            let (&opcode, words) =
                entry.split_first().ok_or(ReadError::EmptyTraceEntry { position })?;
            let op = TraceOp::try_from(opcode)
                .map_err(|_| ReadError::InvalidOpcode { position, opcode })?;
            TraceEvent::from_words(op, words).ok_or(ReadError::TooManyDataWords {
                position,
                count: words.len(),
                max: EVENT_DATA_WORDS,
            })
        })
        .collect()
}
