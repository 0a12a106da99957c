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

//! Serde mirrors of the JSON wire format.
//!
//! Reading goes through owned structs so that every required field is checked by serde;
//! writing borrows from the [`Trace`] so no metadata is copied.

use serde::{ser::SerializeSeq, Deserialize, Serialize, Serializer};
use shtrace_common::{SlotDebugInfo, Trace, TraceEvent};

/// Root object as read from the wire.
#[derive(Debug, Deserialize)]
pub(super) struct RawTrace {
    #[serde(default)]
    pub version: Option<String>,
    pub source: Vec<String>,
    pub slots: Vec<RawSlot>,
    pub functions: Vec<RawFunction>,
    #[serde(default)]
    pub uniforms: Option<Vec<RawSlot>>,
    pub trace: Vec<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawSlot {
    pub slot: i32,
    pub name: String,
    pub columns: u8,
    pub rows: u8,
    pub index: u8,
    #[serde(rename = "groupIdx", default)]
    pub group_idx: Option<i32>,
    pub kind: i32,
    pub line: i32,
    #[serde(default)]
    pub pos: Option<i32>,
    #[serde(default)]
    pub retval: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawFunction {
    pub slot: i32,
    pub name: String,
}

/// Root object as written to the wire; key order is the canonical order.
#[derive(Serialize)]
pub(super) struct WireTrace<'a> {
    pub version: &'a str,
    pub source: &'a [String],
    pub slots: Vec<WireSlot<'a>>,
    pub functions: Vec<WireFunction<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uniforms: Vec<WireSlot<'a>>,
    pub trace: Vec<WireEvent<'a>>,
}

impl<'a> WireTrace<'a> {
    pub(super) fn new(version: &'a str, trace: &'a Trace) -> Self {
        Self {
            version,
            source: trace.source(),
            slots: slot_table(trace.slot_info()),
            functions: trace
                .function_info()
                .iter()
                .enumerate()
                .map(|(slot, info)| WireFunction { slot, name: &info.name })
                .collect(),
            uniforms: slot_table(trace.uniform_info()),
            trace: trace.events().iter().map(WireEvent).collect(),
        }
    }
}

fn slot_table(slots: &[SlotDebugInfo]) -> Vec<WireSlot<'_>> {
    slots.iter().enumerate().map(|(slot, info)| WireSlot { slot, info }).collect()
}

pub(super) struct WireSlot<'a> {
    slot: usize,
    info: &'a SlotDebugInfo,
}

impl Serialize for WireSlot<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Fields<'a> {
            slot: usize,
            name: &'a str,
            columns: u8,
            rows: u8,
            index: u8,
            #[serde(rename = "groupIdx", skip_serializing_if = "Option::is_none")]
            group_idx: Option<i32>,
            kind: i32,
            line: i32,
            #[serde(skip_serializing_if = "Option::is_none")]
            pos: Option<i32>,
            #[serde(skip_serializing_if = "Option::is_none")]
            retval: Option<u32>,
        }

        let info = self.info;
        let group_idx = (info.group_index != i32::from(info.component_index))
            .then_some(info.group_index);
        Fields {
            slot: self.slot,
            name: &info.name,
            columns: info.columns,
            rows: info.rows,
            index: info.component_index,
            group_idx,
            kind: info.number_kind.into(),
            line: info.line,
            pos: info.pos,
            retval: info.fn_return_value.map(u32::from),
        }
        .serialize(serializer)
    }
}

#[derive(Serialize)]
pub(super) struct WireFunction<'a> {
    slot: usize,
    name: &'a str,
}

/// `[opcode, data...]` with trailing zero words dropped.
pub(super) struct WireEvent<'a>(&'a TraceEvent);

impl Serialize for WireEvent<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = self.0.significant_data();
        let mut seq = serializer.serialize_seq(Some(1 + data.len()))?;
        seq.serialize_element(&i32::from(self.0.op))?;
        for word in data {
            seq.serialize_element(word)?;
        }
        seq.end()
    }
}
