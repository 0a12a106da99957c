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

//! Mutable replay state: slot values and call frames.

use std::collections::BTreeSet;

use shtrace_common::{FunctionId, SlotId};

/// Lifecycle of a replay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// Reset, nothing executed yet.
    NotStarted,
    /// Somewhere in the middle of the trace.
    Running,
    /// Every event has executed (or no trace is bound).
    Completed,
}

/// One variable component as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableData {
    /// The slot holding this value.
    pub slot: SlotId,
    /// Whether the slot was written during the most recent step.
    pub dirty: bool,
    /// The value, decoded according to the slot's number kind.
    pub value: f64,
}

/// Current contents of one slot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlotState {
    /// Raw bits of the last write.
    pub bits: i32,
    /// Shallowest block depth this slot was written at since it last went out of scope.
    pub scope: i32,
    /// Position of the last event that wrote any slot of this variable.
    pub write_time: usize,
}

impl Default for SlotState {
    fn default() -> Self {
        Self { bits: 0, scope: i32::MAX, write_time: 0 }
    }
}

/// One call on the replayed call stack.
#[derive(Debug, Clone, Default)]
pub(crate) struct StackFrame {
    /// `None` for the synthetic global frame.
    pub function: Option<FunctionId>,
    /// Last line reached in this frame.
    pub line: Option<i32>,
    /// Slots written while this frame was on top.
    pub display_mask: BTreeSet<SlotId>,
}

impl StackFrame {
    pub(crate) fn global() -> Self {
        Self::default()
    }

    pub(crate) fn call(function: FunctionId) -> Self {
        Self { function: Some(function), ..Self::default() }
    }
}
