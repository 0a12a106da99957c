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

//! Forward replay of a recorded trace.
//!
//! The [`Player`] re-executes trace events against its own copy of the slot values and
//! a reconstructed call stack, which is enough to answer the questions a debugger asks
//! at a pause: which line is current, what is on the call stack, and which variables
//! are visible in each frame.
//!
//! # Stopping points
//!
//! Only `Line` and `Exit` events are places to pause. `Exit` counts so that a caller
//! regains control exactly when a callee returns, before its next statement runs.
//!
//! # Variable visibility
//!
//! Each frame keeps a display mask of the slots written while it was on top. Return
//! values are credited to the caller instead, since the callee is about to be popped,
//! and are withdrawn again at the start of the next step. Leaving a block (a negative
//! `Scope` delta) hides the slots that were only written inside it.

mod error;
mod frame;

pub use error::*;
pub use frame::{PlaybackState, VariableData};

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use shtrace_common::{FunctionId, SlotDebugInfo, SlotId, Trace, TraceOp};
use tracing::{debug, error, trace};

use frame::{SlotState, StackFrame};

/// Why execution paused on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Line(i32),
    Exit,
}

/// Replays one trace for one debugging session.
///
/// The trace itself is shared and immutable; everything mutable (cursor, slot values,
/// call stack, breakpoints) belongs to the player. Several players may replay the
/// same `Arc<Trace>` independently.
#[derive(Debug, Clone)]
pub struct Player {
    trace: Option<Arc<Trace>>,
    cursor: usize,
    /// Current block nesting depth, driven by `Scope` events.
    scope: i32,
    slots: Vec<SlotState>,
    global: StackFrame,
    calls: Vec<StackFrame>,
    /// Slots written during the most recent step.
    dirty: BTreeSet<SlotId>,
    /// Slots that hold function return values.
    return_values: BTreeSet<SlotId>,
    breakpoints: BTreeSet<i32>,
    /// Remaining `Line` events per line number, from the cursor onwards.
    line_numbers: BTreeMap<i32, u32>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    /// A player with no trace bound; it reports a completed, empty session.
    pub fn new() -> Self {
        Self {
            trace: None,
            cursor: 0,
            scope: 0,
            slots: Vec::new(),
            global: StackFrame::global(),
            calls: Vec::new(),
            dirty: BTreeSet::new(),
            return_values: BTreeSet::new(),
            breakpoints: BTreeSet::new(),
            line_numbers: BTreeMap::new(),
        }
    }

    /// A player reset against `trace`.
    pub fn with_trace(trace: Arc<Trace>) -> Self {
        let mut player = Self::new();
        player.reset(Some(trace));
        player
    }

    /// Rebind to `trace` (or to nothing) and rewind to the first event.
    ///
    /// Slot values, the call stack and the per-line counts start over; breakpoints are
    /// kept.
    pub fn reset(&mut self, trace: Option<Arc<Trace>>) {
        let slot_count = trace.as_ref().map_or(0, |trace| trace.slot_info().len());

        self.cursor = 0;
        self.scope = 0;
        self.slots = vec![SlotState::default(); slot_count];
        self.global = StackFrame::global();
        self.calls.clear();
        self.dirty.clear();
        self.return_values.clear();
        self.line_numbers.clear();

        match &trace {
            Some(trace) => {
                self.return_values = trace
                    .slot_info()
                    .iter()
                    .enumerate()
                    .filter(|(_, info)| info.is_return_value())
                    .map(|(index, _)| SlotId::new(index as u32))
                    .collect();
                for event in trace.events().iter().filter(|event| event.op == TraceOp::Line) {
                    *self.line_numbers.entry(event.data[0]).or_default() += 1;
                }
                debug!(
                    events = trace.len(),
                    slots = slot_count,
                    functions = trace.function_info().len(),
                    "player reset"
                );
            }
            None => debug!("player reset without a trace"),
        }

        self.trace = trace;
    }

    /// Apply the event at `position` and report whether it is a stopping point.
    ///
    /// This is the interpretation primitive behind every stepping operation; it does
    /// not move the cursor.
    pub fn execute(&mut self, position: usize) -> Result<bool, PlayerError> {
        Ok(self.execute_event(position)?.is_some())
    }

    /// Step into: run to the next stopping point, entering calls.
    pub fn step(&mut self) -> Result<(), PlayerError> {
        if self.trace_has_completed() {
            return Ok(());
        }
        self.tidy_state();
        while !self.trace_has_completed() {
            if self.advance()?.is_some() {
                break;
            }
        }
        self.log_pause("step");
        Ok(())
    }

    /// Step over: like [`Player::step`], but run through any call made from the
    /// current frame. A breakpoint inside such a call still pauses there.
    pub fn step_over(&mut self) -> Result<(), PlayerError> {
        if self.trace_has_completed() {
            return Ok(());
        }
        self.tidy_state();
        let initial_depth = self.calls.len();
        while !self.trace_has_completed() {
            let can_escape = self.calls.len() <= initial_depth;
            if let Some(stop) = self.advance()? {
                if can_escape || self.is_breakpoint(stop) {
                    break;
                }
            }
        }
        self.log_pause("step over");
        Ok(())
    }

    /// Step out: run until the current frame returns to its caller, a breakpoint is
    /// reached, or the trace ends.
    pub fn step_out(&mut self) -> Result<(), PlayerError> {
        if self.trace_has_completed() {
            return Ok(());
        }
        self.tidy_state();
        let initial_depth = self.calls.len();
        while !self.trace_has_completed() {
            if let Some(stop) = self.advance()? {
                if self.calls.len() < initial_depth || self.is_breakpoint(stop) {
                    break;
                }
            }
        }
        self.log_pause("step out");
        Ok(())
    }

    /// Run until a breakpoint line is reached or the trace ends.
    pub fn run(&mut self) -> Result<(), PlayerError> {
        if self.trace_has_completed() {
            return Ok(());
        }
        self.tidy_state();
        while !self.trace_has_completed() {
            if let Some(stop) = self.advance()? {
                if self.is_breakpoint(stop) {
                    break;
                }
            }
        }
        self.log_pause("run");
        Ok(())
    }

    /// Replace the breakpoint set. Takes effect on the next step or run.
    pub fn set_breakpoints<I: IntoIterator<Item = i32>>(&mut self, lines: I) {
        self.breakpoints = lines.into_iter().collect();
    }

    /// Add one breakpoint line; returns `false` if it was already set.
    pub fn add_breakpoint(&mut self, line: i32) -> bool {
        self.breakpoints.insert(line)
    }

    /// Remove one breakpoint line; returns `false` if it was not set.
    pub fn remove_breakpoint(&mut self, line: i32) -> bool {
        self.breakpoints.remove(&line)
    }

    /// Current breakpoint lines.
    pub fn breakpoints(&self) -> &BTreeSet<i32> {
        &self.breakpoints
    }

    /// The bound trace.
    pub fn trace(&self) -> Option<&Arc<Trace>> {
        self.trace.as_ref()
    }

    /// Index of the next event to execute.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether every event has executed, or no trace is bound.
    pub fn trace_has_completed(&self) -> bool {
        self.trace.as_ref().is_none_or(|trace| self.cursor >= trace.len())
    }

    /// Where the session is in its lifecycle.
    pub fn state(&self) -> PlaybackState {
        if self.trace_has_completed() {
            PlaybackState::Completed
        } else if self.cursor == 0 {
            PlaybackState::NotStarted
        } else {
            PlaybackState::Running
        }
    }

    /// Current line of the innermost frame; `None` before the first step and after
    /// the trace completes.
    pub fn get_current_line(&self) -> Option<i32> {
        if self.trace_has_completed() {
            return None;
        }
        self.top().line
    }

    /// Current line of call frame `frame` (0 is the outermost call).
    pub fn get_current_line_in_stack_frame(&self, frame: usize) -> Result<Option<i32>, PlayerError> {
        Ok(self.call_frame(frame)?.line)
    }

    /// Functions on the call stack, outermost first.
    pub fn get_call_stack(&self) -> Vec<FunctionId> {
        self.calls.iter().filter_map(|frame| frame.function).collect()
    }

    /// Declarations of the functions on the call stack, outermost first.
    pub fn call_stack_names(&self) -> Vec<String> {
        self.get_call_stack()
            .into_iter()
            .map(|function| {
                self.trace
                    .as_ref()
                    .and_then(|trace| trace.function(function))
                    .map_or_else(|| format!("F{function}"), |info| info.name.clone())
            })
            .collect()
    }

    /// Number of calls in progress.
    pub fn get_stack_depth(&self) -> usize {
        self.calls.len()
    }

    /// Variables written in call frame `frame` (0 is the outermost call), most recently
    /// written first.
    pub fn get_local_variables(&self, frame: usize) -> Result<Vec<VariableData>, PlayerError> {
        Ok(self.variables_for_mask(&self.call_frame(frame)?.display_mask))
    }

    /// Variables written outside of any call, plus return values handed back to the
    /// global scope; most recently written first.
    pub fn get_global_variables(&self) -> Vec<VariableData> {
        self.variables_for_mask(&self.global.display_mask)
    }

    /// Remaining `Line` events per line number from the cursor onwards.
    pub fn get_line_numbers_reached(&self) -> &BTreeMap<i32, u32> {
        &self.line_numbers
    }

    /// Raw bits currently held by `slot`.
    pub fn slot_bits(&self, slot: SlotId) -> Option<i32> {
        self.slots.get(slot.index()).map(|state| state.bits)
    }

    fn top(&self) -> &StackFrame {
        self.calls.last().unwrap_or(&self.global)
    }

    fn call_frame(&self, frame: usize) -> Result<&StackFrame, PlayerError> {
        self.calls
            .get(frame)
            .ok_or(PlayerError::FrameOutOfRange { frame, depth: self.calls.len() })
    }

    fn variables_for_mask(&self, mask: &BTreeSet<SlotId>) -> Vec<VariableData> {
        let Some(trace) = &self.trace else {
            return Vec::new();
        };

        let mut vars: Vec<VariableData> = mask
            .iter()
            .filter_map(|&slot| {
                let info = trace.slot(slot)?;
                let state = self.slots.get(slot.index())?;
                Some(VariableData {
                    slot,
                    dirty: self.dirty.contains(&slot),
                    value: info.number_kind.interpret(state.bits),
                })
            })
            .collect();

        // Stable: equally recent slots stay in slot order.
        vars.sort_by_key(|var| Reverse(self.slots[var.slot.index()].write_time));
        vars
    }

    fn is_breakpoint(&self, stop: Stop) -> bool {
        matches!(stop, Stop::Line(line) if self.breakpoints.contains(&line))
    }

    /// Forget the previous step's dirty marks and withdraw return values the caller
    /// has now seen.
    fn tidy_state(&mut self) {
        self.dirty.clear();
        let return_values = &self.return_values;
        let top = self.calls.last_mut().unwrap_or(&mut self.global);
        top.display_mask.retain(|slot| !return_values.contains(slot));
    }

    fn advance(&mut self) -> Result<Option<Stop>, PlayerError> {
        let position = self.cursor;
        self.cursor += 1;
        self.execute_event(position)
    }

    fn log_pause(&self, operation: &'static str) {
        trace!(
            operation,
            cursor = self.cursor,
            line = ?self.get_current_line(),
            depth = self.calls.len(),
            completed = self.trace_has_completed(),
            "paused"
        );
    }

    fn execute_event(&mut self, position: usize) -> Result<Option<Stop>, PlayerError> {
        let Some(trace) = self.trace.clone() else {
            return Err(corrupt(CorruptTrace::CursorOutOfRange { position, len: 0 }));
        };
        let Some(&event) = trace.events().get(position) else {
            return Err(corrupt(CorruptTrace::CursorOutOfRange { position, len: trace.len() }));
        };

        match event.op {
            TraceOp::Line => {
                let line = event.data[0];
                self.top_mut().line = Some(line);
                if let Some(remaining) = self.line_numbers.get_mut(&line) {
                    *remaining = remaining.saturating_sub(1);
                }
                Ok(Some(Stop::Line(line)))
            }
            TraceOp::Var => {
                let slot_infos = trace.slot_info();
                let slot = SlotId::from_word(event.data[0])
                    .filter(|slot| slot.index() < slot_infos.len())
                    .ok_or_else(|| {
                        corrupt(CorruptTrace::SlotOutOfRange {
                            position,
                            slot: event.data[0],
                            slot_count: slot_infos.len(),
                        })
                    })?;

                let frame = if slot_infos[slot.index()].is_return_value() {
                    // The callee is about to be popped; the caller shows the value.
                    match self.calls.len() {
                        0 => {
                            return Err(corrupt(CorruptTrace::ReturnValueWithoutCaller {
                                position,
                                slot,
                            }))
                        }
                        1 => &mut self.global,
                        depth => &mut self.calls[depth - 2],
                    }
                } else {
                    self.calls.last_mut().unwrap_or(&mut self.global)
                };
                frame.display_mask.insert(slot);

                let state = &mut self.slots[slot.index()];
                state.bits = event.data[1];
                state.scope = state.scope.min(self.scope);
                touch_variable(&mut self.slots, slot_infos, slot, position);
                self.dirty.insert(slot);
                Ok(None)
            }
            TraceOp::Enter => {
                let function = check_function(&trace, position, event.data[0])?;
                self.calls.push(StackFrame::call(function));
                Ok(None)
            }
            TraceOp::Exit => {
                let function = check_function(&trace, position, event.data[0])?;
                match self.calls.last().map(|frame| frame.function) {
                    None => {
                        return Err(corrupt(CorruptTrace::ExitFromGlobalFrame {
                            position,
                            function,
                        }))
                    }
                    Some(Some(innermost)) if innermost != function => {
                        return Err(corrupt(CorruptTrace::MismatchedExit {
                            position,
                            function,
                            innermost,
                        }))
                    }
                    Some(_) => {}
                }
                self.calls.pop();
                Ok(Some(Stop::Exit))
            }
            TraceOp::Scope => {
                let delta = event.data[0];
                self.scope = self.scope.saturating_add(delta);
                if delta < 0 {
                    let current = self.scope;
                    let top = self.calls.last_mut().unwrap_or(&mut self.global);
                    for (index, state) in self.slots.iter_mut().enumerate() {
                        if current < state.scope {
                            state.scope = i32::MAX;
                            top.display_mask.remove(&SlotId::new(index as u32));
                        }
                    }
                }
                Ok(None)
            }
        }
    }

    fn top_mut(&mut self) -> &mut StackFrame {
        self.calls.last_mut().unwrap_or(&mut self.global)
    }
}

fn corrupt(err: CorruptTrace) -> PlayerError {
    error!(%err, "corrupt trace detected during replay");
    err.into()
}

fn check_function(trace: &Trace, position: usize, word: i32) -> Result<FunctionId, PlayerError> {
    let function_count = trace.function_info().len();
    FunctionId::from_word(word).filter(|function| function.index() < function_count).ok_or_else(
        || corrupt(CorruptTrace::FunctionOutOfRange { position, function: word, function_count }),
    )
}

/// Stamp `position` as the write time of every slot in the variable containing `slot`.
///
/// A variable's slots are contiguous; the first has group index 0 and `group_index`
/// is each slot's offset from it.
fn touch_variable(slots: &mut [SlotState], infos: &[SlotDebugInfo], slot: SlotId, position: usize) {
    let index = slot.index();
    let offset = usize::try_from(infos[index].group_index).ok().filter(|offset| *offset <= index);
    let mut current = index - offset.unwrap_or(0);
    loop {
        slots[current].write_time = position;
        current += 1;
        if current >= infos.len() || infos[current].group_index == 0 {
            break;
        }
    }
}
