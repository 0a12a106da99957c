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

//! Producer-side construction of traces.

use tracing::trace;

use crate::{
    FunctionDebugInfo, FunctionId, NumberKind, SlotDebugInfo, SlotId, Trace, TraceError,
    TraceEvent,
};

/// Accumulates metadata and events while an instrumented program runs.
///
/// This is the only way to produce a validated [`Trace`]: events are appended in
/// execution order and [`TraceBuilder::build`] checks every invariant before handing
/// out the immutable result.
///
/// ```
/// use shtrace_common::{NumberKind, SlotDebugInfo, TraceBuilder};
///
/// let mut builder = TraceBuilder::new();
/// builder.set_source("int main() {\n    return 2 + 2;\n}");
/// let main = builder.add_function("int main()");
/// let result = builder
///     .add_slot(SlotDebugInfo::scalar("[main].result", NumberKind::Signed, 1).returning(main));
/// builder.enter(main).line(2).var(result, 4).exit(main);
/// let trace = builder.build().unwrap();
/// assert_eq!(trace.len(), 4);
/// ```
#[derive(Debug, Default)]
pub struct TraceBuilder {
    trace: Trace,
}

impl TraceBuilder {
    /// Start an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the program source; it is split into lines on `\n`.
    pub fn set_source(&mut self, source: &str) -> &mut Self {
        self.trace.source = source.split('\n').map(str::to_string).collect();
        self
    }

    /// Register a slot and return its id.
    pub fn add_slot(&mut self, info: SlotDebugInfo) -> SlotId {
        let id = SlotId::new(self.trace.slots.len() as u32);
        self.trace.slots.push(info);
        id
    }

    /// Register every component of a `columns`×`rows` variable as one group.
    ///
    /// Returns the ids in component order.
    pub fn add_variable(
        &mut self,
        name: &str,
        number_kind: NumberKind,
        columns: u8,
        rows: u8,
        line: i32,
    ) -> Vec<SlotId> {
        let count = u16::from(columns) * u16::from(rows);
        (0..count)
            .map(|component| {
                let component = component as u8;
                self.add_slot(SlotDebugInfo::component(
                    name,
                    number_kind,
                    columns,
                    rows,
                    component,
                    line,
                ))
            })
            .collect()
    }

    /// Register a function and return its id.
    pub fn add_function(&mut self, name: impl Into<String>) -> FunctionId {
        let id = FunctionId::new(self.trace.functions.len() as u32);
        self.trace.functions.push(FunctionDebugInfo::new(name));
        id
    }

    /// Register an external uniform input; returns its index in the uniform table.
    pub fn add_uniform(&mut self, info: SlotDebugInfo) -> SlotId {
        let id = SlotId::new(self.trace.uniforms.len() as u32);
        self.trace.uniforms.push(info);
        id
    }

    /// Append an arbitrary event.
    pub fn push(&mut self, event: TraceEvent) -> &mut Self {
        trace!(position = self.trace.events.len(), %event, "recorded trace event");
        self.trace.events.push(event);
        self
    }

    /// Append `Line(line)`.
    pub fn line(&mut self, line: i32) -> &mut Self {
        self.push(TraceEvent::line(line))
    }

    /// Append `Var(slot, bits)`.
    pub fn var(&mut self, slot: SlotId, bits: i32) -> &mut Self {
        self.push(TraceEvent::var(slot, bits))
    }

    /// Append a `Var` carrying the bit pattern of a float.
    pub fn var_f32(&mut self, slot: SlotId, value: f32) -> &mut Self {
        self.push(TraceEvent::var(slot, value.to_bits() as i32))
    }

    /// Append `Enter(function)`.
    pub fn enter(&mut self, function: FunctionId) -> &mut Self {
        self.push(TraceEvent::enter(function))
    }

    /// Append `Exit(function)`.
    pub fn exit(&mut self, function: FunctionId) -> &mut Self {
        self.push(TraceEvent::exit(function))
    }

    /// Append `Scope(delta)`.
    pub fn scope(&mut self, delta: i32) -> &mut Self {
        self.push(TraceEvent::scope(delta))
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.trace.events.len()
    }

    /// Whether no events were recorded yet.
    pub fn is_empty(&self) -> bool {
        self.trace.events.is_empty()
    }

    /// Validate and freeze the trace.
    pub fn build(self) -> Result<Trace, TraceError> {
        self.trace.validate()?;
        Ok(self.trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::ensure_test_logging;

    #[test]
    fn test_source_split_keeps_trailing_line() {
        ensure_test_logging(None);
        let mut builder = TraceBuilder::new();
        builder.set_source("a\nb\n");
        let trace = builder.build().unwrap();
        assert_eq!(trace.source(), &["a", "b", ""]);
    }

    #[test]
    fn test_add_variable_groups_components() {
        ensure_test_logging(None);
        let mut builder = TraceBuilder::new();
        let ids = builder.add_variable("m", NumberKind::Float, 2, 2, 3);
        let trace = builder.build().unwrap();

        assert_eq!(ids.len(), 4);
        let groups: Vec<i32> = trace.slot_info().iter().map(|s| s.group_index).collect();
        assert_eq!(groups, vec![0, 1, 2, 3]);
        assert_eq!(trace.slot(ids[3]).unwrap().display_name(), "m[1][1]");
    }

    #[test]
    fn test_build_rejects_unregistered_function() {
        ensure_test_logging(None);
        let mut builder = TraceBuilder::new();
        builder.enter(FunctionId::new(0));
        assert!(matches!(builder.build(), Err(TraceError::FunctionOutOfRange { .. })));
    }
}
