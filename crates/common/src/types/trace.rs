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

//! The immutable trace record.

use std::sync::Arc;

use crate::{FunctionDebugInfo, FunctionId, SlotDebugInfo, SlotId, TraceError, TraceEvent, TraceOp};

/// A complete recorded execution: metadata plus the ordered events.
///
/// A `Trace` has no mutating API. It is produced by [`crate::TraceBuilder`] or by
/// deserialization and is usually shared between debugger sessions as an `Arc<Trace>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    pub(crate) source: Vec<String>,
    pub(crate) slots: Vec<SlotDebugInfo>,
    pub(crate) functions: Vec<FunctionDebugInfo>,
    pub(crate) uniforms: Vec<SlotDebugInfo>,
    pub(crate) events: Vec<TraceEvent>,
}

impl Trace {
    /// Assemble a trace from its parts without checking invariants.
    ///
    /// Deserializers use this; they hand structurally valid but unchecked data to the
    /// player, which reports index corruption when it reaches it. Producers should use
    /// [`crate::TraceBuilder`] instead.
    pub fn from_parts(
        source: Vec<String>,
        slots: Vec<SlotDebugInfo>,
        functions: Vec<FunctionDebugInfo>,
        uniforms: Vec<SlotDebugInfo>,
        events: Vec<TraceEvent>,
    ) -> Self {
        Self { source, slots, functions, uniforms, events }
    }

    /// Source text, one entry per line.
    pub fn source(&self) -> &[String] {
        &self.source
    }

    /// Slot metadata, indexed by [`SlotId`].
    pub fn slot_info(&self) -> &[SlotDebugInfo] {
        &self.slots
    }

    /// Metadata of one slot.
    pub fn slot(&self, slot: SlotId) -> Option<&SlotDebugInfo> {
        self.slots.get(slot.index())
    }

    /// Function metadata, indexed by [`FunctionId`].
    pub fn function_info(&self) -> &[FunctionDebugInfo] {
        &self.functions
    }

    /// Metadata of one function.
    pub fn function(&self, function: FunctionId) -> Option<&FunctionDebugInfo> {
        self.functions.get(function.index())
    }

    /// Slots holding external uniform inputs.
    pub fn uniform_info(&self) -> &[SlotDebugInfo] {
        &self.uniforms
    }

    /// Recorded events in execution order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events were recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Render a raw value stored in `slot`, or `None` if the slot does not exist.
    pub fn slot_value_string(&self, slot: SlotId, bits: i32) -> Option<String> {
        self.slot(slot).map(|info| info.format_value(bits))
    }

    /// Wrap the trace for sharing between players.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Check the structural invariants of the trace.
    ///
    /// Every `Var` must name an existing slot, every `Enter`/`Exit` an existing
    /// function, return-value flags must point at existing functions, and calls must be
    /// properly nested and closed by the end of the trace.
    pub fn validate(&self) -> Result<(), TraceError> {
        for (index, info) in self.slots.iter().enumerate() {
            if let Some(function) = info.fn_return_value {
                if function.index() >= self.functions.len() {
                    return Err(TraceError::ReturnValueOutOfRange {
                        slot: SlotId::new(index as u32),
                        function,
                    });
                }
            }
        }

        let mut open_calls: Vec<FunctionId> = Vec::new();
        for (position, event) in self.events.iter().enumerate() {
            match event.op {
                TraceOp::Var => {
                    self.check_slot(position, event.data[0])?;
                }
                TraceOp::Enter => {
                    open_calls.push(self.check_function(position, event.data[0])?);
                }
                TraceOp::Exit => {
                    let function = self.check_function(position, event.data[0])?;
                    let innermost = open_calls.last().copied();
                    if innermost != Some(function) {
                        return Err(TraceError::UnbalancedExit {
                            position,
                            function: event.data[0],
                            expected: innermost,
                        });
                    }
                    open_calls.pop();
                }
                TraceOp::Line | TraceOp::Scope => {}
            }
        }

        match open_calls.pop() {
            Some(function) => Err(TraceError::UnterminatedCall { function }),
            None => Ok(()),
        }
    }

    fn check_slot(&self, position: usize, word: i32) -> Result<SlotId, TraceError> {
        SlotId::from_word(word).filter(|slot| slot.index() < self.slots.len()).ok_or(
            TraceError::SlotOutOfRange { position, slot: word, slot_count: self.slots.len() },
        )
    }

    fn check_function(&self, position: usize, word: i32) -> Result<FunctionId, TraceError> {
        FunctionId::from_word(word).filter(|function| function.index() < self.functions.len()).ok_or(
            TraceError::FunctionOutOfRange {
                position,
                function: word,
                function_count: self.functions.len(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::ensure_test_logging;
    use crate::NumberKind;

    fn sample() -> Trace {
        Trace::from_parts(
            vec!["int main() {".into(), "  return 1;".into(), "}".into()],
            vec![SlotDebugInfo::scalar("[main].result", NumberKind::Signed, 1)
                .returning(FunctionId::new(0))],
            vec![FunctionDebugInfo::new("int main()")],
            vec![],
            vec![
                TraceEvent::enter(FunctionId::new(0)),
                TraceEvent::line(1),
                TraceEvent::var(SlotId::new(0), 1),
                TraceEvent::exit(FunctionId::new(0)),
            ],
        )
    }

    #[test]
    fn test_valid_trace_passes() {
        ensure_test_logging(None);
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn test_slot_out_of_range() {
        ensure_test_logging(None);
        let mut trace = sample();
        trace.events[2] = TraceEvent::var(SlotId::new(9), 1);
        assert!(matches!(
            trace.validate(),
            Err(TraceError::SlotOutOfRange { position: 2, slot: 9, slot_count: 1 })
        ));
    }

    #[test]
    fn test_unbalanced_calls() {
        ensure_test_logging(None);
        let mut trace = sample();
        trace.events.pop();
        assert_eq!(
            trace.validate(),
            Err(TraceError::UnterminatedCall { function: FunctionId::new(0) })
        );

        let mut trace = sample();
        trace.events.insert(0, TraceEvent::exit(FunctionId::new(0)));
        assert!(matches!(trace.validate(), Err(TraceError::UnbalancedExit { position: 0, .. })));
    }

    #[test]
    fn test_return_value_must_name_function() {
        ensure_test_logging(None);
        let mut trace = sample();
        trace.slots[0].fn_return_value = Some(FunctionId::new(3));
        assert!(matches!(trace.validate(), Err(TraceError::ReturnValueOutOfRange { .. })));
    }

    #[test]
    fn test_value_string_lookup() {
        ensure_test_logging(None);
        let trace = sample();
        assert_eq!(trace.slot_value_string(SlotId::new(0), -4).as_deref(), Some("-4"));
        assert_eq!(trace.slot_value_string(SlotId::new(1), 0), None);
    }
}
