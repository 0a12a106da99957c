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

//! Trace events emitted by the instrumented program.

use std::fmt;

use crate::{FunctionId, SlotId, TraceError};

/// Maximum number of data words an event carries.
pub const EVENT_DATA_WORDS: usize = 4;

/// Kind of a trace event. The discriminants are the opcodes used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceOp {
    /// `data[0]` = line number about to execute.
    Line = 0,
    /// `data[0]` = slot, `data[1]` = raw 32-bit value.
    Var = 1,
    /// `data[0]` = function being entered.
    Enter = 2,
    /// `data[0]` = function being exited.
    Exit = 3,
    /// `data[0]` = signed change in block nesting.
    Scope = 4,
}

impl TraceOp {
    /// Lowercase mnemonic, as printed by dumps and logs.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Var => "var",
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Scope => "scope",
        }
    }
}

impl From<TraceOp> for i32 {
    fn from(op: TraceOp) -> Self {
        op as Self
    }
}

impl TryFrom<i32> for TraceOp {
    type Error = TraceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Line,
            1 => Self::Var,
            2 => Self::Enter,
            3 => Self::Exit,
            4 => Self::Scope,
            other => return Err(TraceError::InvalidOpcode(other)),
        })
    }
}

impl fmt::Display for TraceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One recorded event: an opcode plus up to [`EVENT_DATA_WORDS`] data words.
///
/// Words an op does not use are kept at zero by the constructors, but events read from
/// untrusted input may carry anything there; consumers ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceEvent {
    /// What happened.
    pub op: TraceOp,
    /// Operands, interpreted per `op`.
    pub data: [i32; EVENT_DATA_WORDS],
}

impl TraceEvent {
    /// Build an event from an opcode and a (possibly short) data prefix.
    ///
    /// Returns `None` when more than [`EVENT_DATA_WORDS`] words are supplied.
    pub fn from_words(op: TraceOp, words: &[i32]) -> Option<Self> {
        if words.len() > EVENT_DATA_WORDS {
            return None;
        }
        let mut data = [0; EVENT_DATA_WORDS];
        data[..words.len()].copy_from_slice(words);
        Some(Self { op, data })
    }

    fn with(op: TraceOp, first: i32, second: i32) -> Self {
        Self { op, data: [first, second, 0, 0] }
    }

    /// Execution is about to reach `line`.
    pub fn line(line: i32) -> Self {
        Self::with(TraceOp::Line, line, 0)
    }

    /// `slot` was assigned the raw value `bits`.
    pub fn var(slot: SlotId, bits: i32) -> Self {
        Self::with(TraceOp::Var, slot.index() as i32, bits)
    }

    /// `function` was called.
    pub fn enter(function: FunctionId) -> Self {
        Self::with(TraceOp::Enter, function.index() as i32, 0)
    }

    /// `function` returned.
    pub fn exit(function: FunctionId) -> Self {
        Self::with(TraceOp::Exit, function.index() as i32, 0)
    }

    /// Block nesting changed by `delta`.
    pub fn scope(delta: i32) -> Self {
        Self::with(TraceOp::Scope, delta, 0)
    }

    /// Whether a debugger may pause on this event.
    pub fn is_stopping_point(&self) -> bool {
        matches!(self.op, TraceOp::Line | TraceOp::Exit)
    }

    /// The data words up to and including the last nonzero one.
    pub fn significant_data(&self) -> &[i32] {
        let len = self.data.iter().rposition(|word| *word != 0).map_or(0, |last| last + 1);
        &self.data[..len]
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        for word in self.significant_data() {
            write!(f, " {word}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::ensure_test_logging;

    #[test]
    fn test_significant_data_drops_trailing_zeros() {
        ensure_test_logging(None);
        assert_eq!(TraceEvent::line(3).significant_data(), &[3]);
        assert_eq!(TraceEvent::var(SlotId::new(0), 0).significant_data(), &[] as &[i32]);
        assert_eq!(TraceEvent::var(SlotId::new(2), 5).significant_data(), &[2, 5]);
        assert_eq!(TraceEvent::var(SlotId::new(0), 5).significant_data(), &[0, 5]);
    }

    #[test]
    fn test_from_words_pads_with_zero() {
        ensure_test_logging(None);
        let event = TraceEvent::from_words(TraceOp::Var, &[1]).unwrap();
        assert_eq!(event, TraceEvent::var(SlotId::new(1), 0));
        assert!(TraceEvent::from_words(TraceOp::Line, &[1, 2, 3, 4, 5]).is_none());
    }

    #[test]
    fn test_stopping_points() {
        ensure_test_logging(None);
        assert!(TraceEvent::line(1).is_stopping_point());
        assert!(TraceEvent::exit(FunctionId::new(0)).is_stopping_point());
        assert!(!TraceEvent::enter(FunctionId::new(0)).is_stopping_point());
        assert!(!TraceEvent::scope(1).is_stopping_point());
        assert_eq!(TraceEvent::scope(-1).to_string(), "scope -1");
    }
}
