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

//! Source-level metadata attached to slots and functions.

use crate::{FunctionId, NumberKind};

/// One scalar component of a source-level variable.
///
/// A `float3x2 m` occupies six slots that share `name`, `columns`, `rows` and `line`
/// and differ only in `component_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDebugInfo {
    /// Variable name without the component suffix, e.g. `myArray[3].myStruct.myVector`.
    pub name: String,
    /// Number of columns in the variable's shape.
    pub columns: u8,
    /// Number of rows in the variable's shape.
    pub rows: u8,
    /// Which scalar of the shape this slot is.
    pub component_index: u8,
    /// Position of this slot within its composite (array/struct); 0 starts a new group.
    pub group_index: i32,
    /// How the raw bits are interpreted.
    pub number_kind: NumberKind,
    /// Declaration line.
    pub line: i32,
    /// Declaration offset in the source, when the producer knows it.
    pub pos: Option<i32>,
    /// Set when this slot holds (part of) a function's return value.
    pub fn_return_value: Option<FunctionId>,
}

impl Default for SlotDebugInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            columns: 1,
            rows: 1,
            component_index: 0,
            group_index: 0,
            number_kind: NumberKind::NonNumeric,
            line: 0,
            pos: None,
            fn_return_value: None,
        }
    }
}

impl SlotDebugInfo {
    /// A scalar slot of the given kind declared at `line`.
    pub fn scalar(name: impl Into<String>, number_kind: NumberKind, line: i32) -> Self {
        Self { name: name.into(), number_kind, line, ..Default::default() }
    }

    /// Component `component_index` of a `columns`×`rows` variable.
    pub fn component(
        name: impl Into<String>,
        number_kind: NumberKind,
        columns: u8,
        rows: u8,
        component_index: u8,
        line: i32,
    ) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
            component_index,
            group_index: i32::from(component_index),
            number_kind,
            line,
            ..Default::default()
        }
    }

    /// Mark this slot as holding the return value of `function`.
    pub fn returning(mut self, function: FunctionId) -> Self {
        self.fn_return_value = Some(function);
        self
    }

    /// Whether this slot is a synthetic return-value slot.
    pub fn is_return_value(&self) -> bool {
        self.fn_return_value.is_some()
    }

    /// Number of scalars in the variable this slot belongs to.
    pub fn component_count(&self) -> usize {
        usize::from(self.columns) * usize::from(self.rows)
    }

    /// Suffix that names this component: `[col][row]` for matrices, `.x`..`.w` for vectors.
    pub fn component_suffix(&self) -> String {
        if self.rows > 1 {
            let rows = self.rows;
            let index = self.component_index;
            return format!("[{}][{}]", index / rows, index % rows);
        }
        if self.columns > 1 {
            return match self.component_index {
                0 => ".x",
                1 => ".y",
                2 => ".z",
                3 => ".w",
                _ => "[???]",
            }
            .to_string();
        }
        String::new()
    }

    /// Full display name of this component, e.g. `color.y`.
    pub fn display_name(&self) -> String {
        format!("{}{}", self.name, self.component_suffix())
    }

    /// Interpret and render a raw value stored in this slot.
    pub fn format_value(&self, bits: i32) -> String {
        self.number_kind.value_to_string(self.number_kind.interpret(bits))
    }
}

/// Metadata for one function of the traced program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionDebugInfo {
    /// Full declaration, e.g. `half4 main(float2 xy)`.
    pub name: String,
}

impl FunctionDebugInfo {
    /// Create function metadata from its declaration string.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::ensure_test_logging;

    #[test]
    fn test_component_suffix() {
        ensure_test_logging(None);
        let scalar = SlotDebugInfo::scalar("x", NumberKind::Float, 1);
        assert_eq!(scalar.component_suffix(), "");

        let vector = SlotDebugInfo::component("v", NumberKind::Float, 4, 1, 2, 1);
        assert_eq!(vector.display_name(), "v.z");

        let wide = SlotDebugInfo::component("v", NumberKind::Float, 5, 1, 4, 1);
        assert_eq!(wide.component_suffix(), "[???]");

        let matrix = SlotDebugInfo::component("m", NumberKind::Float, 2, 3, 4, 1);
        assert_eq!(matrix.component_suffix(), "[1][1]");
        assert_eq!(matrix.component_count(), 6);
    }

    #[test]
    fn test_format_value_per_kind() {
        ensure_test_logging(None);
        let float = SlotDebugInfo::scalar("f", NumberKind::Float, 1);
        assert_eq!(float.format_value(2.5f32.to_bits() as i32), "2.5");

        let flag = SlotDebugInfo::scalar("b", NumberKind::Boolean, 1);
        assert_eq!(flag.format_value(0), "false");

        let unsigned = SlotDebugInfo::scalar("u", NumberKind::Unsigned, 1);
        assert_eq!(unsigned.format_value(-2), "4.2949673e+09");
    }
}
