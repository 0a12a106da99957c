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

//! Interpretation of raw 32-bit slot values.

use std::fmt;

use crate::TraceError;

/// How the 32-bit pattern stored in a slot is to be read.
///
/// The discriminants are the values used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumberKind {
    /// IEEE-754 single precision.
    Float = 0,
    /// Two's complement signed integer.
    Signed = 1,
    /// Unsigned integer.
    Unsigned = 2,
    /// Boolean, nonzero is true.
    Boolean = 3,
    /// Anything else; displayed as a signed integer.
    #[default]
    NonNumeric = 4,
}

impl NumberKind {
    /// Decode `bits` into a displayable number.
    pub fn interpret(self, bits: i32) -> f64 {
        match self {
            Self::Float => f64::from(f32::from_bits(bits as u32)),
            Self::Unsigned => f64::from(bits as u32),
            Self::Signed | Self::Boolean | Self::NonNumeric => f64::from(bits),
        }
    }

    /// Short type name used by the textual dump.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Signed => "int",
            Self::Unsigned => "uint",
            Self::Boolean => "bool",
            Self::NonNumeric => "???",
        }
    }

    /// Render an already-interpreted value the way the debugger shows it.
    pub fn value_to_string(self, value: f64) -> String {
        match self {
            Self::Boolean => if value != 0.0 { "true" } else { "false" }.to_string(),
            _ => format_significant(value, 8),
        }
    }
}

impl From<NumberKind> for i32 {
    fn from(kind: NumberKind) -> Self {
        kind as Self
    }
}

impl TryFrom<i32> for NumberKind {
    type Error = TraceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Float,
            1 => Self::Signed,
            2 => Self::Unsigned,
            3 => Self::Boolean,
            4 => Self::NonNumeric,
            other => return Err(TraceError::InvalidNumberKind(other)),
        })
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Format `value` like C's `%.<digits>g`.
///
/// Trailing zeros are removed, and scientific notation is used when the decimal
/// exponent is below -4 or at least `digits`.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", strip_fraction_zeros(mantissa), exponent.unsigned_abs())
    } else {
        let precision = (digits as i32 - 1 - exponent).max(0) as usize;
        strip_fraction_zeros(&format!("{value:.precision$}")).to_string()
    }
}

fn strip_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
