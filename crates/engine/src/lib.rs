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

//! Replay engine for recorded shader debug traces.
//!
//! - [`serializer`] reads and writes the JSON wire format consumed by debugger front ends
//! - [`dump`] renders a trace as indented, human-readable text
//! - [`format`] wraps the trace producers a debugger may be handed
//! - [`player`] re-executes a trace step by step and answers line, call-stack and
//!   variable queries at the current position

pub mod dump;
pub use dump::*;

pub mod format;
pub use format::*;

pub mod player;
pub use player::*;

pub mod serializer;
pub use serializer::*;
