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

//! Shared data model for shader debug traces.
//!
//! A trace is recorded once by an instrumented shader execution and replayed later by
//! a debugger. This crate holds the immutable record (slot and function metadata, the
//! ordered event list, the shader source) together with the producer-side builder and
//! the logging setup shared by every shtrace component.

/// Trace data model: identifiers, slot/function metadata, events and the trace itself
pub mod types;

/// Logging setup and utilities for consistent logging across shtrace components
pub mod logging;

pub use types::*;
