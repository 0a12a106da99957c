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

//! Trace producers a debugger can be handed.
//!
//! Shader programs can run on more than one backend. Only the interpreted backend
//! records the event trace this crate replays; a trace handle coming from any other
//! backend is still representable, but asking it to serialize or dump reports
//! [`FormatError::Unsupported`] instead of quietly producing nothing.

use std::{
    io::{self, Write},
    sync::Arc,
};

use shtrace_common::Trace;
use thiserror::Error;

use crate::{dump_trace, read_trace, write_trace, ReadError, WriteError};

/// A debug trace as handed over by a shader backend.
#[derive(Debug, Clone)]
pub enum DebugTrace {
    /// A full event trace that can be serialized, dumped and replayed.
    Recorded(Arc<Trace>),
    /// A backend that does not record replayable traces.
    Native {
        /// Name of the backend, for error messages.
        backend: String,
    },
}

/// Errors from [`DebugTrace`] operations.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The trace variant cannot perform the requested operation.
    #[error("{operation} is not supported for traces from the {backend} backend")]
    Unsupported {
        /// Backend that produced the trace.
        backend: String,
        /// The operation that was requested.
        operation: &'static str,
    },

    /// Serialization failed.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Deserialization failed.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// Writing the dump failed.
    #[error("failed to write trace dump: {0}")]
    Io(#[from] io::Error),
}

impl DebugTrace {
    /// Deserialize a recorded trace.
    pub fn read(bytes: &[u8]) -> Result<Self, FormatError> {
        Ok(Self::Recorded(Arc::new(read_trace(bytes)?)))
    }

    /// The replayable trace, if this variant carries one.
    pub fn trace(&self) -> Option<&Arc<Trace>> {
        match self {
            Self::Recorded(trace) => Some(trace),
            Self::Native { .. } => None,
        }
    }

    /// Serialize the trace in its wire format.
    pub fn write_trace<W: Write>(&self, writer: W) -> Result<(), FormatError> {
        match self {
            Self::Recorded(trace) => Ok(write_trace(trace, writer)?),
            Self::Native { backend } => {
                Err(FormatError::Unsupported { backend: backend.clone(), operation: "write_trace" })
            }
        }
    }

    /// Write a human-readable rendering of the trace.
    pub fn dump<W: Write>(&self, writer: W) -> Result<(), FormatError> {
        match self {
            Self::Recorded(trace) => Ok(dump_trace(trace, writer)?),
            Self::Native { backend } => {
                Err(FormatError::Unsupported { backend: backend.clone(), operation: "dump" })
            }
        }
    }
}

impl From<Trace> for DebugTrace {
    fn from(trace: Trace) -> Self {
        Self::Recorded(Arc::new(trace))
    }
}

impl From<Arc<Trace>> for DebugTrace {
    fn from(trace: Arc<Trace>) -> Self {
        Self::Recorded(trace)
    }
}
