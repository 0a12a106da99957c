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

//! Index newtypes for slots and functions.

macro_rules! index_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
        pub struct $name(u32);

        paste::paste! {
            impl $name {
                #[doc = "Create a " $name " from a position in the owning table."]
                pub const fn new(index: u32) -> Self {
                    Self(index)
                }

                #[doc = "Position of this " $name " in the owning table."]
                pub const fn index(self) -> usize {
                    self.0 as usize
                }

                #[doc = "Convert a raw trace data word into a " $name ", rejecting negative values."]
                pub fn from_word(word: i32) -> Option<Self> {
                    u32::try_from(word).ok().map(Self)
                }
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(value: usize) -> Result<Self, Self::Error> {
                u32::try_from(value).map(Self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_id! {
    /// Identifier of one scalar slot; the index into [`crate::Trace::slot_info`].
    SlotId
}

index_id! {
    /// Identifier of a function; the index into [`crate::Trace::function_info`].
    FunctionId
}
