// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command list encoding
//!
//! A command list is a sequence of 64-bit aligned (value, header) word pairs,
//! each optionally followed by extra parameter words:
//!
//! ```text
//!  31  30        20 19  16 15               0
//! ┌───┬────────────┬──────┬──────────────────┐
//! │grp│ extra words│ mask │   register id    │
//! └───┴────────────┴──────┴──────────────────┘
//! ```

use crate::core::hw::mmio::bits;
use std::fmt;

/// Header word of a command pair
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader(pub u32);

impl CommandHeader {
    /// Build a header word
    pub const fn new(cmd_id: u32, mask: u32, extra: u32, group: bool) -> Self {
        Self(
            (cmd_id & 0xFFFF)
                | ((mask & 0xF) << 16)
                | ((extra & 0x7FF) << 20)
                | ((group as u32) << 31),
        )
    }

    /// Target register id
    #[inline(always)]
    pub const fn cmd_id(self) -> u32 {
        bits(self.0, 0, 16)
    }

    /// Nibble write mask, one bit per byte
    #[inline(always)]
    pub const fn parameter_mask(self) -> u32 {
        bits(self.0, 16, 4)
    }

    /// Number of parameter words after the pair
    #[inline(always)]
    pub const fn extra_data_length(self) -> u32 {
        bits(self.0, 20, 11)
    }

    /// Extra words target consecutive registers instead of repeating `cmd_id`
    #[inline(always)]
    pub const fn group_commands(self) -> bool {
        bits(self.0, 31, 1) != 0
    }

    /// Register targeted by extra word `i`
    #[inline(always)]
    pub const fn extra_target(self, i: u32) -> u32 {
        if self.group_commands() {
            self.cmd_id() + i + 1
        } else {
            self.cmd_id()
        }
    }
}

impl fmt::Debug for CommandHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHeader")
            .field("cmd_id", &format_args!("{:#05X}", self.cmd_id()))
            .field("mask", &format_args!("{:#X}", self.parameter_mask()))
            .field("extra", &self.extra_data_length())
            .field("group", &self.group_commands())
            .finish()
    }
}

/// Read position inside the command list being decoded
///
/// Addresses are guest physical. The cursor can be re-pointed mid-list by the
/// command buffer jump registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandListCursor {
    /// Physical address of the first word
    pub head: u32,
    /// Physical address of the next word to read
    pub current: u32,
    /// List length in words
    pub length: u32,
}

impl CommandListCursor {
    pub const fn new(head: u32, size_bytes: u32) -> Self {
        Self {
            head,
            current: head,
            length: size_bytes / 4,
        }
    }

    /// One past the last word, as a physical address
    #[inline]
    pub const fn end(&self) -> u64 {
        self.head as u64 + self.length as u64 * 4
    }

    #[inline]
    pub const fn has_remaining(&self) -> bool {
        (self.current as u64) < self.end()
    }

    /// Words consumed since the head
    #[inline]
    pub const fn consumed_words(&self) -> u32 {
        self.current.wrapping_sub(self.head) / 4
    }

    /// Skip a word so the next pair starts on an 8-byte boundary of the list
    #[inline]
    pub fn align(&mut self) {
        if self.consumed_words() % 2 != 0 {
            self.current = self.current.wrapping_add(4);
        }
    }

    /// Stop decoding after the current command
    pub fn terminate(&mut self) {
        self.head = self.current;
        self.length = 0;
    }

    /// Address of the next word, advancing past it
    ///
    /// Returns `None` once the list is exhausted.
    #[inline]
    pub fn next_address(&mut self) -> Option<u32> {
        if !self.has_remaining() {
            return None;
        }
        let address = self.current;
        self.current = self.current.wrapping_add(4);
        Some(address)
    }
}
