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

//! Multi-word register value assembly
//!
//! Float uniforms and default attributes are four floats wide but arrive one
//! 32-bit register write at a time: either four float32 words, or four
//! float24 values packed big-end-first into three words:
//!
//! ```text
//! word 0  wwwwwwwwwwwwwwwwwwwwwwww zzzzzzzz
//! word 1  zzzzzzzzzzzzzzzz yyyyyyyyyyyyyyyy
//! word 2  yyyyyyyy xxxxxxxxxxxxxxxxxxxxxxxx
//! ```

use super::float24::Float24;
use super::types::Vec4;

/// Word buffer plus cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackedAccumulator {
    buffer: [u32; 4],
    counter: usize,
}

impl PackedAccumulator {
    pub const fn new() -> Self {
        Self {
            buffer: [0; 4],
            counter: 0,
        }
    }

    /// Drop any partially received value
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Words received towards the current value
    pub const fn pending(&self) -> usize {
        self.counter
    }

    /// Append a word; returns the buffered words once `words` have arrived
    ///
    /// The cursor resets whenever a value completes.
    pub fn push(&mut self, value: u32, words: usize) -> Option<[u32; 4]> {
        self.buffer[self.counter] = value;
        self.counter += 1;
        if self.counter >= words {
            self.counter = 0;
            Some(self.buffer)
        } else {
            None
        }
    }
}

/// Unpack three words of packed float24 data
pub fn unpack_float24(words: &[u32; 4]) -> Vec4<Float24> {
    Vec4 {
        w: Float24::from_raw(words[0] >> 8),
        z: Float24::from_raw(((words[0] & 0xFF) << 16) | ((words[1] >> 16) & 0xFFFF)),
        y: Float24::from_raw(((words[1] & 0xFFFF) << 8) | ((words[2] >> 24) & 0xFF)),
        x: Float24::from_raw(words[2] & 0xFF_FFFF),
    }
}

/// Unpack four float32 words, first word is w
pub fn unpack_float32(words: &[u32; 4]) -> Vec4<Float24> {
    let mut value = Vec4::default();
    for (i, word) in words.iter().enumerate() {
        value[3 - i] = Float24::from_f32(f32::from_bits(*word));
    }
    value
}

/// Pack a vector into the three-word float24 layout
pub fn pack_float24(value: Vec4<Float24>) -> [u32; 3] {
    let [x, y, z, w] = value.map(Float24::to_raw).to_array();
    [
        (w << 8) | (z >> 16),
        ((z & 0xFFFF) << 16) | (y >> 8),
        ((y & 0xFF) << 24) | x,
    ]
}
