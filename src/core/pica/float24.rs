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

//! 24-bit shader floats
//!
//! The PICA shader units work on floats with a 16-bit mantissa, 7-bit exponent
//! (bias 63) and a sign bit. Values are kept as host `f32` internally; only the
//! raw conversions know about the packed layout.
//!
//! ```text
//!  23 22     16 15              0
//! ┌──┬─────────┬─────────────────┐
//! │S │ exponent│    mantissa     │
//! └──┴─────────┴─────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

const MANTISSA_BITS: u32 = 16;
const EXPONENT_BITS: u32 = 7;
const EXPONENT_MAX: u32 = (1 << EXPONENT_BITS) - 1;

/// Difference between the float32 exponent bias (127) and the float24 one (63)
const BIAS_ADJUST: u32 = 128 - (1 << (EXPONENT_BITS - 1));

/// A PICA float24 value
#[derive(Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Float24(f32);

impl Float24 {
    pub const ZERO: Float24 = Float24(0.0);
    pub const ONE: Float24 = Float24(1.0);

    /// Wrap a host float without rounding
    ///
    /// Uniforms uploaded in float32 mode keep their full precision, as on hardware.
    pub const fn from_f32(value: f32) -> Self {
        Self(value)
    }

    /// Decode a packed 24-bit value
    ///
    /// Bits above 23 are ignored. A zero magnitude decodes to a signed zero and
    /// an all-ones exponent maps to the float32 infinity/NaN exponent.
    ///
    /// # Example
    ///
    /// ```
    /// use picarx::core::pica::Float24;
    ///
    /// assert_eq!(Float24::from_raw(0x3F0000).to_f32(), 1.0);
    /// assert_eq!(Float24::from_raw(0xBF0000).to_f32(), -1.0);
    /// assert_eq!(Float24::from_raw(0x400000).to_f32(), 2.0);
    /// ```
    pub fn from_raw(raw: u32) -> Self {
        let mantissa = raw & ((1 << MANTISSA_BITS) - 1);
        let exponent = (raw >> MANTISSA_BITS) & EXPONENT_MAX;
        let sign = ((raw >> (MANTISSA_BITS + EXPONENT_BITS)) & 1) << 31;

        let bits = if raw & ((1 << (MANTISSA_BITS + EXPONENT_BITS)) - 1) != 0 {
            let exponent = if exponent == EXPONENT_MAX {
                255
            } else {
                exponent + BIAS_ADJUST
            };
            sign | (mantissa << (23 - MANTISSA_BITS)) | (exponent << 23)
        } else {
            sign
        };

        Self(f32::from_bits(bits))
    }

    /// Encode into the packed 24-bit layout
    ///
    /// Mantissa bits below float24 precision are truncated. Magnitudes below the
    /// smallest float24 flush to signed zero; magnitudes above the largest one
    /// saturate to the all-ones exponent.
    pub fn to_raw(self) -> u32 {
        let bits = self.0.to_bits();
        let sign = (bits >> 31) << (MANTISSA_BITS + EXPONENT_BITS);
        let exponent = (bits >> 23) & 0xFF;
        let mantissa = (bits >> (23 - MANTISSA_BITS)) & ((1 << MANTISSA_BITS) - 1);

        if exponent == 0xFF {
            return sign | (EXPONENT_MAX << MANTISSA_BITS) | mantissa;
        }
        if exponent < BIAS_ADJUST {
            return sign;
        }
        let exponent = exponent - BIAS_ADJUST;
        if exponent >= EXPONENT_MAX {
            return sign | (EXPONENT_MAX << MANTISSA_BITS);
        }
        sign | (exponent << MANTISSA_BITS) | mantissa
    }

    /// Host float value
    pub const fn to_f32(self) -> f32 {
        self.0
    }
}

impl From<f32> for Float24 {
    fn from(value: f32) -> Self {
        Self::from_f32(value)
    }
}

impl fmt::Debug for Float24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Float24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
