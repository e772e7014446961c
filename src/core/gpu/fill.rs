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

//! Memory fill units

use super::registers::{MemoryFillConfig, MemoryFillControl};
use crate::core::error::GpuError;
use crate::core::memory::GuestMemory;
use crate::core::video::Rasterizer;

/// Fill `[start, end)` with the configured pattern
///
/// The pattern width comes from the control word: 32-bit, 24-bit or (by
/// default) 16-bit. A range that is not a multiple of the pattern width ends
/// with a truncated copy of it.
///
/// # Errors
///
/// - [`GpuError::InvalidAddress`] if either end is not backed by memory
/// - [`GpuError::InvalidRange`] if the range is empty or reversed
/// - [`GpuError::UnmappedRegion`] if the range crosses out of its region
pub fn memory_fill(
    config: &MemoryFillConfig,
    memory: &mut dyn GuestMemory,
    rasterizer: &mut dyn Rasterizer,
) -> Result<(), GpuError> {
    let start = config.start_address();
    let end = config.end_address();

    if !memory.is_valid_physical_address(start) {
        return Err(GpuError::InvalidAddress {
            which: "start",
            address: start,
        });
    }
    if !memory.is_valid_physical_address(end) {
        return Err(GpuError::InvalidAddress {
            which: "end",
            address: end,
        });
    }
    if end <= start {
        return Err(GpuError::InvalidRange { start, end });
    }

    if rasterizer.accelerate_fill(config) {
        return Ok(());
    }

    let size = end - start;
    memory.invalidate_region(start, size);
    let dest = memory
        .physical_slice_mut(start, size as usize)
        .ok_or(GpuError::UnmappedRegion {
            address: start,
            size: size as usize,
        })?;

    if config.control.contains(MemoryFillControl::FILL_24BIT) {
        fill_pattern(dest, &config.value_24bit());
    } else if config.control.contains(MemoryFillControl::FILL_32BIT) {
        // Whole words only
        let words = dest.len() / 4 * 4;
        fill_pattern(&mut dest[..words], &config.value_32bit().to_le_bytes());
    } else {
        fill_pattern(dest, &config.value_16bit().to_le_bytes());
    }
    Ok(())
}

fn fill_pattern(dest: &mut [u8], pattern: &[u8]) {
    for chunk in dest.chunks_mut(pattern.len()) {
        chunk.copy_from_slice(&pattern[..chunk.len()]);
    }
}
