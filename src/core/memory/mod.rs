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

//! Guest physical memory
//!
//! The command processor never owns guest memory. It reads command lists,
//! vertex and index buffers from it and writes fill, transfer and copy results
//! back into it through the [`GuestMemory`] trait.
//!
//! # Memory Map
//!
//! | Physical Address Range | Region    | Size   |
//! |------------------------|-----------|--------|
//! | 0x18000000-0x185FFFFF  | VRAM      | 6MB    |
//! | 0x1FF00000-0x1FF7FFFF  | DSP RAM   | 512KB  |
//! | 0x1FF80000-0x1FFFFFFF  | AXI WRAM  | 512KB  |
//! | 0x20000000-0x27FFFFFF  | FCRAM     | 128MB  |
//!
//! # Example
//!
//! ```
//! use picarx::core::memory::{GuestMemory, PhysicalMemory, VRAM_PADDR};
//!
//! let mut memory = PhysicalMemory::with_fcram_size(0x1000);
//!
//! assert!(memory.write_u32(VRAM_PADDR, 0x12345678));
//! assert_eq!(memory.read_u32(VRAM_PADDR), Some(0x12345678));
//!
//! // Accesses outside any region are rejected
//! assert_eq!(memory.read_u32(0x0000_0000), None);
//! ```

mod region;

pub use region::*;

use crate::core::error::{EmulatorError, Result};
use std::fs;
use std::path::Path;

/// Access to guest physical memory
///
/// Implementors only need to provide bounds-checked slices; every other
/// accessor is derived from them. A slice request must be rejected when the
/// range straddles the end of a region.
///
/// The cache notifications let a hardware renderer keep its surface cache
/// coherent with memory that the command processor reads or writes directly.
pub trait GuestMemory {
    /// Borrow `len` bytes starting at physical address `addr`
    fn physical_slice(&self, addr: u32, len: usize) -> Option<&[u8]>;

    /// Mutably borrow `len` bytes starting at physical address `addr`
    fn physical_slice_mut(&mut self, addr: u32, len: usize) -> Option<&mut [u8]>;

    /// Check whether `addr` is backed by memory
    fn is_valid_physical_address(&self, addr: u32) -> bool {
        self.physical_slice(addr, 1).is_some()
    }

    /// Copy guest bytes into `dest`
    ///
    /// Returns `false` (leaving `dest` untouched) if the range is not fully backed.
    fn read_block(&self, addr: u32, dest: &mut [u8]) -> bool {
        match self.physical_slice(addr, dest.len()) {
            Some(src) => {
                dest.copy_from_slice(src);
                true
            }
            None => false,
        }
    }

    /// Copy `src` into guest memory
    ///
    /// Returns `false` (writing nothing) if the range is not fully backed.
    fn write_block(&mut self, addr: u32, src: &[u8]) -> bool {
        match self.physical_slice_mut(addr, src.len()) {
            Some(dest) => {
                dest.copy_from_slice(src);
                true
            }
            None => false,
        }
    }

    /// Read a byte
    fn read_u8(&self, addr: u32) -> Option<u8> {
        self.physical_slice(addr, 1).map(|bytes| bytes[0])
    }

    /// Read a little-endian halfword
    fn read_u16(&self, addr: u32) -> Option<u16> {
        let mut bytes = [0u8; 2];
        self.read_block(addr, &mut bytes)
            .then(|| u16::from_le_bytes(bytes))
    }

    /// Read a little-endian word
    fn read_u32(&self, addr: u32) -> Option<u32> {
        let mut bytes = [0u8; 4];
        self.read_block(addr, &mut bytes)
            .then(|| u32::from_le_bytes(bytes))
    }

    /// Write a little-endian word
    fn write_u32(&mut self, addr: u32, value: u32) -> bool {
        self.write_block(addr, &value.to_le_bytes())
    }

    /// Copy `len` bytes from `src` to `dst` inside guest memory
    ///
    /// Overlapping ranges behave like `memmove`. The copy goes through a small
    /// stack buffer so it never allocates.
    fn copy_block(&mut self, dst: u32, src: u32, len: usize) -> bool {
        const CHUNK: usize = 256;

        if self.physical_slice(src, len).is_none() || self.physical_slice(dst, len).is_none() {
            return false;
        }

        let backward = dst > src && (dst as u64) < src as u64 + len as u64;
        let mut buffer = [0u8; CHUNK];
        let mut done = 0;

        while done < len {
            let n = (len - done).min(CHUNK);
            let offset = if backward { len - done - n } else { done } as u32;
            let chunk = &mut buffer[..n];

            if !self.read_block(src + offset, chunk) || !self.write_block(dst + offset, chunk) {
                return false;
            }
            done += n;
        }
        true
    }

    /// The region is about to be read directly; write back cached copies
    fn flush_region(&mut self, _addr: u32, _size: u32) {}

    /// The region is about to be overwritten directly; drop cached copies
    fn invalidate_region(&mut self, _addr: u32, _size: u32) {}

    /// Both of the above
    fn flush_and_invalidate_region(&mut self, addr: u32, size: u32) {
        self.flush_region(addr, size);
        self.invalidate_region(addr, size);
    }
}

/// Guest physical memory backed by host buffers
///
/// Holds VRAM, DSP RAM, AXI WRAM and FCRAM. Cache notifications are no-ops.
pub struct PhysicalMemory {
    vram: Vec<u8>,
    dsp_ram: Vec<u8>,
    axi_wram: Vec<u8>,
    fcram: Vec<u8>,
}

impl PhysicalMemory {
    /// Create guest memory with the default 128MB FCRAM
    pub fn new() -> Self {
        Self::with_fcram_size(FCRAM_SIZE)
    }

    /// Create guest memory with a custom FCRAM size
    ///
    /// Tests and tools that never touch FCRAM can keep it small.
    pub fn with_fcram_size(fcram_size: usize) -> Self {
        log::debug!("Allocating guest memory (FCRAM {:#X} bytes)", fcram_size);
        Self {
            vram: vec![0; VRAM_SIZE],
            dsp_ram: vec![0; DSP_RAM_SIZE],
            axi_wram: vec![0; AXI_WRAM_SIZE],
            fcram: vec![0; fcram_size],
        }
    }

    fn backing(&self, region: MemoryRegion) -> &[u8] {
        match region {
            MemoryRegion::Vram => &self.vram,
            MemoryRegion::DspRam => &self.dsp_ram,
            MemoryRegion::AxiWram => &self.axi_wram,
            MemoryRegion::Fcram => &self.fcram,
        }
    }

    fn backing_mut(&mut self, region: MemoryRegion) -> &mut [u8] {
        match region {
            MemoryRegion::Vram => &mut self.vram,
            MemoryRegion::DspRam => &mut self.dsp_ram,
            MemoryRegion::AxiWram => &mut self.axi_wram,
            MemoryRegion::Fcram => &mut self.fcram,
        }
    }

    /// Load a raw file into guest memory at `addr`
    ///
    /// # Returns
    ///
    /// Number of bytes loaded
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not fit in a single region.
    pub fn load_dump<P: AsRef<Path>>(&mut self, addr: u32, path: P) -> Result<usize> {
        let data = fs::read(path.as_ref())?;
        if !self.write_block(addr, &data) {
            return Err(EmulatorError::DumpTooLarge {
                address: addr,
                size: data.len(),
            });
        }
        log::info!(
            "Loaded {} bytes from {} at {:#010X}",
            data.len(),
            path.as_ref().display(),
            addr
        );
        Ok(data.len())
    }
}

impl Default for PhysicalMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestMemory for PhysicalMemory {
    fn physical_slice(&self, addr: u32, len: usize) -> Option<&[u8]> {
        let (region, offset) = MemoryRegion::classify(addr)?;
        let backing = self.backing(region);
        let end = offset.checked_add(len)?;
        if offset >= backing.len() || end > backing.len() {
            return None;
        }
        Some(&backing[offset..end])
    }

    fn physical_slice_mut(&mut self, addr: u32, len: usize) -> Option<&mut [u8]> {
        let (region, offset) = MemoryRegion::classify(addr)?;
        let backing = self.backing_mut(region);
        let end = offset.checked_add(len)?;
        if offset >= backing.len() || end > backing.len() {
            return None;
        }
        Some(&mut backing[offset..end])
    }
}

#[cfg(test)]
mod tests;
