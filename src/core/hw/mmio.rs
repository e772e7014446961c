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

//! Memory-mapped register plumbing
//!
//! Every peripheral the command processor talks to is a flat array of 32-bit
//! registers. [`RegisterFile`] is that array; typed configuration views are
//! decoded from it at fixed word offsets. [`MmioRegion`] turns a virtual
//! address and access width into a register index.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            HardwareManager                  │
//! ├─────────────────────────────────────────────┤
//! │  match addr & 0xFFFFF000 {                  │
//! │    LCD page   => lcd.write(addr, data)      │
//! │    GPU pages  => gpu.write(addr, data, ..)  │
//! │  }                                          │
//! └─────────────────────────────────────────────┘
//!           │                   │
//!    ┌──────┴──────┐    ┌──────┴──────┐
//!    │    LCD      │    │    GPU      │
//!    │ (MmioRegion)│    │ (MmioRegion)│
//!    └─────────────┘    └─────────────┘
//! ```
//!
//! Only 32-bit accesses are supported. Other widths are logged and ignored,
//! reads of them return zero.

use crate::core::error::{EmulatorError, Result};
use std::fmt;

/// Expand a 4-bit write mask into a byte mask
///
/// Each mask bit selects one whole byte of the destination word.
///
/// # Example
///
/// ```
/// use picarx::core::hw::mmio::expand_mask;
///
/// assert_eq!(expand_mask(0b0000), 0x0000_0000);
/// assert_eq!(expand_mask(0b0101), 0x00FF_00FF);
/// assert_eq!(expand_mask(0b1111), 0xFFFF_FFFF);
/// ```
pub const fn expand_mask(mask: u32) -> u32 {
    let mut expanded = 0;
    let mut bit = 0;
    while bit < 4 {
        if mask & (1 << bit) != 0 {
            expanded |= 0xFF << (bit * 8);
        }
        bit += 1;
    }
    expanded
}

/// Merge `value` into `old` under a nibble write mask
pub const fn masked_merge(old: u32, value: u32, mask: u32) -> u32 {
    let byte_mask = expand_mask(mask);
    (old & !byte_mask) | (value & byte_mask)
}

/// Extract `width` bits starting at `shift`
#[inline(always)]
pub const fn bits(word: u32, shift: u32, width: u32) -> u32 {
    (word >> shift) & ((1u64 << width) - 1) as u32
}

/// Replace `width` bits starting at `shift`
#[inline(always)]
pub const fn with_bits(word: u32, shift: u32, width: u32, value: u32) -> u32 {
    let mask = (((1u64 << width) - 1) as u32) << shift;
    (word & !mask) | ((value << shift) & mask)
}

/// Flat array of `N` 32-bit registers
///
/// Indices are word offsets. Fixed-offset accessors ([`word`](Self::word),
/// [`set_word`](Self::set_word)) are meant for layout constants that are
/// checked against `N` at compile time; guest-controlled indices go through
/// [`get`](Self::get) and [`set`](Self::set).
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterFile<const N: usize> {
    words: Box<[u32; N]>,
}

impl<const N: usize> RegisterFile<N> {
    /// Number of registers
    pub const LEN: usize = N;

    /// Create a zeroed register file
    pub fn new() -> Self {
        Self {
            words: Box::new([0; N]),
        }
    }

    /// Zero every register
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Read a register at a layout constant
    #[inline(always)]
    pub fn word(&self, index: usize) -> u32 {
        self.words[index]
    }

    /// Write a register at a layout constant
    #[inline(always)]
    pub fn set_word(&mut self, index: usize, value: u32) {
        self.words[index] = value;
    }

    /// Read a bit field of a register
    #[inline(always)]
    pub fn field(&self, index: usize, shift: u32, width: u32) -> u32 {
        bits(self.words[index], shift, width)
    }

    /// Replace a bit field of a register
    #[inline(always)]
    pub fn set_field(&mut self, index: usize, shift: u32, width: u32, value: u32) {
        self.words[index] = with_bits(self.words[index], shift, width, value);
    }

    /// Read a guest-selected register
    pub fn get(&self, index: usize) -> Result<u32> {
        self.words
            .get(index)
            .copied()
            .ok_or(EmulatorError::InvalidRegister { index, count: N })
    }

    /// Write a guest-selected register
    pub fn set(&mut self, index: usize, value: u32) -> Result<()> {
        let slot = self
            .words
            .get_mut(index)
            .ok_or(EmulatorError::InvalidRegister { index, count: N })?;
        *slot = value;
        Ok(())
    }

    /// Masked write of a guest-selected register
    ///
    /// # Returns
    ///
    /// The merged register value
    pub fn merge(&mut self, index: usize, value: u32, mask: u32) -> Result<u32> {
        let old = self.get(index)?;
        let merged = masked_merge(old, value, mask);
        self.words[index] = merged;
        Ok(merged)
    }

    /// Raw register words
    pub fn as_slice(&self) -> &[u32] {
        &self.words[..]
    }

    /// Copy raw register bytes starting at byte `offset`
    ///
    /// Bytes are laid out little-endian, as the guest sees them.
    pub fn read_bytes(&self, offset: usize, dest: &mut [u8]) -> bool {
        if offset.checked_add(dest.len()).is_none_or(|end| end > N * 4) {
            return false;
        }
        for (i, byte) in dest.iter_mut().enumerate() {
            let at = offset + i;
            *byte = self.words[at / 4].to_le_bytes()[at % 4];
        }
        true
    }

    /// Overwrite raw register bytes starting at byte `offset`
    ///
    /// No side effects are triggered.
    pub fn write_bytes(&mut self, offset: usize, src: &[u8]) -> bool {
        if offset.checked_add(src.len()).is_none_or(|end| end > N * 4) {
            return false;
        }
        for (i, &byte) in src.iter().enumerate() {
            let at = offset + i;
            let mut le = self.words[at / 4].to_le_bytes();
            le[at % 4] = byte;
            self.words[at / 4] = u32::from_le_bytes(le);
        }
        true
    }
}

impl<const N: usize> Default for RegisterFile<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for RegisterFile<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nonzero = self.words.iter().filter(|&&w| w != 0).count();
        f.debug_struct("RegisterFile")
            .field("len", &N)
            .field("nonzero", &nonzero)
            .finish()
    }
}

/// Integer types an MMIO access can carry
pub trait AccessWidth: Copy + Default + fmt::LowerHex {
    /// Width in bits
    const BITS: u32;

    /// Truncate or zero-extend to a register word
    fn to_word(self) -> u32;

    /// Truncate or zero-extend from a register word
    fn from_word(word: u32) -> Self;

    /// Widen for recording
    fn to_u64(self) -> u64;
}

macro_rules! impl_access_width {
    ($($ty:ty),*) => {
        $(
            impl AccessWidth for $ty {
                const BITS: u32 = <$ty>::BITS;

                #[inline(always)]
                fn to_word(self) -> u32 {
                    self as u32
                }

                #[inline(always)]
                fn from_word(word: u32) -> Self {
                    word as $ty
                }

                #[inline(always)]
                fn to_u64(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_access_width!(u8, u16, u32, u64);

/// A peripheral register block mapped into the IO virtual address space
///
/// The peripheral supplies its base address, register count and register
/// storage; address decoding and 32-bit-only access checking are shared.
pub trait MmioRegion {
    /// Name used in log messages
    const NAME: &'static str;

    /// Virtual base address
    const VADDR: u32;

    /// Number of 32-bit registers
    const NUM_REGS: usize;

    /// Register storage
    fn registers(&self) -> &[u32];

    /// Check if this region contains the given virtual address
    fn contains(addr: u32) -> bool {
        addr >= Self::VADDR && ((addr - Self::VADDR) as usize) < Self::NUM_REGS * 4
    }

    /// Decode a virtual address into a register index
    ///
    /// # Errors
    ///
    /// - [`EmulatorError::UnsupportedAccessWidth`] for anything but 32-bit accesses
    /// - [`EmulatorError::InvalidRegister`] if the address lies past the register file
    fn register_index<T: AccessWidth>(addr: u32) -> Result<usize> {
        let index = (addr.wrapping_sub(Self::VADDR) / 4) as usize;
        if index >= Self::NUM_REGS || addr < Self::VADDR {
            return Err(EmulatorError::InvalidRegister {
                index,
                count: Self::NUM_REGS,
            });
        }
        if T::BITS != 32 {
            return Err(EmulatorError::UnsupportedAccessWidth {
                address: addr,
                bits: T::BITS,
            });
        }
        Ok(index)
    }

    /// Read a register
    ///
    /// Invalid accesses are logged and read as zero.
    fn read<T: AccessWidth>(&self, addr: u32) -> T {
        match Self::register_index::<T>(addr) {
            Ok(index) => T::from_word(self.registers()[index]),
            Err(e) => {
                log::error!("{}: unknown Read{} @ {:#010X}: {}", Self::NAME, T::BITS, addr, e);
                T::default()
            }
        }
    }

    /// Copy raw register bytes
    fn read_block(&self, addr: u32, dest: &mut [u8]) -> bool {
        if !Self::contains(addr) {
            return false;
        }
        let offset = (addr - Self::VADDR) as usize;
        let regs = self.registers();
        if offset + dest.len() > regs.len() * 4 {
            return false;
        }
        for (i, byte) in dest.iter_mut().enumerate() {
            let at = offset + i;
            *byte = regs[at / 4].to_le_bytes()[at % 4];
        }
        true
    }
}
