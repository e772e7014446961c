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

//! Physical memory region identification
//!
//! The GPU only ever touches a handful of physical regions: VRAM, the DSP and
//! AXI work RAMs and FCRAM. Everything else is reported as unmapped.

/// VRAM physical base address
pub const VRAM_PADDR: u32 = 0x1800_0000;
/// VRAM size (6MB)
pub const VRAM_SIZE: usize = 0x0060_0000;

/// DSP RAM physical base address
pub const DSP_RAM_PADDR: u32 = 0x1FF0_0000;
/// DSP RAM size (512KB)
pub const DSP_RAM_SIZE: usize = 0x0008_0000;

/// AXI WRAM physical base address
pub const AXI_WRAM_PADDR: u32 = 0x1FF8_0000;
/// AXI WRAM size (512KB)
pub const AXI_WRAM_SIZE: usize = 0x0008_0000;

/// FCRAM physical base address
pub const FCRAM_PADDR: u32 = 0x2000_0000;
/// Default FCRAM size (128MB)
pub const FCRAM_SIZE: usize = 0x0800_0000;

/// Memory region identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Video RAM
    Vram,
    /// DSP shared RAM
    DspRam,
    /// AXI work RAM
    AxiWram,
    /// Main FCRAM
    Fcram,
}

impl MemoryRegion {
    /// All regions in ascending address order
    pub const ALL: [MemoryRegion; 4] = [
        MemoryRegion::Vram,
        MemoryRegion::DspRam,
        MemoryRegion::AxiWram,
        MemoryRegion::Fcram,
    ];

    /// Physical base address of the region
    pub const fn base(self) -> u32 {
        match self {
            MemoryRegion::Vram => VRAM_PADDR,
            MemoryRegion::DspRam => DSP_RAM_PADDR,
            MemoryRegion::AxiWram => AXI_WRAM_PADDR,
            MemoryRegion::Fcram => FCRAM_PADDR,
        }
    }

    /// Identify the region that could contain `paddr`
    ///
    /// Only the base address is compared here; the caller checks the offset
    /// against the actual backing size (FCRAM size is configurable).
    pub fn classify(paddr: u32) -> Option<(MemoryRegion, usize)> {
        Self::ALL
            .iter()
            .rev()
            .find(|region| paddr >= region.base())
            .map(|&region| (region, (paddr - region.base()) as usize))
            .filter(|&(region, offset)| offset < region.max_size())
    }

    /// Largest size the region can have
    const fn max_size(self) -> usize {
        match self {
            MemoryRegion::Vram => VRAM_SIZE,
            MemoryRegion::DspRam => DSP_RAM_SIZE,
            MemoryRegion::AxiWram => AXI_WRAM_SIZE,
            // FCRAM may be configured up to the end of the address space
            MemoryRegion::Fcram => (u32::MAX - FCRAM_PADDR) as usize + 1,
        }
    }
}
