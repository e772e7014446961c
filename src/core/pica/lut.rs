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

//! Lookup tables uploaded through auto-incrementing data ports

use super::regs::ProcTexLutTable;

pub const NUM_LIGHTING_SAMPLERS: usize = 24;
pub const LIGHTING_LUT_SIZE: usize = 256;
pub const FOG_LUT_SIZE: usize = 128;

/// Fragment lighting tables
#[derive(Debug, Clone)]
pub struct LightingLuts {
    pub luts: Box<[[u32; LIGHTING_LUT_SIZE]; NUM_LIGHTING_SAMPLERS]>,
}

impl Default for LightingLuts {
    fn default() -> Self {
        Self {
            luts: Box::new([[0; LIGHTING_LUT_SIZE]; NUM_LIGHTING_SAMPLERS]),
        }
    }
}

/// Fog table
#[derive(Debug, Clone)]
pub struct FogLut {
    pub lut: [u32; FOG_LUT_SIZE],
}

impl Default for FogLut {
    fn default() -> Self {
        Self {
            lut: [0; FOG_LUT_SIZE],
        }
    }
}

impl FogLut {
    /// Store `value` at `offset`, wrapping at the table size
    pub fn write(&mut self, offset: u32, value: u32) {
        self.lut[offset as usize % FOG_LUT_SIZE] = value;
    }
}

/// Procedural texture tables
#[derive(Debug, Clone)]
pub struct ProcTexLuts {
    pub noise_table: [u32; 128],
    pub color_map_table: [u32; 128],
    pub alpha_map_table: [u32; 128],
    pub color_table: [u32; 256],
    pub color_diff_table: [u32; 256],
}

impl Default for ProcTexLuts {
    fn default() -> Self {
        Self {
            noise_table: [0; 128],
            color_map_table: [0; 128],
            alpha_map_table: [0; 128],
            color_table: [0; 256],
            color_diff_table: [0; 256],
        }
    }
}

impl ProcTexLuts {
    /// Table backing `table`
    pub fn table_mut(&mut self, table: ProcTexLutTable) -> &mut [u32] {
        match table {
            ProcTexLutTable::Noise => &mut self.noise_table,
            ProcTexLutTable::ColorMap => &mut self.color_map_table,
            ProcTexLutTable::AlphaMap => &mut self.alpha_map_table,
            ProcTexLutTable::Color => &mut self.color_table,
            ProcTexLutTable::ColorDiff => &mut self.color_diff_table,
        }
    }

    /// Store `value` at `index`, wrapping at the table size
    pub fn write(&mut self, table: ProcTexLutTable, index: u32, value: u32) {
        let entries = self.table_mut(table);
        let len = entries.len();
        entries[index as usize % len] = value;
    }
}

/// All uploadable tables
#[derive(Debug, Clone, Default)]
pub struct Luts {
    pub lighting: LightingLuts,
    pub fog: FogLut,
    pub proctex: ProcTexLuts,
}
