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

//! PICA register file
//!
//! 0x300 words written by command lists. Only the registers with side effects
//! or read by the vertex pipeline have typed accessors here; everything else is
//! stored verbatim for the rasterizer collaborator to interpret.
//!
//! ## Layout (word offsets)
//!
//! ```text
//! 0x010        trigger_irq
//! 0x04F-0x056  rasterizer: vs output count and semantic maps
//! 0x0AF-0x0B7  procedural texture LUT config and data
//! 0x0E6-0x0EF  fog LUT offset and data
//! 0x1C5-0x1CF  lighting LUT config and data
//! 0x200-0x25F  pipeline: vertex attributes, draw triggers, command buffers
//! 0x280-0x2AF  geometry shader unit
//! 0x2B0-0x2DF  vertex shader unit
//! ```

use crate::core::error::Result;
use crate::core::hw::mmio::{bits, RegisterFile};

/// Number of PICA registers
pub const NUM_REGS: usize = 0x300;

/// Primitive topology selected by the pipeline registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriangleTopology {
    #[default]
    List,
    Strip,
    Fan,
    /// Primitives are emitted by the geometry shader
    Shader,
}

impl TriangleTopology {
    fn from_bits(value: u32) -> Self {
        match value & 3 {
            0 => TriangleTopology::List,
            1 => TriangleTopology::Strip,
            2 => TriangleTopology::Fan,
            _ => TriangleTopology::Shader,
        }
    }
}

/// Vertex attribute component format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFormat {
    Byte,
    UnsignedByte,
    Short,
    Float,
}

impl AttributeFormat {
    fn from_bits(value: u64) -> Self {
        match value & 3 {
            0 => AttributeFormat::Byte,
            1 => AttributeFormat::UnsignedByte,
            2 => AttributeFormat::Short,
            _ => AttributeFormat::Float,
        }
    }

    /// Size of one component in bytes
    pub const fn component_size(self) -> u32 {
        match self {
            AttributeFormat::Byte | AttributeFormat::UnsignedByte => 1,
            AttributeFormat::Short => 2,
            AttributeFormat::Float => 4,
        }
    }
}

/// Shader unit selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderUnit {
    Geometry,
    Vertex,
}

impl ShaderUnit {
    /// First register of the unit's block
    pub const fn base(self) -> usize {
        match self {
            ShaderUnit::Geometry => PicaRegs::GS_BASE,
            ShaderUnit::Vertex => PicaRegs::VS_BASE,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ShaderUnit::Geometry => "geometry shader",
            ShaderUnit::Vertex => "vertex shader",
        }
    }
}

/// Procedural texture lookup table selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcTexLutTable {
    Noise,
    ColorMap,
    AlphaMap,
    Color,
    ColorDiff,
}

/// Index array configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexArrayConfig {
    /// Byte offset from the vertex attribute base address
    pub offset: u32,
    /// 16-bit indices (8-bit otherwise)
    pub index_u16: bool,
}

/// One of the twelve vertex array loaders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Byte offset of the array from the attribute base address
    pub data_offset: u32,
    /// Attribute id (or padding id 12-15) per component slot
    pub components: [u32; 12],
    /// Size of one array element in bytes
    pub byte_count: u32,
    /// Number of valid component slots
    pub component_count: u32,
}

/// Uniform upload setup word of a shader unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSetup {
    pub index: u32,
    pub is_float32: bool,
}

/// PICA register file with typed views
#[derive(Debug, Clone, Default)]
pub struct PicaRegs {
    file: RegisterFile<NUM_REGS>,
}

impl PicaRegs {
    pub const TRIGGER_IRQ: usize = 0x010;

    // Rasterizer
    pub const VS_OUTPUT_TOTAL: usize = 0x04F;
    pub const VS_OUTPUT_ATTRIBUTES: usize = 0x050;
    pub const NUM_VS_OUTPUT_ATTRIBUTES: usize = 7;

    // Texturing
    pub const PROCTEX_LUT_CONFIG: usize = 0x0AF;
    pub const PROCTEX_LUT_DATA: usize = 0x0B0;
    pub const FOG_LUT_OFFSET: usize = 0x0E6;
    pub const FOG_LUT_DATA: usize = 0x0E8;

    // Lighting
    pub const LIGHTING_LUT_CONFIG: usize = 0x1C5;
    pub const LIGHTING_LUT_DATA: usize = 0x1C8;

    // Pipeline
    pub const VERTEX_ATTRIBUTE_BASE: usize = 0x200;
    pub const VERTEX_ATTRIBUTE_FORMAT_LOW: usize = 0x201;
    pub const VERTEX_ATTRIBUTE_FORMAT_HIGH: usize = 0x202;
    pub const VERTEX_LOADERS: usize = 0x203;
    pub const NUM_VERTEX_LOADERS: usize = 12;
    pub const INDEX_ARRAY: usize = 0x227;
    pub const NUM_VERTICES: usize = 0x228;
    pub const USE_GS: usize = 0x229;
    pub const VERTEX_OFFSET: usize = 0x22A;
    pub const TRIGGER_DRAW: usize = 0x22E;
    pub const TRIGGER_DRAW_INDEXED: usize = 0x22F;
    pub const DEFAULT_ATTRIBUTE_INDEX: usize = 0x232;
    pub const DEFAULT_ATTRIBUTE_DATA: usize = 0x233;
    pub const COMMAND_BUFFER_SIZE: usize = 0x238;
    pub const COMMAND_BUFFER_ADDRESS: usize = 0x23A;
    pub const COMMAND_BUFFER_JUMP: usize = 0x23C;
    pub const MAX_INPUT_ATTRIB_INDEX: usize = 0x242;
    pub const GS_UNIT_EXCLUSIVE_CONFIGURATION: usize = 0x244;
    pub const GPU_MODE: usize = 0x245;
    pub const VS_OUTMAP_TOTAL_MINUS_1: usize = 0x24A;
    pub const TRIANGLE_TOPOLOGY: usize = 0x25E;
    pub const RESTART_PRIMITIVE: usize = 0x25F;

    // Shader units, offsets relative to the unit base
    pub const GS_BASE: usize = 0x280;
    pub const VS_BASE: usize = 0x2B0;
    pub const SHADER_BLOCK_SIZE: usize = 0x30;
    pub const SHADER_BOOL_UNIFORMS: usize = 0x00;
    pub const SHADER_INT_UNIFORMS: usize = 0x01;
    pub const SHADER_INPUT_BUFFER_CONFIG: usize = 0x09;
    pub const SHADER_MAIN_OFFSET: usize = 0x0A;
    pub const SHADER_INPUT_REGISTER_MAP: usize = 0x0B;
    pub const SHADER_OUTPUT_MASK: usize = 0x0D;
    pub const SHADER_UNIFORM_SETUP: usize = 0x10;
    pub const SHADER_UNIFORM_DATA: usize = 0x11;
    pub const SHADER_PROGRAM_OFFSET: usize = 0x1B;
    pub const SHADER_PROGRAM_DATA: usize = 0x1C;
    pub const SHADER_SWIZZLE_OFFSET: usize = 0x25;
    pub const SHADER_SWIZZLE_DATA: usize = 0x26;

    /// Create a zeroed register file
    pub fn new() -> Self {
        Self {
            file: RegisterFile::new(),
        }
    }

    /// Zero every register
    pub fn clear(&mut self) {
        self.file.clear();
    }

    /// Read a register by index
    pub fn get(&self, id: usize) -> Result<u32> {
        self.file.get(id)
    }

    /// Masked write, returning the merged value
    pub fn merge(&mut self, id: usize, value: u32, mask: u32) -> Result<u32> {
        self.file.merge(id, value, mask)
    }

    /// Read a register at a layout constant
    #[inline(always)]
    pub fn word(&self, id: usize) -> u32 {
        self.file.word(id)
    }

    /// Write a register at a layout constant
    #[inline(always)]
    pub fn set_word(&mut self, id: usize, value: u32) {
        self.file.set_word(id, value);
    }

    /// Raw register words
    pub fn as_slice(&self) -> &[u32] {
        self.file.as_slice()
    }

    fn u64_at(&self, low: usize) -> u64 {
        self.word(low) as u64 | ((self.word(low + 1) as u64) << 32)
    }

    // ---- Rasterizer ----

    /// Number of shader output attributes forwarded to the rasterizer
    pub fn vs_output_total(&self) -> u32 {
        self.file.field(Self::VS_OUTPUT_TOTAL, 0, 3)
    }

    /// Semantic ids of the four components of output attribute `i`
    pub fn vs_output_semantics(&self, i: usize) -> [u32; 4] {
        let word = self.word(Self::VS_OUTPUT_ATTRIBUTES + i);
        [
            bits(word, 0, 5),
            bits(word, 8, 5),
            bits(word, 16, 5),
            bits(word, 24, 5),
        ]
    }

    // ---- Texturing ----

    pub fn proctex_lut_index(&self) -> u32 {
        self.file.field(Self::PROCTEX_LUT_CONFIG, 0, 8)
    }

    pub fn set_proctex_lut_index(&mut self, index: u32) {
        self.file.set_field(Self::PROCTEX_LUT_CONFIG, 0, 8, index);
    }

    /// Table selected for procedural texture LUT uploads
    pub fn proctex_lut_table(&self) -> Option<ProcTexLutTable> {
        match self.file.field(Self::PROCTEX_LUT_CONFIG, 8, 4) {
            0 => Some(ProcTexLutTable::Noise),
            2 => Some(ProcTexLutTable::ColorMap),
            3 => Some(ProcTexLutTable::AlphaMap),
            4 => Some(ProcTexLutTable::Color),
            5 => Some(ProcTexLutTable::ColorDiff),
            _ => None,
        }
    }

    pub fn fog_lut_offset(&self) -> u32 {
        self.file.word(Self::FOG_LUT_OFFSET)
    }

    pub fn set_fog_lut_offset(&mut self, offset: u32) {
        self.file.set_word(Self::FOG_LUT_OFFSET, offset);
    }

    // ---- Lighting ----

    pub fn lighting_lut_index(&self) -> u32 {
        self.file.field(Self::LIGHTING_LUT_CONFIG, 0, 8)
    }

    pub fn set_lighting_lut_index(&mut self, index: u32) {
        self.file.set_field(Self::LIGHTING_LUT_CONFIG, 0, 8, index);
    }

    pub fn lighting_lut_type(&self) -> u32 {
        self.file.field(Self::LIGHTING_LUT_CONFIG, 8, 5)
    }

    // ---- Pipeline ----

    /// Physical base address of all vertex arrays and the index array
    pub fn vertex_attribute_base_address(&self) -> u32 {
        (self.word(Self::VERTEX_ATTRIBUTE_BASE) & 0x1FFF_FFFE) << 3
    }

    fn attribute_format_word(&self) -> u64 {
        self.u64_at(Self::VERTEX_ATTRIBUTE_FORMAT_LOW)
    }

    /// Component format of attribute `i` (0-11)
    pub fn attribute_format(&self, i: usize) -> AttributeFormat {
        AttributeFormat::from_bits(self.attribute_format_word() >> (4 * i))
    }

    /// Number of components of attribute `i` (1-4)
    pub fn attribute_components(&self, i: usize) -> u32 {
        ((self.attribute_format_word() >> (4 * i + 2)) & 3) as u32 + 1
    }

    /// Whether attribute `i` takes its value from the default attributes
    ///
    /// Attributes 12-15 have no loader and always do.
    pub fn is_default_attribute(&self, i: usize) -> bool {
        i >= 12 || (self.attribute_format_word() >> (48 + i)) & 1 != 0
    }

    /// Highest attribute index fed by the vertex loaders
    pub fn max_attribute_index(&self) -> u32 {
        (self.attribute_format_word() >> 60) as u32 & 0xF
    }

    /// Configuration of vertex array loader `i` (0-11)
    pub fn loader(&self, i: usize) -> LoaderConfig {
        let base = Self::VERTEX_LOADERS + 3 * i;
        let low = self.word(base + 1);
        let high = self.word(base + 2);

        let mut components = [0u32; 12];
        for (slot, component) in components.iter_mut().enumerate() {
            *component = if slot < 8 {
                bits(low, 4 * slot as u32, 4)
            } else {
                bits(high, 4 * (slot as u32 - 8), 4)
            };
        }

        LoaderConfig {
            data_offset: self.word(base),
            components,
            byte_count: bits(high, 16, 8),
            component_count: bits(high, 28, 4),
        }
    }

    pub fn index_array(&self) -> IndexArrayConfig {
        let word = self.word(Self::INDEX_ARRAY);
        IndexArrayConfig {
            offset: bits(word, 0, 31),
            index_u16: bits(word, 31, 1) != 0,
        }
    }

    pub fn num_vertices(&self) -> u32 {
        self.word(Self::NUM_VERTICES)
    }

    pub fn vertex_offset(&self) -> u32 {
        self.word(Self::VERTEX_OFFSET)
    }

    /// Geometry shader stage enabled
    pub fn use_gs(&self) -> bool {
        self.file.field(Self::USE_GS, 0, 2) == 2
    }

    pub fn default_attribute_index(&self) -> u32 {
        self.file.field(Self::DEFAULT_ATTRIBUTE_INDEX, 0, 4)
    }

    pub fn set_default_attribute_index(&mut self, index: u32) {
        self.file.set_field(Self::DEFAULT_ATTRIBUTE_INDEX, 0, 4, index);
    }

    /// Physical address of command buffer `n` (0 or 1)
    pub fn command_buffer_address(&self, n: usize) -> u32 {
        self.file.field(Self::COMMAND_BUFFER_ADDRESS + n, 0, 28) << 3
    }

    /// Size in bytes of command buffer `n` (0 or 1)
    pub fn command_buffer_size(&self, n: usize) -> u32 {
        self.file.field(Self::COMMAND_BUFFER_SIZE + n, 0, 20) << 3
    }

    /// Highest input attribute index used by immediate-mode submission
    pub fn max_input_attrib_index(&self) -> u32 {
        self.file.field(Self::MAX_INPUT_ATTRIB_INDEX, 0, 4)
    }

    /// Vertex shader writes are not mirrored into the geometry shader
    pub fn gs_unit_exclusive(&self) -> bool {
        self.file.field(Self::GS_UNIT_EXCLUSIVE_CONFIGURATION, 0, 1) != 0
    }

    /// Number of vertex shader output attributes
    pub fn vs_outmap_total(&self) -> u32 {
        self.file.field(Self::VS_OUTMAP_TOTAL_MINUS_1, 0, 4) + 1
    }

    pub fn triangle_topology(&self) -> TriangleTopology {
        TriangleTopology::from_bits(self.file.field(Self::TRIANGLE_TOPOLOGY, 8, 2))
    }

    // ---- Shader units ----

    fn shader_word(&self, unit: ShaderUnit, offset: usize) -> u32 {
        self.word(unit.base() + offset)
    }

    pub fn bool_uniforms(&self, unit: ShaderUnit) -> u16 {
        self.shader_word(unit, Self::SHADER_BOOL_UNIFORMS) as u16
    }

    /// Integer uniform `index` (0-3) as x, y, z, w bytes
    pub fn int_uniform(&self, unit: ShaderUnit, index: usize) -> [u8; 4] {
        self.shader_word(unit, Self::SHADER_INT_UNIFORMS + index)
            .to_le_bytes()
    }

    /// Highest input register loaded by the unit
    pub fn shader_max_input_attribute_index(&self, unit: ShaderUnit) -> u32 {
        bits(self.shader_word(unit, Self::SHADER_INPUT_BUFFER_CONFIG), 0, 4)
    }

    pub fn main_offset(&self, unit: ShaderUnit) -> u32 {
        bits(self.shader_word(unit, Self::SHADER_MAIN_OFFSET), 0, 16)
    }

    /// Input register that receives attribute `attribute`
    pub fn input_register_for_attribute(&self, unit: ShaderUnit, attribute: usize) -> usize {
        let map = self.u64_at(unit.base() + Self::SHADER_INPUT_REGISTER_MAP);
        ((map >> (4 * attribute)) & 0xF) as usize
    }

    pub fn output_mask(&self, unit: ShaderUnit) -> u16 {
        self.shader_word(unit, Self::SHADER_OUTPUT_MASK) as u16
    }

    pub fn uniform_setup(&self, unit: ShaderUnit) -> UniformSetup {
        let word = self.shader_word(unit, Self::SHADER_UNIFORM_SETUP);
        UniformSetup {
            index: bits(word, 0, 8),
            is_float32: bits(word, 31, 1) != 0,
        }
    }

    pub fn set_uniform_index(&mut self, unit: ShaderUnit, index: u32) {
        self.file
            .set_field(unit.base() + Self::SHADER_UNIFORM_SETUP, 0, 8, index);
    }

    pub fn program_offset(&self, unit: ShaderUnit) -> u32 {
        self.shader_word(unit, Self::SHADER_PROGRAM_OFFSET)
    }

    pub fn set_program_offset(&mut self, unit: ShaderUnit, offset: u32) {
        self.set_word(unit.base() + Self::SHADER_PROGRAM_OFFSET, offset);
    }

    pub fn swizzle_offset(&self, unit: ShaderUnit) -> u32 {
        self.shader_word(unit, Self::SHADER_SWIZZLE_OFFSET)
    }

    pub fn set_swizzle_offset(&mut self, unit: ShaderUnit, offset: u32) {
        self.set_word(unit.base() + Self::SHADER_SWIZZLE_OFFSET, offset);
    }
}

const _: () = assert!(PicaRegs::VS_BASE + PicaRegs::SHADER_BLOCK_SIZE == 0x2E0);
const _: () = assert!(0x2E0 < NUM_REGS);
const _: () = assert!(PicaRegs::GS_BASE + PicaRegs::SHADER_BLOCK_SIZE == PicaRegs::VS_BASE);
const _: () = assert!(PicaRegs::SHADER_SWIZZLE_DATA + 8 <= PicaRegs::SHADER_BLOCK_SIZE);
const _: () = assert!(
    PicaRegs::VERTEX_LOADERS + 3 * PicaRegs::NUM_VERTEX_LOADERS == PicaRegs::INDEX_ARRAY
);
const _: () = assert!(PicaRegs::COMMAND_BUFFER_JUMP == PicaRegs::COMMAND_BUFFER_ADDRESS + 2);
