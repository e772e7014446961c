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

//! PICA200 command processor
//!
//! The GPU's 3D engine is programmed exclusively through its register file.
//! Guest software builds command lists in memory and hands them to the command
//! processor, which decodes each (value, header) pair into a masked register
//! write and then runs that register's side effect:
//!
//! - shader program, swizzle and uniform uploads
//! - lookup table uploads for lighting, fog and procedural textures
//! - draw triggers, which run vertices through the vertex pipeline
//! - command buffer jumps, which redirect the decoder mid-list
//!
//! Everything the processor does not own itself (rasterization, shader
//! execution, interrupt delivery) is reached through [`VideoCore`].
//!
//! # Example
//!
//! ```
//! use picarx::core::memory::{GuestMemory, PhysicalMemory, FCRAM_PADDR};
//! use picarx::core::pica::{CommandHeader, Pica, PicaRegs};
//! use picarx::core::video::VideoCore;
//!
//! let mut memory = PhysicalMemory::with_fcram_size(0x1000);
//! let mut video = VideoCore::headless();
//! let mut pica = Pica::new();
//!
//! // Set the fog LUT offset to 5, then upload one entry
//! let list = [
//!     5,
//!     CommandHeader::new(PicaRegs::FOG_LUT_OFFSET as u32, 0xF, 0, false).0,
//!     0xABCD,
//!     CommandHeader::new(PicaRegs::FOG_LUT_DATA as u32, 0xF, 0, false).0,
//! ];
//! for (i, word) in list.iter().enumerate() {
//!     assert!(memory.write_u32(FCRAM_PADDR + i as u32 * 4, *word));
//! }
//!
//! pica.process_command_list(&memory, &mut video, FCRAM_PADDR, 16);
//!
//! assert_eq!(pica.luts().fog.lut[5], 0xABCD);
//! assert_eq!(pica.regs().fog_lut_offset(), 6);
//! ```

mod accumulator;
mod command;
mod dispatch;
mod draw;
mod float24;
mod geometry_pipeline;
mod lut;
mod output_vertex;
mod primitive_assembly;
mod regs;
mod shader;
mod types;
mod vertex_loader;

#[cfg(test)]
mod tests;

pub use accumulator::{pack_float24, unpack_float24, unpack_float32, PackedAccumulator};
pub use command::{CommandHeader, CommandListCursor};
pub use dispatch::{handler_for, RegisterHandler};
pub use float24::Float24;
pub use geometry_pipeline::{GeometryPipeline, GsStage, VertexSink};
pub use lut::{FogLut, LightingLuts, Luts, ProcTexLuts, NUM_LIGHTING_SAMPLERS};
pub use output_vertex::{semantic, OutputVertex};
pub use primitive_assembly::PrimitiveAssembler;
pub use regs::{
    AttributeFormat, IndexArrayConfig, LoaderConfig, PicaRegs, ProcTexLutTable, ShaderUnit,
    TriangleTopology, UniformSetup, NUM_REGS,
};
pub use shader::{
    GsEmitter, GsOutput, PassthroughShaderEngine, ShaderEngine, ShaderRegisters, ShaderSetup,
    UnitState, Uniforms, MAX_PROGRAM_CODE_LENGTH, MAX_SWIZZLE_DATA_LENGTH, MAX_VS_PROGRAM_LENGTH,
    NUM_FLOAT_UNIFORMS,
};
pub use types::{AttributeBuffer, Vec4, MAX_ATTRIBUTES};
pub use vertex_loader::VertexLoader;

use crate::core::debugger::DebugEvent;
use crate::core::memory::GuestMemory;
use crate::core::video::VideoCore;

/// Vertex being assembled attribute by attribute through the default
/// attribute port
#[derive(Debug, Clone, Default)]
pub struct ImmediateModeState {
    pub input_vertex: AttributeBuffer,
    /// Next attribute slot to fill
    pub current_attribute: u32,
    /// The geometry pipeline is reconfigured before the next immediate vertex
    pub reset_geometry_pipeline: bool,
}

/// PICA200 state owned by the command processor
pub struct Pica {
    regs: PicaRegs,

    vs: ShaderSetup,
    gs: ShaderSetup,
    gs_unit: UnitState,

    input_default_attributes: AttributeBuffer,
    immediate: ImmediateModeState,

    luts: Luts,

    primitive_assembler: PrimitiveAssembler<OutputVertex>,
    geometry_pipeline: GeometryPipeline,

    cmd_list: CommandListCursor,

    default_attr: PackedAccumulator,
    vs_float_uniforms: PackedAccumulator,
    gs_float_uniforms: PackedAccumulator,
}

impl Default for Pica {
    fn default() -> Self {
        Self::new()
    }
}

impl Pica {
    pub fn new() -> Self {
        Self {
            regs: PicaRegs::new(),
            vs: ShaderSetup::new(),
            gs: ShaderSetup::new(),
            gs_unit: UnitState::with_emitter(),
            input_default_attributes: AttributeBuffer::default(),
            immediate: ImmediateModeState::default(),
            luts: Luts::default(),
            primitive_assembler: PrimitiveAssembler::new(TriangleTopology::List),
            geometry_pipeline: GeometryPipeline::new(),
            cmd_list: CommandListCursor::default(),
            default_attr: PackedAccumulator::new(),
            vs_float_uniforms: PackedAccumulator::new(),
            gs_float_uniforms: PackedAccumulator::new(),
        }
    }

    /// Reset to power-on state
    pub fn init(&mut self) {
        *self = Self::new();
        self.geometry_pipeline.reconfigure(&self.regs);
        log::debug!("PICA initialized");
    }

    pub fn shutdown(&mut self) {
        self.cmd_list = CommandListCursor::default();
        log::debug!("PICA shut down");
    }

    /// Decode and execute the command list at physical `address`
    ///
    /// `size` is in bytes. Decoding stops at the end of the list, on a read
    /// from unbacked memory, or early when a jump register points the
    /// decoder at a different list.
    pub fn process_command_list(
        &mut self,
        memory: &dyn GuestMemory,
        video: &mut VideoCore,
        address: u32,
        size: u32,
    ) {
        self.cmd_list = CommandListCursor::new(address, size);
        log::debug!("Processing command list at 0x{:08X} ({} bytes)", address, size);

        while self.cmd_list.has_remaining() {
            self.cmd_list.align();

            // Padding after the last pair ends the list
            let Some(value_address) = self.cmd_list.next_address() else {
                break;
            };
            let Some(header_address) = self.cmd_list.next_address() else {
                log::error!(
                    "Command list truncated: no header after value at 0x{:08X}",
                    value_address
                );
                break;
            };

            let (Some(value), Some(header)) = (
                memory.read_u32(value_address),
                memory.read_u32(header_address),
            ) else {
                log::error!(
                    "Command list read from invalid address 0x{:08X}",
                    value_address
                );
                self.cmd_list.terminate();
                break;
            };

            let header = CommandHeader(header);
            let mask = header.parameter_mask();
            self.write_pica_reg(memory, video, header.cmd_id(), value, mask);

            for i in 0..header.extra_data_length() {
                let Some(extra_address) = self.cmd_list.next_address() else {
                    log::error!(
                        "Command list truncated: {} of {} extra words missing for {:?}",
                        header.extra_data_length() - i,
                        header.extra_data_length(),
                        header
                    );
                    break;
                };
                let Some(extra) = memory.read_u32(extra_address) else {
                    log::error!(
                        "Command list read from invalid address 0x{:08X}",
                        extra_address
                    );
                    self.cmd_list.terminate();
                    break;
                };
                self.write_pica_reg(memory, video, header.extra_target(i), extra, mask);
            }
        }
    }

    /// Apply a masked register write and run its side effect
    pub fn write_pica_reg(
        &mut self,
        memory: &dyn GuestMemory,
        video: &mut VideoCore,
        id: u32,
        value: u32,
        mask: u32,
    ) {
        let index = id as usize;
        let merged = match self.regs.merge(index, value, mask) {
            Ok(merged) => merged,
            Err(_) => {
                log::error!(
                    "Commandlist tried to write to invalid register 0x{:03X} (value: {:08X}, mask: {:X})",
                    id,
                    value,
                    mask
                );
                return;
            }
        };

        if video.tracer.is_tracing() {
            video.tracer.on_write(id as u16, mask as u16, merged);
        }

        video.debug.fire(DebugEvent::PicaCommandLoaded(id));

        if let Some(handler) = dispatch::handler_for(index) {
            handler(self, memory, video, index, value);
        }

        video.rasterizer.notify_pica_register_changed(id);
        video.debug.fire(DebugEvent::PicaCommandProcessed(id));
    }

    pub fn regs(&self) -> &PicaRegs {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut PicaRegs {
        &mut self.regs
    }

    pub fn vs_setup(&self) -> &ShaderSetup {
        &self.vs
    }

    pub fn gs_setup(&self) -> &ShaderSetup {
        &self.gs
    }

    pub fn shader_setup_mut(&mut self, unit: ShaderUnit) -> &mut ShaderSetup {
        match unit {
            ShaderUnit::Geometry => &mut self.gs,
            ShaderUnit::Vertex => &mut self.vs,
        }
    }

    pub fn luts(&self) -> &Luts {
        &self.luts
    }

    /// Values loaded for attributes without a vertex array
    pub fn default_attributes(&self) -> &AttributeBuffer {
        &self.input_default_attributes
    }

    pub fn immediate_mode(&self) -> &ImmediateModeState {
        &self.immediate
    }

    pub fn primitive_assembler(&self) -> &PrimitiveAssembler<OutputVertex> {
        &self.primitive_assembler
    }

    /// Decoder position of the list being processed (or last processed)
    pub fn command_list(&self) -> &CommandListCursor {
        &self.cmd_list
    }
}

impl std::fmt::Debug for Pica {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pica")
            .field("cmd_list", &self.cmd_list)
            .field("topology", &self.primitive_assembler.topology())
            .field("uses_gs", &self.geometry_pipeline.uses_gs())
            .field("immediate", &self.immediate.current_attribute)
            .finish_non_exhaustive()
    }
}
