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

//! Register side effects
//!
//! Every register id with a side effect has an entry in a table built at
//! compile time. Handlers run after the masked write has been merged into the
//! register file and receive the raw (unmasked) written value.

use super::accumulator::{unpack_float24, unpack_float32};
use super::command::CommandListCursor;
use super::lut::NUM_LIGHTING_SAMPLERS;
use super::regs::{PicaRegs, ShaderUnit, NUM_REGS};
use super::shader::{
    MAX_PROGRAM_CODE_LENGTH, MAX_SWIZZLE_DATA_LENGTH, MAX_VS_PROGRAM_LENGTH, NUM_FLOAT_UNIFORMS,
};
use super::types::Vec4;
use super::Pica;
use crate::core::interrupt::InterruptId;
use crate::core::memory::GuestMemory;
use crate::core::video::VideoCore;

/// Side effect of a register write
///
/// Arguments: PICA state, guest memory, collaborators, register id, raw value.
pub type RegisterHandler = fn(&mut Pica, &dyn GuestMemory, &mut VideoCore, usize, u32);

static HANDLERS: [Option<RegisterHandler>; NUM_REGS] = build_table();

/// Handler registered for `id`, if any
#[inline]
pub fn handler_for(id: usize) -> Option<RegisterHandler> {
    HANDLERS.get(id).copied().flatten()
}

const fn register_range(
    table: &mut [Option<RegisterHandler>; NUM_REGS],
    first: usize,
    count: usize,
    handler: RegisterHandler,
) {
    let mut i = 0;
    while i < count {
        table[first + i] = Some(handler);
        i += 1;
    }
}

const fn build_table() -> [Option<RegisterHandler>; NUM_REGS] {
    let mut table: [Option<RegisterHandler>; NUM_REGS] = [None; NUM_REGS];

    table[PicaRegs::TRIGGER_IRQ] = Some(trigger_irq as RegisterHandler);

    register_range(&mut table, PicaRegs::PROCTEX_LUT_DATA, 8, proctex_lut_data);
    register_range(&mut table, PicaRegs::FOG_LUT_DATA, 8, fog_lut_data);
    register_range(&mut table, PicaRegs::LIGHTING_LUT_DATA, 8, lighting_lut_data);

    table[PicaRegs::TRIGGER_DRAW] = Some(trigger_draw as RegisterHandler);
    table[PicaRegs::TRIGGER_DRAW_INDEXED] = Some(trigger_draw as RegisterHandler);
    table[PicaRegs::DEFAULT_ATTRIBUTE_INDEX] = Some(default_attribute_index as RegisterHandler);
    register_range(&mut table, PicaRegs::DEFAULT_ATTRIBUTE_DATA, 3, default_attribute_data);
    register_range(&mut table, PicaRegs::COMMAND_BUFFER_JUMP, 2, command_buffer_jump);
    // GPU_MODE only enables vertex processing and needs no handling
    table[PicaRegs::TRIANGLE_TOPOLOGY] = Some(triangle_topology as RegisterHandler);
    table[PicaRegs::RESTART_PRIMITIVE] = Some(restart_primitive as RegisterHandler);

    let units = [PicaRegs::GS_BASE, PicaRegs::VS_BASE];
    let mut u = 0;
    while u < units.len() {
        let base = units[u];
        table[base + PicaRegs::SHADER_BOOL_UNIFORMS] = Some(bool_uniforms as RegisterHandler);
        register_range(&mut table, base + PicaRegs::SHADER_INT_UNIFORMS, 4, int_uniforms);
        register_range(&mut table, base + PicaRegs::SHADER_UNIFORM_DATA, 8, float_uniform_data);
        register_range(&mut table, base + PicaRegs::SHADER_PROGRAM_DATA, 8, program_data);
        register_range(&mut table, base + PicaRegs::SHADER_SWIZZLE_DATA, 8, swizzle_data);
        u += 1;
    }

    table
}

/// Shader unit owning register `id`
#[inline]
fn unit_for(id: usize) -> ShaderUnit {
    if id >= PicaRegs::VS_BASE {
        ShaderUnit::Vertex
    } else {
        ShaderUnit::Geometry
    }
}

fn trigger_irq(
    _pica: &mut Pica,
    _memory: &dyn GuestMemory,
    video: &mut VideoCore,
    _id: usize,
    _value: u32,
) {
    video.signal_interrupt(InterruptId::P3D);
}

fn triangle_topology(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    _id: usize,
    _value: u32,
) {
    let topology = pica.regs.triangle_topology();
    pica.primitive_assembler.reconfigure(topology);
}

fn restart_primitive(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    _id: usize,
    _value: u32,
) {
    pica.primitive_assembler.reset();
}

fn default_attribute_index(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    _id: usize,
    _value: u32,
) {
    pica.immediate.current_attribute = 0;
    pica.immediate.reset_geometry_pipeline = true;
    pica.default_attr.reset();
}

fn default_attribute_data(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    video: &mut VideoCore,
    _id: usize,
    value: u32,
) {
    pica.write_default_attribute(video, value);
}

fn command_buffer_jump(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    id: usize,
    _value: u32,
) {
    let index = id - PicaRegs::COMMAND_BUFFER_JUMP;
    let address = pica.regs.command_buffer_address(index);
    let size = pica.regs.command_buffer_size(index);
    log::trace!("Command buffer {} jump to 0x{:08X} ({} bytes)", index, address, size);
    pica.cmd_list = CommandListCursor::new(address, size);
}

fn trigger_draw(
    pica: &mut Pica,
    memory: &dyn GuestMemory,
    video: &mut VideoCore,
    id: usize,
    _value: u32,
) {
    pica.draw(memory, video, id == PicaRegs::TRIGGER_DRAW_INDEXED);
}

fn bool_uniforms(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    id: usize,
    _value: u32,
) {
    let unit = unit_for(id);
    let value = pica.regs.bool_uniforms(unit);
    pica.shader_setup_mut(unit).write_bool_uniforms(value as u32);
}

fn int_uniforms(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    id: usize,
    _value: u32,
) {
    let unit = unit_for(id);
    let index = id - unit.base() - PicaRegs::SHADER_INT_UNIFORMS;
    let [x, y, z, w] = pica.regs.int_uniform(unit, index);
    pica.shader_setup_mut(unit).uniforms.i[index] = Vec4::new(x, y, z, w);
    log::trace!(
        "Set {} integer uniform {} to {:02x} {:02x} {:02x} {:02x}",
        unit.name(),
        index,
        x,
        y,
        z,
        w
    );
}

fn float_uniform_data(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    id: usize,
    value: u32,
) {
    let unit = unit_for(id);
    let setup = pica.regs.uniform_setup(unit);
    let words = if setup.is_float32 { 4 } else { 3 };

    let accumulator = match unit {
        ShaderUnit::Geometry => &mut pica.gs_float_uniforms,
        ShaderUnit::Vertex => &mut pica.vs_float_uniforms,
    };
    let Some(buffer) = accumulator.push(value, words) else {
        return;
    };

    let index = setup.index as usize;
    if index >= NUM_FLOAT_UNIFORMS {
        log::trace!("Invalid {} float uniform index {}", unit.name(), index);
        return;
    }

    // Components arrive w first
    let uniform = if setup.is_float32 {
        unpack_float32(&buffer)
    } else {
        unpack_float24(&buffer)
    };
    pica.shader_setup_mut(unit).uniforms.f[index] = uniform;
    log::trace!(
        "Set {} float uniform {:x} to {:?}",
        unit.name(),
        index,
        uniform.to_f32()
    );

    pica.regs.set_uniform_index(unit, setup.index + 1);
}

fn program_data(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    id: usize,
    value: u32,
) {
    let unit = unit_for(id);
    let offset = pica.regs.program_offset(unit);

    match unit {
        ShaderUnit::Geometry => {
            if offset as usize >= MAX_PROGRAM_CODE_LENGTH {
                log::error!("Invalid GS program offset {}", offset);
                return;
            }
            pica.gs.program_code[offset as usize] = value;
            pica.gs.mark_program_code_dirty();
        }
        ShaderUnit::Vertex => {
            if offset >= MAX_VS_PROGRAM_LENGTH {
                log::error!("Invalid VS program offset {}", offset);
                return;
            }
            pica.vs.program_code[offset as usize] = value;
            pica.vs.mark_program_code_dirty();
            if !pica.regs.gs_unit_exclusive() {
                pica.gs.program_code[offset as usize] = value;
                pica.gs.mark_program_code_dirty();
            }
        }
    }

    pica.regs.set_program_offset(unit, offset + 1);
}

fn swizzle_data(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    id: usize,
    value: u32,
) {
    let unit = unit_for(id);
    let offset = pica.regs.swizzle_offset(unit);
    if offset as usize >= MAX_SWIZZLE_DATA_LENGTH {
        log::error!("Invalid {} swizzle pattern offset {}", unit.name(), offset);
        return;
    }

    let offset_index = offset as usize;
    pica.shader_setup_mut(unit).swizzle_data[offset_index] = value;
    pica.shader_setup_mut(unit).mark_swizzle_data_dirty();
    if unit == ShaderUnit::Vertex && !pica.regs.gs_unit_exclusive() {
        pica.gs.swizzle_data[offset_index] = value;
        pica.gs.mark_swizzle_data_dirty();
    }

    pica.regs.set_swizzle_offset(unit, offset + 1);
}

fn lighting_lut_data(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    _id: usize,
    value: u32,
) {
    let index = pica.regs.lighting_lut_index();
    let lut_type = pica.regs.lighting_lut_type() as usize;

    let Some(lut) = pica.luts.lighting.luts.get_mut(lut_type) else {
        log::error!(
            "Lighting LUT {} out of range ({} samplers)",
            lut_type,
            NUM_LIGHTING_SAMPLERS
        );
        return;
    };
    // The index field is 8 bits wide and wraps at 256
    lut[index as usize] = value;
    pica.regs.set_lighting_lut_index(index + 1);
}

fn fog_lut_data(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    _id: usize,
    value: u32,
) {
    let offset = pica.regs.fog_lut_offset();
    pica.luts.fog.write(offset, value);
    pica.regs.set_fog_lut_offset(offset.wrapping_add(1));
}

fn proctex_lut_data(
    pica: &mut Pica,
    _memory: &dyn GuestMemory,
    _video: &mut VideoCore,
    _id: usize,
    value: u32,
) {
    let index = pica.regs.proctex_lut_index();
    match pica.regs.proctex_lut_table() {
        Some(table) => pica.luts.proctex.write(table, index, value),
        None => log::error!("Unknown procedural texture LUT selected"),
    }
    pica.regs.set_proctex_lut_index(index + 1);
}
