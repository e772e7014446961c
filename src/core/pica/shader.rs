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

//! Shader unit state and the shader engine seam
//!
//! The command processor owns program code, swizzle patterns and uniforms of
//! both shader units. Executing shader programs is delegated to a
//! [`ShaderEngine`].

use super::float24::Float24;
use super::regs::{PicaRegs, ShaderUnit};
use super::types::{AttributeBuffer, Vec4, MAX_ATTRIBUTES};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Program memory size in words
pub const MAX_PROGRAM_CODE_LENGTH: usize = 4096;

/// Swizzle pattern memory size in words
pub const MAX_SWIZZLE_DATA_LENGTH: usize = 4096;

/// Vertex shader program memory writable through its upload port
pub const MAX_VS_PROGRAM_LENGTH: u32 = 512;

pub const NUM_FLOAT_UNIFORMS: usize = 96;
pub const NUM_INT_UNIFORMS: usize = 4;
pub const NUM_BOOL_UNIFORMS: usize = 16;

/// Uniform banks of one shader unit
#[derive(Debug, Clone)]
pub struct Uniforms {
    pub f: [Vec4<Float24>; NUM_FLOAT_UNIFORMS],
    pub b: [bool; NUM_BOOL_UNIFORMS],
    pub i: [Vec4<u8>; NUM_INT_UNIFORMS],
}

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            f: [Vec4::default(); NUM_FLOAT_UNIFORMS],
            b: [false; NUM_BOOL_UNIFORMS],
            i: [Vec4::default(); NUM_INT_UNIFORMS],
        }
    }
}

/// Program, swizzle patterns and uniforms of one shader unit
#[derive(Debug, Clone)]
pub struct ShaderSetup {
    pub uniforms: Uniforms,
    pub program_code: Box<[u32; MAX_PROGRAM_CODE_LENGTH]>,
    pub swizzle_data: Box<[u32; MAX_SWIZZLE_DATA_LENGTH]>,

    program_code_dirty: bool,
    swizzle_data_dirty: bool,
    program_code_hash: u64,
    swizzle_data_hash: u64,
}

impl Default for ShaderSetup {
    fn default() -> Self {
        Self {
            uniforms: Uniforms::default(),
            program_code: Box::new([0; MAX_PROGRAM_CODE_LENGTH]),
            swizzle_data: Box::new([0; MAX_SWIZZLE_DATA_LENGTH]),
            program_code_dirty: true,
            swizzle_data_dirty: true,
            program_code_hash: 0,
            swizzle_data_hash: 0,
        }
    }
}

fn hash_words(words: &[u32]) -> u64 {
    let mut hasher = DefaultHasher::new();
    words.hash(&mut hasher);
    hasher.finish()
}

impl ShaderSetup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero everything and mark both tables dirty
    pub fn reset(&mut self) {
        self.uniforms = Uniforms::default();
        self.program_code.fill(0);
        self.swizzle_data.fill(0);
        self.program_code_dirty = true;
        self.swizzle_data_dirty = true;
    }

    pub fn mark_program_code_dirty(&mut self) {
        self.program_code_dirty = true;
    }

    pub fn mark_swizzle_data_dirty(&mut self) {
        self.swizzle_data_dirty = true;
    }

    pub fn is_program_code_dirty(&self) -> bool {
        self.program_code_dirty
    }

    pub fn is_swizzle_data_dirty(&self) -> bool {
        self.swizzle_data_dirty
    }

    /// Hash of the program code, recomputed only after writes
    ///
    /// Engines key compiled shader caches on this.
    pub fn program_code_hash(&mut self) -> u64 {
        if self.program_code_dirty {
            self.program_code_hash = hash_words(&self.program_code[..]);
            self.program_code_dirty = false;
        }
        self.program_code_hash
    }

    /// Hash of the swizzle patterns, recomputed only after writes
    pub fn swizzle_data_hash(&mut self) -> u64 {
        if self.swizzle_data_dirty {
            self.swizzle_data_hash = hash_words(&self.swizzle_data[..]);
            self.swizzle_data_dirty = false;
        }
        self.swizzle_data_hash
    }

    /// Decode the 16 boolean uniforms from a register word
    pub fn write_bool_uniforms(&mut self, value: u32) {
        for (i, b) in self.uniforms.b.iter_mut().enumerate() {
            *b = value & (1 << i) != 0;
        }
    }
}

/// Register banks of one shader invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct ShaderRegisters {
    pub input: [Vec4<Float24>; 16],
    pub temporary: [Vec4<Float24>; 16],
    pub output: [Vec4<Float24>; 16],
}

/// Execution state of a shader unit
#[derive(Debug, Clone, Default)]
pub struct UnitState {
    pub registers: ShaderRegisters,
    pub conditional_code: [bool; 2],
    pub address_registers: [i32; 3],
    /// Present on the geometry shader unit only
    pub emitter: Option<GsEmitter>,
}

impl UnitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A unit that can emit primitives
    pub fn with_emitter() -> Self {
        Self {
            emitter: Some(GsEmitter::default()),
            ..Self::default()
        }
    }

    /// Route attributes 0..=max_input_attribute_index into input registers
    pub fn load_input(&mut self, regs: &PicaRegs, unit: ShaderUnit, input: &AttributeBuffer) {
        let max_attribute = regs.shader_max_input_attribute_index(unit) as usize;
        for attribute in 0..=max_attribute.min(MAX_ATTRIBUTES - 1) {
            let register = regs.input_register_for_attribute(unit, attribute);
            self.registers.input[register] = input.attr[attribute];
        }
    }

    /// Pack the output registers enabled in `output_mask` into `output`
    pub fn write_output(&self, regs: &PicaRegs, unit: ShaderUnit, output: &mut AttributeBuffer) {
        copy_registers_to_output(&self.registers.output, regs.output_mask(unit), output);
    }
}

fn copy_registers_to_output(
    registers: &[Vec4<Float24>; 16],
    mask: u16,
    output: &mut AttributeBuffer,
) {
    let enabled = (0..16).filter(|reg| mask & (1 << reg) != 0);
    for (slot, reg) in enabled.enumerate() {
        output.attr[slot] = registers[reg];
    }
}

/// Geometry shader output event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GsOutput {
    /// Flip the winding of the next primitive
    Winding,
    Vertex(AttributeBuffer),
}

/// Primitive emitter of the geometry shader unit
///
/// The engine stages vertices with [`emit`](Self::emit); completed primitives
/// are queued until the geometry pipeline drains them.
#[derive(Debug, Clone, Default)]
pub struct GsEmitter {
    pub buffer: [AttributeBuffer; 3],
    /// Staging slot for the next emitted vertex
    pub vertex_id: u8,
    /// The next emit completes a primitive
    pub prim_emit: bool,
    pub winding: bool,
    pub output_mask: u16,
    queue: Vec<GsOutput>,
}

impl GsEmitter {
    /// Stage the output registers as vertex `vertex_id`
    pub fn emit(&mut self, output_regs: &[Vec4<Float24>; 16]) {
        let Some(slot) = self.buffer.get_mut(self.vertex_id as usize) else {
            log::error!("Geometry shader emitted to invalid vertex slot {}", self.vertex_id);
            return;
        };
        copy_registers_to_output(output_regs, self.output_mask, slot);

        if self.prim_emit {
            if self.winding {
                self.queue.push(GsOutput::Winding);
            }
            for vertex in &self.buffer {
                self.queue.push(GsOutput::Vertex(*vertex));
            }
        }
    }

    /// Take the queued outputs in emission order
    pub fn drain(&mut self) -> std::vec::Drain<'_, GsOutput> {
        self.queue.drain(..)
    }
}

/// Shader program executor
///
/// `setup_batch` is called once before a run of invocations that share a
/// program and entry point; `run` executes one invocation.
pub trait ShaderEngine {
    fn setup_batch(&mut self, setup: &mut ShaderSetup, entry_point: u32);

    fn run(&mut self, setup: &ShaderSetup, state: &mut UnitState);
}

/// Engine that copies input registers straight to output registers
///
/// Stands in for a real interpreter when only the command stream matters.
#[derive(Debug, Default, Clone)]
pub struct PassthroughShaderEngine {
    batches: u64,
    invocations: u64,
    last_program_hash: u64,
}

impl PassthroughShaderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    pub fn last_program_hash(&self) -> u64 {
        self.last_program_hash
    }
}

impl ShaderEngine for PassthroughShaderEngine {
    fn setup_batch(&mut self, setup: &mut ShaderSetup, entry_point: u32) {
        self.batches += 1;
        self.last_program_hash = setup.program_code_hash();
        log::trace!("Shader batch at entry point {:#X}", entry_point);
    }

    fn run(&mut self, _setup: &ShaderSetup, state: &mut UnitState) {
        self.invocations += 1;
        state.registers.output = state.registers.input;
    }
}

impl<T: ShaderEngine> ShaderEngine for std::rc::Rc<std::cell::RefCell<T>> {
    fn setup_batch(&mut self, setup: &mut ShaderSetup, entry_point: u32) {
        self.borrow_mut().setup_batch(setup, entry_point);
    }

    fn run(&mut self, setup: &ShaderSetup, state: &mut UnitState) {
        self.borrow_mut().run(setup, state);
    }
}
