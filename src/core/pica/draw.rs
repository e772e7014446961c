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

//! Draw calls and immediate-mode vertex submission

use super::accumulator::unpack_float24;
use super::geometry_pipeline::{GsStage, VertexSink};
use super::regs::{ShaderUnit, TriangleTopology};
use super::shader::UnitState;
use super::types::AttributeBuffer;
use super::vertex_loader::VertexLoader;
use super::Pica;
use crate::core::debugger::{DebugEvent, MemoryAccessTracker};
use crate::core::memory::GuestMemory;
use crate::core::video::VideoCore;

const VERTEX_CACHE_SIZE: usize = 32;

/// Post-transform cache for indexed draws, keyed by vertex index
///
/// Replacement is round robin. A fresh cache is used for every draw call.
struct VertexCache {
    valid: [bool; VERTEX_CACHE_SIZE],
    ids: [u32; VERTEX_CACHE_SIZE],
    entries: [AttributeBuffer; VERTEX_CACHE_SIZE],
    position: usize,
}

impl VertexCache {
    fn new() -> Self {
        Self {
            valid: [false; VERTEX_CACHE_SIZE],
            ids: [0; VERTEX_CACHE_SIZE],
            entries: [AttributeBuffer::default(); VERTEX_CACHE_SIZE],
            position: 0,
        }
    }

    fn lookup(&self, vertex: u32) -> Option<AttributeBuffer> {
        (0..VERTEX_CACHE_SIZE)
            .find(|&i| self.valid[i] && self.ids[i] == vertex)
            .map(|i| self.entries[i])
    }

    fn insert(&mut self, vertex: u32, output: &AttributeBuffer) {
        self.valid[self.position] = true;
        self.ids[self.position] = vertex;
        self.entries[self.position] = *output;
        self.position = (self.position + 1) % VERTEX_CACHE_SIZE;
    }
}

impl Pica {
    /// Run a draw call configured by the pipeline registers
    pub(super) fn draw(
        &mut self,
        memory: &dyn GuestMemory,
        video: &mut VideoCore,
        is_indexed: bool,
    ) {
        video.debug.fire(DebugEvent::IncomingPrimitiveBatch);

        let mut accelerate =
            video.settings.hw_shader_enabled && self.primitive_assembler.is_empty();
        if self.regs.use_gs() {
            if video.settings.hw_shader_accurate_gs {
                accelerate = false;
            }
        } else if matches!(
            self.primitive_assembler.topology(),
            TriangleTopology::List | TriangleTopology::Shader
        ) {
            // A partial triangle would be left in the assembler
            accelerate = accelerate && self.regs.num_vertices() % 3 == 0;
        }

        if accelerate && video.rasterizer.accelerate_draw_batch(&self.regs, is_indexed) {
            video.debug.fire(DebugEvent::FinishedPrimitiveBatch);
            return;
        }

        let loader = VertexLoader::new(&self.regs);
        let base_address = self.regs.vertex_attribute_base_address();
        let num_vertices = self.regs.num_vertices();
        let vertex_offset = self.regs.vertex_offset();

        let index_info = self.regs.index_array();
        let index_size: u32 = if index_info.index_u16 { 2 } else { 1 };
        let index_address = base_address.wrapping_add(index_info.offset);
        let index_data: &[u8] = if is_indexed {
            let length = num_vertices as usize * index_size as usize;
            match memory.physical_slice(index_address, length) {
                Some(data) => data,
                None => {
                    log::error!(
                        "Index array at invalid address 0x{:08X} ({} vertices)",
                        index_address,
                        num_vertices
                    );
                    video.debug.fire(DebugEvent::FinishedPrimitiveBatch);
                    return;
                }
            }
        } else {
            &[]
        };

        log::trace!(
            "Drawing {} vertices ({}), base 0x{:08X}",
            num_vertices,
            if is_indexed { "indexed" } else { "arrays" },
            base_address
        );

        let mut tracker = video.debug.recorder.is_some().then(MemoryAccessTracker::new);
        let mut cache = VertexCache::new();
        let mut shader_unit = UnitState::new();

        video
            .shader_engine
            .setup_batch(&mut self.vs, self.regs.main_offset(ShaderUnit::Vertex));
        self.geometry_pipeline.reconfigure(&self.regs);
        self.geometry_pipeline
            .setup(&self.regs, video.shader_engine.as_mut(), &mut self.gs);

        for index in 0..num_vertices {
            let vertex = if is_indexed {
                let at = (index * index_size) as usize;
                if let Some(tracker) = tracker.as_mut() {
                    tracker.add_access(index_address.wrapping_add(index * index_size), index_size);
                }
                if index_info.index_u16 {
                    u16::from_le_bytes([index_data[at], index_data[at + 1]]) as u32
                } else {
                    index_data[at] as u32
                }
            } else {
                index.wrapping_add(vertex_offset)
            };

            let cached = if is_indexed { cache.lookup(vertex) } else { None };
            let vs_output = match cached {
                Some(output) => output,
                None => {
                    let mut input = AttributeBuffer::default();
                    loader.load_vertex(
                        memory,
                        base_address,
                        vertex,
                        &self.input_default_attributes,
                        &mut input,
                        tracker.as_mut(),
                    );

                    video.debug.fire(DebugEvent::VertexShaderInvocation(&input));
                    shader_unit.load_input(&self.regs, ShaderUnit::Vertex, &input);
                    video.shader_engine.run(&self.vs, &mut shader_unit);

                    let mut output = AttributeBuffer::default();
                    shader_unit.write_output(&self.regs, ShaderUnit::Vertex, &mut output);
                    if is_indexed {
                        cache.insert(vertex, &output);
                    }
                    output
                }
            };

            self.submit_vertex(video, &vs_output);
        }

        if let (Some(tracker), Some(recorder)) = (tracker.as_ref(), video.debug.recorder.as_mut()) {
            tracker.for_each_range(memory, |data, address| recorder.memory_accessed(data, address));
        }

        video.rasterizer.draw_triangles();
        video.debug.fire(DebugEvent::FinishedPrimitiveBatch);
    }

    /// Handle a word written to the default attribute data port
    ///
    /// Three words make one float24 attribute. While the attribute index is
    /// below 15 it sets a default attribute; index 15 selects immediate mode,
    /// where attributes accumulate into a vertex that is drawn once the last
    /// input attribute arrives.
    pub(super) fn write_default_attribute(&mut self, video: &mut VideoCore, value: u32) {
        let Some(words) = self.default_attr.push(value, 3) else {
            return;
        };
        let attribute = unpack_float24(&words);

        let index = self.regs.default_attribute_index();
        if index < 15 {
            self.input_default_attributes.attr[index as usize] = attribute;
            self.regs.set_default_attribute_index(index + 1);
            log::trace!("Set default VS attribute {:x} to {:?}", index, attribute.to_f32());
            return;
        }

        let current = self.immediate.current_attribute;
        self.immediate.input_vertex.attr[current as usize] = attribute;
        if current < self.regs.max_input_attrib_index() {
            self.immediate.current_attribute += 1;
            return;
        }
        self.immediate.current_attribute = 0;

        video
            .shader_engine
            .setup_batch(&mut self.vs, self.regs.main_offset(ShaderUnit::Vertex));
        video
            .debug
            .fire(DebugEvent::VertexShaderInvocation(&self.immediate.input_vertex));

        let mut shader_unit = UnitState::new();
        shader_unit.load_input(&self.regs, ShaderUnit::Vertex, &self.immediate.input_vertex);
        video.shader_engine.run(&self.vs, &mut shader_unit);
        let mut output = AttributeBuffer::default();
        shader_unit.write_output(&self.regs, ShaderUnit::Vertex, &mut output);

        if self.immediate.reset_geometry_pipeline {
            self.geometry_pipeline.reconfigure(&self.regs);
            self.immediate.reset_geometry_pipeline = false;
        }
        self.geometry_pipeline
            .setup(&self.regs, video.shader_engine.as_mut(), &mut self.gs);
        self.submit_vertex(video, &output);

        // Each immediate vertex is flushed on its own
        video.rasterizer.draw_triangles();
        video.debug.fire(DebugEvent::FinishedPrimitiveBatch);
    }

    fn submit_vertex(&mut self, video: &mut VideoCore, vertex: &AttributeBuffer) {
        let gs = GsStage {
            setup: &self.gs,
            unit: &mut self.gs_unit,
            engine: video.shader_engine.as_mut(),
        };
        let mut sink = VertexSink {
            regs: &self.regs,
            assembler: &mut self.primitive_assembler,
            rasterizer: video.rasterizer.as_mut(),
        };
        self.geometry_pipeline.submit_vertex(vertex, gs, &mut sink);
    }
}
