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

//! Vertex shader output to primitive assembly
//!
//! Without a geometry shader every vertex goes straight to the primitive
//! assembler. With one, vertex shader outputs are packed into the geometry
//! shader's input buffer; each time it fills, the geometry shader runs and its
//! emitted vertices are assembled instead.

use super::output_vertex::OutputVertex;
use super::primitive_assembly::PrimitiveAssembler;
use super::regs::{PicaRegs, ShaderUnit};
use super::shader::{GsOutput, ShaderEngine, ShaderSetup, UnitState};
use super::types::{AttributeBuffer, MAX_ATTRIBUTES};
use crate::core::video::Rasterizer;

/// Final stage: semantic mapping, assembly and rasterizer hand-off
pub struct VertexSink<'a> {
    pub regs: &'a PicaRegs,
    pub assembler: &'a mut PrimitiveAssembler<OutputVertex>,
    pub rasterizer: &'a mut dyn Rasterizer,
}

impl VertexSink<'_> {
    pub fn submit(&mut self, vertex: &AttributeBuffer) {
        let output = OutputVertex::from_attribute_buffer(self.regs, vertex);
        let rasterizer = &mut *self.rasterizer;
        self.assembler
            .submit_vertex(output, |v0, v1, v2| rasterizer.add_triangle(v0, v1, v2));
    }

    pub fn set_winding(&mut self) {
        self.assembler.set_winding();
    }
}

/// Geometry shader unit borrowed for one submission
pub struct GsStage<'a> {
    pub setup: &'a ShaderSetup,
    pub unit: &'a mut UnitState,
    pub engine: &'a mut dyn ShaderEngine,
}

#[derive(Debug, Clone)]
struct GsInputBuffer {
    buffer: AttributeBuffer,
    cursor: usize,
    /// Attributes contributed per vertex
    vs_output_num: usize,
    /// Attributes consumed per geometry shader invocation
    capacity: usize,
}

impl GsInputBuffer {
    /// Append a vertex; true once the buffer is full and was reset
    fn push(&mut self, vertex: &AttributeBuffer) -> bool {
        let count = self.vs_output_num.min(self.capacity - self.cursor);
        self.buffer.attr[self.cursor..self.cursor + count]
            .copy_from_slice(&vertex.attr[..count]);
        self.cursor += count;
        if self.cursor >= self.capacity {
            self.cursor = 0;
            true
        } else {
            false
        }
    }
}

/// Vertex routing between the vertex shader and the primitive assembler
#[derive(Debug, Clone, Default)]
pub struct GeometryPipeline {
    gs_input: Option<GsInputBuffer>,
}

impl GeometryPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read the pipeline configuration, dropping buffered GS input
    pub fn reconfigure(&mut self, regs: &PicaRegs) {
        if !regs.use_gs() {
            self.gs_input = None;
            return;
        }

        let vs_output_num = regs.vs_outmap_total() as usize;
        let capacity = (regs.shader_max_input_attribute_index(ShaderUnit::Geometry) as usize + 1)
            .min(MAX_ATTRIBUTES);
        if vs_output_num > capacity {
            log::error!(
                "Vertex shader outputs {} attributes but the geometry shader reads {}",
                vs_output_num,
                capacity
            );
        }

        self.gs_input = Some(GsInputBuffer {
            buffer: AttributeBuffer::default(),
            cursor: 0,
            vs_output_num: vs_output_num.min(capacity),
            capacity,
        });
    }

    /// Whether vertices go through the geometry shader
    pub fn uses_gs(&self) -> bool {
        self.gs_input.is_some()
    }

    /// Prepare the geometry shader for a batch
    pub fn setup(
        &self,
        regs: &PicaRegs,
        engine: &mut dyn ShaderEngine,
        gs_setup: &mut ShaderSetup,
    ) {
        if self.gs_input.is_some() {
            engine.setup_batch(gs_setup, regs.main_offset(ShaderUnit::Geometry));
        }
    }

    /// Forward one vertex shader output
    pub fn submit_vertex(
        &mut self,
        vertex: &AttributeBuffer,
        gs: GsStage<'_>,
        sink: &mut VertexSink<'_>,
    ) {
        let Some(input) = self.gs_input.as_mut() else {
            sink.submit(vertex);
            return;
        };

        if !input.push(vertex) {
            return;
        }

        let emitter_mask = sink.regs.output_mask(ShaderUnit::Geometry);
        if let Some(emitter) = gs.unit.emitter.as_mut() {
            emitter.output_mask = emitter_mask;
        }

        gs.unit.load_input(sink.regs, ShaderUnit::Geometry, &input.buffer);
        gs.engine.run(gs.setup, gs.unit);

        if let Some(emitter) = gs.unit.emitter.as_mut() {
            for output in emitter.drain() {
                match output {
                    GsOutput::Winding => sink.set_winding(),
                    GsOutput::Vertex(vertex) => sink.submit(&vertex),
                }
            }
        }
    }
}
