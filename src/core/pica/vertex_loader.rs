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

//! Vertex array loading
//!
//! Twelve loaders each describe one interleaved array. A loader lists up to
//! twelve components; component ids 0-11 name attributes, ids 12-15 insert 4,
//! 8, 12 or 16 bytes of padding. Attributes not fed by any loader may take
//! their value from the default attributes.

use super::float24::Float24;
use super::regs::{AttributeFormat, PicaRegs};
use super::types::{AttributeBuffer, Vec4, MAX_ATTRIBUTES};
use crate::core::debugger::MemoryAccessTracker;
use crate::core::memory::GuestMemory;

const NUM_ARRAY_ATTRIBUTES: usize = 12;

#[inline]
const fn align_up(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

/// Per-attribute source description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AttributeSource {
    /// Byte offset from the attribute base address
    offset: u32,
    stride: u32,
    format: AttributeFormat,
    /// 0 when no loader feeds the attribute
    elements: u32,
}

impl Default for AttributeSource {
    fn default() -> Self {
        Self {
            offset: 0,
            stride: 0,
            format: AttributeFormat::Float,
            elements: 0,
        }
    }
}

/// Decoded vertex array configuration
#[derive(Debug, Clone)]
pub struct VertexLoader {
    sources: [AttributeSource; MAX_ATTRIBUTES],
    is_default: [bool; MAX_ATTRIBUTES],
    num_total_attributes: usize,
}

impl VertexLoader {
    /// Decode the loader registers
    pub fn new(regs: &PicaRegs) -> Self {
        let mut sources = [AttributeSource::default(); MAX_ATTRIBUTES];
        let mut is_default = [false; MAX_ATTRIBUTES];
        for (i, flag) in is_default.iter_mut().enumerate() {
            *flag = regs.is_default_attribute(i);
        }

        for loader_id in 0..PicaRegs::NUM_VERTEX_LOADERS {
            let loader = regs.loader(loader_id);
            let mut offset = 0u32;

            for component in 0..loader.component_count as usize {
                let Some(&attribute) = loader.components.get(component) else {
                    log::error!(
                        "Overflow in the vertex attribute loader {} trying to load component {}",
                        loader_id,
                        component
                    );
                    continue;
                };

                if (attribute as usize) < NUM_ARRAY_ATTRIBUTES {
                    let attribute = attribute as usize;
                    let format = regs.attribute_format(attribute);
                    let elements = regs.attribute_components(attribute);
                    offset = align_up(offset, format.component_size());
                    sources[attribute] = AttributeSource {
                        offset: loader.data_offset.wrapping_add(offset),
                        stride: loader.byte_count,
                        format,
                        elements,
                    };
                    offset += elements * format.component_size();
                } else {
                    // Ids 12..=15 are padding
                    offset = align_up(offset, 4);
                    offset += (attribute - 11) * 4;
                }
            }
        }

        Self {
            sources,
            is_default,
            num_total_attributes: regs.max_attribute_index() as usize + 1,
        }
    }

    /// Number of attributes each vertex carries
    pub fn num_total_attributes(&self) -> usize {
        self.num_total_attributes
    }

    /// Load vertex number `vertex` into `input`
    ///
    /// Array-fed attributes are read from guest memory; missing components are
    /// filled with (0, 0, 0, 1). Default attributes are copied from `defaults`.
    /// Attributes that are neither keep whatever `input` held.
    pub fn load_vertex(
        &self,
        memory: &dyn GuestMemory,
        base_address: u32,
        vertex: u32,
        defaults: &AttributeBuffer,
        input: &mut AttributeBuffer,
        mut accesses: Option<&mut MemoryAccessTracker>,
    ) {
        for i in 0..self.num_total_attributes.min(MAX_ATTRIBUTES) {
            let source = &self.sources[i];
            if source.elements != 0 {
                let address = base_address
                    .wrapping_add(source.offset)
                    .wrapping_add(source.stride.wrapping_mul(vertex));
                let size = source.format.component_size();
                let length = source.elements * size;

                if let Some(tracker) = accesses.as_deref_mut() {
                    tracker.add_access(address, length);
                }

                let attribute = &mut input.attr[i];
                match memory.physical_slice(address, length as usize) {
                    Some(data) => {
                        for comp in 0..source.elements as usize {
                            let at = comp * size as usize;
                            attribute[comp] = decode_component(source.format, &data[at..]);
                        }
                    }
                    None => {
                        log::error!(
                            "Vertex attribute {} of vertex {} at invalid address 0x{:08X}",
                            i,
                            vertex,
                            address
                        );
                        for comp in 0..source.elements as usize {
                            attribute[comp] = Float24::ZERO;
                        }
                    }
                }

                let origin: Vec4<Float24> = Vec4::origin();
                for comp in source.elements as usize..4 {
                    attribute[comp] = origin[comp];
                }

                log::trace!(
                    "Loaded attribute {} of vertex {}: {:?}",
                    i,
                    vertex,
                    attribute.to_f32()
                );
            } else if self.is_default[i] {
                input.attr[i] = defaults.attr[i];
                log::trace!("Loaded default attribute {} for vertex {}", i, vertex);
            }
        }
    }
}

fn decode_component(format: AttributeFormat, data: &[u8]) -> Float24 {
    let value = match format {
        AttributeFormat::Byte => data[0] as i8 as f32,
        AttributeFormat::UnsignedByte => data[0] as f32,
        AttributeFormat::Short => i16::from_le_bytes([data[0], data[1]]) as f32,
        AttributeFormat::Float => f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
    };
    Float24::from_f32(value)
}
