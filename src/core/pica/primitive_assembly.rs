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

//! Triangle assembly from a vertex stream

use super::regs::TriangleTopology;

/// Turns submitted vertices into triangles according to the topology
#[derive(Debug, Clone)]
pub struct PrimitiveAssembler<V> {
    topology: TriangleTopology,
    buffer: [V; 2],
    buffer_index: usize,
    strip_ready: bool,
    winding: bool,
}

impl<V: Copy + Default> Default for PrimitiveAssembler<V> {
    fn default() -> Self {
        Self::new(TriangleTopology::List)
    }
}

impl<V: Copy + Default> PrimitiveAssembler<V> {
    pub fn new(topology: TriangleTopology) -> Self {
        Self {
            topology,
            buffer: [V::default(); 2],
            buffer_index: 0,
            strip_ready: false,
            winding: false,
        }
    }

    /// Feed one vertex, calling `on_triangle` for every completed triangle
    pub fn submit_vertex<F>(&mut self, vertex: V, mut on_triangle: F)
    where
        F: FnMut(&V, &V, &V),
    {
        match self.topology {
            TriangleTopology::List | TriangleTopology::Shader => {
                if self.buffer_index < 2 {
                    self.buffer[self.buffer_index] = vertex;
                    self.buffer_index += 1;
                } else {
                    self.buffer_index = 0;
                    if self.topology == TriangleTopology::Shader && self.winding {
                        on_triangle(&self.buffer[1], &self.buffer[0], &vertex);
                        self.winding = false;
                    } else {
                        on_triangle(&self.buffer[0], &self.buffer[1], &vertex);
                    }
                }
            }
            TriangleTopology::Strip | TriangleTopology::Fan => {
                if self.strip_ready {
                    on_triangle(&self.buffer[0], &self.buffer[1], &vertex);
                }
                self.buffer[self.buffer_index] = vertex;
                self.strip_ready |= self.buffer_index == 1;

                self.buffer_index = match self.topology {
                    TriangleTopology::Strip => 1 - self.buffer_index,
                    _ => 1,
                };
            }
        }
    }

    /// Swap the first two vertices of the next shader-emitted triangle
    pub fn set_winding(&mut self) {
        self.winding = true;
    }

    /// Drop buffered vertices
    pub fn reset(&mut self) {
        self.buffer_index = 0;
        self.strip_ready = false;
        self.winding = false;
    }

    /// Reset and switch topology
    pub fn reconfigure(&mut self, topology: TriangleTopology) {
        self.reset();
        self.topology = topology;
    }

    /// No vertices are buffered
    pub fn is_empty(&self) -> bool {
        self.buffer_index == 0 && !self.strip_ready
    }

    pub fn topology(&self) -> TriangleTopology {
        self.topology
    }
}
