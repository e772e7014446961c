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

//! Command processor tests
//!
//! - `commands`: list decoding, masking, jumps, truncation and hooks
//! - `uploads`: uniform, program, swizzle and LUT upload ports
//! - `draw`: draw calls, the vertex cache and immediate mode

mod uploads;

use super::*;
use crate::core::interrupt::GspInterruptController;
use crate::core::memory::{PhysicalMemory, FCRAM_PADDR};
use crate::core::video::NullRasterizer;
use std::cell::RefCell;
use std::rc::Rc;

/// Builds a command list with pair alignment handled
#[derive(Default)]
struct ListBuilder {
    words: Vec<u32>,
}

impl ListBuilder {
    fn new() -> Self {
        Self::default()
    }

    fn write(self, id: usize, value: u32) -> Self {
        self.write_masked(id, value, 0xF)
    }

    fn write_masked(mut self, id: usize, value: u32, mask: u32) -> Self {
        self.words.push(value);
        self.words
            .push(CommandHeader::new(id as u32, mask, 0, false).0);
        self
    }

    /// One header followed by `values.len() - 1` extra words
    fn burst(mut self, id: usize, values: &[u32], group: bool) -> Self {
        let extra = values.len() as u32 - 1;
        self.words.push(values[0]);
        self.words
            .push(CommandHeader::new(id as u32, 0xF, extra, group).0);
        self.words.extend_from_slice(&values[1..]);
        if self.words.len() % 2 != 0 {
            self.words.push(0xDEAD_BEEF);
        }
        self
    }

    fn size_bytes(&self) -> u32 {
        self.words.len() as u32 * 4
    }

    fn store(&self, memory: &mut PhysicalMemory, address: u32) {
        for (i, word) in self.words.iter().enumerate() {
            assert!(memory.write_u32(address + i as u32 * 4, *word));
        }
    }
}

/// PICA with handles on every collaborator
struct Harness {
    pica: Pica,
    memory: PhysicalMemory,
    video: VideoCore,
    rasterizer: Rc<RefCell<NullRasterizer>>,
    engine: Rc<RefCell<PassthroughShaderEngine>>,
    interrupts: Rc<RefCell<GspInterruptController>>,
}

impl Harness {
    fn new() -> Self {
        Self::with_rasterizer(NullRasterizer::new())
    }

    fn with_rasterizer(rasterizer: NullRasterizer) -> Self {
        let rasterizer = Rc::new(RefCell::new(rasterizer));
        let engine = Rc::new(RefCell::new(PassthroughShaderEngine::new()));
        let interrupts = Rc::new(RefCell::new(GspInterruptController::new()));
        let video = VideoCore::new(
            Default::default(),
            Box::new(rasterizer.clone()),
            Box::new(engine.clone()),
            Box::new(interrupts.clone()),
        );
        Self {
            pica: Pica::new(),
            memory: PhysicalMemory::with_fcram_size(0x10000),
            video,
            rasterizer,
            engine,
            interrupts,
        }
    }

    /// Store `list` at the start of FCRAM and execute it
    fn run(&mut self, list: &ListBuilder) {
        list.store(&mut self.memory, FCRAM_PADDR);
        self.pica.process_command_list(
            &self.memory,
            &mut self.video,
            FCRAM_PADDR,
            list.size_bytes(),
        );
    }

    fn write(&mut self, id: usize, value: u32) {
        self.pica
            .write_pica_reg(&self.memory, &mut self.video, id as u32, value, 0xF);
    }
}
