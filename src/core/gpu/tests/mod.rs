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

//! GPU register block tests
//!
//! - `fill`: memory fill patterns and completion signalling
//! - `transfer`: display transfers and texture copies
//! - `mmio`: access checks, command list kick-off, recording and vertical blank

mod fill;
mod mmio;
mod transfer;

use super::*;
use crate::core::interrupt::GspInterruptController;
use crate::core::memory::PhysicalMemory;
use crate::core::video::NullRasterizer;
use std::cell::RefCell;
use std::rc::Rc;

/// GPU with handles on every collaborator
struct Harness {
    gpu: Gpu,
    pica: Pica,
    memory: PhysicalMemory,
    video: VideoCore,
    rasterizer: Rc<RefCell<NullRasterizer>>,
    interrupts: Rc<RefCell<GspInterruptController>>,
}

impl Harness {
    fn new() -> Self {
        let rasterizer = Rc::new(RefCell::new(NullRasterizer::new()));
        let interrupts = Rc::new(RefCell::new(GspInterruptController::new()));
        let mut video = VideoCore::headless();
        video.set_rasterizer(Box::new(rasterizer.clone()));
        video.set_interrupt_sink(Box::new(interrupts.clone()));

        let mut gpu = Gpu::new();
        gpu.init();
        Self {
            gpu,
            pica: Pica::new(),
            memory: PhysicalMemory::with_fcram_size(0x10000),
            video,
            rasterizer,
            interrupts,
        }
    }

    /// 32-bit write to register `index`
    fn write(&mut self, index: usize, value: u32) {
        self.gpu.write::<u32>(
            Gpu::VADDR + index as u32 * 4,
            value,
            &mut self.memory,
            &mut self.pica,
            &mut self.video,
        );
    }

    fn reg(&self, index: usize) -> u32 {
        self.gpu.regs().file().word(index)
    }

    fn pending(&self, id: InterruptId) -> bool {
        self.interrupts.borrow().is_pending(id)
    }

    fn bytes(&self, addr: u32, len: usize) -> Vec<u8> {
        let mut out = vec![0; len];
        assert!(self.memory.read_block(addr, &mut out));
        out
    }
}
