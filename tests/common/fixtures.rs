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

//! Test fixtures for common test scenarios

use picarx::core::config::Settings;
use picarx::core::hw::HardwareManager;
use picarx::core::interrupt::GspInterruptController;
use picarx::core::memory::{GuestMemory, PhysicalMemory};
use picarx::core::pica::{CommandHeader, PassthroughShaderEngine};
use picarx::core::video::{NullRasterizer, VideoCore};
use std::cell::RefCell;
use std::rc::Rc;

/// Hardware manager with handles on its rasterizer and interrupt sink
#[allow(dead_code)]
pub struct TestHardware {
    pub hw: HardwareManager,
    pub rasterizer: Rc<RefCell<NullRasterizer>>,
    pub interrupts: Rc<RefCell<GspInterruptController>>,
}

/// Create an initialized manager with a small FCRAM
#[allow(dead_code)]
pub fn create_test_hardware() -> TestHardware {
    let settings = Settings {
        fcram_size: 0x10000,
        ..Settings::default()
    };
    let rasterizer = Rc::new(RefCell::new(NullRasterizer::new()));
    let interrupts = Rc::new(RefCell::new(GspInterruptController::new()));
    let memory = PhysicalMemory::with_fcram_size(settings.fcram_size);
    let video = VideoCore::new(
        settings,
        Box::new(rasterizer.clone()),
        Box::new(PassthroughShaderEngine::new()),
        Box::new(interrupts.clone()),
    );

    let mut hw = HardwareManager::new(memory, video);
    hw.init();
    TestHardware {
        hw,
        rasterizer,
        interrupts,
    }
}

/// Command list assembled word by word
#[derive(Default)]
#[allow(dead_code)]
pub struct CommandList {
    words: Vec<u32>,
}

#[allow(dead_code)]
impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full-mask single register write
    pub fn write(mut self, id: usize, value: u32) -> Self {
        self.words.push(value);
        self.words.push(CommandHeader::new(id as u32, 0xF, 0, false).0);
        self
    }

    /// Consecutive registers starting at `id`
    pub fn write_group(mut self, id: usize, values: &[u32]) -> Self {
        self.words.push(values[0]);
        self.words
            .push(CommandHeader::new(id as u32, 0xF, values.len() as u32 - 1, true).0);
        self.words.extend_from_slice(&values[1..]);
        if self.words.len() % 2 != 0 {
            self.words.push(0);
        }
        self
    }

    pub fn size_bytes(&self) -> u32 {
        self.words.len() as u32 * 4
    }

    /// Store the list in guest memory
    pub fn store(&self, hw: &mut HardwareManager, address: u32) {
        for (i, word) in self.words.iter().enumerate() {
            assert!(
                hw.memory_mut().write_u32(address + i as u32 * 4, *word),
                "command list does not fit at 0x{:08X}",
                address
            );
        }
    }

    /// Raw little-endian bytes, as a dump file would hold them
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|word| word.to_le_bytes()).collect()
    }
}
