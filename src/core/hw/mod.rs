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

//! Hardware manager
//!
//! Ties guest memory, the GPU and LCD register blocks, the PICA command
//! processor and the video collaborators together, and routes IO accesses to
//! the right register block by page.
//!
//! # IO Pages
//!
//! | Virtual Page            | Peripheral |
//! |-------------------------|------------|
//! | 0x1ED02000              | LCD        |
//! | 0x1EF00000-0x1EF0F000   | GPU        |
//!
//! Accesses to any other page are logged and dropped.

pub mod mmio;

use crate::core::config::Settings;
use crate::core::debugger::{InitialState, TraceRecorder};
use crate::core::gpu::Gpu;
use crate::core::interrupt::GspInterruptController;
use crate::core::lcd::Lcd;
use crate::core::memory::{GuestMemory, PhysicalMemory};
use crate::core::pica::{PassthroughShaderEngine, Pica};
use crate::core::video::{NullRasterizer, VideoCore};
use mmio::{AccessWidth, MmioRegion};
use std::cell::RefCell;
use std::rc::Rc;

/// Number of 4KB pages the GPU register block answers on
const GPU_PAGES: u32 = 16;

enum Route {
    Lcd,
    Gpu,
    Unmapped,
}

fn route(addr: u32) -> Route {
    let page = addr & 0xFFFF_F000;
    if page == Lcd::VADDR {
        Route::Lcd
    } else if (Gpu::VADDR..Gpu::VADDR + GPU_PAGES * 0x1000).contains(&page) {
        Route::Gpu
    } else {
        Route::Unmapped
    }
}

/// Owns every piece of the GPU subsystem
pub struct HardwareManager {
    memory: PhysicalMemory,
    gpu: Gpu,
    lcd: Lcd,
    pica: Pica,
    video: VideoCore,
}

impl HardwareManager {
    /// Assemble a manager around existing memory and collaborators
    pub fn new(memory: PhysicalMemory, video: VideoCore) -> Self {
        Self {
            memory,
            gpu: Gpu::new(),
            lcd: Lcd::new(),
            pica: Pica::new(),
            video,
        }
    }

    /// Headless manager with FCRAM sized from `settings`
    ///
    /// Returns the interrupt controller so the caller can observe it.
    pub fn headless(settings: Settings) -> (Self, Rc<RefCell<GspInterruptController>>) {
        let interrupts = Rc::new(RefCell::new(GspInterruptController::new()));
        let memory = PhysicalMemory::with_fcram_size(settings.fcram_size);
        let video = VideoCore::new(
            settings,
            Box::new(NullRasterizer::new()),
            Box::new(PassthroughShaderEngine::new()),
            Box::new(interrupts.clone()),
        );
        (Self::new(memory, video), interrupts)
    }

    pub fn init(&mut self) {
        self.gpu.init();
        self.lcd.init();
        self.pica.init();
        log::debug!("Hardware initialized OK");
    }

    pub fn shutdown(&mut self) {
        self.gpu.shutdown();
        self.lcd.shutdown();
        self.pica.shutdown();
        log::debug!("Hardware shutdown OK");
    }

    /// Read an IO register
    ///
    /// Unmapped pages read as zero.
    pub fn read<T: AccessWidth>(&self, addr: u32) -> T {
        match route(addr) {
            Route::Lcd => self.lcd.read(addr),
            Route::Gpu => self.gpu.read(addr),
            Route::Unmapped => {
                log::error!("unknown Read{} @ {:#010X}", T::BITS, addr);
                T::default()
            }
        }
    }

    /// Write an IO register
    pub fn write<T: AccessWidth>(&mut self, addr: u32, data: T) {
        match route(addr) {
            Route::Lcd => self.lcd.write(addr, data, &mut self.video),
            Route::Gpu => self.gpu.write(
                addr,
                data,
                &mut self.memory,
                &mut self.pica,
                &mut self.video,
            ),
            Route::Unmapped => log::error!(
                "unknown Write{} {:#010X} @ {:#010X}",
                T::BITS,
                data.to_u64(),
                addr
            ),
        }
    }

    /// Execute a command list directly, bypassing the GPU trigger register
    pub fn process_command_list(&mut self, address: u32, size: u32) {
        self.pica
            .process_command_list(&self.memory, &mut self.video, address, size);
    }

    /// Advance the vertical blank timer
    pub fn tick(&mut self, cycles: u64) -> u32 {
        self.gpu.tick(cycles, &mut self.video)
    }

    /// Start recording GPU traffic, snapshotting the current register state
    ///
    /// Replaces any recorder already attached.
    pub fn start_trace(&mut self) -> Rc<RefCell<TraceRecorder>> {
        let initial_state = InitialState {
            gpu_registers: self.gpu.registers().to_vec(),
            lcd_registers: self.lcd.registers().to_vec(),
            pica_registers: self.pica.regs().as_slice().to_vec(),
        };
        let recorder = Rc::new(RefCell::new(TraceRecorder::new(initial_state)));
        self.video
            .debug_context_mut()
            .set_recorder(Some(Box::new(recorder.clone())));
        log::info!("Trace recording started");
        recorder
    }

    /// Detach the recorder
    pub fn stop_trace(&mut self) {
        if self.video.debug_context_mut().set_recorder(None).is_some() {
            log::info!("Trace recording stopped");
        }
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut dyn GuestMemory {
        &mut self.memory
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    pub fn lcd(&self) -> &Lcd {
        &self.lcd
    }

    pub fn pica(&self) -> &Pica {
        &self.pica
    }

    pub fn video(&self) -> &VideoCore {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut VideoCore {
        &mut self.video
    }
}
