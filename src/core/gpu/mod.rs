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

//! External GPU registers
//!
//! The GPU register block at virtual 0x1EF00000 holds everything around the
//! PICA 3D core: two memory fill units, the LCD framebuffer configuration,
//! the display transfer engine and the command processor kick-off registers.
//!
//! Most registers are plain storage. Writes to the three trigger registers
//! start an operation synchronously:
//!
//! | Register | Operation | Interrupt |
//! |----------|-----------|-----------|
//! | 0x007 / 0x00B | memory fill unit 0 / 1 | PSC0 / PSC1 unless the start address is 0 |
//! | 0x306 | display transfer or texture copy | PPF |
//! | 0x63C | run a PICA command list | (raised by the list itself) |
//!
//! # Vertical blank
//!
//! [`Gpu::tick`] counts emulated cycles and, once per frame
//! ([`FRAME_TICKS`]), swaps the rasterizer's buffers and raises PDC0 and PDC1.

pub mod color;
mod fill;
pub mod registers;
mod transfer;

#[cfg(test)]
mod tests;

pub use fill::memory_fill;
pub use registers::{
    CommandProcessorConfig, DisplayTransferConfig, FramebufferConfig, GpuRegs, MemoryFillConfig,
    MemoryFillControl, PixelFormat, ScalingMode, TextureCopyConfig, TransferFlags,
};
pub use transfer::{display_transfer, texture_copy};

use crate::core::debugger::DebugEvent;
use crate::core::hw::mmio::{AccessWidth, MmioRegion};
use crate::core::interrupt::InterruptId;
use crate::core::memory::GuestMemory;
use crate::core::pica::Pica;
use crate::core::video::VideoCore;

/// ARM11 clock rate in Hz
pub const BASE_CLOCK_RATE: u64 = 268_111_856;

/// Cycles between two vertical blanks (60 Hz)
pub const FRAME_TICKS: u64 = BASE_CLOCK_RATE / 60;

/// Virtual base of the IO register space
pub const IO_VADDR: u32 = 0x1EC0_0000;

/// Physical base of the IO register space
pub const IO_PADDR: u32 = 0x1010_0000;

/// Physical address of an IO register given its virtual address
#[inline]
pub const fn io_physical_address(vaddr: u32) -> u32 {
    vaddr.wrapping_sub(IO_VADDR).wrapping_add(IO_PADDR)
}

/// GPU register block
#[derive(Debug, Clone, Default)]
pub struct Gpu {
    regs: GpuRegs,

    /// Cycles accumulated towards the next vertical blank
    cycles_into_frame: u64,

    /// Vertical blanks since init
    frame_count: u64,
}

impl MmioRegion for Gpu {
    const NAME: &'static str = "GPU";
    const VADDR: u32 = 0x1EF0_0000;
    const NUM_REGS: usize = registers::NUM_REGS;

    fn registers(&self) -> &[u32] {
        self.regs.file().as_slice()
    }
}

impl Gpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every register and install the default framebuffers
    ///
    /// The addresses are the ones the system applets use.
    pub fn init(&mut self) {
        self.regs.clear();
        self.cycles_into_frame = 0;
        self.frame_count = 0;

        let rgb8 = PixelFormat::RGB8 as u32;
        let top = FramebufferConfig {
            width: 240,
            height: 400,
            address_left1: 0x181E_6000,
            address_left2: 0x1822_C800,
            address_right1: 0x1827_3000,
            address_right2: 0x182B_9800,
            color_format: rgb8,
            active_fb: 0,
            stride: 3 * 240,
        };
        let bottom = FramebufferConfig {
            width: 240,
            height: 320,
            address_left1: 0x1848_F000,
            address_left2: 0x184C_7800,
            color_format: rgb8,
            active_fb: 0,
            stride: 3 * 240,
            ..FramebufferConfig::default()
        };
        self.regs.set_framebuffer(0, &top);
        self.regs.set_framebuffer(1, &bottom);

        log::debug!("GPU initialized OK");
    }

    pub fn shutdown(&mut self) {
        log::debug!("GPU shutdown OK");
    }

    pub fn regs(&self) -> &GpuRegs {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut GpuRegs {
        &mut self.regs
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Advance the vertical blank timer
    ///
    /// Returns the number of vertical blanks that occurred.
    pub fn tick(&mut self, cycles: u64, video: &mut VideoCore) -> u32 {
        self.cycles_into_frame += cycles;

        let mut vblanks = 0;
        while self.cycles_into_frame >= FRAME_TICKS {
            self.cycles_into_frame -= FRAME_TICKS;
            self.vblank(video);
            vblanks += 1;
        }
        vblanks
    }

    fn vblank(&mut self, video: &mut VideoCore) {
        self.frame_count += 1;
        video.rasterizer.swap_buffers();

        // Both screens share one vertical blank
        video.signal_interrupt(InterruptId::PDC0);
        video.signal_interrupt(InterruptId::PDC1);

        video.debug.fire(DebugEvent::BufferSwapped);
        if let Some(recorder) = video.debug.recorder.as_mut() {
            recorder.frame_finished();
        }
    }

    /// Write a register, running any operation it triggers
    ///
    /// Only 32-bit writes inside the register block are accepted; anything
    /// else is logged and dropped. Accepted writes are forwarded to the trace
    /// recorder after their side effects.
    pub fn write<T: AccessWidth>(
        &mut self,
        addr: u32,
        data: T,
        memory: &mut dyn GuestMemory,
        pica: &mut Pica,
        video: &mut VideoCore,
    ) {
        let index = match Self::register_index::<T>(addr) {
            Ok(index) => index,
            Err(e) => {
                log::error!(
                    "GPU: unknown Write{} {:#010X} @ {:#010X}: {}",
                    T::BITS,
                    data.to_u64(),
                    addr,
                    e
                );
                return;
            }
        };

        self.regs.file_mut().set_word(index, data.to_word());

        match index {
            i if i == GpuRegs::MEMORY_FILL_TRIGGER[0] => self.trigger_memory_fill(0, memory, video),
            i if i == GpuRegs::MEMORY_FILL_TRIGGER[1] => self.trigger_memory_fill(1, memory, video),
            GpuRegs::DISPLAY_TRANSFER_TRIGGER => self.trigger_display_transfer(memory, video),
            GpuRegs::COMMAND_PROCESSOR_TRIGGER => self.trigger_command_list(memory, pica, video),
            _ => {}
        }

        // Recorded last so memory read by the operation is captured first
        if let Some(recorder) = video.debug.recorder.as_mut() {
            recorder.register_written(io_physical_address(addr), data.to_u64(), T::BITS);
        }
    }

    /// Copy raw register bytes in, without side effects
    pub fn write_block(&mut self, addr: u32, src: &[u8]) -> bool {
        if !Self::contains(addr) {
            return false;
        }
        let offset = (addr - Self::VADDR) as usize;
        self.regs.file_mut().write_bytes(offset, src)
    }

    fn trigger_memory_fill(
        &mut self,
        unit: usize,
        memory: &mut dyn GuestMemory,
        video: &mut VideoCore,
    ) {
        let config = self.regs.memory_fill(unit);
        if !config.control.contains(MemoryFillControl::TRIGGER) {
            return;
        }

        match memory_fill(&config, memory, video.rasterizer.as_mut()) {
            Ok(()) => log::trace!(
                "MemoryFill from {:#010X} to {:#010X}",
                config.start_address(),
                config.end_address()
            ),
            Err(e) => log::error!("Memory fill unit {}: {}", unit, e),
        }

        // No interrupt for a zero start address
        if config.start_address() != 0 {
            let id = if unit == 0 {
                InterruptId::PSC0
            } else {
                InterruptId::PSC1
            };
            video.signal_interrupt(id);
        }

        // Happens even when the start address is zero
        let control = (config.control - MemoryFillControl::TRIGGER) | MemoryFillControl::FINISHED;
        self.regs.set_memory_fill_control(unit, control);
    }

    fn trigger_display_transfer(&mut self, memory: &mut dyn GuestMemory, video: &mut VideoCore) {
        let config = self.regs.display_transfer();
        if config.trigger & 1 == 0 {
            return;
        }

        video.debug.fire(DebugEvent::IncomingDisplayTransfer);

        if config.is_texture_copy() {
            match texture_copy(&config, memory, video.rasterizer.as_mut()) {
                Ok(()) => log::trace!(
                    "TextureCopy: {:#X} bytes from {:#010X}({}+{})-> {:#010X}({}+{}), flags {:#010X}",
                    config.texture_copy.size,
                    config.input_physical_address(),
                    config.texture_copy.input_width * 16,
                    config.texture_copy.input_gap * 16,
                    config.output_physical_address(),
                    config.texture_copy.output_width * 16,
                    config.texture_copy.output_gap * 16,
                    config.flags_raw
                ),
                Err(e) => log::error!("Texture copy: {}", e),
            }
        } else {
            match display_transfer(&config, memory, video.rasterizer.as_mut()) {
                Ok(()) => log::trace!(
                    "DisplayTransfer: {:#010X}({}x{})-> {:#010X}({}x{}), dst format {:x}, flags {:#010X}",
                    config.input_physical_address(),
                    config.input_width,
                    config.input_height,
                    config.output_physical_address(),
                    config.output_width,
                    config.output_height,
                    config.output_format_raw(),
                    config.flags_raw
                ),
                Err(e) => log::error!("Display transfer: {}", e),
            }
        }

        self.regs
            .file_mut()
            .set_word(GpuRegs::DISPLAY_TRANSFER_TRIGGER, 0);
        video.signal_interrupt(InterruptId::PPF);
    }

    fn trigger_command_list(
        &mut self,
        memory: &mut dyn GuestMemory,
        pica: &mut Pica,
        video: &mut VideoCore,
    ) {
        let config = self.regs.command_processor();
        if config.trigger & 1 == 0 {
            return;
        }

        let address = config.physical_address();
        if let Some(recorder) = video.debug.recorder.as_mut() {
            match memory.physical_slice(address, config.size as usize) {
                Some(list) => recorder.memory_accessed(list, address),
                None => log::warn!("Command list at {:#010X} is not backed by memory", address),
            }
        }

        pica.process_command_list(&*memory, video, address, config.size);

        self.regs
            .file_mut()
            .set_word(GpuRegs::COMMAND_PROCESSOR_TRIGGER, 0);
    }
}
