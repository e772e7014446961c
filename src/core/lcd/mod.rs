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

//! LCD registers
//!
//! Each screen has a solid color fill that overrides the framebuffer when
//! enabled, and a backlight level. None of the registers have side effects.

use crate::core::gpu::io_physical_address;
use crate::core::hw::mmio::{bits, AccessWidth, MmioRegion, RegisterFile};
use crate::core::video::VideoCore;

/// Number of LCD registers
pub const NUM_REGS: usize = 0x400;

/// Screen color fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorFill {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub enabled: bool,
}

impl ColorFill {
    pub fn from_raw(raw: u32) -> Self {
        Self {
            r: bits(raw, 0, 8) as u8,
            g: bits(raw, 8, 8) as u8,
            b: bits(raw, 16, 8) as u8,
            enabled: bits(raw, 24, 1) != 0,
        }
    }

    pub fn raw(&self) -> u32 {
        (self.r as u32)
            | ((self.g as u32) << 8)
            | ((self.b as u32) << 16)
            | ((self.enabled as u32) << 24)
    }
}

/// LCD register block
#[derive(Debug, Clone, Default)]
pub struct Lcd {
    regs: RegisterFile<NUM_REGS>,
}

impl MmioRegion for Lcd {
    const NAME: &'static str = "LCD";
    const VADDR: u32 = 0x1ED0_2000;
    const NUM_REGS: usize = NUM_REGS;

    fn registers(&self) -> &[u32] {
        self.regs.as_slice()
    }
}

impl Lcd {
    pub const COLOR_FILL_TOP: usize = 0x081;
    pub const BACKLIGHT_TOP: usize = 0x090;
    pub const COLOR_FILL_BOTTOM: usize = 0x281;
    pub const BACKLIGHT_BOTTOM: usize = 0x290;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) {
        self.regs.clear();
        log::debug!("LCD initialized OK");
    }

    pub fn shutdown(&mut self) {
        log::debug!("LCD shutdown OK");
    }

    pub fn regs(&self) -> &RegisterFile<NUM_REGS> {
        &self.regs
    }

    /// Color fill of screen 0 (top) or 1 (bottom)
    pub fn color_fill(&self, screen: usize) -> ColorFill {
        let index = if screen == 0 {
            Self::COLOR_FILL_TOP
        } else {
            Self::COLOR_FILL_BOTTOM
        };
        ColorFill::from_raw(self.regs.word(index))
    }

    pub fn backlight(&self, screen: usize) -> u32 {
        let index = if screen == 0 {
            Self::BACKLIGHT_TOP
        } else {
            Self::BACKLIGHT_BOTTOM
        };
        self.regs.word(index)
    }

    /// Write a register and forward it to the trace recorder
    pub fn write<T: AccessWidth>(&mut self, addr: u32, data: T, video: &mut VideoCore) {
        let index = match Self::register_index::<T>(addr) {
            Ok(index) => index,
            Err(e) => {
                log::error!(
                    "LCD: unknown Write{} {:#010X} @ {:#010X}: {}",
                    T::BITS,
                    data.to_u64(),
                    addr,
                    e
                );
                return;
            }
        };

        self.regs.set_word(index, data.to_word());

        if let Some(recorder) = video.debug.recorder.as_mut() {
            recorder.register_written(io_physical_address(addr), data.to_u64(), T::BITS);
        }

        log::trace!("LCD: Write{} @ {:#010X} = {:#010X}", T::BITS, addr, data.to_u64());
    }

    /// Copy raw register bytes in
    pub fn write_block(&mut self, addr: u32, src: &[u8]) -> bool {
        if !Self::contains(addr) {
            return false;
        }
        self.regs.write_bytes((addr - Self::VADDR) as usize, src)
    }
}

// Each block sits at a fixed word offset
const _: () = assert!(Lcd::COLOR_FILL_TOP == 0x81);
const _: () = assert!(Lcd::BACKLIGHT_TOP == Lcd::COLOR_FILL_TOP + 1 + 0xE);
const _: () = assert!(Lcd::COLOR_FILL_BOTTOM == Lcd::BACKLIGHT_TOP + 1 + 0x1F0);
const _: () = assert!(Lcd::BACKLIGHT_BOTTOM + 1 + 0x16F == NUM_REGS);
