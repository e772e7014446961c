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

//! GPU register layout and configuration views
//!
//! The external GPU register block is 0x1000 words. Configuration blocks live at
//! fixed word offsets separated by unused padding; tracing tools address them
//! absolutely, so the layout below is checked at compile time.
//!
//! ```text
//! 0x000  padding                  (0x004 words)
//! 0x004  memory fill 0            (0x004 words)
//! 0x008  memory fill 1            (0x004 words)
//! 0x00C  padding                  (0x10B words)
//! 0x117  framebuffer top          (0x040 words)
//! 0x157  framebuffer bottom       (0x040 words)
//! 0x197  padding                  (0x169 words)
//! 0x300  display transfer         (0x00B words)
//! 0x30B  padding                  (0x32D words)
//! 0x638  command processor        (0x005 words)
//! 0x63D  padding                  (0x9C3 words)
//! ```

use crate::core::error::GpuError;
use crate::core::hw::mmio::{bits, RegisterFile};
use bitflags::bitflags;

/// Number of GPU registers
pub const NUM_REGS: usize = 0x1000;

/// Address registers hold physical addresses divided by 8
#[inline(always)]
pub const fn decode_address_register(value: u32) -> u32 {
    value.wrapping_mul(8)
}

/// Framebuffer / transfer pixel formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    RGBA8 = 0,
    RGB8 = 1,
    RGB565 = 2,
    RGB5A1 = 3,
    RGBA4 = 4,
}

impl PixelFormat {
    /// Decode a 3-bit format field
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(PixelFormat::RGBA8),
            1 => Some(PixelFormat::RGB8),
            2 => Some(PixelFormat::RGB565),
            3 => Some(PixelFormat::RGB5A1),
            4 => Some(PixelFormat::RGBA4),
            _ => None,
        }
    }

    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::RGBA8 => 4,
            PixelFormat::RGB8 => 3,
            PixelFormat::RGB565 | PixelFormat::RGB5A1 | PixelFormat::RGBA4 => 2,
        }
    }
}

/// Display transfer downscaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingMode {
    NoScale,
    /// Average horizontal pairs
    ScaleX,
    /// Average 2x2 blocks
    ScaleXY,
}

bitflags! {
    /// Memory fill control word
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemoryFillControl: u32 {
        /// Written by the guest to start the fill, cleared on completion
        const TRIGGER = 1 << 0;
        /// Set once the fill unit is done
        const FINISHED = 1 << 1;
        const FILL_24BIT = 1 << 8;
        const FILL_32BIT = 1 << 9;
        const _ = !0;
    }
}

bitflags! {
    /// Display transfer flag bits (format and scaling fields excluded)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TransferFlags: u32 {
        const FLIP_VERTICALLY = 1 << 0;
        /// Input is linear (output tiled unless `DONT_SWIZZLE`)
        const INPUT_LINEAR = 1 << 1;
        const CROP_INPUT_LINES = 1 << 2;
        const IS_TEXTURE_COPY = 1 << 3;
        const DONT_SWIZZLE = 1 << 5;
        const BLOCK_32 = 1 << 16;
        const _ = !0;
    }
}

/// Memory fill unit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryFillConfig {
    pub address_start: u32,
    pub address_end: u32,
    pub value: u32,
    pub control: MemoryFillControl,
}

impl MemoryFillConfig {
    pub const ADDRESS_START: usize = 0;
    pub const ADDRESS_END: usize = 1;
    pub const VALUE: usize = 2;
    pub const CONTROL: usize = 3;
    pub const SIZE: usize = 4;

    fn read(regs: &RegisterFile<NUM_REGS>, base: usize) -> Self {
        Self {
            address_start: regs.word(base + Self::ADDRESS_START),
            address_end: regs.word(base + Self::ADDRESS_END),
            value: regs.word(base + Self::VALUE),
            control: MemoryFillControl::from_bits_retain(regs.word(base + Self::CONTROL)),
        }
    }

    pub fn start_address(&self) -> u32 {
        decode_address_register(self.address_start)
    }

    pub fn end_address(&self) -> u32 {
        decode_address_register(self.address_end)
    }

    pub fn value_16bit(&self) -> u16 {
        self.value as u16
    }

    /// Red, green and blue bytes of a 24-bit fill, in memory order
    pub fn value_24bit(&self) -> [u8; 3] {
        let [r, g, b, _] = self.value.to_le_bytes();
        [r, g, b]
    }

    pub fn value_32bit(&self) -> u32 {
        self.value
    }
}

/// Framebuffer configuration of one screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FramebufferConfig {
    pub width: u32,
    pub height: u32,
    pub address_left1: u32,
    pub address_left2: u32,
    pub color_format: u32,
    pub active_fb: u32,
    /// Distance between two pixel rows, in bytes
    pub stride: u32,
    pub address_right1: u32,
    pub address_right2: u32,
}

impl FramebufferConfig {
    pub const SIZE_REG: usize = 0x0;
    pub const ADDRESS_LEFT1: usize = 0x3;
    pub const ADDRESS_LEFT2: usize = 0x4;
    pub const FORMAT: usize = 0x5;
    pub const ACTIVE_FB: usize = 0x7;
    pub const STRIDE: usize = 0xD;
    pub const ADDRESS_RIGHT1: usize = 0xE;
    pub const ADDRESS_RIGHT2: usize = 0xF;
    pub const SIZE: usize = 0x40;

    fn read(regs: &RegisterFile<NUM_REGS>, base: usize) -> Self {
        let size = regs.word(base + Self::SIZE_REG);
        Self {
            width: bits(size, 0, 16),
            height: bits(size, 16, 16),
            address_left1: regs.word(base + Self::ADDRESS_LEFT1),
            address_left2: regs.word(base + Self::ADDRESS_LEFT2),
            color_format: regs.field(base + Self::FORMAT, 0, 3),
            active_fb: regs.word(base + Self::ACTIVE_FB),
            stride: regs.word(base + Self::STRIDE),
            address_right1: regs.word(base + Self::ADDRESS_RIGHT1),
            address_right2: regs.word(base + Self::ADDRESS_RIGHT2),
        }
    }

    fn write(&self, regs: &mut RegisterFile<NUM_REGS>, base: usize) {
        regs.set_word(base + Self::SIZE_REG, (self.height << 16) | (self.width & 0xFFFF));
        regs.set_word(base + Self::ADDRESS_LEFT1, self.address_left1);
        regs.set_word(base + Self::ADDRESS_LEFT2, self.address_left2);
        regs.set_field(base + Self::FORMAT, 0, 3, self.color_format);
        regs.set_word(base + Self::ACTIVE_FB, self.active_fb);
        regs.set_word(base + Self::STRIDE, self.stride);
        regs.set_word(base + Self::ADDRESS_RIGHT1, self.address_right1);
        regs.set_word(base + Self::ADDRESS_RIGHT2, self.address_right2);
    }

    /// Second framebuffer is being displayed
    pub fn second_fb_active(&self) -> bool {
        self.active_fb & 1 != 0
    }

    pub fn pixel_format(&self) -> Option<PixelFormat> {
        PixelFormat::from_raw(self.color_format)
    }
}

/// Texture copy parameters stored after the display transfer block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureCopyConfig {
    /// Total bytes to copy; the low 4 bits are ignored
    pub size: u32,
    /// Input run length in 16-byte units
    pub input_width: u32,
    /// Bytes skipped after each input run, in 16-byte units
    pub input_gap: u32,
    pub output_width: u32,
    pub output_gap: u32,
}

/// Display transfer unit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTransferConfig {
    pub input_address: u32,
    pub output_address: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub input_width: u32,
    pub input_height: u32,
    /// Raw flags word
    pub flags_raw: u32,
    pub trigger: u32,
    pub texture_copy: TextureCopyConfig,
}

impl DisplayTransferConfig {
    pub const INPUT_ADDRESS: usize = 0x0;
    pub const OUTPUT_ADDRESS: usize = 0x1;
    pub const OUTPUT_SIZE: usize = 0x2;
    pub const INPUT_SIZE: usize = 0x3;
    pub const FLAGS: usize = 0x4;
    pub const TRIGGER: usize = 0x6;
    pub const TEXTURE_COPY_SIZE: usize = 0x8;
    pub const TEXTURE_COPY_INPUT: usize = 0x9;
    pub const TEXTURE_COPY_OUTPUT: usize = 0xA;
    pub const SIZE: usize = 0xB;

    fn read(regs: &RegisterFile<NUM_REGS>, base: usize) -> Self {
        let output_size = regs.word(base + Self::OUTPUT_SIZE);
        let input_size = regs.word(base + Self::INPUT_SIZE);
        let copy_input = regs.word(base + Self::TEXTURE_COPY_INPUT);
        let copy_output = regs.word(base + Self::TEXTURE_COPY_OUTPUT);
        Self {
            input_address: regs.word(base + Self::INPUT_ADDRESS),
            output_address: regs.word(base + Self::OUTPUT_ADDRESS),
            output_width: bits(output_size, 0, 16),
            output_height: bits(output_size, 16, 16),
            input_width: bits(input_size, 0, 16),
            input_height: bits(input_size, 16, 16),
            flags_raw: regs.word(base + Self::FLAGS),
            trigger: regs.word(base + Self::TRIGGER),
            texture_copy: TextureCopyConfig {
                size: regs.word(base + Self::TEXTURE_COPY_SIZE),
                input_width: bits(copy_input, 0, 16),
                input_gap: bits(copy_input, 16, 16),
                output_width: bits(copy_output, 0, 16),
                output_gap: bits(copy_output, 16, 16),
            },
        }
    }

    pub fn input_physical_address(&self) -> u32 {
        decode_address_register(self.input_address)
    }

    pub fn output_physical_address(&self) -> u32 {
        decode_address_register(self.output_address)
    }

    pub fn flags(&self) -> TransferFlags {
        TransferFlags::from_bits_retain(self.flags_raw)
    }

    pub fn is_texture_copy(&self) -> bool {
        self.flags().contains(TransferFlags::IS_TEXTURE_COPY)
    }

    pub fn input_format_raw(&self) -> u32 {
        bits(self.flags_raw, 8, 3)
    }

    pub fn output_format_raw(&self) -> u32 {
        bits(self.flags_raw, 12, 3)
    }

    pub fn scaling_raw(&self) -> u32 {
        bits(self.flags_raw, 24, 2)
    }

    /// Decoded scaling mode
    ///
    /// # Errors
    ///
    /// Mode 3 is not implemented.
    pub fn scaling(&self) -> Result<ScalingMode, GpuError> {
        match self.scaling_raw() {
            0 => Ok(ScalingMode::NoScale),
            1 => Ok(ScalingMode::ScaleX),
            2 => Ok(ScalingMode::ScaleXY),
            other => Err(GpuError::UnsupportedScaling(other)),
        }
    }
}

/// Command list processing unit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandProcessorConfig {
    /// Command list size in bytes
    pub size: u32,
    pub address: u32,
    pub trigger: u32,
}

impl CommandProcessorConfig {
    pub const SIZE_REG: usize = 0x0;
    pub const ADDRESS: usize = 0x2;
    pub const TRIGGER: usize = 0x4;
    pub const SIZE: usize = 0x5;

    fn read(regs: &RegisterFile<NUM_REGS>, base: usize) -> Self {
        Self {
            size: regs.word(base + Self::SIZE_REG),
            address: regs.word(base + Self::ADDRESS),
            trigger: regs.word(base + Self::TRIGGER),
        }
    }

    pub fn physical_address(&self) -> u32 {
        decode_address_register(self.address)
    }
}

/// GPU register block with typed views
#[derive(Debug, Clone, Default)]
pub struct GpuRegs {
    file: RegisterFile<NUM_REGS>,
}

impl GpuRegs {
    pub const MEMORY_FILL: [usize; 2] = [0x004, 0x008];
    pub const FRAMEBUFFER: [usize; 2] = [0x117, 0x157];
    pub const DISPLAY_TRANSFER: usize = 0x300;
    pub const COMMAND_PROCESSOR: usize = 0x638;

    /// Register whose write starts memory fill unit `n`
    pub const MEMORY_FILL_TRIGGER: [usize; 2] = [
        Self::MEMORY_FILL[0] + MemoryFillConfig::CONTROL,
        Self::MEMORY_FILL[1] + MemoryFillConfig::CONTROL,
    ];
    pub const DISPLAY_TRANSFER_TRIGGER: usize =
        Self::DISPLAY_TRANSFER + DisplayTransferConfig::TRIGGER;
    pub const COMMAND_PROCESSOR_TRIGGER: usize =
        Self::COMMAND_PROCESSOR + CommandProcessorConfig::TRIGGER;

    pub fn new() -> Self {
        Self {
            file: RegisterFile::new(),
        }
    }

    pub fn clear(&mut self) {
        self.file.clear();
    }

    pub fn file(&self) -> &RegisterFile<NUM_REGS> {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut RegisterFile<NUM_REGS> {
        &mut self.file
    }

    pub fn memory_fill(&self, unit: usize) -> MemoryFillConfig {
        MemoryFillConfig::read(&self.file, Self::MEMORY_FILL[unit])
    }

    /// Replace the control word of fill unit `n`
    pub fn set_memory_fill_control(&mut self, unit: usize, control: MemoryFillControl) {
        self.file.set_word(
            Self::MEMORY_FILL[unit] + MemoryFillConfig::CONTROL,
            control.bits(),
        );
    }

    pub fn framebuffer(&self, screen: usize) -> FramebufferConfig {
        FramebufferConfig::read(&self.file, Self::FRAMEBUFFER[screen])
    }

    pub fn set_framebuffer(&mut self, screen: usize, config: &FramebufferConfig) {
        config.write(&mut self.file, Self::FRAMEBUFFER[screen]);
    }

    pub fn display_transfer(&self) -> DisplayTransferConfig {
        DisplayTransferConfig::read(&self.file, Self::DISPLAY_TRANSFER)
    }

    pub fn command_processor(&self) -> CommandProcessorConfig {
        CommandProcessorConfig::read(&self.file, Self::COMMAND_PROCESSOR)
    }
}

// Layout: padding between the configuration blocks must add up exactly
const _: () = assert!(GpuRegs::MEMORY_FILL[0] == 0x4);
const _: () = assert!(GpuRegs::MEMORY_FILL[1] == GpuRegs::MEMORY_FILL[0] + MemoryFillConfig::SIZE);
const _: () =
    assert!(GpuRegs::MEMORY_FILL[1] + MemoryFillConfig::SIZE + 0x10B == GpuRegs::FRAMEBUFFER[0]);
const _: () =
    assert!(GpuRegs::FRAMEBUFFER[1] == GpuRegs::FRAMEBUFFER[0] + FramebufferConfig::SIZE);
const _: () = assert!(
    GpuRegs::FRAMEBUFFER[1] + FramebufferConfig::SIZE + 0x169 == GpuRegs::DISPLAY_TRANSFER
);
const _: () = assert!(
    GpuRegs::DISPLAY_TRANSFER + DisplayTransferConfig::SIZE + 0x32D == GpuRegs::COMMAND_PROCESSOR
);
const _: () =
    assert!(GpuRegs::COMMAND_PROCESSOR + CommandProcessorConfig::SIZE + 0x9C3 == NUM_REGS);
const _: () = assert!(GpuRegs::COMMAND_PROCESSOR_TRIGGER == 0x63C);
const _: () = assert!(GpuRegs::DISPLAY_TRANSFER_TRIGGER == 0x306);
