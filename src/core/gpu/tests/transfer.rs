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

use super::*;
use crate::core::error::GpuError;
use crate::core::memory::VRAM_PADDR;

const DT: usize = GpuRegs::DISPLAY_TRANSFER;
const SRC: u32 = VRAM_PADDR;
const DST: u32 = VRAM_PADDR + 0x1000;

fn flags(input: PixelFormat, output: PixelFormat, scaling: u32, extra: TransferFlags) -> u32 {
    extra.bits() | ((input as u32) << 8) | ((output as u32) << 12) | (scaling << 24)
}

/// Program a display transfer and trigger it
fn run_transfer(h: &mut Harness, input: (u32, u32), output: (u32, u32), flags: u32) {
    h.write(DT + DisplayTransferConfig::INPUT_ADDRESS, SRC / 8);
    h.write(DT + DisplayTransferConfig::OUTPUT_ADDRESS, DST / 8);
    h.write(DT + DisplayTransferConfig::INPUT_SIZE, (input.1 << 16) | input.0);
    h.write(DT + DisplayTransferConfig::OUTPUT_SIZE, (output.1 << 16) | output.0);
    h.write(DT + DisplayTransferConfig::FLAGS, flags);
    h.write(GpuRegs::DISPLAY_TRANSFER_TRIGGER, 1);
}

/// RGBA8 pixel as stored in memory
fn rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    [a, b, g, r]
}

fn store_pixels(h: &mut Harness, pixels: &[[u8; 4]]) {
    let bytes: Vec<u8> = pixels.iter().flatten().copied().collect();
    assert!(h.memory.write_block(SRC, &bytes));
}

#[test]
fn test_linear_rgba8_to_rgb8() {
    let mut h = Harness::new();
    store_pixels(
        &mut h,
        &[
            rgba8(0x10, 0x11, 0x12, 0xFF),
            rgba8(0x20, 0x21, 0x22, 0xFF),
            rgba8(0x30, 0x31, 0x32, 0xFF),
            rgba8(0x40, 0x41, 0x42, 0xFF),
        ],
    );

    let linear = TransferFlags::INPUT_LINEAR | TransferFlags::DONT_SWIZZLE;
    run_transfer(&mut h, (2, 2), (2, 2), flags(PixelFormat::RGBA8, PixelFormat::RGB8, 0, linear));

    assert_eq!(
        h.bytes(DST, 12),
        [0x12, 0x11, 0x10, 0x22, 0x21, 0x20, 0x32, 0x31, 0x30, 0x42, 0x41, 0x40]
    );
    assert!(h.pending(InterruptId::PPF));
    assert_eq!(h.reg(GpuRegs::DISPLAY_TRANSFER_TRIGGER), 0);
}

#[test]
fn test_vertical_flip() {
    let mut h = Harness::new();
    store_pixels(
        &mut h,
        &[
            rgba8(1, 0, 0, 0),
            rgba8(2, 0, 0, 0),
            rgba8(3, 0, 0, 0),
            rgba8(4, 0, 0, 0),
        ],
    );

    let extra =
        TransferFlags::INPUT_LINEAR | TransferFlags::DONT_SWIZZLE | TransferFlags::FLIP_VERTICALLY;
    run_transfer(&mut h, (2, 2), (2, 2), flags(PixelFormat::RGBA8, PixelFormat::RGBA8, 0, extra));

    let rows = h.bytes(DST, 16);
    assert_eq!(rows[3], 3);
    assert_eq!(rows[7], 4);
    assert_eq!(rows[11], 1);
    assert_eq!(rows[15], 2);
}

#[test]
fn test_linear_to_tiled() {
    let mut h = Harness::new();
    store_pixels(
        &mut h,
        &[
            rgba8(1, 0, 0, 0),
            rgba8(2, 0, 0, 0),
            rgba8(3, 0, 0, 0),
            rgba8(4, 0, 0, 0),
        ],
    );

    run_transfer(
        &mut h,
        (2, 2),
        (2, 2),
        flags(PixelFormat::RGBA8, PixelFormat::RGBA8, 0, TransferFlags::INPUT_LINEAR),
    );

    // Z-order inside the tile: (0,0) (1,0) (0,1) (1,1)
    let tiled = h.bytes(DST, 16);
    assert_eq!([tiled[3], tiled[7], tiled[11], tiled[15]], [1, 2, 3, 4]);
}

#[test]
fn test_tiled_downscale_averages_block() {
    let mut h = Harness::new();
    // One 2x2 block in tiled order
    store_pixels(
        &mut h,
        &[
            rgba8(10, 0, 100, 255),
            rgba8(20, 0, 100, 255),
            rgba8(30, 0, 100, 255),
            rgba8(40, 0, 100, 255),
        ],
    );

    run_transfer(
        &mut h,
        (2, 2),
        (2, 2),
        flags(PixelFormat::RGBA8, PixelFormat::RGBA8, 2, TransferFlags::empty()),
    );

    assert_eq!(h.bytes(DST, 4), rgba8(25, 0, 100, 255));
    // Output shrank to one pixel
    assert_eq!(h.bytes(DST + 4, 4), [0; 4]);
}

#[test]
fn test_rejected_transfers_still_complete() {
    let mut h = Harness::new();
    store_pixels(&mut h, &[rgba8(0xFF, 0xFF, 0xFF, 0xFF)]);

    // Scaling linear input is not supported
    run_transfer(
        &mut h,
        (2, 2),
        (2, 2),
        flags(PixelFormat::RGBA8, PixelFormat::RGBA8, 1, TransferFlags::INPUT_LINEAR),
    );

    assert_eq!(h.bytes(DST, 4), [0; 4]);
    assert!(h.pending(InterruptId::PPF));
    assert_eq!(h.reg(GpuRegs::DISPLAY_TRANSFER_TRIGGER), 0);
}

#[test]
fn test_transfer_validation() {
    let mut memory = PhysicalMemory::with_fcram_size(0x1000);
    let mut rasterizer = NullRasterizer::new();
    let config = |flags_raw: u32, size: u32| DisplayTransferConfig {
        input_address: SRC / 8,
        output_address: DST / 8,
        output_width: size,
        output_height: size,
        input_width: size,
        input_height: 2,
        flags_raw,
        trigger: 1,
        texture_copy: TextureCopyConfig::default(),
    };

    let check = |flags_raw: u32,
                 size: u32,
                 memory: &mut PhysicalMemory,
                 rasterizer: &mut NullRasterizer| {
        display_transfer(&config(flags_raw, size), memory, rasterizer)
    };

    assert_eq!(
        check(0, 0, &mut memory, &mut rasterizer),
        Err(GpuError::ZeroDimension("input width"))
    );
    assert_eq!(
        check(3 << 24, 2, &mut memory, &mut rasterizer),
        Err(GpuError::UnsupportedScaling(3))
    );
    assert_eq!(
        check(7 << 12, 2, &mut memory, &mut rasterizer),
        Err(GpuError::UnknownPixelFormat(7))
    );

    let mut bad_address = config(0, 2);
    bad_address.output_address = 0;
    assert_eq!(
        display_transfer(&bad_address, &mut memory, &mut rasterizer),
        Err(GpuError::InvalidAddress {
            which: "output",
            address: 0
        })
    );
}

/// Program a texture copy and trigger it
fn run_copy(h: &mut Harness, size: u32, input: (u32, u32), output: (u32, u32)) {
    h.write(DT + DisplayTransferConfig::INPUT_ADDRESS, SRC / 8);
    h.write(DT + DisplayTransferConfig::OUTPUT_ADDRESS, DST / 8);
    h.write(DT + DisplayTransferConfig::TEXTURE_COPY_SIZE, size);
    h.write(DT + DisplayTransferConfig::TEXTURE_COPY_INPUT, (input.1 << 16) | input.0);
    h.write(DT + DisplayTransferConfig::TEXTURE_COPY_OUTPUT, (output.1 << 16) | output.0);
    h.write(DT + DisplayTransferConfig::FLAGS, TransferFlags::IS_TEXTURE_COPY.bits());
    h.write(GpuRegs::DISPLAY_TRANSFER_TRIGGER, 1);
}

#[test]
fn test_texture_copy_into_gapped_output() {
    let mut h = Harness::new();
    let source: Vec<u8> = (0..64).collect();
    assert!(h.memory.write_block(SRC, &source));
    assert!(h.memory.write_block(DST, &[0xEE; 128]));

    // Contiguous input, 16-byte runs with 16-byte gaps on output
    run_copy(&mut h, 64, (0, 0), (1, 1));

    let out = h.bytes(DST, 128);
    for run in 0..4 {
        let at = run * 32;
        assert_eq!(&out[at..at + 16], &source[run * 16..run * 16 + 16]);
        assert_eq!(&out[at + 16..at + 32], &[0xEE; 16]);
    }
    assert!(h.pending(InterruptId::PPF));
}

#[test]
fn test_texture_copy_gathers_gapped_input() {
    let mut h = Harness::new();
    let source: Vec<u8> = (0..64).collect();
    assert!(h.memory.write_block(SRC, &source));

    // Take 16 bytes, skip 16
    run_copy(&mut h, 32, (1, 1), (0, 0));

    let out = h.bytes(DST, 48);
    assert_eq!(&out[..16], &source[..16]);
    assert_eq!(&out[16..32], &source[32..48]);
    assert_eq!(&out[32..], &[0; 16]);
}

#[test]
fn test_texture_copy_size_is_aligned_down() {
    let mut h = Harness::new();
    assert!(h.memory.write_block(SRC, &[0xAB; 32]));

    run_copy(&mut h, 31, (0, 0), (0, 0));

    let out = h.bytes(DST, 32);
    assert_eq!(&out[..16], &[0xAB; 16]);
    assert_eq!(&out[16..], &[0; 16]);
}

#[test]
fn test_zero_size_texture_copy_writes_nothing() {
    let mut h = Harness::new();
    assert!(h.memory.write_block(SRC, &[0xAB; 16]));

    run_copy(&mut h, 15, (1, 0), (1, 0));

    assert_eq!(h.bytes(DST, 16), [0; 16]);
    // The trigger still completes
    assert!(h.pending(InterruptId::PPF));
    assert_eq!(h.reg(GpuRegs::DISPLAY_TRANSFER_TRIGGER), 0);
}

#[test]
fn test_zero_width_with_gap_freezes() {
    let mut memory = PhysicalMemory::with_fcram_size(0x1000);
    let mut rasterizer = NullRasterizer::new();
    let config = DisplayTransferConfig {
        input_address: SRC / 8,
        output_address: DST / 8,
        output_width: 0,
        output_height: 0,
        input_width: 0,
        input_height: 0,
        flags_raw: TransferFlags::IS_TEXTURE_COPY.bits(),
        trigger: 1,
        texture_copy: TextureCopyConfig {
            size: 64,
            input_width: 0,
            input_gap: 1,
            output_width: 4,
            output_gap: 0,
        },
    };

    assert_eq!(
        texture_copy(&config, &mut memory, &mut rasterizer),
        Err(GpuError::HardwareFreeze("input width"))
    );
}
