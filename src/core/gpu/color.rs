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

//! Pixel codecs and tiled addressing
//!
//! Colors are decoded to `[r, g, b, a]` bytes and encoded back. Multi-byte
//! formats are little-endian in memory; the byte-order formats store their
//! channels reversed:
//!
//! ```text
//! RGBA8   [a, b, g, r]
//! RGB8    [b, g, r]
//! RGB565  rrrrrggg gggbbbbb
//! RGB5A1  rrrrrggg ggbbbbba
//! RGBA4   rrrrgggg bbbbaaaa
//! ```

use super::registers::PixelFormat;

/// Decoded color, `[r, g, b, a]`
pub type Rgba = [u8; 4];

#[inline(always)]
const fn convert_5_to_8(value: u8) -> u8 {
    (value << 3) | (value >> 2)
}

#[inline(always)]
const fn convert_6_to_8(value: u8) -> u8 {
    (value << 2) | (value >> 4)
}

#[inline(always)]
const fn convert_4_to_8(value: u8) -> u8 {
    (value << 4) | value
}

#[inline(always)]
const fn convert_1_to_8(value: u8) -> u8 {
    value * 255
}

/// Decode one pixel
///
/// `src` must hold at least `format.bytes_per_pixel()` bytes.
pub fn decode_pixel(format: PixelFormat, src: &[u8]) -> Rgba {
    match format {
        PixelFormat::RGBA8 => [src[3], src[2], src[1], src[0]],
        PixelFormat::RGB8 => [src[2], src[1], src[0], 255],
        PixelFormat::RGB565 => {
            let pixel = u16::from_le_bytes([src[0], src[1]]);
            [
                convert_5_to_8(((pixel >> 11) & 0x1F) as u8),
                convert_6_to_8(((pixel >> 5) & 0x3F) as u8),
                convert_5_to_8((pixel & 0x1F) as u8),
                255,
            ]
        }
        PixelFormat::RGB5A1 => {
            let pixel = u16::from_le_bytes([src[0], src[1]]);
            [
                convert_5_to_8(((pixel >> 11) & 0x1F) as u8),
                convert_5_to_8(((pixel >> 6) & 0x1F) as u8),
                convert_5_to_8(((pixel >> 1) & 0x1F) as u8),
                convert_1_to_8((pixel & 1) as u8),
            ]
        }
        PixelFormat::RGBA4 => {
            let pixel = u16::from_le_bytes([src[0], src[1]]);
            [
                convert_4_to_8(((pixel >> 12) & 0xF) as u8),
                convert_4_to_8(((pixel >> 8) & 0xF) as u8),
                convert_4_to_8(((pixel >> 4) & 0xF) as u8),
                convert_4_to_8((pixel & 0xF) as u8),
            ]
        }
    }
}

/// Encode one pixel
///
/// `dst` must hold at least `format.bytes_per_pixel()` bytes.
pub fn encode_pixel(format: PixelFormat, color: Rgba, dst: &mut [u8]) {
    let [r, g, b, a] = color;
    match format {
        PixelFormat::RGBA8 => dst[..4].copy_from_slice(&[a, b, g, r]),
        PixelFormat::RGB8 => dst[..3].copy_from_slice(&[b, g, r]),
        PixelFormat::RGB565 => {
            let pixel = ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3);
            dst[..2].copy_from_slice(&pixel.to_le_bytes());
        }
        PixelFormat::RGB5A1 => {
            let pixel = ((r as u16 >> 3) << 11)
                | ((g as u16 >> 3) << 6)
                | ((b as u16 >> 3) << 1)
                | (a as u16 >> 7);
            dst[..2].copy_from_slice(&pixel.to_le_bytes());
        }
        PixelFormat::RGBA4 => {
            let pixel = ((r as u16 >> 4) << 12)
                | ((g as u16 >> 4) << 8)
                | ((b as u16 >> 4) << 4)
                | (a as u16 >> 4);
            dst[..2].copy_from_slice(&pixel.to_le_bytes());
        }
    }
}

/// Average `N` colors channel by channel
pub fn average<const N: usize>(colors: [Rgba; N]) -> Rgba {
    let mut sum = [0u32; 4];
    for color in colors {
        for (acc, channel) in sum.iter_mut().zip(color) {
            *acc += channel as u32;
        }
    }
    sum.map(|channel| (channel / N as u32) as u8)
}

/// Byte offset of pixel (x, y) inside its 8x8 tile row
///
/// Tiles are stored in Z-order. The caller adds `(y & !7) * stride` to reach
/// the right tile row.
pub fn morton_offset(x: u32, y: u32, bytes_per_pixel: u32) -> u32 {
    const XLUT: [u32; 8] = [0x00, 0x01, 0x04, 0x05, 0x10, 0x11, 0x14, 0x15];
    const YLUT: [u32; 8] = [0x00, 0x02, 0x08, 0x0A, 0x20, 0x22, 0x28, 0x2A];

    let coarse_x = x & !7;
    let interleaved = XLUT[(x & 7) as usize] + YLUT[(y & 7) as usize];
    (interleaved + coarse_x * 8) * bytes_per_pixel
}
