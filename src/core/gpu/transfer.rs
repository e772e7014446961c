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

//! Display transfer engine
//!
//! The engine has two modes, selected by [`TransferFlags::IS_TEXTURE_COPY`]:
//!
//! - **Display transfer** converts a framebuffer between pixel formats and
//!   between linear and 8x8 tiled layouts, optionally flipping it vertically and
//!   downscaling it by two horizontally (or in both directions).
//! - **Texture copy** is a raw byte copy whose source and destination are each
//!   described as runs of `width` bytes separated by `gap` bytes.

use super::color::{self, Rgba};
use super::registers::{DisplayTransferConfig, PixelFormat, ScalingMode, TransferFlags};
use crate::core::error::GpuError;
use crate::core::memory::GuestMemory;
use crate::core::video::Rasterizer;

fn check_addresses(
    config: &DisplayTransferConfig,
    memory: &dyn GuestMemory,
) -> Result<(), GpuError> {
    let input = config.input_physical_address();
    if !memory.is_valid_physical_address(input) {
        return Err(GpuError::InvalidAddress {
            which: "input",
            address: input,
        });
    }
    let output = config.output_physical_address();
    if !memory.is_valid_physical_address(output) {
        return Err(GpuError::InvalidAddress {
            which: "output",
            address: output,
        });
    }
    Ok(())
}

fn pixel_format(raw: u32) -> Result<PixelFormat, GpuError> {
    PixelFormat::from_raw(raw).ok_or(GpuError::UnknownPixelFormat(raw))
}

/// Byte size of an image, rejecting sizes no memory region could hold
fn image_size(address: u32, width: u32, height: u32, bpp: u32) -> Result<u32, GpuError> {
    let size = width as u64 * height as u64 * bpp as u64;
    u32::try_from(size).map_err(|_| GpuError::UnmappedRegion {
        address,
        size: size as usize,
    })
}

/// Convert a framebuffer
///
/// # Errors
///
/// Any invalid configuration is rejected before a single byte is written:
/// addresses not backed by memory, zero dimensions, scaling mode 3, scaling
/// of linear input and unknown pixel formats. [`GpuError::UnmappedRegion`]
/// is returned if the image runs off the end of its memory region; pixels
/// before that point have already been converted.
pub fn display_transfer(
    config: &DisplayTransferConfig,
    memory: &mut dyn GuestMemory,
    rasterizer: &mut dyn Rasterizer,
) -> Result<(), GpuError> {
    check_addresses(config, memory)?;

    if config.input_width == 0 {
        return Err(GpuError::ZeroDimension("input width"));
    }
    if config.input_height == 0 {
        return Err(GpuError::ZeroDimension("input height"));
    }
    if config.output_width == 0 {
        return Err(GpuError::ZeroDimension("output width"));
    }
    if config.output_height == 0 {
        return Err(GpuError::ZeroDimension("output height"));
    }

    if rasterizer.accelerate_display_transfer(config) {
        return Ok(());
    }

    let flags = config.flags();
    let scaling = config.scaling()?;
    let input_linear = flags.contains(TransferFlags::INPUT_LINEAR);
    if input_linear && scaling != ScalingMode::NoScale {
        return Err(GpuError::LinearScaling);
    }

    let input_format = pixel_format(config.input_format_raw())?;
    let output_format = pixel_format(config.output_format_raw())?;
    let src_bpp = input_format.bytes_per_pixel();
    let dst_bpp = output_format.bytes_per_pixel();

    let src_base = config.input_physical_address();
    let dst_base = config.output_physical_address();

    let horizontal_scale = (scaling != ScalingMode::NoScale) as u32;
    let vertical_scale = (scaling == ScalingMode::ScaleXY) as u32;
    let output_width = config.output_width >> horizontal_scale;
    let output_height = config.output_height >> vertical_scale;

    let input_size = image_size(src_base, config.input_width, config.input_height, src_bpp)?;
    let output_size = image_size(dst_base, output_width, output_height, dst_bpp)?;
    memory.flush_region(src_base, input_size);
    memory.invalidate_region(dst_base, output_size);

    // Source pixels averaged into one output pixel
    let samples = match scaling {
        ScalingMode::NoScale => 1,
        ScalingMode::ScaleX => 2,
        ScalingMode::ScaleXY => 4,
    };
    let flip = flags.contains(TransferFlags::FLIP_VERTICALLY);
    let dont_swizzle = flags.contains(TransferFlags::DONT_SWIZZLE);
    let input_stride = config.input_width * src_bpp;
    let output_stride = output_width * dst_bpp;

    let mut buffer = [0u8; 16];

    for y in 0..output_height {
        for x in 0..output_width {
            let input_x = x << horizontal_scale;
            let input_y = y << vertical_scale;
            let output_y = if flip { output_height - y - 1 } else { y };

            let linear_src = (input_x + input_y * config.input_width) * src_bpp;
            let linear_dst = (x + output_y * output_width) * dst_bpp;
            let tiled_src =
                color::morton_offset(input_x, input_y, src_bpp) + (input_y & !7) * input_stride;
            let tiled_dst =
                color::morton_offset(x, output_y, dst_bpp) + (output_y & !7) * output_stride;

            let (src_offset, dst_offset) = match (input_linear, dont_swizzle) {
                (true, false) => (linear_src, tiled_dst),
                (true, true) => (linear_src, linear_dst),
                (false, false) => (tiled_src, linear_dst),
                (false, true) => (tiled_src, tiled_dst),
            };

            // Downscaled pixels are adjacent in tiled order
            let src_addr = src_base.wrapping_add(src_offset);
            let src = &mut buffer[..(samples * src_bpp) as usize];
            if !memory.read_block(src_addr, src) {
                return Err(GpuError::UnmappedRegion {
                    address: src_addr,
                    size: src.len(),
                });
            }

            let bpp = src_bpp as usize;
            let decode = |i: usize| color::decode_pixel(input_format, &src[i * bpp..]);
            let color: Rgba = match scaling {
                ScalingMode::NoScale => decode(0),
                ScalingMode::ScaleX => color::average([decode(0), decode(1)]),
                ScalingMode::ScaleXY => {
                    color::average([decode(0), decode(1), decode(2), decode(3)])
                }
            };

            let dst_addr = dst_base.wrapping_add(dst_offset);
            let dst = memory
                .physical_slice_mut(dst_addr, dst_bpp as usize)
                .ok_or(GpuError::UnmappedRegion {
                    address: dst_addr,
                    size: dst_bpp as usize,
                })?;
            color::encode_pixel(output_format, color, dst);
        }
    }
    Ok(())
}

/// Copy bytes between two gapped layouts
///
/// A gap of zero makes that side contiguous regardless of its width.
///
/// # Errors
///
/// Besides invalid addresses, a zero size or a zero width on a gapped side is
/// rejected: the hardware never finishes such a copy.
pub fn texture_copy(
    config: &DisplayTransferConfig,
    memory: &mut dyn GuestMemory,
    rasterizer: &mut dyn Rasterizer,
) -> Result<(), GpuError> {
    check_addresses(config, memory)?;

    if rasterizer.accelerate_texture_copy(config) {
        return Ok(());
    }

    let params = &config.texture_copy;

    // The size is counted in 16-byte units
    let mut remaining = params.size & !15;
    if remaining == 0 {
        return Err(GpuError::HardwareFreeze("size"));
    }

    let input_gap = params.input_gap * 16;
    let output_gap = params.output_gap * 16;
    let input_width = if input_gap == 0 {
        remaining
    } else {
        params.input_width * 16
    };
    let output_width = if output_gap == 0 {
        remaining
    } else {
        params.output_width * 16
    };

    if input_width == 0 {
        return Err(GpuError::HardwareFreeze("input width"));
    }
    if output_width == 0 {
        return Err(GpuError::HardwareFreeze("output width"));
    }

    let mut src = config.input_physical_address();
    let mut dst = config.output_physical_address();

    let contiguous = |width: u32, gap: u32| -> u32 {
        let bytes = params.size as u64 / width as u64 * (width as u64 + gap as u64);
        u32::try_from(bytes).unwrap_or(u32::MAX)
    };
    memory.flush_region(src, contiguous(input_width, input_gap));
    let output_size = contiguous(output_width, output_gap);
    if output_gap != 0 {
        // Bytes inside the gaps must survive
        memory.flush_and_invalidate_region(dst, output_size);
    } else {
        memory.invalidate_region(dst, output_size);
    }

    let mut remaining_input = input_width;
    let mut remaining_output = output_width;

    while remaining > 0 {
        let copy_size = remaining_input.min(remaining_output).min(remaining);
        if !memory.copy_block(dst, src, copy_size as usize) {
            let address = if memory.physical_slice(src, copy_size as usize).is_none() {
                src
            } else {
                dst
            };
            return Err(GpuError::UnmappedRegion {
                address,
                size: copy_size as usize,
            });
        }

        src = src.wrapping_add(copy_size);
        dst = dst.wrapping_add(copy_size);
        remaining_input -= copy_size;
        remaining_output -= copy_size;
        remaining -= copy_size;

        if remaining_input == 0 {
            remaining_input = input_width;
            src = src.wrapping_add(input_gap);
        }
        if remaining_output == 0 {
            remaining_output = output_width;
            dst = dst.wrapping_add(output_gap);
        }
    }
    Ok(())
}
