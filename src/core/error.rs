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

/// Emulator error types
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Invalid memory access at 0x{address:08X}")]
    InvalidMemoryAccess { address: u32 },

    #[error("Unsupported {bits}-bit register access at 0x{address:08X}")]
    UnsupportedAccessWidth { address: u32, bits: u32 },

    #[error("Invalid register index 0x{index:04X} (register file holds {count} words)")]
    InvalidRegister { index: usize, count: usize },

    #[error("Unmapped MMIO address 0x{address:08X}")]
    UnmappedAddress { address: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Trace encode error: {0}")]
    TraceEncode(#[from] bincode::error::EncodeError),

    #[error("Trace decode error: {0}")]
    TraceDecode(#[from] bincode::error::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Incompatible trace version: expected {expected}, got {got}")]
    TraceVersion { expected: u32, got: u32 },

    #[error("Memory dump of {size} bytes does not fit at 0x{address:08X}")]
    DumpTooLarge { address: u32, size: usize },

    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}

/// GPU-specific error types
///
/// These describe guest configurations that real hardware would also choke on.
/// They never abort emulation: the caller logs them and skips the operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuError {
    #[error("invalid {which} address {address:#010X}")]
    InvalidAddress { which: &'static str, address: u32 },

    #[error("invalid memory range from {start:#010X} to {end:#010X}")]
    InvalidRange { start: u32, end: u32 },

    #[error("zero {0}")]
    ZeroDimension(&'static str),

    #[error("zero {0}. Real hardware freezes on this.")]
    HardwareFreeze(&'static str),

    #[error("unimplemented display transfer scaling mode {0}")]
    UnsupportedScaling(u32),

    #[error("scaling is only implemented on tiled input")]
    LinearScaling,

    #[error("unknown pixel format {0:#x}")]
    UnknownPixelFormat(u32),

    #[error("guest region {address:#010X}+{size:#X} is not backed by memory")]
    UnmappedRegion { address: u32, size: usize },
}
