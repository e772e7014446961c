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

//! Custom assertions for GPU testing

use picarx::core::gpu::Gpu;
use picarx::core::hw::mmio::MmioRegion;
use picarx::core::hw::HardwareManager;
use picarx::core::interrupt::{GspInterruptController, InterruptId};

/// Assert a GPU register (by index) holds the expected value
#[allow(dead_code)]
pub fn assert_gpu_reg(hw: &HardwareManager, index: usize, expected: u32) {
    let actual = hw.read::<u32>(Gpu::VADDR + index as u32 * 4);
    assert_eq!(
        actual, expected,
        "GPU register 0x{:03X} mismatch: expected 0x{:08X}, got 0x{:08X}",
        index, expected, actual
    );
}

/// Assert guest memory holds the expected word
#[allow(dead_code)]
pub fn assert_memory_word(hw: &HardwareManager, addr: u32, expected: u32) {
    use picarx::core::memory::GuestMemory;

    let actual = hw.memory().read_u32(addr).expect("Failed to read memory");
    assert_eq!(
        actual, expected,
        "Memory at 0x{:08X} mismatch: expected 0x{:08X}, got 0x{:08X}",
        addr, expected, actual
    );
}

/// Assert an interrupt was signalled exactly `count` times
#[allow(dead_code)]
pub fn assert_signalled(interrupts: &GspInterruptController, id: InterruptId, count: u64) {
    let actual = interrupts.signal_count(id);
    assert_eq!(
        actual, count,
        "Interrupt {} signalled {} times, expected {}",
        id, actual, count
    );
}
