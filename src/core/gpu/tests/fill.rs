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
use crate::core::memory::{GuestMemory, PhysicalMemory, VRAM_PADDR};
use crate::core::video::NullRasterizer;

const FILL0: usize = GpuRegs::MEMORY_FILL[0];
const FILL1: usize = GpuRegs::MEMORY_FILL[1];

/// Program fill unit registers, control last
fn start_fill(
    h: &mut Harness,
    base: usize,
    start: u32,
    end: u32,
    value: u32,
    control: MemoryFillControl,
) {
    h.write(base + MemoryFillConfig::ADDRESS_START, start / 8);
    h.write(base + MemoryFillConfig::ADDRESS_END, end / 8);
    h.write(base + MemoryFillConfig::VALUE, value);
    h.write(
        base + MemoryFillConfig::CONTROL,
        (control | MemoryFillControl::TRIGGER).bits(),
    );
}

#[test]
fn test_fill_16bit() {
    let mut h = Harness::new();
    start_fill(&mut h, FILL0, VRAM_PADDR, VRAM_PADDR + 8, 0xAAAA_1234, MemoryFillControl::empty());

    assert_eq!(h.bytes(VRAM_PADDR, 10), [0x34, 0x12, 0x34, 0x12, 0x34, 0x12, 0x34, 0x12, 0, 0]);
    assert!(h.pending(InterruptId::PSC0));
    assert!(!h.pending(InterruptId::PSC1));
}

#[test]
fn test_fill_24bit_truncates_last_pattern() {
    let mut h = Harness::new();
    start_fill(
        &mut h,
        FILL0,
        VRAM_PADDR,
        VRAM_PADDR + 8,
        0x0033_2211,
        MemoryFillControl::FILL_24BIT,
    );

    assert_eq!(h.bytes(VRAM_PADDR, 9), [0x11, 0x22, 0x33, 0x11, 0x22, 0x33, 0x11, 0x22, 0]);
}

#[test]
fn test_fill_32bit() {
    let mut h = Harness::new();
    start_fill(
        &mut h,
        FILL1,
        VRAM_PADDR + 0x10,
        VRAM_PADDR + 0x20,
        0xDEAD_BEEF,
        MemoryFillControl::FILL_32BIT,
    );

    for i in 0..4 {
        assert_eq!(h.memory.read_u32(VRAM_PADDR + 0x10 + i * 4), Some(0xDEAD_BEEF));
    }
    assert_eq!(h.memory.read_u32(VRAM_PADDR + 0x20), Some(0));
    assert!(h.pending(InterruptId::PSC1));
    assert!(!h.pending(InterruptId::PSC0));
}

#[test]
fn test_fill_completion_flags() {
    let mut h = Harness::new();
    start_fill(&mut h, FILL0, VRAM_PADDR, VRAM_PADDR + 8, 0, MemoryFillControl::FILL_32BIT);

    let control = MemoryFillControl::from_bits_retain(h.reg(GpuRegs::MEMORY_FILL_TRIGGER[0]));
    assert!(!control.contains(MemoryFillControl::TRIGGER));
    assert!(control.contains(MemoryFillControl::FINISHED));
    assert!(control.contains(MemoryFillControl::FILL_32BIT));
}

#[test]
fn test_zero_start_finishes_silently() {
    let mut h = Harness::new();
    start_fill(&mut h, FILL0, 0, VRAM_PADDR + 8, 0xFFFF, MemoryFillControl::empty());

    assert_eq!(h.interrupts.borrow().total_signals(), 0);
    let control = MemoryFillControl::from_bits_retain(h.reg(GpuRegs::MEMORY_FILL_TRIGGER[0]));
    assert_eq!(control, MemoryFillControl::FINISHED);
}

#[test]
fn test_control_without_trigger_does_nothing() {
    let mut h = Harness::new();
    h.write(FILL0 + MemoryFillConfig::ADDRESS_START, VRAM_PADDR / 8);
    h.write(FILL0 + MemoryFillConfig::ADDRESS_END, (VRAM_PADDR + 8) / 8);
    h.write(FILL0 + MemoryFillConfig::VALUE, 0xFFFF);
    h.write(FILL0 + MemoryFillConfig::CONTROL, MemoryFillControl::FILL_32BIT.bits());

    assert_eq!(h.memory.read_u32(VRAM_PADDR), Some(0));
    assert_eq!(h.interrupts.borrow().total_signals(), 0);
    assert_eq!(h.reg(GpuRegs::MEMORY_FILL_TRIGGER[0]), MemoryFillControl::FILL_32BIT.bits());
}

#[test]
fn test_invalid_ranges() {
    let mut memory = PhysicalMemory::with_fcram_size(0x1000);
    let mut rasterizer = NullRasterizer::new();
    let config = |start: u32, end: u32| MemoryFillConfig {
        address_start: start / 8,
        address_end: end / 8,
        value: 0x1234,
        control: MemoryFillControl::TRIGGER,
    };

    assert_eq!(
        memory_fill(&config(VRAM_PADDR + 8, VRAM_PADDR), &mut memory, &mut rasterizer),
        Err(GpuError::InvalidRange {
            start: VRAM_PADDR + 8,
            end: VRAM_PADDR
        })
    );
    assert!(matches!(
        memory_fill(&config(VRAM_PADDR, 0x0800_0000), &mut memory, &mut rasterizer),
        Err(GpuError::InvalidAddress { which: "end", .. })
    ));
    assert_eq!(memory.read_u32(VRAM_PADDR), Some(0));
}

proptest::proptest! {
    #[test]
    fn prop_fill_covers_exactly_the_range(
        start_block in 1u32..64,
        blocks in 1u32..32,
        value in proptest::prelude::any::<u32>(),
        mode in 0usize..3,
    ) {
        let control = [
            MemoryFillControl::empty(),
            MemoryFillControl::FILL_24BIT,
            MemoryFillControl::FILL_32BIT,
        ][mode];
        let start = VRAM_PADDR + start_block * 8;
        let end = start + blocks * 8;
        let config = MemoryFillConfig {
            address_start: start / 8,
            address_end: end / 8,
            value,
            control: control | MemoryFillControl::TRIGGER,
        };
        let pattern: Vec<u8> = match mode {
            0 => (value as u16).to_le_bytes().to_vec(),
            1 => value.to_le_bytes()[..3].to_vec(),
            _ => value.to_le_bytes().to_vec(),
        };

        let mut memory = PhysicalMemory::with_fcram_size(0);
        let mut rasterizer = NullRasterizer::new();
        assert!(memory.write_block(start - 8, &[0xA5; 8]));
        assert!(memory.write_block(end, &[0xA5; 8]));

        proptest::prop_assert!(memory_fill(&config, &mut memory, &mut rasterizer).is_ok());
        let window = (end - start) as usize + 16;
        let first = memory.physical_slice(start - 8, window).unwrap().to_vec();
        proptest::prop_assert!(memory_fill(&config, &mut memory, &mut rasterizer).is_ok());
        let second = memory.physical_slice(start - 8, window).unwrap().to_vec();

        proptest::prop_assert_eq!(&first, &second);
        proptest::prop_assert_eq!(&first[..8], &[0xA5; 8]);
        proptest::prop_assert_eq!(&first[first.len() - 8..], &[0xA5; 8]);
        for (i, byte) in first[8..first.len() - 8].iter().enumerate() {
            proptest::prop_assert_eq!(*byte, pattern[i % pattern.len()]);
        }
    }
}
