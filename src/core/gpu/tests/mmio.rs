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
use crate::core::debugger::{InitialState, TraceEvent, TraceRecorder};
use crate::core::memory::FCRAM_PADDR;
use crate::core::pica::{CommandHeader, PicaRegs};

const CP: usize = GpuRegs::COMMAND_PROCESSOR;

fn attach_recorder(h: &mut Harness) -> Rc<RefCell<TraceRecorder>> {
    let recorder = Rc::new(RefCell::new(TraceRecorder::new(InitialState::default())));
    h.video
        .debug_context_mut()
        .set_recorder(Some(Box::new(recorder.clone())));
    recorder
}

/// Store a one-command list raising P3D and return its size
fn store_irq_list(h: &mut Harness) -> u32 {
    let header = CommandHeader::new(PicaRegs::TRIGGER_IRQ as u32, 0xF, 0, false).0;
    assert!(h.memory.write_u32(FCRAM_PADDR, 0x1234_5678));
    assert!(h.memory.write_u32(FCRAM_PADDR + 4, header));
    8
}

#[test]
fn test_init_installs_default_framebuffers() {
    let h = Harness::new();

    let top = h.gpu.regs().framebuffer(0);
    assert_eq!((top.width, top.height), (240, 400));
    assert_eq!(top.address_left1, 0x181E_6000);
    assert_eq!(top.address_right2, 0x182B_9800);
    assert_eq!(top.pixel_format(), Some(PixelFormat::RGB8));
    assert_eq!(top.stride, 720);

    let bottom = h.gpu.regs().framebuffer(1);
    assert_eq!((bottom.width, bottom.height), (240, 320));
    assert_eq!(bottom.address_left2, 0x184C_7800);
    assert!(!bottom.second_fb_active());
}

#[test]
fn test_plain_registers_read_back() {
    let mut h = Harness::new();
    h.write(0x200, 0xCAFE_F00D);

    assert_eq!(h.gpu.read::<u32>(Gpu::VADDR + 0x800), 0xCAFE_F00D);
}

#[test]
fn test_narrow_access_is_ignored() {
    let mut h = Harness::new();
    let recorder = attach_recorder(&mut h);

    h.gpu.write::<u16>(
        Gpu::VADDR + 0x800,
        0xBEEF,
        &mut h.memory,
        &mut h.pica,
        &mut h.video,
    );

    assert_eq!(h.reg(0x200), 0);
    assert_eq!(h.gpu.read::<u8>(Gpu::VADDR), 0);
    assert!(recorder.borrow().events().is_empty());
}

#[test]
fn test_out_of_range_write_is_ignored() {
    let mut h = Harness::new();
    h.gpu.write::<u32>(
        Gpu::VADDR + (registers::NUM_REGS as u32) * 4,
        1,
        &mut h.memory,
        &mut h.pica,
        &mut h.video,
    );
    assert_eq!(h.gpu.read::<u32>(Gpu::VADDR + (registers::NUM_REGS as u32) * 4), 0);
}

#[test]
fn test_command_processor_trigger_runs_list() {
    let mut h = Harness::new();
    let size = store_irq_list(&mut h);

    h.write(CP + CommandProcessorConfig::SIZE_REG, size);
    h.write(CP + CommandProcessorConfig::ADDRESS, FCRAM_PADDR / 8);
    assert!(!h.pending(InterruptId::P3D));

    h.write(GpuRegs::COMMAND_PROCESSOR_TRIGGER, 1);

    assert!(h.pending(InterruptId::P3D));
    assert_eq!(h.pica.regs().word(PicaRegs::TRIGGER_IRQ), 0x1234_5678);
    assert_eq!(h.reg(GpuRegs::COMMAND_PROCESSOR_TRIGGER), 0);
}

#[test]
fn test_trigger_without_bit_zero_is_stored() {
    let mut h = Harness::new();
    store_irq_list(&mut h);
    h.write(CP + CommandProcessorConfig::SIZE_REG, 8);
    h.write(CP + CommandProcessorConfig::ADDRESS, FCRAM_PADDR / 8);

    h.write(GpuRegs::COMMAND_PROCESSOR_TRIGGER, 2);

    assert!(!h.pending(InterruptId::P3D));
    assert_eq!(h.reg(GpuRegs::COMMAND_PROCESSOR_TRIGGER), 2);
}

#[test]
fn test_recorder_sees_list_then_write() {
    let mut h = Harness::new();
    let size = store_irq_list(&mut h);
    h.write(CP + CommandProcessorConfig::SIZE_REG, size);
    h.write(CP + CommandProcessorConfig::ADDRESS, FCRAM_PADDR / 8);

    let recorder = attach_recorder(&mut h);
    h.write(GpuRegs::COMMAND_PROCESSOR_TRIGGER, 1);

    let trigger_vaddr = Gpu::VADDR + GpuRegs::COMMAND_PROCESSOR_TRIGGER as u32 * 4;
    let events = recorder.borrow().events().to_vec();
    assert_eq!(events.len(), 2);
    match &events[0] {
        TraceEvent::MemoryLoad { address, data } => {
            assert_eq!(*address, FCRAM_PADDR);
            assert_eq!(data.len(), size as usize);
        }
        other => panic!("expected the command list, got {:?}", other),
    }
    assert_eq!(
        events[1],
        TraceEvent::RegisterWrite {
            address: 0x1040_18F0,
            value: 1,
            width_bits: 32
        }
    );
    assert_eq!(io_physical_address(trigger_vaddr), 0x1040_18F0);
}

#[test]
fn test_write_block_has_no_side_effects() {
    let mut h = Harness::new();
    let offset = GpuRegs::DISPLAY_TRANSFER_TRIGGER as u32 * 4;

    assert!(h.gpu.write_block(Gpu::VADDR + offset, &1u32.to_le_bytes()));

    assert_eq!(h.reg(GpuRegs::DISPLAY_TRANSFER_TRIGGER), 1);
    assert_eq!(h.interrupts.borrow().total_signals(), 0);
    assert!(!h.gpu.write_block(Gpu::VADDR - 4, &[0; 4]));
}

#[test]
fn test_vblank_every_frame() {
    let mut h = Harness::new();
    let recorder = attach_recorder(&mut h);

    assert_eq!(h.gpu.tick(FRAME_TICKS - 1, &mut h.video), 0);
    assert!(!h.pending(InterruptId::PDC0));

    assert_eq!(h.gpu.tick(1, &mut h.video), 1);
    assert!(h.pending(InterruptId::PDC0));
    assert!(h.pending(InterruptId::PDC1));
    assert_eq!(h.rasterizer.borrow().swaps(), 1);
    assert_eq!(recorder.borrow().events(), &[TraceEvent::FrameMarker]);

    assert_eq!(h.gpu.tick(FRAME_TICKS * 2, &mut h.video), 2);
    assert_eq!(h.gpu.frame_count(), 3);
}
