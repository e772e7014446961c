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

//! GSP interrupt signalling
//!
//! The GPU reports completed work to the GSP service through a small set of
//! interrupt lines. The command processor only ever raises them through the
//! [`InterruptSink`] trait; [`GspInterruptController`] is the in-crate sink that
//! latches them for whoever services the GSP.
//!
//! ## Interrupt Sources
//!
//! ```text
//! Id | Source | Raised by
//! ---|--------|---------------------------------------------
//! 0  | PSC0   | Memory fill unit 0 finished
//! 1  | PSC1   | Memory fill unit 1 finished
//! 2  | PDC0   | Vertical blank (top screen)
//! 3  | PDC1   | Vertical blank (bottom screen)
//! 4  | PPF    | Display transfer / texture copy finished
//! 5  | P3D    | Command list requested an interrupt
//! 6  | DMA    | GSP DMA finished
//! ```

use bitflags::bitflags;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// GSP interrupt identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InterruptId {
    PSC0 = 0,
    PSC1 = 1,
    PDC0 = 2,
    PDC1 = 3,
    PPF = 4,
    P3D = 5,
    DMA = 6,
}

impl InterruptId {
    /// All interrupt ids in numeric order
    pub const ALL: [InterruptId; 7] = [
        InterruptId::PSC0,
        InterruptId::PSC1,
        InterruptId::PDC0,
        InterruptId::PDC1,
        InterruptId::PPF,
        InterruptId::P3D,
        InterruptId::DMA,
    ];

    /// Pending-set flag for this id
    pub fn flag(self) -> GspInterrupts {
        GspInterrupts::from_bits_truncate(1 << self as u8)
    }
}

impl fmt::Display for InterruptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

bitflags! {
    /// Set of GSP interrupt lines
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GspInterrupts: u8 {
        const PSC0 = 1 << 0;
        const PSC1 = 1 << 1;
        const PDC0 = 1 << 2;
        const PDC1 = 1 << 3;
        const PPF = 1 << 4;
        const P3D = 1 << 5;
        const DMA = 1 << 6;
    }
}

/// Receiver of GPU interrupts
pub trait InterruptSink {
    /// Raise the given interrupt line
    fn signal_interrupt(&mut self, id: InterruptId);
}

impl<T: InterruptSink> InterruptSink for Rc<RefCell<T>> {
    fn signal_interrupt(&mut self, id: InterruptId) {
        self.borrow_mut().signal_interrupt(id);
    }
}

/// GSP interrupt controller
///
/// Latches raised interrupts until they are acknowledged and keeps a running
/// count per line.
///
/// # Example
///
/// ```
/// use picarx::core::interrupt::{GspInterruptController, InterruptId, InterruptSink};
///
/// let mut gsp = GspInterruptController::new();
/// gsp.signal_interrupt(InterruptId::PPF);
/// assert!(gsp.is_pending(InterruptId::PPF));
///
/// gsp.acknowledge(InterruptId::PPF.flag());
/// assert!(!gsp.is_pending(InterruptId::PPF));
/// assert_eq!(gsp.signal_count(InterruptId::PPF), 1);
/// ```
#[derive(Debug, Default)]
pub struct GspInterruptController {
    /// Interrupts raised and not yet acknowledged
    pending: GspInterrupts,

    /// Lines the guest has registered for. Masked lines are still counted.
    mask: GspInterrupts,

    counters: [u64; InterruptId::ALL.len()],
}

impl GspInterruptController {
    /// Create a controller with every line enabled and nothing pending
    pub fn new() -> Self {
        Self {
            pending: GspInterrupts::empty(),
            mask: GspInterrupts::all(),
            counters: [0; InterruptId::ALL.len()],
        }
    }

    /// Latch an interrupt
    ///
    /// Masked lines are counted but never latched.
    pub fn request(&mut self, id: InterruptId) {
        self.counters[id as usize] += 1;
        if self.mask.contains(id.flag()) {
            self.pending |= id.flag();
        }
        log::trace!("GSP interrupt {} requested, pending={:?}", id, self.pending);
    }

    /// Clear the given lines
    pub fn acknowledge(&mut self, lines: GspInterrupts) {
        self.pending &= !lines;
        log::trace!("GSP interrupts acknowledged, pending={:?}", self.pending);
    }

    /// Check whether a single line is latched
    pub fn is_pending(&self, id: InterruptId) -> bool {
        self.pending.contains(id.flag())
    }

    /// All latched lines
    pub fn pending(&self) -> GspInterrupts {
        self.pending
    }

    /// Select which lines are latched
    pub fn set_mask(&mut self, mask: GspInterrupts) {
        self.mask = mask;
    }

    /// Number of times a line was raised since creation
    pub fn signal_count(&self, id: InterruptId) -> u64 {
        self.counters[id as usize]
    }

    /// Total number of interrupts raised since creation
    pub fn total_signals(&self) -> u64 {
        self.counters.iter().sum()
    }
}

impl InterruptSink for GspInterruptController {
    fn signal_interrupt(&mut self, id: InterruptId) {
        self.request(id);
    }
}
