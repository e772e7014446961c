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

//! Debugging hooks for the command processor
//!
//! - [`DebugContext`]: event subscribers and an optional [`Recorder`]
//! - [`PicaTracer`]: captures every PICA register write between start and finish
//! - [`MemoryAccessTracker`]: coalesces guest ranges touched during a draw
//!
//! # Example
//!
//! ```
//! use picarx::core::debugger::{DebugContext, DebugEvent};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let mut context = DebugContext::new();
//! let seen = Rc::new(Cell::new(0));
//!
//! let counter = seen.clone();
//! let subscription = context.subscribe(move |event| {
//!     if let DebugEvent::PicaCommandProcessed(_) = event {
//!         counter.set(counter.get() + 1);
//!     }
//! });
//!
//! context.fire(DebugEvent::PicaCommandProcessed(0x10));
//! drop(subscription);
//! context.fire(DebugEvent::PicaCommandProcessed(0x10));
//!
//! assert_eq!(seen.get(), 1);
//! ```

mod access_tracker;
mod recorder;
mod tracer;

pub use access_tracker::MemoryAccessTracker;
pub use recorder::{
    InitialState, Recorder, TraceEvent, TraceFile, TraceMetadata, TraceRecorder, TRACE_VERSION,
};
pub use tracer::{PicaTrace, PicaTracer, RegisterWrite};

use crate::core::pica::AttributeBuffer;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Events fired by the command processor
#[derive(Debug, Clone, Copy)]
pub enum DebugEvent<'a> {
    /// A PICA register write is about to be handled
    PicaCommandLoaded(u32),
    /// A PICA register write has been handled
    PicaCommandProcessed(u32),
    IncomingPrimitiveBatch,
    FinishedPrimitiveBatch,
    /// Input attributes of a vertex about to enter the vertex shader
    VertexShaderInvocation(&'a AttributeBuffer),
    IncomingDisplayTransfer,
    BufferSwapped,
}

type Callback = dyn FnMut(&DebugEvent<'_>);

/// Keeps a debug subscription alive
///
/// Dropping the token unsubscribes; the context forgets the callback the next
/// time it fires an event.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _handle: Rc<RefCell<Callback>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription")
    }
}

/// Event subscribers plus the optional trace recorder
#[derive(Default)]
pub struct DebugContext {
    subscribers: Vec<Weak<RefCell<Callback>>>,

    /// Receives raw memory reads and MMIO writes when present
    pub recorder: Option<Box<dyn Recorder>>,
}

impl DebugContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every subsequent event
    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&DebugEvent<'_>) + 'static,
    {
        let handle: Rc<RefCell<Callback>> = Rc::new(RefCell::new(callback));
        self.subscribers.push(Rc::downgrade(&handle));
        Subscription { _handle: handle }
    }

    /// Whether anyone is listening
    #[inline]
    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.is_empty()
    }

    /// Deliver an event to every live subscriber
    ///
    /// A callback that fires an event on the same context from inside its own
    /// invocation is skipped for the nested event.
    pub fn fire(&mut self, event: DebugEvent<'_>) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers.retain(|weak| weak.strong_count() > 0);
        for weak in &self.subscribers {
            if let Some(callback) = weak.upgrade() {
                if let Ok(mut callback) = callback.try_borrow_mut() {
                    (*callback)(&event);
                }
            }
        }
    }

    /// Attach a recorder, returning the previous one
    pub fn set_recorder(
        &mut self,
        recorder: Option<Box<dyn Recorder>>,
    ) -> Option<Box<dyn Recorder>> {
        std::mem::replace(&mut self.recorder, recorder)
    }
}

impl fmt::Debug for DebugContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugContext")
            .field("subscribers", &self.subscribers.len())
            .field("recorder", &self.recorder.is_some())
            .finish()
    }
}
