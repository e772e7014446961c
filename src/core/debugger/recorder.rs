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

//! Capture of GPU traffic for offline replay
//!
//! A [`TraceRecorder`] collects the initial register state, every MMIO write
//! and every block of guest memory the GPU read. The result is a
//! [`TraceFile`], serialized with bincode.
//!
//! # Version Compatibility
//!
//! Trace files carry a version number. Loading a trace with a different
//! version fails with [`EmulatorError::TraceVersion`].

use crate::core::error::{EmulatorError, Result};
use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::rc::Rc;

/// Trace file format version
pub const TRACE_VERSION: u32 = 1;

/// Sink for raw GPU traffic
pub trait Recorder {
    /// The GPU read `data` starting at `physical_address`
    fn memory_accessed(&mut self, data: &[u8], physical_address: u32);

    /// An MMIO register at `physical_address` was written
    fn register_written(&mut self, physical_address: u32, value: u64, width_bits: u32);

    /// A frame was presented
    fn frame_finished(&mut self) {}
}

impl<T: Recorder> Recorder for Rc<RefCell<T>> {
    fn memory_accessed(&mut self, data: &[u8], physical_address: u32) {
        self.borrow_mut().memory_accessed(data, physical_address);
    }

    fn register_written(&mut self, physical_address: u32, value: u64, width_bits: u32) {
        self.borrow_mut()
            .register_written(physical_address, value, width_bits);
    }

    fn frame_finished(&mut self) {
        self.borrow_mut().frame_finished();
    }
}

/// One recorded event, in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum TraceEvent {
    MemoryLoad { address: u32, data: Vec<u8> },
    RegisterWrite { address: u32, value: u64, width_bits: u32 },
    FrameMarker,
}

/// Register state at the moment recording started
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct InitialState {
    pub gpu_registers: Vec<u32>,
    pub lcd_registers: Vec<u32>,
    pub pica_registers: Vec<u32>,
}

/// When and how the trace was captured
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct TraceMetadata {
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Frames between start and finish
    pub frame_count: u64,
}

/// Complete serialized trace
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct TraceFile {
    /// Version number for compatibility checking
    pub version: u32,
    pub metadata: TraceMetadata,
    pub initial_state: InitialState,
    pub events: Vec<TraceEvent>,
}

impl TraceFile {
    /// Write the trace to `path`
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = bincode::encode_to_vec(self, config::standard())?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Read a trace and verify its version
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        let (trace, _): (TraceFile, usize) =
            bincode::decode_from_slice(&buffer, config::standard())?;

        if trace.version != TRACE_VERSION {
            return Err(EmulatorError::TraceVersion {
                expected: TRACE_VERSION,
                got: trace.version,
            });
        }

        Ok(trace)
    }

    /// Number of MMIO writes in the trace
    pub fn register_write_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, TraceEvent::RegisterWrite { .. }))
            .count()
    }

    /// Total guest bytes captured
    pub fn memory_bytes(&self) -> usize {
        self.events
            .iter()
            .map(|event| match event {
                TraceEvent::MemoryLoad { data, .. } => data.len(),
                _ => 0,
            })
            .sum()
    }
}

/// In-memory trace builder
#[derive(Debug)]
pub struct TraceRecorder {
    started: DateTime<Utc>,
    initial_state: InitialState,
    events: Vec<TraceEvent>,
    frame_count: u64,
}

impl TraceRecorder {
    pub fn new(initial_state: InitialState) -> Self {
        Self {
            started: Utc::now(),
            initial_state,
            events: Vec::new(),
            frame_count: 0,
        }
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Package everything recorded so far
    pub fn finish(&self) -> TraceFile {
        TraceFile {
            version: TRACE_VERSION,
            metadata: TraceMetadata {
                timestamp: self.started,
                frame_count: self.frame_count,
            },
            initial_state: self.initial_state.clone(),
            events: self.events.clone(),
        }
    }
}

impl Recorder for TraceRecorder {
    fn memory_accessed(&mut self, data: &[u8], physical_address: u32) {
        if data.is_empty() {
            return;
        }
        self.events.push(TraceEvent::MemoryLoad {
            address: physical_address,
            data: data.to_vec(),
        });
    }

    fn register_written(&mut self, physical_address: u32, value: u64, width_bits: u32) {
        self.events.push(TraceEvent::RegisterWrite {
            address: physical_address,
            value,
            width_bits,
        });
    }

    fn frame_finished(&mut self) {
        self.frame_count += 1;
        self.events.push(TraceEvent::FrameMarker);
    }
}
