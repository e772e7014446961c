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

//! PICA register write tracer
//!
//! Captures the (id, mask, merged value) triple of every register write
//! between [`PicaTracer::start`] and [`PicaTracer::finish`].

use crate::core::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One captured register write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterWrite {
    pub cmd_id: u16,
    pub mask: u16,
    pub value: u32,
}

/// A finished trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicaTrace {
    pub writes: Vec<RegisterWrite>,
}

impl PicaTrace {
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Write one line per captured register write
    ///
    /// # Example
    /// ```
    /// use picarx::core::debugger::PicaTracer;
    ///
    /// let mut tracer = PicaTracer::new();
    /// tracer.start();
    /// tracer.on_write(0x22E, 0xF, 1);
    ///
    /// let trace = tracer.finish().unwrap();
    /// let mut out = Vec::new();
    /// trace.write_log(&mut out).unwrap();
    /// assert_eq!(String::from_utf8(out).unwrap(), "0x022E mask=0xF value=0x00000001\n");
    /// ```
    pub fn write_log<W: Write>(&self, mut output: W) -> Result<()> {
        for write in &self.writes {
            writeln!(
                output,
                "0x{:04X} mask=0x{:X} value=0x{:08X}",
                write.cmd_id, write.mask, write.value
            )?;
        }
        Ok(())
    }
}

/// Register write tracer
///
/// Idle until started. Writes seen while idle are ignored.
#[derive(Debug, Default)]
pub struct PicaTracer {
    current: Option<PicaTrace>,
}

impl PicaTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new trace
    ///
    /// Starting while a trace is already running is ignored.
    pub fn start(&mut self) {
        if self.current.is_some() {
            log::warn!("PICA tracing already running");
            return;
        }
        self.current = Some(PicaTrace::default());
    }

    #[inline]
    pub fn is_tracing(&self) -> bool {
        self.current.is_some()
    }

    /// Record a write if a trace is running
    #[inline]
    pub fn on_write(&mut self, cmd_id: u16, mask: u16, value: u32) {
        if let Some(trace) = self.current.as_mut() {
            trace.writes.push(RegisterWrite {
                cmd_id,
                mask,
                value,
            });
        }
    }

    /// Stop tracing and hand the trace over
    pub fn finish(&mut self) -> Option<PicaTrace> {
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_tracer_ignores_writes() {
        let mut tracer = PicaTracer::new();
        tracer.on_write(0x10, 0xF, 1);
        assert!(!tracer.is_tracing());
        assert_eq!(tracer.finish(), None);
    }

    #[test]
    fn test_trace_captures_in_order() {
        let mut tracer = PicaTracer::new();
        tracer.start();
        tracer.on_write(0x2B0, 0x3, 0x1234);
        tracer.on_write(0x22E, 0xF, 1);

        let trace = tracer.finish().unwrap();
        assert!(!tracer.is_tracing());
        assert_eq!(trace.len(), 2);
        assert_eq!(
            trace.writes[0],
            RegisterWrite {
                cmd_id: 0x2B0,
                mask: 0x3,
                value: 0x1234
            }
        );
        assert_eq!(trace.writes[1].cmd_id, 0x22E);
    }

    #[test]
    fn test_restart_keeps_running_trace() {
        let mut tracer = PicaTracer::new();
        tracer.start();
        tracer.on_write(1, 0xF, 1);
        tracer.start();
        assert_eq!(tracer.finish().map(|t| t.len()), Some(1));
    }

    #[test]
    fn test_write_log_lines() {
        let trace = PicaTrace {
            writes: vec![
                RegisterWrite {
                    cmd_id: 0x1,
                    mask: 0x1,
                    value: 0xAB,
                },
                RegisterWrite {
                    cmd_id: 0x2FF,
                    mask: 0xF,
                    value: 0xFFFF_FFFF,
                },
            ],
        };
        let mut out = Vec::new();
        trace.write_log(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, ["0x0001 mask=0x1 value=0x000000AB", "0x02FF mask=0xF value=0xFFFFFFFF"]);
    }
}
