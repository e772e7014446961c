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

//! Core emulation components
//!
//! This module contains all hardware emulation components:
//! - Guest physical memory
//! - GPU and LCD register blocks
//! - PICA200 command processor
//! - GSP interrupt signalling
//! - Debug hooks and trace recording
//! - Hardware manager tying them together

pub mod config;
pub mod debugger;
pub mod error;
pub mod gpu;
pub mod hw;
pub mod interrupt;
pub mod lcd;
pub mod memory;
pub mod pica;
pub mod video;

pub use config::Settings;
pub use error::{EmulatorError, GpuError, Result};
pub use gpu::Gpu;
pub use hw::HardwareManager;
pub use lcd::Lcd;
pub use memory::{GuestMemory, PhysicalMemory};
pub use pica::Pica;
pub use video::VideoCore;
