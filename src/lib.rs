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

//! PICA200 GPU command processor core library
//!
//! This library emulates the GPU side of a handheld console: the external GPU
//! and LCD register blocks, and the PICA200 command processor that decodes
//! command lists, uploads shader state and feeds vertices to a rasterizer.
//!
//! # Example
//!
//! ```
//! use picarx::core::config::Settings;
//! use picarx::core::hw::HardwareManager;
//! use picarx::core::lcd::Lcd;
//! use picarx::core::hw::mmio::MmioRegion;
//!
//! let settings = Settings { fcram_size: 0x1000, ..Settings::default() };
//! let (mut hw, _interrupts) = HardwareManager::headless(settings);
//! hw.init();
//!
//! hw.write::<u32>(Lcd::VADDR + 0x90 * 4, 0x40);
//! assert_eq!(hw.lcd().backlight(0), 0x40);
//! ```

pub mod core;
