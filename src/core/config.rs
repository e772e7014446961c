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

//! Video core settings
//!
//! Settings are read from a TOML file and may be overridden from the environment
//! (which in turn may be populated from a `.env` file by the binary).
//!
//! # Example
//!
//! ```
//! use picarx::core::config::Settings;
//!
//! let settings = Settings::from_toml_str("hw_shader_enabled = true").unwrap();
//! assert!(settings.hw_shader_enabled);
//! assert!(!settings.hw_shader_accurate_gs);
//! ```

use crate::core::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable enabling the hardware shader batch path
pub const ENV_HW_SHADER: &str = "PICARX_HW_SHADER";

/// Environment variable forcing accurate geometry shader emulation
pub const ENV_HW_SHADER_ACCURATE_GS: &str = "PICARX_HW_SHADER_ACCURATE_GS";

/// Environment variable enabling the shader JIT flag
pub const ENV_SHADER_JIT: &str = "PICARX_SHADER_JIT";

/// Settings consulted by the command processor and its collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// A hardware renderer is attached (informational for collaborators)
    pub hw_renderer_enabled: bool,

    /// Shader engine may compile programs (informational for collaborators)
    pub shader_jit_enabled: bool,

    /// Allow whole draw batches to be handed to the rasterizer
    pub hw_shader_enabled: bool,

    /// Never accelerate draws while a geometry shader is active
    pub hw_shader_accurate_gs: bool,

    /// Request accurate multiplication from hardware shaders
    pub hw_shader_accurate_mul: bool,

    /// FCRAM size in bytes
    pub fcram_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hw_renderer_enabled: false,
            shader_jit_enabled: false,
            hw_shader_enabled: false,
            hw_shader_accurate_gs: true,
            hw_shader_accurate_mul: false,
            fcram_size: crate::core::memory::FCRAM_SIZE,
        }
    }
}

impl Settings {
    /// Parse settings from a TOML document
    ///
    /// Missing keys keep their default value.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Apply `PICARX_*` environment overrides
    ///
    /// Accepted truthy values are `1`, `true`, `yes` and `on` (case-insensitive);
    /// anything else is treated as false. Unset variables leave the value untouched.
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = env_flag(ENV_HW_SHADER) {
            self.hw_shader_enabled = value;
        }
        if let Some(value) = env_flag(ENV_HW_SHADER_ACCURATE_GS) {
            self.hw_shader_accurate_gs = value;
        }
        if let Some(value) = env_flag(ENV_SHADER_JIT) {
            self.shader_jit_enabled = value;
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    Some(parse_flag(&value))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
