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

//! Shader output to rasterizer vertex mapping

use super::float24::Float24;
use super::regs::PicaRegs;
use super::types::{AttributeBuffer, Vec4};
use serde::{Deserialize, Serialize};

/// Semantic slot written by a shader output component
pub mod semantic {
    pub const POSITION_X: u32 = 0;
    pub const QUATERNION_X: u32 = 4;
    pub const COLOR_R: u32 = 8;
    pub const TEXCOORD0_U: u32 = 12;
    pub const TEXCOORD1_U: u32 = 14;
    pub const TEXCOORD0_W: u32 = 16;
    pub const VIEW_X: u32 = 18;
    pub const TEXCOORD2_U: u32 = 22;
    /// Component is not forwarded
    pub const INVALID: u32 = 31;
}

const NUM_SLOTS: usize = 24;

/// Vertex as consumed by the rasterizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputVertex {
    pub pos: Vec4<Float24>,
    pub quat: Vec4<Float24>,
    pub color: Vec4<Float24>,
    pub tc0: [Float24; 2],
    pub tc1: [Float24; 2],
    pub tc0_w: Float24,
    pub view: [Float24; 3],
    pub tc2: [Float24; 2],
}

impl OutputVertex {
    /// Scatter shader outputs into semantic slots
    ///
    /// Each of the first `vs_output_total` output attributes maps its four
    /// components through the semantic table. Colors are made absolute and
    /// saturated to 1.0 before interpolation, as the hardware does.
    pub fn from_attribute_buffer(regs: &PicaRegs, output: &AttributeBuffer) -> Self {
        let mut slots = [Float24::ZERO; NUM_SLOTS];

        let total = (regs.vs_output_total() as usize).min(PicaRegs::NUM_VS_OUTPUT_ATTRIBUTES);
        for attribute in 0..total {
            let semantics = regs.vs_output_semantics(attribute);
            for (component, &id) in semantics.iter().enumerate() {
                if let Some(slot) = slots.get_mut(id as usize) {
                    *slot = output.attr[attribute][component];
                } else if id != semantic::INVALID {
                    log::error!("Invalid/unknown semantic id: {}", id);
                }
            }
        }

        let saturate = |value: Float24| Float24::from_f32(value.to_f32().abs().min(1.0));

        Self {
            pos: Vec4::new(slots[0], slots[1], slots[2], slots[3]),
            quat: Vec4::new(slots[4], slots[5], slots[6], slots[7]),
            color: Vec4::new(slots[8], slots[9], slots[10], slots[11]).map(saturate),
            tc0: [slots[12], slots[13]],
            tc1: [slots[14], slots[15]],
            tc0_w: slots[16],
            view: [slots[18], slots[19], slots[20]],
            tc2: [slots[22], slots[23]],
        }
    }
}
