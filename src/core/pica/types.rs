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

//! Small vector types shared by the vertex pipeline

use super::float24::Float24;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Four-component vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub w: T,
}

impl<T> Vec4<T> {
    pub const fn new(x: T, y: T, z: T, w: T) -> Self {
        Self { x, y, z, w }
    }
}

impl<T: Copy> Vec4<T> {
    /// Apply `f` to every component
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Vec4<U> {
        Vec4::new(f(self.x), f(self.y), f(self.z), f(self.w))
    }

    pub fn to_array(self) -> [T; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

impl<T> Index<usize> for Vec4<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            3 => &self.w,
            _ => panic!("Vec4 component {} out of range", index),
        }
    }
}

impl<T> IndexMut<usize> for Vec4<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            3 => &mut self.w,
            _ => panic!("Vec4 component {} out of range", index),
        }
    }
}

impl Vec4<Float24> {
    /// Build from host floats
    pub fn from_f32(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self::new(
            Float24::from_f32(x),
            Float24::from_f32(y),
            Float24::from_f32(z),
            Float24::from_f32(w),
        )
    }

    /// (0, 0, 0, 1)
    pub const fn origin() -> Self {
        Self::new(Float24::ZERO, Float24::ZERO, Float24::ZERO, Float24::ONE)
    }

    /// Host float components
    pub fn to_f32(self) -> [f32; 4] {
        self.map(Float24::to_f32).to_array()
    }
}

/// Number of attribute slots in a vertex
pub const MAX_ATTRIBUTES: usize = 16;

/// One vertex worth of shader attributes (inputs or outputs)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeBuffer {
    pub attr: [Vec4<Float24>; MAX_ATTRIBUTES],
}
