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

//! Collaborators of the command processor
//!
//! The command processor decodes and dispatches; drawing pixels, running shader
//! programs and delivering interrupts are someone else's job. [`VideoCore`]
//! bundles those collaborators together with the settings and debug hooks so
//! they can be handed to the GPU and PICA as one unit.

use crate::core::config::Settings;
use crate::core::debugger::{DebugContext, PicaTracer};
use crate::core::gpu::registers::{DisplayTransferConfig, MemoryFillConfig};
use crate::core::interrupt::{GspInterruptController, InterruptId, InterruptSink};
use crate::core::pica::{OutputVertex, PassthroughShaderEngine, PicaRegs, ShaderEngine};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Rendering backend interface
///
/// The `accelerate_*` hooks let a backend take over an operation entirely;
/// returning `false` makes the command processor fall back to its own
/// implementation.
pub trait Rasterizer {
    /// Queue a triangle for rendering
    fn add_triangle(&mut self, v0: &OutputVertex, v1: &OutputVertex, v2: &OutputVertex);

    /// Flush queued triangles
    fn draw_triangles(&mut self);

    /// A PICA register was written
    fn notify_pica_register_changed(&mut self, id: u32);

    fn accelerate_fill(&mut self, _config: &MemoryFillConfig) -> bool {
        false
    }

    fn accelerate_display_transfer(&mut self, _config: &DisplayTransferConfig) -> bool {
        false
    }

    fn accelerate_texture_copy(&mut self, _config: &DisplayTransferConfig) -> bool {
        false
    }

    /// Draw the configured vertex batch on the host GPU
    fn accelerate_draw_batch(&mut self, _regs: &PicaRegs, _is_indexed: bool) -> bool {
        false
    }

    /// Present the current frame
    fn swap_buffers(&mut self) {}
}

impl<T: Rasterizer> Rasterizer for Rc<RefCell<T>> {
    fn add_triangle(&mut self, v0: &OutputVertex, v1: &OutputVertex, v2: &OutputVertex) {
        self.borrow_mut().add_triangle(v0, v1, v2);
    }

    fn draw_triangles(&mut self) {
        self.borrow_mut().draw_triangles();
    }

    fn notify_pica_register_changed(&mut self, id: u32) {
        self.borrow_mut().notify_pica_register_changed(id);
    }

    fn accelerate_fill(&mut self, config: &MemoryFillConfig) -> bool {
        self.borrow_mut().accelerate_fill(config)
    }

    fn accelerate_display_transfer(&mut self, config: &DisplayTransferConfig) -> bool {
        self.borrow_mut().accelerate_display_transfer(config)
    }

    fn accelerate_texture_copy(&mut self, config: &DisplayTransferConfig) -> bool {
        self.borrow_mut().accelerate_texture_copy(config)
    }

    fn accelerate_draw_batch(&mut self, regs: &PicaRegs, is_indexed: bool) -> bool {
        self.borrow_mut().accelerate_draw_batch(regs, is_indexed)
    }

    fn swap_buffers(&mut self) {
        self.borrow_mut().swap_buffers();
    }
}

/// Rasterizer that only counts what it is asked to do
#[derive(Debug, Default, Clone)]
pub struct NullRasterizer {
    triangles: u64,
    draw_calls: u64,
    register_notifications: u64,
    swaps: u64,
    accelerated_draws: u64,
    accelerate_draws: bool,
    last_triangle: Option<[OutputVertex; 3]>,
}

impl NullRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept every draw batch offered through `accelerate_draw_batch`
    pub fn with_accelerated_draws(mut self, enabled: bool) -> Self {
        self.accelerate_draws = enabled;
        self
    }

    pub fn triangles(&self) -> u64 {
        self.triangles
    }

    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    pub fn register_notifications(&self) -> u64 {
        self.register_notifications
    }

    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    pub fn accelerated_draws(&self) -> u64 {
        self.accelerated_draws
    }

    pub fn last_triangle(&self) -> Option<&[OutputVertex; 3]> {
        self.last_triangle.as_ref()
    }
}

impl Rasterizer for NullRasterizer {
    fn add_triangle(&mut self, v0: &OutputVertex, v1: &OutputVertex, v2: &OutputVertex) {
        self.triangles += 1;
        self.last_triangle = Some([*v0, *v1, *v2]);
    }

    fn draw_triangles(&mut self) {
        self.draw_calls += 1;
    }

    fn notify_pica_register_changed(&mut self, _id: u32) {
        self.register_notifications += 1;
    }

    fn accelerate_draw_batch(&mut self, _regs: &PicaRegs, _is_indexed: bool) -> bool {
        if self.accelerate_draws {
            self.accelerated_draws += 1;
        }
        self.accelerate_draws
    }

    fn swap_buffers(&mut self) {
        self.swaps += 1;
    }
}

/// Settings, collaborators and debug hooks shared by the GPU and PICA
pub struct VideoCore {
    pub(crate) settings: Settings,
    pub(crate) rasterizer: Box<dyn Rasterizer>,
    pub(crate) shader_engine: Box<dyn ShaderEngine>,
    pub(crate) interrupts: Box<dyn InterruptSink>,
    pub(crate) debug: DebugContext,
    pub(crate) tracer: PicaTracer,
}

impl VideoCore {
    pub fn new(
        settings: Settings,
        rasterizer: Box<dyn Rasterizer>,
        shader_engine: Box<dyn ShaderEngine>,
        interrupts: Box<dyn InterruptSink>,
    ) -> Self {
        Self {
            settings,
            rasterizer,
            shader_engine,
            interrupts,
            debug: DebugContext::new(),
            tracer: PicaTracer::new(),
        }
    }

    /// Default settings, a [`NullRasterizer`], a [`PassthroughShaderEngine`]
    /// and a private [`GspInterruptController`]
    pub fn headless() -> Self {
        Self::new(
            Settings::default(),
            Box::new(NullRasterizer::new()),
            Box::new(PassthroughShaderEngine::new()),
            Box::new(GspInterruptController::new()),
        )
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn rasterizer_mut(&mut self) -> &mut dyn Rasterizer {
        self.rasterizer.as_mut()
    }

    pub fn set_rasterizer(&mut self, rasterizer: Box<dyn Rasterizer>) {
        self.rasterizer = rasterizer;
    }

    pub fn set_shader_engine(&mut self, engine: Box<dyn ShaderEngine>) {
        self.shader_engine = engine;
    }

    pub fn set_interrupt_sink(&mut self, interrupts: Box<dyn InterruptSink>) {
        self.interrupts = interrupts;
    }

    pub fn debug_context(&self) -> &DebugContext {
        &self.debug
    }

    pub fn debug_context_mut(&mut self) -> &mut DebugContext {
        &mut self.debug
    }

    pub fn tracer_mut(&mut self) -> &mut PicaTracer {
        &mut self.tracer
    }

    /// Raise a GSP interrupt
    pub fn signal_interrupt(&mut self, id: InterruptId) {
        log::trace!("Signalling GSP interrupt {}", id);
        self.interrupts.signal_interrupt(id);
    }
}

impl fmt::Debug for VideoCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoCore")
            .field("settings", &self.settings)
            .field("debug", &self.debug)
            .field("tracing", &self.tracer.is_tracing())
            .finish_non_exhaustive()
    }
}
