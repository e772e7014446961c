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

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use picarx::core::config::Settings;
use picarx::core::error::Result;
use picarx::core::gpu::FRAME_TICKS;
use picarx::core::hw::HardwareManager;
use picarx::core::interrupt::{GspInterruptController, InterruptId};
use picarx::core::memory::PhysicalMemory;
use picarx::core::pica::PassthroughShaderEngine;
use picarx::core::video::{NullRasterizer, VideoCore};
use serde::Serialize;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// PICA200 command list player
#[derive(Parser)]
#[command(name = "picarx")]
#[command(about = "Replay a PICA200 command list dump headlessly", long_about = None)]
struct Args {
    /// Raw command list dump
    dump: PathBuf,

    /// Physical address to load the dump at
    #[arg(short = 'a', long, default_value = "0x20000000", value_parser = parse_address)]
    address: u32,

    /// Settings file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Record GPU traffic to this file
    #[arg(short = 't', long)]
    trace: Option<PathBuf>,

    /// Vertical blanks to run after the list
    #[arg(short = 'f', long, default_value = "1")]
    frames: u64,
}

fn parse_address(value: &str) -> std::result::Result<u32, String> {
    let digits = value.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid address {:?}: {}", value, e))
}

/// Printed as JSON once the list has run
#[derive(Serialize)]
struct Summary {
    list_bytes: usize,
    triangles: u64,
    batches: u64,
    frames: u64,
    interrupts: Vec<(String, u64)>,
}

fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("picarx v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::load(path)?
        }
        None => Settings::default(),
    };
    settings.apply_env_overrides();

    let mut memory = PhysicalMemory::with_fcram_size(settings.fcram_size);
    let list_bytes = match memory.load_dump(args.address, &args.dump) {
        Ok(size) => size,
        Err(e) => {
            error!("Failed to load {}: {}", args.dump.display(), e);
            return Err(e);
        }
    };

    let rasterizer = Rc::new(RefCell::new(NullRasterizer::new()));
    let interrupts = Rc::new(RefCell::new(GspInterruptController::new()));
    let video = VideoCore::new(
        settings,
        Box::new(rasterizer.clone()),
        Box::new(PassthroughShaderEngine::new()),
        Box::new(interrupts.clone()),
    );

    let mut hw = HardwareManager::new(memory, video);
    hw.init();

    let recorder = args.trace.as_ref().map(|_| hw.start_trace());

    info!("Running {} byte command list at {:#010X}", list_bytes, args.address);
    hw.process_command_list(args.address, list_bytes as u32);
    let frames = hw.tick(FRAME_TICKS * args.frames) as u64;

    if let (Some(path), Some(recorder)) = (&args.trace, recorder) {
        hw.stop_trace();
        let trace = recorder.borrow().finish();
        trace.save_to_file(path)?;
        info!(
            "Trace written to {} ({} register writes, {} bytes of memory)",
            path.display(),
            trace.register_write_count(),
            trace.memory_bytes()
        );
    }

    hw.shutdown();

    let interrupts = interrupts.borrow();
    let summary = Summary {
        list_bytes,
        triangles: rasterizer.borrow().triangles(),
        batches: rasterizer.borrow().draw_calls(),
        frames,
        interrupts: InterruptId::ALL
            .iter()
            .map(|&id| (id.to_string(), interrupts.signal_count(id)))
            .filter(|(_, count)| *count > 0)
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
