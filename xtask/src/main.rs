use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development tasks for picarx")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// fmt check, clippy and the full test suite
    Ci,
    /// Format the workspace
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Lint every target, warnings are errors unless fixing
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Run tests, optionally restricted to some core modules
    Test {
        /// Module to test (repeatable)
        #[arg(short, long, value_enum)]
        module: Vec<Module>,
        /// Doc tests only
        #[arg(long)]
        doc: bool,
    },
    /// Run the command list benchmarks
    Bench {
        /// Criterion filter, e.g. `uniform_burst`
        filter: Option<String>,
    },
    /// Replay a command list dump through the picarx binary
    Replay {
        dump: PathBuf,
        /// Physical address the dump is loaded at
        #[arg(long)]
        address: Option<String>,
        /// Frames to run after the list
        #[arg(long)]
        frames: Option<u32>,
        /// Record a trace to this file
        #[arg(short, long)]
        trace: Option<PathBuf>,
        #[arg(long)]
        release: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Module {
    Pica,
    Gpu,
    Lcd,
    Memory,
    Hw,
    Debugger,
}

impl Module {
    fn path(self) -> &'static str {
        match self {
            Module::Pica => "core::pica",
            Module::Gpu => "core::gpu",
            Module::Lcd => "core::lcd",
            Module::Memory => "core::memory",
            Module::Hw => "core::hw",
            Module::Debugger => "core::debugger",
        }
    }
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Task::Ci => ci(),
        Task::Fmt { check } => run(fmt(check)),
        Task::Clippy { fix } => run(clippy(fix)),
        Task::Test { module, doc } => test(&module, doc),
        Task::Bench { filter } => {
            let mut cmd = cargo("bench");
            cmd.args(["--bench", "command_bench"]);
            if let Some(filter) = filter {
                cmd.arg("--").arg(filter);
            }
            run(cmd)
        }
        Task::Replay {
            dump,
            address,
            frames,
            trace,
            release,
        } => replay(dump, address, frames, trace, release),
    }
}

fn cargo(subcommand: &str) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg(subcommand);
    cmd
}

fn fmt(check: bool) -> Command {
    let mut cmd = cargo("fmt");
    cmd.arg("--all");
    if check {
        cmd.args(["--", "--check"]);
    }
    cmd
}

fn clippy(fix: bool) -> Command {
    let mut cmd = cargo("clippy");
    cmd.args(["--workspace", "--all-targets"]);
    if fix {
        cmd.args(["--fix", "--allow-dirty"]);
    } else {
        cmd.args(["--", "-D", "warnings"]);
    }
    cmd
}

fn ci() -> Result<()> {
    println!("{}", "=== picarx CI ===".bold().blue());
    let start = Instant::now();

    step("fmt", fmt(true))?;
    step("clippy", clippy(false))?;
    step("test", cargo("test"))?;

    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn test(modules: &[Module], doc: bool) -> Result<()> {
    if doc {
        let mut cmd = cargo("test");
        cmd.arg("--doc");
        return run(cmd);
    }
    if modules.is_empty() {
        return run(cargo("test"));
    }

    let mut failed = Vec::new();
    for module in modules {
        let mut cmd = cargo("test");
        cmd.args(["--lib", module.path()]);
        if step(module.path(), cmd).is_err() {
            failed.push(module.path());
        }
    }

    if !failed.is_empty() {
        bail!("tests failed in {}", failed.join(", "));
    }
    Ok(())
}

fn replay(
    dump: PathBuf,
    address: Option<String>,
    frames: Option<u32>,
    trace: Option<PathBuf>,
    release: bool,
) -> Result<()> {
    if !dump.is_file() {
        bail!("dump not found: {}", dump.display());
    }

    let mut cmd = cargo("run");
    cmd.args(["--bin", "picarx"]);
    if release {
        cmd.arg("--release");
    }
    cmd.arg("--").arg(&dump);
    if let Some(address) = address {
        cmd.args(["--address", &address]);
    }
    if let Some(frames) = frames {
        cmd.args(["--frames", &frames.to_string()]);
    }
    if let Some(trace) = &trace {
        cmd.arg("--trace").arg(trace);
    }

    println!("{} replaying {}", "→".blue(), dump.display().to_string().cyan());
    run(cmd)?;
    if let Some(trace) = trace {
        println!("{} trace written to {}", "✓".green(), trace.display());
    }
    Ok(())
}

/// Run `cmd` with a labelled pass/fail line
fn step(name: &str, cmd: Command) -> Result<()> {
    println!("{} {}", "→".blue(), name.bold());
    let start = Instant::now();
    match run(cmd) {
        Ok(()) => {
            println!(
                "{} {} ({:.2}s)",
                "✓".green().bold(),
                name,
                start.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red().bold(), name);
            Err(e)
        }
    }
}

fn run(mut cmd: Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;
    if !status.success() {
        bail!("{:?} failed: {}", cmd, status);
    }
    Ok(())
}
