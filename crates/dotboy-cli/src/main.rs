mod capture;
mod config;
mod input;
mod pacer;

use clap::Parser;
use dotboy_core::{cartridge::Cartridge, disasm, gameboy::GameBoy};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

use capture::Capture;
use input::{Inputs, ScriptedInput, StdinInput};
use pacer::FixedPacer;

#[derive(Parser)]
#[command(name = "dotboy", about = "Headless DMG Game Boy emulator")]
struct Args {
    /// Path to ROM file
    rom: PathBuf,

    /// Path to boot ROM file; starts from the power-on state
    #[arg(long)]
    bootrom: Option<PathBuf>,

    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to run
    #[arg(long)]
    frames: Option<u64>,

    /// Number of CPU cycles to run, checked at frame boundaries
    #[arg(long)]
    cycles: Option<u64>,

    /// Write the last presented frame to this PNG file
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Throttle to the hardware frame rate
    #[arg(long)]
    pace: bool,

    /// Read `press <button>` / `release <button>` lines from stdin
    #[arg(long)]
    stdin_input: bool,

    /// Print CPU state every 60 frames
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let cfg = config::load_from_file(&config_path);

    let bootrom = args.bootrom.clone().or(cfg.boot_rom.clone());
    let frame_limit = args.frames.or(cfg.frames);
    let screenshot = args.screenshot.clone().or(cfg.screenshot.clone());
    let pace = args.pace || cfg.pace;

    let cart = match Cartridge::from_file(&args.rom) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load ROM {}: {e}", args.rom.display());
            return ExitCode::FAILURE;
        }
    };

    let boot = bootrom.and_then(|path| match std::fs::read(&path) {
        Ok(data) => Some(data),
        Err(e) => {
            warn!("Failed to load boot ROM {}: {e}", path.display());
            None
        }
    });

    let mut gb = match boot {
        Some(data) => {
            let mut gb = GameBoy::new_power_on();
            gb.load_boot_rom(data);
            gb
        }
        None => GameBoy::new(),
    };
    gb.load_cart(cart);

    let mut inputs = Inputs {
        scripted: ScriptedInput::new(&cfg.input),
        stdin: args.stdin_input.then(StdinInput::spawn),
    };
    let mut capture = Capture::new();
    let mut pacer = FixedPacer::new(pace);

    let mut total_cycles = 0u64;
    let mut runs = 0u64;
    loop {
        inputs.scripted.set_frame(gb.frame_count());
        total_cycles += u64::from(gb.run_frame(&mut capture, &mut inputs, &mut pacer));
        runs += 1;

        if args.debug && runs.is_multiple_of(60) {
            let pc = gb.cpu.regs.pc;
            let next = disasm::disassemble(pc, |addr| gb.mmu.read_byte(addr));
            println!("{} {pc:04X}: {next}", gb.cpu.debug_state());
        }

        if let Some(max) = frame_limit
            && runs >= max
        {
            break;
        }
        if let Some(max) = args.cycles
            && total_cycles >= max
        {
            break;
        }
    }

    info!(
        "Ran {runs} frames ({} presented), {total_cycles} cycles",
        capture.presented
    );

    if let Some(path) = screenshot {
        if let Err(e) = capture::save_png(&path, &capture.frame) {
            error!("Failed to write screenshot {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        info!("Saved screenshot to {}", path.display());
    }

    ExitCode::SUCCESS
}
