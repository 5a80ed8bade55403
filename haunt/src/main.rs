use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use shade::cpu::Cpu;
use shade::dispatch::DecodeState;
use shade::Gameboy;
use tracing::error;
use tracing::info;
use tracing::level_filters::LevelFilter;

mod config;

use config::Config;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The path to the ROM to run.
    rom: PathBuf,
    /// The path to the config file. Defaults to `haunt.toml`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// The number of steps to run. Overrides the config.
    #[arg(long)]
    steps: Option<u64>,
    /// The log level. Overrides the config.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("[haunt] {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(steps) = args.steps {
        config.max_steps = steps;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    let level = match LevelFilter::from_str(&config.log_level) {
        Ok(level) => level,
        Err(err) => {
            eprintln!("[haunt] bad log level \"{}\": {err}", config.log_level);
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let rom = match std::fs::read(&args.rom) {
        Ok(rom) => rom,
        Err(err) => {
            error!("Could not read {}: {err}", args.rom.display());
            return ExitCode::FAILURE;
        }
    };
    let mut gb = match boot(rom, config.post_boot) {
        Ok(gb) => gb,
        Err(err) => {
            error!("Could not load {}: {err}", args.rom.display());
            return ExitCode::FAILURE;
        }
    };
    info!("Constructed GB");

    let mut ticks = 0u64;
    let mut steps = 0u64;
    let mut digest = ExitCode::SUCCESS;
    while steps < config.max_steps {
        if config.trace_instructions {
            trace_next(&gb);
        }
        match gb.step() {
            Ok(n) => ticks += n as u64,
            Err(err) => {
                error!("Step {steps} failed: {err}");
                digest = ExitCode::FAILURE;
                break;
            }
        }
        steps += 1;
        // Nothing can wake the CPU without interrupts, so there is no point in idling
        if !gb.is_running() {
            info!("CPU entered the {} state", gb.cpu.state);
            break;
        }
    }
    info!("Ran {steps} steps ({ticks} ticks)");
    println!("{}", gb.cpu);
    digest
}

fn boot(rom: Vec<u8>, post_boot: bool) -> Result<Gameboy, shade::Error> {
    if post_boot {
        return Gameboy::new(rom);
    }
    let mut gb = Gameboy::without_cartridge();
    gb.load_cartridge(rom)?;
    gb.cpu = Cpu::new();
    Ok(gb)
}

/// Logs the instruction that the next step will run.
fn trace_next(gb: &Gameboy) {
    let pc = gb.cpu.pc.0;
    let Ok(opcode) = gb.read_byte(pc) else {
        return;
    };
    let prefixed = gb.dispatcher().state() == DecodeState::Prefixed;
    let desc = gb.dispatcher().table().lookup(opcode, prefixed);
    info!("0x{pc:0>4X}: {desc} (0x{opcode:0>2X})");
}
