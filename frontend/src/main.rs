use std::path::PathBuf;

use clap::Parser;
use invaders_core::core::Machine;
use invaders_machine::SpaceInvadersCabinet;

mod emulator;
mod input;
mod overlay;
mod rom_path;
mod video;

/// Space Invaders cabinet emulator.
#[derive(Parser)]
struct Args {
    /// Directory containing invaders.h/g/f/e. Defaults to ./invaders.
    #[arg(long, value_name = "PATH")]
    rom_dir: Option<PathBuf>,

    /// Window scale factor.
    #[arg(long, default_value_t = 3)]
    scale: u32,
}

fn main() {
    let args = Args::parse();
    let rom_dir = args.rom_dir.unwrap_or_else(|| PathBuf::from("invaders"));

    let rom_set = rom_path::load_rom_set(&rom_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load ROMs from {}: {e}", rom_dir.display());
        std::process::exit(1);
    });

    let mut cabinet = SpaceInvadersCabinet::new();
    cabinet.load_roms(&rom_set).unwrap_or_else(|e| {
        eprintln!("Failed to map program ROMs: {e}");
        std::process::exit(1);
    });

    let key_map = input::default_key_map(cabinet.input_map());
    cabinet.reset();
    emulator::run(&mut cabinet, &key_map, args.scale);
}
