//! Command-line front-end: reads a game description, writes a ROM.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cartforge::game::Game;
use cartforge::Builder;

/// Compile a declarative game description into a bootable NES ROM.
#[derive(Debug, Parser)]
#[command(name = "cartforge", version, about)]
struct Args {
    /// Path to the game description, as JSON.
    #[arg(long)]
    game: PathBuf,

    /// Name of the scene to boot into.
    #[arg(long)]
    scene: String,

    /// Output .nes file path.
    #[arg(long, default_value = "out.nes")]
    out: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let raw = fs::read_to_string(&args.game)
        .with_context(|| format!("reading game description from {}", args.game.display()))?;
    let game: Game = serde_json::from_str(&raw)
        .with_context(|| format!("parsing game description from {}", args.game.display()))?;

    info!(
        "building \"{}\" from scene \"{}\" -> {}",
        game.name,
        args.scene,
        args.out.display()
    );

    let rom = Builder::build(Some(&game), &args.scene).context("compiling ROM")?;

    fs::write(&args.out, &rom).with_context(|| format!("writing ROM to {}", args.out.display()))?;

    info!("wrote {} bytes to {}", rom.len(), args.out.display());
    Ok(())
}
