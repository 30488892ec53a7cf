//! tweak CLI - render, play and inspect audio through the tweak effect graph.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tweak")]
#[command(author, version, about = "Pitch, speed, reverb and volume for audio files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a WAV file through the effects to a new WAV file
    Render(commands::render::RenderArgs),

    /// Play a WAV file with live, adjustable effects
    Play(commands::play::PlayArgs),

    /// Show WAV file information
    Info(commands::info::InfoArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),

    /// List and show presets
    Presets(commands::presets::PresetsArgs),

    /// Write a synthetic reverb impulse response to a WAV file
    Impulse(commands::impulse::ImpulseArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Impulse(args) => commands::impulse::run(args),
    }
}
