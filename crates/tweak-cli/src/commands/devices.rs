//! Audio output device listing.

use clap::{Args, Subcommand};
use tweak_io::{default_output_device, find_output_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all output devices
    List,

    /// Show the default output device
    Info,

    /// Check which device a `--output` value selects
    Find {
        /// Device index, exact name, or partial name
        query: String,
    },
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = list_devices()?;

            if devices.is_empty() {
                println!("No audio output devices found.");
                return Ok(());
            }

            println!("Output Devices");
            println!("==============\n");
            for device in &devices {
                let marker = if device.is_default { " (default)" } else { "" };
                println!(
                    "  [{}] {} ({} Hz, {} ch){}",
                    device.index,
                    device.name,
                    device.default_sample_rate,
                    device.default_channels,
                    marker
                );
            }
            println!();
            println!("Total: {} output(s)", devices.len());
            println!();
            println!("Tip: Use device index or partial name with --output:");
            println!("  tweak play song.wav --output 0");
            println!("  tweak play song.wav --output \"USB\"");
        }

        DevicesCommand::Info => match default_output_device()? {
            Some(device) => {
                println!("Default Output:");
                println!("  Name: {}", device.name);
                println!("  Sample Rate: {} Hz", device.default_sample_rate);
                println!("  Channels: {}", device.default_channels);
            }
            None => println!("Default Output: None"),
        },

        DevicesCommand::Find { query } => {
            let device = find_output_device(&query)?;
            println!("[{}] {}", device.index, device.name);
        }
    }

    Ok(())
}
