//! Display WAV file metadata.

use clap::Args;
use tweak_io::{SampleEncoding, read_wav_info};

/// Display WAV file information.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the WAV file
    pub file: std::path::PathBuf,

    /// Print machine-readable JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let info = read_wav_info(&args.file)?;
    let file_size = std::fs::metadata(&args.file)?.len();

    let format_str = match info.encoding {
        SampleEncoding::Pcm => "PCM",
        SampleEncoding::IeeeFloat => "IEEE Float",
    };

    if args.json {
        let value = serde_json::json!({
            "file": args.file.display().to_string(),
            "format": format_str,
            "bits_per_sample": info.bits_per_sample,
            "channels": info.channels,
            "sample_rate": info.sample_rate,
            "frames": info.num_frames,
            "duration_secs": info.duration_secs,
            "file_size": file_size,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File:        {}", args.file.display());
    println!("Format:      {} {}-bit", format_str, info.bits_per_sample);
    println!("Channels:    {}", info.channels);
    println!("Sample Rate: {} Hz", info.sample_rate);
    println!(
        "Duration:    {:.3}s ({} frames)",
        info.duration_secs, info.num_frames
    );
    println!("File Size:   {}", format_bytes(file_size));

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_sizes() {
        assert_eq!(format_bytes(44), "44 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
