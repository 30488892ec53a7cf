//! Offline rendering command.

use super::common::{EffectArgs, describe_params};
use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tweak_core::{DEFAULT_BLOCK_SIZE, OfflineRenderer};
use tweak_io::{WavFormat, read_wav, write_wav};

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    effects: EffectArgs,

    /// Output bit depth (16, 24, or 32 for float) [default: 16]
    #[arg(long)]
    bit_depth: Option<u16>,

    /// Processing block size in frames [default: 512]
    #[arg(long)]
    block_size: Option<usize>,

    /// Seed for the reverb impulse, for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let (params, settings) = args.effects.resolve()?;

    let bits = args.bit_depth.or(settings.bit_depth).unwrap_or(16);
    let format = WavFormat::from_bits(bits)
        .with_context(|| format!("unsupported bit depth {bits} (expected 16, 24 or 32)"))?;
    let block_size = args
        .block_size
        .or(settings.block_size)
        .unwrap_or(DEFAULT_BLOCK_SIZE);
    if block_size == 0 {
        anyhow::bail!("block size must be at least 1");
    }
    let seed = args.seed.or(settings.seed);

    println!("Reading {}...", args.input.display());
    let input = Arc::new(
        read_wav(&args.input).with_context(|| format!("reading {}", args.input.display()))?,
    );
    println!(
        "  {} frames, {} channel(s), {} Hz, {:.2}s",
        input.frame_count(),
        input.channel_count(),
        input.sample_rate(),
        input.duration_secs()
    );

    let stages = match seed {
        Some(seed) => params.seeded_stages(seed),
        None => params.stages(),
    };
    println!("Rendering with {}...", describe_params(&params));

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(params.output_frames(input.frame_count()) as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let output = OfflineRenderer::new()
        .with_block_size(block_size)
        .render_with_progress(&input, &stages, |done, total| {
            pb.set_length(total);
            pb.set_position(done);
        })?;
    pb.finish_and_clear();

    println!(
        "  {} frames, {:.2}s, peak {:.1} dB",
        output.frame_count(),
        output.duration_secs(),
        linear_to_db(output.peak())
    );
    if output.peak() > 1.0 {
        println!("  warning: output exceeds full scale and will clip in PCM formats");
    }

    println!("Writing {} ({bits}-bit)...", args.output.display());
    write_wav(&args.output, &output, format)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Done!");

    Ok(())
}

fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}
