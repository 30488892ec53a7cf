//! Synthetic reverb impulse export.

use anyhow::Context;
use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tweak_core::impulse::decay_seconds;
use tweak_core::{AudioBuffer, EffectParameters, synthesize, synthesize_with_rng};
use tweak_io::{WavFormat, write_wav};

#[derive(Args)]
pub struct ImpulseArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Reverb amount, 0 to 1; sets the decay time
    #[arg(long)]
    reverb: f32,

    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Seed for the noise source
    #[arg(long)]
    seed: Option<u64>,

    /// Scale by the gain the convolver applies
    #[arg(long)]
    normalize: bool,

    /// Output bit depth (16, 24, or 32 for float)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

pub fn run(args: ImpulseArgs) -> anyhow::Result<()> {
    EffectParameters::default()
        .with_reverb(args.reverb)
        .validate()?;
    if args.sample_rate == 0 {
        anyhow::bail!("sample rate must be non-zero");
    }
    let format = WavFormat::from_bits(args.bit_depth).with_context(|| {
        format!(
            "unsupported bit depth {} (expected 16, 24 or 32)",
            args.bit_depth
        )
    })?;

    let ir = match args.seed {
        Some(seed) => synthesize_with_rng(
            args.sample_rate,
            args.reverb,
            &mut StdRng::seed_from_u64(seed),
        ),
        None => synthesize(args.sample_rate, args.reverb),
    };

    let scale = if args.normalize {
        ir.normalization_scale()
    } else {
        1.0
    };
    let channels = ir
        .channels()
        .iter()
        .map(|ch| ch.iter().map(|s| s * scale).collect())
        .collect();
    let buffer = AudioBuffer::new(channels, ir.sample_rate())?;

    println!(
        "Impulse: {} channel(s), {} frames, {} Hz, decay {:.2}s",
        buffer.channel_count(),
        buffer.frame_count(),
        buffer.sample_rate(),
        decay_seconds(args.reverb)
    );
    write_wav(&args.output, &buffer, format)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());

    Ok(())
}
