//! Shared CLI helpers used across multiple commands.

use clap::Args;
use tweak_config::{Preset, RenderSettings};
use tweak_core::EffectParameters;

/// Effect parameter flags shared by `render` and `play`.
///
/// A preset supplies the starting values; explicit flags override them.
#[derive(Args, Debug, Default, Clone)]
pub struct EffectArgs {
    /// Pitch shift in semitones (also changes duration)
    #[arg(long, allow_negative_numbers = true)]
    pub pitch: Option<f32>,

    /// Reverb amount, 0 to 1
    #[arg(long)]
    pub reverb: Option<f32>,

    /// Output volume, 0 to 5
    #[arg(long)]
    pub volume: Option<f32>,

    /// Playback speed, 0.25 to 4
    #[arg(long)]
    pub speed: Option<f32>,

    /// Preset name or path to a preset TOML file
    #[arg(short, long)]
    pub preset: Option<String>,
}

impl EffectArgs {
    /// Resolves the preset, applies the overrides and validates the result.
    pub fn resolve(&self) -> anyhow::Result<(EffectParameters, RenderSettings)> {
        let (mut params, render) = match &self.preset {
            Some(name) => {
                let preset = load_preset(name)?;
                println!("Using preset: {}", preset.name);
                (preset.effects, preset.render)
            }
            None => (EffectParameters::default(), RenderSettings::default()),
        };

        if let Some(pitch) = self.pitch {
            params.pitch_semitones = pitch;
        }
        if let Some(reverb) = self.reverb {
            params.reverb_amount = reverb;
        }
        if let Some(volume) = self.volume {
            params.volume = volume;
        }
        if let Some(speed) = self.speed {
            params.speed = speed;
        }

        params.validate()?;
        Ok((params, render))
    }
}

/// Load a preset by factory name, path, or name in the preset directories.
pub fn load_preset(name: &str) -> anyhow::Result<Preset> {
    Preset::resolve(name).map_err(|e| {
        anyhow::anyhow!("{e}. Use 'tweak presets' to see available presets.")
    })
}

/// One-line summary of the active parameters.
pub fn describe_params(params: &EffectParameters) -> String {
    format!(
        "pitch {:+.1} st, reverb {:.2}, volume {:.2}, speed {:.2}x",
        params.pitch_semitones, params.reverb_amount, params.volume, params.speed
    )
}

/// Formats seconds as `m:ss`. Negative and non-finite values show as `0:00`.
pub fn format_time(secs: f64) -> String {
    let whole = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", whole / 60, whole % 60)
}
