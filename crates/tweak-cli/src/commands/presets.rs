//! Preset listing, inspection and saving.

use super::common::{EffectArgs, describe_params, load_preset};
use clap::Args;
use tweak_config::{
    Preset, ensure_user_presets_dir, factory_presets, is_factory_preset, list_all_presets,
    preset_name_from_path, system_presets_dir, user_presets_dir,
};

#[derive(Args)]
pub struct PresetsArgs {
    /// Show details of a preset (name or path)
    #[arg(long, value_name = "NAME", conflicts_with = "save")]
    show: Option<String>,

    /// Save the given effect flags as a user preset
    #[arg(long, value_name = "NAME")]
    save: Option<String>,

    /// Description for a saved preset
    #[arg(short, long, requires = "save")]
    description: Option<String>,

    /// Overwrite an existing user preset
    #[arg(long, requires = "save")]
    force: bool,

    /// Show preset directories
    #[arg(long)]
    paths: bool,

    #[command(flatten)]
    effects: EffectArgs,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    if args.paths {
        return show_paths();
    }
    if let Some(name) = &args.show {
        return show_preset(name);
    }
    if let Some(name) = &args.save {
        return save_preset(name, &args);
    }
    list_presets()
}

fn list_presets() -> anyhow::Result<()> {
    println!("Factory Presets:");
    println!("================");
    for preset in factory_presets() {
        let desc = preset.description.as_deref().unwrap_or("");
        println!("  {:20} - {}", preset.name, desc);
    }
    println!();

    println!("User Presets:");
    println!("=============");
    let on_disk = list_all_presets();
    if on_disk.is_empty() {
        println!("  (none)");
        println!();
        println!("  Create a preset with: tweak presets --save <name> --pitch 3 --reverb 0.4");
    } else {
        for path in on_disk {
            let name = preset_name_from_path(&path).unwrap_or_else(|| "unknown".into());
            match Preset::load(&path) {
                Ok(preset) => {
                    let desc = preset.description.as_deref().unwrap_or("");
                    println!("  {:20} - {}", name, desc);
                }
                Err(e) => println!("  {:20} - (error loading: {e})", name),
            }
        }
    }
    println!();

    Ok(())
}

fn show_preset(name: &str) -> anyhow::Result<()> {
    let preset = load_preset(name)?;

    println!("Preset: {}", preset.name);
    println!("{}", "=".repeat(8 + preset.name.len()));
    println!();

    if let Some(desc) = &preset.description {
        println!("Description: {}", desc);
        println!();
    }

    let params = &preset.effects;
    println!("Effects:");
    println!("  pitch_semitones = {}", params.pitch_semitones);
    println!("  reverb_amount   = {}", params.reverb_amount);
    println!("  volume          = {}", params.volume);
    println!("  speed           = {}", params.speed);
    println!("  playback rate   = {:.3}x", params.playback_rate());

    if !preset.render.is_empty() {
        println!();
        println!("Render:");
        if let Some(bits) = preset.render.bit_depth {
            println!("  bit_depth  = {bits}");
        }
        if let Some(block) = preset.render.block_size {
            println!("  block_size = {block}");
        }
        if let Some(seed) = preset.render.seed {
            println!("  seed       = {seed}");
        }
    }

    println!();
    println!("TOML:");
    print!("{}", preset.to_toml()?);

    Ok(())
}

fn save_preset(name: &str, args: &PresetsArgs) -> anyhow::Result<()> {
    if is_factory_preset(name) {
        anyhow::bail!("'{name}' is a factory preset name. Choose a different name.");
    }

    let (params, render) = args.effects.resolve()?;

    let dir = ensure_user_presets_dir()?;
    let preset_path = dir.join(format!("{name}.toml"));
    if preset_path.exists() && !args.force {
        anyhow::bail!("Preset '{name}' already exists. Use --force to overwrite.");
    }

    let mut preset = Preset::new(name).with_effects(params).with_render(render);
    if let Some(desc) = &args.description {
        preset = preset.with_description(desc.as_str());
    }
    preset.save(&preset_path)?;

    println!("Saved preset '{}' ({})", name, describe_params(&params));
    println!("  {}", preset_path.display());
    Ok(())
}

fn show_paths() -> anyhow::Result<()> {
    println!("Preset Directories:");
    println!("  User:   {}", user_presets_dir().display());
    println!("  System: {}", system_presets_dir().display());
    Ok(())
}
