//! Factory presets bundled with tweak.
//!
//! Always available without external files. They are embedded as TOML, so
//! they double as format examples.

use crate::Preset;

/// Factory preset names, in listing order.
pub static FACTORY_PRESET_NAMES: &[&str] =
    &["dry", "chipmunk", "deep", "hall", "slowed-reverb", "boost"];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("dry", DRY_PRESET),
    ("chipmunk", CHIPMUNK_PRESET),
    ("deep", DEEP_PRESET),
    ("hall", HALL_PRESET),
    ("slowed-reverb", SLOWED_REVERB_PRESET),
    ("boost", BOOST_PRESET),
];

const DRY_PRESET: &str = r#"
name = "Dry"
description = "No processing - output equals input"
"#;

const CHIPMUNK_PRESET: &str = r#"
name = "Chipmunk"
description = "One octave up, half the length"

[effects]
pitch_semitones = 12.0
volume = 0.9
"#;

const DEEP_PRESET: &str = r#"
name = "Deep"
description = "Five semitones down with a little room"

[effects]
pitch_semitones = -5.0
reverb_amount = 0.15
"#;

const HALL_PRESET: &str = r#"
name = "Hall"
description = "Long synthetic hall, mostly wet"

[effects]
reverb_amount = 0.6
volume = 0.9
"#;

const SLOWED_REVERB_PRESET: &str = r#"
name = "Slowed + Reverb"
description = "Slower and lower, washed in reverb"

[effects]
speed = 0.85
reverb_amount = 0.4

[render]
bit_depth = 24
"#;

const BOOST_PRESET: &str = r#"
name = "Boost"
description = "Plain gain, may clip on hot material"

[effects]
volume = 1.8
"#;

/// All factory presets.
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| Preset::from_toml(toml).ok())
        .collect()
}

/// Gets a factory preset by key (`"slowed-reverb"`) or display name
/// (`"Slowed + Reverb"`), case-insensitively.
pub fn get_factory_preset(name: &str) -> Option<Preset> {
    let name_lower = name.to_lowercase();

    if let Some((_, toml)) = FACTORY_PRESETS_TOML
        .iter()
        .find(|(key, _)| key.to_lowercase() == name_lower)
    {
        return Preset::from_toml(toml).ok();
    }

    factory_presets()
        .into_iter()
        .find(|p| p.name.to_lowercase() == name_lower)
}

/// True if `name` matches a factory preset key or display name.
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}
