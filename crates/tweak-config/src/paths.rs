//! Where presets live on disk.
//!
//! | Kind           | Linux                      | macOS                                         | Windows                  |
//! |----------------|----------------------------|-----------------------------------------------|--------------------------|
//! | User presets   | `~/.config/tweak/presets/` | `~/Library/Application Support/tweak/presets/` | `%APPDATA%\tweak\presets\` |
//! | System presets | `/usr/share/tweak/presets/`| `/Library/Application Support/tweak/presets/`  | `%PROGRAMDATA%\tweak\presets\` |
//!
//! ```rust,no_run
//! use tweak_config::paths;
//!
//! if let Some(path) = paths::find_preset("late_night") {
//!     println!("found {}", path.display());
//! }
//! ```

use std::path::{Path, PathBuf};

const APP_NAME: &str = "tweak";
const PRESETS_SUBDIR: &str = "presets";

/// Per-user configuration directory. Falls back to `./tweak` when the
/// platform has none.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Per-user presets directory.
pub fn user_presets_dir() -> PathBuf {
    user_config_dir().join(PRESETS_SUBDIR)
}

/// System-wide, usually read-only, presets directory.
pub fn system_presets_dir() -> PathBuf {
    let base = if cfg!(target_os = "linux") {
        PathBuf::from("/usr/share")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support")
    } else {
        dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
    };
    base.join(APP_NAME).join(PRESETS_SUBDIR)
}

/// Finds a preset file.
///
/// `name` is tried as a path first, then as a file name (`.toml` added when
/// missing) in the user directory, then in the system directory.
pub fn find_preset(name: &str) -> Option<PathBuf> {
    let direct = PathBuf::from(name);
    if direct.is_file() {
        return Some(direct);
    }

    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };

    [user_presets_dir(), system_presets_dir()]
        .into_iter()
        .map(|dir| dir.join(&filename))
        .find(|path| path.is_file())
}

/// Creates the user presets directory if needed and returns it.
pub fn ensure_user_presets_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_presets_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// Preset files in the user directory, then the system directory.
///
/// Missing or unreadable directories contribute nothing.
pub fn list_all_presets() -> Vec<PathBuf> {
    let mut presets = presets_in(&user_presets_dir());
    presets.extend(presets_in(&system_presets_dir()));
    presets
}

fn presets_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    found.sort();
    found
}

/// Preset name for a file: its stem.
///
/// ```rust
/// use std::path::Path;
/// use tweak_config::paths::preset_name_from_path;
///
/// let name = preset_name_from_path(Path::new("/presets/late_night.toml"));
/// assert_eq!(name.as_deref(), Some("late_night"));
/// ```
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn dirs_are_namespaced() {
        assert!(user_presets_dir().ends_with("tweak/presets"));
        assert!(user_config_dir().ends_with("tweak"));
        assert!(system_presets_dir().ends_with("tweak/presets"));
    }

    #[test]
    fn find_by_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mine.toml");
        fs::write(&path, "name = \"mine\"").unwrap();
        assert_eq!(find_preset(path.to_str().unwrap()), Some(path));
    }

    #[test]
    fn find_missing() {
        assert!(find_preset("nonexistent_preset_12345").is_none());
    }

    #[test]
    fn lists_only_toml_sorted() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.toml"), "").unwrap();
        fs::write(temp.path().join("a.toml"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();
        fs::create_dir(temp.path().join("dir.toml")).unwrap();

        let found = presets_in(temp.path());
        let names: Vec<_> = found
            .iter()
            .filter_map(|p| preset_name_from_path(p))
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn missing_dir_lists_nothing() {
        assert!(presets_in(Path::new("/nonexistent/path/12345")).is_empty());
    }
}
