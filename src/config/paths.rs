//! Application paths.
//!
//! Config file lookup order:
//!   1. `./config.toml` in the working directory
//!   2. the platform config dir (via the `dirs` crate):
//!      Windows: %APPDATA%\emotion-tts\config.toml
//!      macOS:   ~/Library/Application Support/emotion-tts/config.toml
//!      Linux:   ~/.config/emotion-tts/config.toml
//!
//! Outputs are always written under `./outputs/`:
//!   outputs/emotions/  tagged annotation JSON
//!   outputs/audios/    synthesized audio

use std::path::{Path, PathBuf};

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Full path to `config.toml`.
    pub config_file: PathBuf,
    /// Directory for annotation JSON written by the tagger.
    pub emotions_dir: PathBuf,
    /// Directory for synthesized audio.
    pub audios_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "emotion-tts";
    const CONFIG_FILE: &'static str = "config.toml";

    pub fn new() -> Self {
        let local = PathBuf::from(Self::CONFIG_FILE);
        let config_file = if local.exists() {
            local
        } else {
            dirs::config_dir()
                .map(|dir| dir.join(Self::APP_NAME).join(Self::CONFIG_FILE))
                .unwrap_or(local)
        };

        Self::with_config(config_file, Path::new("."))
    }

    /// Paths with an explicit config file and an explicit output root.
    pub fn with_config(config_file: PathBuf, root: &Path) -> Self {
        let outputs = root.join("outputs");
        Self {
            config_file,
            emotions_dir: outputs.join("emotions"),
            audios_dir: outputs.join("audios"),
        }
    }

    /// `outputs/emotions/{list-stem}_emotion_annotation.json`
    pub fn annotation_output(&self, list_file: &Path) -> PathBuf {
        let stem = list_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "list".into());
        self.emotions_dir
            .join(format!("{stem}_emotion_annotation.json"))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths
            .config_file
            .file_name()
            .is_some_and(|n| n == "config.toml"));
        assert!(paths.emotions_dir.ends_with("outputs/emotions"));
        assert!(paths.audios_dir.ends_with("outputs/audios"));
    }

    #[test]
    fn annotation_output_uses_list_stem() {
        let paths = AppPaths::with_config("config.toml".into(), Path::new("/work"));
        let out = paths.annotation_output(Path::new("/data/lists/amiya.list"));
        assert_eq!(
            out,
            PathBuf::from("/work/outputs/emotions/amiya_emotion_annotation.json")
        );
    }
}
