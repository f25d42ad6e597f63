use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BurninError, Result};
use crate::options::BurnOptions;

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_font_path() -> PathBuf {
    PathBuf::from("resources/fonts/LiberationSans-Regular.ttf")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub media: MediaConfig,
    /// Base look of every burn-in, overridden per job
    #[serde(default)]
    pub options: BurnOptions,
    #[serde(default)]
    pub fonts: FontConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    /// Font used when a job does not name one
    #[serde(default = "default_font_path")]
    pub default_font: PathBuf,
    /// Also escape `/` separators in font paths on Windows.
    /// Backslash separators and drive colons are always escaped there.
    #[serde(default)]
    pub escape_forward_slashes: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            default_font: default_font_path(),
            escape_forward_slashes: false,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BurninError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| BurninError::Config(format!("Failed to parse config file: {}", e)))?;
        config.options.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BurninError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| BurninError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
