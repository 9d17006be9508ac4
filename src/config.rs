//! JSON configuration: tool locations, encoder knobs, and form defaults.
//!
//! Every field is optional; a missing file means built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::error::{StillvidError, StillvidResult};

pub const CONFIG_ENV: &str = "STILLVID_CONFIG";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub tools: ToolSettings,
    pub encoder: EncoderSettings,
    pub defaults: Defaults,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolSettings {
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
    pub extra_search_dirs: Vec<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderSettings {
    pub video_codec: String,
    pub pixel_format: String,
    pub preset: String,
    pub audio_codec: String,
    /// Constant output frame rate for the seed segment. `None` leaves ffmpeg's default.
    pub framerate: Option<u32>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            preset: "veryfast".to_string(),
            audio_codec: "aac".to_string(),
            framerate: None,
        }
    }
}

/// Values used when the caller leaves a form field empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    pub resolution: String,
    pub seed: String,
    pub bitrate: String,
    pub no_clobber: bool,
    pub portrait: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            resolution: "1920x1080".to_string(),
            seed: "60s".to_string(),
            bitrate: "192k".to_string(),
            no_clobber: true,
            portrait: false,
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> StillvidResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json(&text)
            .map_err(|e| StillvidError::invalid_setting(format!("config '{}': {e}", path.display())))
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// `explicit` first, then `$STILLVID_CONFIG`, then the per-user config file if present.
    pub fn load(explicit: Option<&Path>) -> StillvidResult<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> StillvidResult<()> {
        if self.encoder.framerate == Some(0) {
            return Err(StillvidError::invalid_setting("encoder framerate must be non-zero"));
        }
        for (field, value) in [
            ("video_codec", &self.encoder.video_codec),
            ("pixel_format", &self.encoder.pixel_format),
            ("preset", &self.encoder.preset),
            ("audio_codec", &self.encoder.audio_codec),
        ] {
            if value.trim().is_empty() {
                return Err(StillvidError::invalid_setting(format!(
                    "encoder {field} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("stillvid").join("config.json"))
}
