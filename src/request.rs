use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    config::Defaults,
    error::{StillvidError, StillvidResult},
    frame::Resolution,
    paths,
    seed::SeedDuration,
};

pub const BITRATE_PRESETS: &[&str] = &["128k", "192k", "256k", "320k"];

/// Raw field values as a user typed them. Empty strings mean "use the default".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderForm {
    pub audio: String,
    pub image: String,
    pub output_dir: String,
    pub output_name: String,
    pub resolution: String,
    pub portrait: bool,
    pub seed: String,
    pub bitrate: String,
    pub no_clobber: bool,
}

impl RenderForm {
    /// A form pre-filled with configured defaults for the option fields.
    pub fn with_defaults(defaults: &Defaults) -> Self {
        Self {
            resolution: defaults.resolution.clone(),
            portrait: defaults.portrait,
            seed: defaults.seed.clone(),
            bitrate: defaults.bitrate.clone(),
            no_clobber: defaults.no_clobber,
            ..Self::default()
        }
    }
}

/// Audio bitrate in kbps, from text like `"192k"` or `"320 kbps"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioBitrate(pub u32);

impl AudioBitrate {
    pub fn parse(raw: &str) -> StillvidResult<Self> {
        let digits: String = raw
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            return Err(StillvidError::invalid_setting(format!(
                "bitrate '{raw}' contains no number"
            )));
        }
        let kbps = digits.parse::<u32>().map_err(|_| {
            StillvidError::invalid_setting(format!("bitrate '{raw}' is out of range"))
        })?;
        if kbps == 0 {
            return Err(StillvidError::invalid_setting("bitrate must be non-zero"));
        }
        Ok(Self(kbps))
    }

    pub fn kbps(self) -> u32 {
        self.0
    }
}

/// A fully validated render job. Built once per run and never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderRequest {
    pub audio_path: PathBuf,
    pub image_path: PathBuf,
    pub output_dir: PathBuf,
    /// Always ends in `.mp4`.
    pub output_name: String,
    pub resolution: Resolution,
    pub portrait: bool,
    pub seed: SeedDuration,
    pub audio_bitrate: AudioBitrate,
    pub no_clobber: bool,
}

impl RenderRequest {
    /// Validate and normalise a form without touching the filesystem or any external tool.
    ///
    /// Empty option fields fall back to `defaults`; an empty output directory falls back to
    /// the audio file's directory and an empty (or bare `.mp4`) name to the audio file's stem.
    pub fn resolve(form: &RenderForm, defaults: &Defaults) -> StillvidResult<Self> {
        let mut missing = Vec::new();
        if form.audio.trim().is_empty() {
            missing.push("audio");
        }
        if form.image.trim().is_empty() {
            missing.push("image");
        }
        if !missing.is_empty() {
            return Err(StillvidError::invalid_setting(format!(
                "incomplete fields: {} must be set",
                missing.join(" and ")
            )));
        }

        let pick = |value: &str, fallback: &str| -> String {
            if value.trim().is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };
        let resolution = Resolution::parse(&pick(&form.resolution, &defaults.resolution))?;
        let seed = SeedDuration::parse(&pick(&form.seed, &defaults.seed))?;
        let audio_bitrate = AudioBitrate::parse(&pick(&form.bitrate, &defaults.bitrate))?;

        let audio_path = paths::absolutize(&form.audio)?;
        let image_path = paths::absolutize(&form.image)?;

        let output_dir = if form.output_dir.trim().is_empty() {
            audio_path
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    StillvidError::invalid_path(format!(
                        "cannot derive an output directory from '{}'",
                        audio_path.display()
                    ))
                })?
        } else {
            paths::absolutize(&form.output_dir)?
        };

        let output_name = paths::ensure_mp4_extension(&form.output_name)
            .or_else(|| paths::default_output_name(&audio_path))
            .ok_or_else(|| {
                StillvidError::invalid_path(format!(
                    "cannot derive an output name from '{}'",
                    audio_path.display()
                ))
            })?;
        if output_name.contains(['/', '\\']) {
            return Err(StillvidError::invalid_path(format!(
                "output name '{output_name}' must be a file name, not a path"
            )));
        }

        Ok(Self {
            audio_path,
            image_path,
            output_dir,
            output_name,
            resolution,
            portrait: form.portrait,
            seed,
            audio_bitrate,
            no_clobber: form.no_clobber,
        })
    }
}

/// Result of one render. Produced exactly once per request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RenderOutcome {
    Success { path: PathBuf },
    Failure { message: String },
}

impl RenderOutcome {
    pub fn from_result(res: StillvidResult<PathBuf>) -> Self {
        match res {
            Ok(path) => Self::Success { path },
            Err(e) => Self::Failure {
                message: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
