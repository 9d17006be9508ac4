use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::error::{StillvidError, StillvidResult};

/// Reports the total duration of a media file in seconds.
pub trait AudioProber: Send + Sync {
    fn duration_secs(&self, media: &Path) -> StillvidResult<f64>;
}

/// [`AudioProber`] backed by the system `ffprobe`.
#[derive(Clone, Debug)]
pub struct FfprobeProber {
    program: PathBuf,
}

impl FfprobeProber {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

pub fn probe_args(media: &Path) -> Vec<std::ffi::OsString> {
    let mut args: Vec<std::ffi::OsString> = [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .into_iter()
    .map(Into::into)
    .collect();
    args.push(media.as_os_str().to_owned());
    args
}

impl AudioProber for FfprobeProber {
    fn duration_secs(&self, media: &Path) -> StillvidResult<f64> {
        tracing::debug!(program = %self.program.display(), media = %media.display(), "probing duration");
        let out = Command::new(&self.program)
            .args(probe_args(media))
            .output()
            .map_err(|e| {
                StillvidError::probe(format!(
                    "failed to run '{}': {e}",
                    self.program.display()
                ))
            })?;

        if !out.status.success() {
            return Err(StillvidError::probe(format!(
                "ffprobe exited with status {} for '{}': {}",
                out.status,
                media.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        parse_duration(&String::from_utf8_lossy(&out.stdout))
    }
}

/// Parse the bare seconds value ffprobe prints, e.g. `"183.066122\n"`.
pub fn parse_duration(stdout: &str) -> StillvidResult<f64> {
    let text = stdout.trim();
    let secs = text.parse::<f64>().map_err(|_| {
        StillvidError::probe(format!("duration output is not a number: '{text}'"))
    })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(StillvidError::probe(format!(
            "duration must be a positive number of seconds, got '{text}'"
        )));
    }
    Ok(secs)
}
