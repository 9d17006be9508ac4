use std::{
    ffi::OsString,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::Context as _;

use crate::{
    config::EncoderSettings,
    error::{EncodePhase, StillvidError, StillvidResult},
};

/// Still frame -> seed segment of exactly `seconds`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedJob {
    pub frame_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub seconds: u32,
    pub out_path: PathBuf,
}

/// Concat manifest (video, stream copied) + original audio (re-encoded) -> final MP4.
#[derive(Clone, Debug, PartialEq)]
pub struct MuxJob {
    pub manifest_path: PathBuf,
    pub audio_path: PathBuf,
    pub audio_bitrate_kbps: u32,
    pub duration_secs: f64,
    pub out_path: PathBuf,
}

/// The two external encoder invocations a render needs.
pub trait VideoEncoder: Send + Sync {
    fn encode_seed(&self, job: &SeedJob) -> StillvidResult<()>;
    fn mux(&self, job: &MuxJob) -> StillvidResult<()>;
}

/// Concat demuxer input listing one segment `count` times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConcatManifest {
    pub segment: PathBuf,
    pub count: u64,
}

impl ConcatManifest {
    pub fn new(segment: impl Into<PathBuf>, count: u64) -> Self {
        Self {
            segment: segment.into(),
            count,
        }
    }

    pub fn write_lines<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let line = format!("file '{}'\n", escape_concat_path(&self.segment));
        for _ in 0..self.count {
            out.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    pub fn write_to(&self, path: &Path) -> StillvidResult<()> {
        let write = || -> std::io::Result<()> {
            let mut out = BufWriter::new(File::create(path)?);
            self.write_lines(&mut out)?;
            out.flush()
        };
        write()
            .with_context(|| format!("write concat manifest '{}'", path.display()))
            .map_err(|e| StillvidError::io(format!("{e:#}")))
    }
}

fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

/// Trim ffmpeg's float printing to something stable, e.g. `45.000000` -> `45`.
pub fn format_secs(secs: f64) -> String {
    let s = format!("{secs:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

pub fn seed_args(job: &SeedJob, settings: &EncoderSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-loglevel", "error", "-loop", "1", "-i"]
        .into_iter()
        .map(Into::into)
        .collect();
    args.push(job.frame_path.clone().into_os_string());
    args.extend(
        [
            "-c:v".to_string(),
            settings.video_codec.clone(),
            "-t".to_string(),
            job.seconds.to_string(),
            "-pix_fmt".to_string(),
            settings.pixel_format.clone(),
            "-vf".to_string(),
            format!("scale={}:{}", job.width, job.height),
            "-preset".to_string(),
            settings.preset.clone(),
        ]
        .into_iter()
        .map(Into::into),
    );
    if let Some(fps) = settings.framerate {
        args.push("-r".into());
        args.push(fps.to_string().into());
    }
    args.push(job.out_path.clone().into_os_string());
    args
}

pub fn mux_args(job: &MuxJob, settings: &EncoderSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i",
    ]
    .into_iter()
    .map(Into::into)
    .collect();
    args.push(job.manifest_path.clone().into_os_string());
    args.push("-i".into());
    args.push(job.audio_path.clone().into_os_string());
    args.extend(
        [
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            settings.audio_codec.clone(),
            "-b:a".to_string(),
            format!("{}k", job.audio_bitrate_kbps),
            "-shortest".to_string(),
            "-t".to_string(),
            format_secs(job.duration_secs),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]
        .into_iter()
        .map(Into::into),
    );
    args.push(job.out_path.clone().into_os_string());
    args
}

/// [`VideoEncoder`] backed by the system `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    program: PathBuf,
    settings: EncoderSettings,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>, settings: EncoderSettings) -> Self {
        Self {
            program: program.into(),
            settings,
        }
    }

    fn run(&self, phase: EncodePhase, args: Vec<OsString>) -> StillvidResult<()> {
        tracing::debug!(
            %phase,
            program = %self.program.display(),
            args = ?args,
            "running ffmpeg"
        );

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                StillvidError::encode(
                    phase,
                    format!("failed to spawn '{}': {e}", self.program.display()),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StillvidError::encode(
                phase,
                format!("ffmpeg exited with status {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(())
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn encode_seed(&self, job: &SeedJob) -> StillvidResult<()> {
        if job.width == 0 || job.height == 0 {
            return Err(StillvidError::encode(
                EncodePhase::Seed,
                "seed width/height must be non-zero",
            ));
        }
        if !job.width.is_multiple_of(2) || !job.height.is_multiple_of(2) {
            return Err(StillvidError::encode(
                EncodePhase::Seed,
                "seed width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if job.seconds == 0 {
            return Err(StillvidError::encode(
                EncodePhase::Seed,
                "seed duration must be non-zero",
            ));
        }
        self.run(EncodePhase::Seed, seed_args(job, &self.settings))
    }

    fn mux(&self, job: &MuxJob) -> StillvidResult<()> {
        self.run(EncodePhase::Mux, mux_args(job, &self.settings))
    }
}
