//! End-to-end render: probe, compose, seed encode, loop-concat mux, cleanup.
//!
//! Stages run strictly in order because each external call consumes the previous one's
//! output:
//!
//! 1. probe the audio duration ([`AudioProber`])
//! 2. resolve the seed length ([`SeedDuration::resolve`](crate::SeedDuration::resolve)) and
//!    the loop count, capped at [`MAX_LOOPS`](crate::seed::MAX_LOOPS)
//! 3. compose the letterboxed frame into a per-run work directory
//! 4. encode the seed segment ([`VideoEncoder::encode_seed`])
//! 5. write a concat manifest repeating the seed `ceil(audio / seed)` times
//! 6. mux manifest video (stream copy) against the re-encoded audio ([`VideoEncoder::mux`])
//! 7. drop the work directory
//!
//! Any error short-circuits the remaining stages. The work directory is removed on every
//! exit path, so no intermediate files survive a failed run.

use std::path::{Path, PathBuf};

use crate::{
    config::{Config, Defaults},
    encode::{ConcatManifest, FfmpegEncoder, MuxJob, SeedJob, VideoEncoder},
    error::{StillvidError, StillvidResult},
    frame,
    paths,
    probe::{AudioProber, FfprobeProber},
    progress::ProgressReporter,
    request::{RenderForm, RenderOutcome, RenderRequest},
    seed,
    tools::ToolPaths,
};

const WORK_DIR_PREFIX: &str = ".stillvid-";
const FRAME_FILE: &str = "frame.png";
const SEED_FILE: &str = "seed.mp4";
const MANIFEST_FILE: &str = "concat.txt";

/// Uniquely named scratch directory inside the output directory.
///
/// Removed on drop; removal failures are logged and otherwise ignored.
pub struct WorkDir {
    dir: Option<tempfile::TempDir>,
}

impl WorkDir {
    pub fn create_in(parent: &Path) -> StillvidResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| {
                StillvidError::io(format!(
                    "failed to create work directory in '{}': {e}",
                    parent.display()
                ))
            })?;
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(d) => d.path(),
            None => Path::new(""),
        }
    }

    pub fn frame_path(&self) -> PathBuf {
        self.path().join(FRAME_FILE)
    }

    pub fn seed_path(&self) -> PathBuf {
        self.path().join(SEED_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path().join(MANIFEST_FILE)
    }

    pub fn close(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove work directory");
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        self.remove();
    }
}

pub struct RenderPipeline {
    prober: Box<dyn AudioProber>,
    encoder: Box<dyn VideoEncoder>,
    defaults: Defaults,
}

impl RenderPipeline {
    pub fn new(prober: Box<dyn AudioProber>, encoder: Box<dyn VideoEncoder>) -> Self {
        Self {
            prober,
            encoder,
            defaults: Defaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Wire the real `ffprobe`/`ffmpeg` binaries found through the config's tool settings.
    pub fn from_config(config: &Config) -> StillvidResult<Self> {
        config.validate()?;
        let tools = ToolPaths::locate(&config.tools)?;
        tracing::debug!(
            ffmpeg = %tools.ffmpeg.display(),
            ffprobe = %tools.ffprobe.display(),
            "located tools"
        );
        Ok(Self::new(
            Box::new(FfprobeProber::new(tools.ffprobe)),
            Box::new(FfmpegEncoder::new(tools.ffmpeg, config.encoder.clone())),
        )
        .with_defaults(config.defaults.clone()))
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Resolve a raw form and render it. Validation errors become a `Failure` outcome before
    /// any external tool runs.
    pub fn run_form(
        &self,
        form: &RenderForm,
        reporter: &mut dyn ProgressReporter,
    ) -> RenderOutcome {
        match RenderRequest::resolve(form, &self.defaults) {
            Ok(request) => self.run(&request, reporter),
            Err(e) => {
                tracing::warn!(error = %e, "render request rejected");
                RenderOutcome::from_result(Err(e))
            }
        }
    }

    #[tracing::instrument(skip_all, fields(audio = %request.audio_path.display(), out_dir = %request.output_dir.display()))]
    pub fn run(
        &self,
        request: &RenderRequest,
        reporter: &mut dyn ProgressReporter,
    ) -> RenderOutcome {
        let res = self.execute(request, reporter);
        match &res {
            Ok(path) => tracing::info!(out = %path.display(), "render finished"),
            Err(e) => tracing::warn!(error = %e, "render failed"),
        }
        RenderOutcome::from_result(res)
    }

    fn execute(
        &self,
        request: &RenderRequest,
        reporter: &mut dyn ProgressReporter,
    ) -> StillvidResult<PathBuf> {
        paths::prepare_output_dir(&request.output_dir)?;

        reporter.report("Analyzing audio duration...");
        let audio_secs = self.prober.duration_secs(&request.audio_path)?;
        tracing::info!(audio_secs, "probed audio");

        let seed_secs = request.seed.resolve(audio_secs);
        let loops = seed::checked_loop_count(audio_secs, seed_secs)?;
        tracing::info!(seed_secs, loops, "built loop plan");

        let work = WorkDir::create_in(&request.output_dir)?;

        reporter.report("Composing frame...");
        let composed = frame::compose_frame_file(
            &request.image_path,
            request.resolution,
            request.portrait,
            &work.frame_path(),
        )?;

        reporter.report(&format!(
            "Encoding seed segment ({seed_secs}s, {}x{})...",
            composed.width, composed.height
        ));
        let seed_job = SeedJob {
            frame_path: composed.path.clone(),
            width: composed.width,
            height: composed.height,
            seconds: seed_secs,
            out_path: work.seed_path(),
        };
        self.encoder.encode_seed(&seed_job)?;

        let manifest = ConcatManifest::new(seed_job.out_path.clone(), loops);
        manifest.write_to(&work.manifest_path())?;

        let out_path = paths::resolve_output_path(
            &request.output_dir,
            &request.output_name,
            request.no_clobber,
        );
        reporter.report(&format!(
            "Muxing final video ({}k)...",
            request.audio_bitrate.kbps()
        ));
        let mux_job = MuxJob {
            manifest_path: work.manifest_path(),
            audio_path: request.audio_path.clone(),
            audio_bitrate_kbps: request.audio_bitrate.kbps(),
            duration_secs: audio_secs,
            out_path: out_path.clone(),
        };
        let existed_before = out_path.exists();
        if let Err(e) = self.encoder.mux(&mux_job) {
            if !existed_before {
                remove_partial_output(&out_path);
            }
            return Err(e);
        }

        work.close();
        Ok(out_path)
    }
}

fn remove_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output")
        }
    }
}
