//! Stillvid turns one still image and one audio track into a static MP4 video.
//!
//! The heavy lifting is delegated to the system `ffmpeg`/`ffprobe`. Instead of encoding the
//! image for the full length of the track, a short seed segment is encoded once and then
//! repeated through ffmpeg's concat demuxer while the audio is muxed in:
//!
//! - resolve a [`RenderForm`] into a validated [`RenderRequest`]
//! - run it through a [`RenderPipeline`] (directly or on a [`RenderWorker`])
//! - receive a [`RenderOutcome`]
//!
//! External tools sit behind [`AudioProber`] and [`VideoEncoder`] so the pipeline can be
//! driven with fakes.
#![forbid(unsafe_code)]

mod foundation;

pub mod config;
pub mod encode;
pub mod frame;
pub mod paths;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod request;
pub mod seed;
pub mod tools;
pub mod worker;

pub use foundation::error;

pub use config::{Config, Defaults, EncoderSettings, ToolSettings};
pub use encode::{ConcatManifest, FfmpegEncoder, MuxJob, SeedJob, VideoEncoder};
pub use error::{EncodePhase, StillvidError, StillvidResult};
pub use frame::{ComposedFrame, Resolution, canvas_size, compose_frame, compose_frame_file};
pub use paths::{InputKind, classify_input, ensure_mp4_extension, resolve_output_path};
pub use pipeline::{RenderPipeline, WorkDir};
pub use probe::{AudioProber, FfprobeProber};
pub use progress::{ChannelReporter, CollectingReporter, ProgressReporter, TracingReporter};
pub use request::{AudioBitrate, RenderForm, RenderOutcome, RenderRequest};
pub use seed::{SeedDuration, checked_loop_count, loop_count};
pub use tools::ToolPaths;
pub use worker::{RenderWorker, SubmitError, WorkerEvent};
