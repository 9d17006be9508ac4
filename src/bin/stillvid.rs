use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use stillvid::{
    AudioProber as _, Config, ProgressReporter as _, FfprobeProber, InputKind, RenderForm, RenderOutcome, RenderPipeline,
    RenderWorker, Resolution, ToolPaths, TracingReporter, WorkerEvent, frame::RESOLUTION_PRESETS,
    request::BITRATE_PRESETS, seed::SEED_PRESETS, tools,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stillvid", version, about = "Make a static MP4 video from one image and one audio track")]
struct Cli {
    /// JSON config file (defaults to $STILLVID_CONFIG, then the per-user config file).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log external commands and pipeline details.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a static MP4 (requires `ffmpeg` and `ffprobe`).
    Render(RenderArgs),
    /// Compose the letterboxed frame only and write it as PNG.
    Frame(FrameArgs),
    /// Print the duration of a media file in seconds.
    Probe(ProbeArgs),
    /// Print the ffmpeg/ffprobe binaries that would be used.
    Tools,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Loose inputs, sorted by extension into audio, image, or output directory.
    inputs: Vec<PathBuf>,

    /// Audio track.
    #[arg(long)]
    audio: Option<String>,

    /// Still image.
    #[arg(long)]
    image: Option<String>,

    /// Output directory (defaults to the audio file's directory).
    #[arg(long = "out-dir")]
    out_dir: Option<String>,

    /// Output file name; `.mp4` is appended when missing (defaults to the audio file name).
    #[arg(long)]
    name: Option<String>,

    #[arg(long, help = with_presets("WIDTHxHEIGHT or \"From Image\"", RESOLUTION_PRESETS))]
    resolution: Option<String>,

    /// Swap width and height.
    #[arg(long)]
    portrait: bool,

    #[arg(
        long,
        help = with_presets("Seed segment length; \"Guess\" picks one from the audio length", SEED_PRESETS)
    )]
    seed: Option<String>,

    #[arg(long, help = with_presets("AAC bitrate", BITRATE_PRESETS))]
    bitrate: Option<String>,

    /// Overwrite an existing output file instead of adding a -NNN suffix.
    #[arg(long, conflicts_with = "no_clobber")]
    clobber: bool,

    /// Never overwrite; add a -NNN suffix on collision.
    #[arg(long)]
    no_clobber: bool,

    /// Print the outcome as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Still image.
    #[arg(long)]
    image: PathBuf,

    /// WIDTHxHEIGHT or "From Image".
    #[arg(long, default_value = "1920x1080")]
    resolution: String,

    /// Swap width and height.
    #[arg(long)]
    portrait: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Media file to measure.
    media: PathBuf,
}

fn with_presets(text: &str, presets: &[&str]) -> String {
    format!("{text} (presets: {})", presets.join(", "))
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    match cli.cmd {
        Command::Render(args) => cmd_render(&config, args),
        Command::Frame(args) => cmd_frame(args),
        Command::Probe(args) => cmd_probe(&config, args),
        Command::Tools => cmd_tools(&config),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_form(config: &Config, args: &RenderArgs) -> anyhow::Result<RenderForm> {
    let mut form = RenderForm::with_defaults(&config.defaults);

    for input in &args.inputs {
        let text = input.to_string_lossy().into_owned();
        match stillvid::classify_input(input) {
            InputKind::Audio => form.audio = text,
            InputKind::Image => form.image = text,
            InputKind::Directory => form.output_dir = text,
            InputKind::Unknown => {
                anyhow::bail!("cannot tell whether '{}' is audio or an image", input.display())
            }
        }
    }

    let overrides = [
        (&args.audio, &mut form.audio),
        (&args.image, &mut form.image),
        (&args.out_dir, &mut form.output_dir),
        (&args.name, &mut form.output_name),
        (&args.resolution, &mut form.resolution),
        (&args.seed, &mut form.seed),
        (&args.bitrate, &mut form.bitrate),
    ];
    for (value, field) in overrides {
        if let Some(v) = value {
            *field = v.clone();
        }
    }

    if args.portrait {
        form.portrait = true;
    }
    if args.clobber {
        form.no_clobber = false;
    }
    if args.no_clobber {
        form.no_clobber = true;
    }
    Ok(form)
}

fn cmd_render(config: &Config, args: RenderArgs) -> anyhow::Result<ExitCode> {
    let form = build_form(config, &args)?;
    let pipeline = RenderPipeline::from_config(config)?;
    let (worker, events) = RenderWorker::spawn(pipeline)?;
    worker
        .submit(form)
        .context("submit render job")?;

    // With --json, stdout is reserved for the outcome and progress goes to the log.
    let mut log = TracingReporter;
    let mut outcome = None;
    for event in events.iter() {
        match event {
            WorkerEvent::Progress(msg) if args.json => log.report(&msg),
            WorkerEvent::Progress(msg) => eprintln!("{msg}"),
            WorkerEvent::Finished(o) => {
                outcome = Some(o);
                break;
            }
        }
    }
    drop(worker);

    let outcome = outcome.context("render worker stopped without reporting an outcome")?;
    if args.json {
        println!("{}", serde_json::to_string(&outcome)?);
    }

    Ok(match outcome {
        RenderOutcome::Success { path } => {
            if !args.json {
                eprintln!("[DONE] {}", path.display());
            }
            ExitCode::SUCCESS
        }
        RenderOutcome::Failure { message } => {
            if !args.json {
                eprintln!("[ERROR] {message}");
            }
            ExitCode::FAILURE
        }
    })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<ExitCode> {
    let resolution = Resolution::parse(&args.resolution)?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let frame = stillvid::compose_frame_file(&args.image, resolution, args.portrait, &args.out)?;
    eprintln!(
        "wrote {} ({}x{})",
        frame.path.display(),
        frame.width,
        frame.height
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_probe(config: &Config, args: ProbeArgs) -> anyhow::Result<ExitCode> {
    let tools = ToolPaths::locate(&config.tools)?;
    let secs = FfprobeProber::new(tools.ffprobe).duration_secs(absolute(&args.media)?.as_path())?;
    println!("{secs}");
    Ok(ExitCode::SUCCESS)
}

fn cmd_tools(config: &Config) -> anyhow::Result<ExitCode> {
    let located = ToolPaths::locate(&config.tools)?;
    let mut all_ok = true;
    for (name, path) in [("ffmpeg", &located.ffmpeg), ("ffprobe", &located.ffprobe)] {
        let ok = tools::is_runnable(path);
        all_ok &= ok;
        let status = if ok { "" } else { " (fails to run)" };
        println!("{:<8} {}{status}", format!("{name}:"), path.display());
    }
    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    Ok(stillvid::paths::absolutize(&path.to_string_lossy())?)
}
