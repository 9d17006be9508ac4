#![allow(dead_code)]

use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use stillvid::{
    AudioProber, EncodePhase, MuxJob, SeedJob, StillvidError, StillvidResult, VideoEncoder,
};

pub fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "stillvid_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

/// Directory entries, sorted by name.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[derive(Clone, Default)]
pub struct ProbeLog {
    pub calls: Arc<AtomicUsize>,
}

impl ProbeLog {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub struct FakeProber {
    pub result: Result<f64, String>,
    pub log: ProbeLog,
}

impl AudioProber for FakeProber {
    fn duration_secs(&self, _media: &Path) -> StillvidResult<f64> {
        self.log.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(StillvidError::probe)
    }
}

#[derive(Clone, Debug, Default)]
pub struct EncodeRecord {
    pub seeds: Vec<SeedJob>,
    pub muxes: Vec<MuxJob>,
    pub manifest_lines: Vec<String>,
    /// Whether the composed frame existed when the seed encode ran.
    pub frame_seen: bool,
}

#[derive(Clone, Default)]
pub struct EncodeLog(pub Arc<Mutex<EncodeRecord>>);

impl EncodeLog {
    pub fn snapshot(&self) -> EncodeRecord {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailAt {
    #[default]
    Nowhere,
    Seed,
    /// Fail after writing a partial output file.
    Mux,
}

pub struct FakeEncoder {
    pub fail_at: FailAt,
    pub log: EncodeLog,
}

impl VideoEncoder for FakeEncoder {
    fn encode_seed(&self, job: &SeedJob) -> StillvidResult<()> {
        let mut rec = self.log.0.lock().unwrap();
        rec.frame_seen = job.frame_path.is_file();
        rec.seeds.push(job.clone());
        if self.fail_at == FailAt::Seed {
            return Err(StillvidError::encode(EncodePhase::Seed, "exit status: 1"));
        }
        std::fs::write(&job.out_path, b"seed").unwrap();
        Ok(())
    }

    fn mux(&self, job: &MuxJob) -> StillvidResult<()> {
        let mut rec = self.log.0.lock().unwrap();
        rec.muxes.push(job.clone());
        rec.manifest_lines = std::fs::read_to_string(&job.manifest_path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        std::fs::write(&job.out_path, b"video").unwrap();
        if self.fail_at == FailAt::Mux {
            return Err(StillvidError::encode(EncodePhase::Mux, "exit status: 1"));
        }
        Ok(())
    }
}

pub struct Harness {
    pub probes: ProbeLog,
    pub encodes: EncodeLog,
    pub pipeline: stillvid::RenderPipeline,
}

pub fn harness(duration: Result<f64, String>, fail_at: FailAt) -> Harness {
    let probes = ProbeLog::default();
    let encodes = EncodeLog::default();
    let pipeline = stillvid::RenderPipeline::new(
        Box::new(FakeProber {
            result: duration,
            log: probes.clone(),
        }),
        Box::new(FakeEncoder {
            fail_at,
            log: encodes.clone(),
        }),
    );
    Harness {
        probes,
        encodes,
        pipeline,
    }
}

/// An audio placeholder and a 64x32 PNG inside `root/in`; outputs go to `root/out`.
pub fn fixture(root: &Path) -> stillvid::RenderForm {
    let input = root.join("in");
    std::fs::create_dir_all(&input).unwrap();
    let audio = input.join("song.mp3");
    std::fs::write(&audio, b"not really audio").unwrap();
    let image = input.join("cover.png");
    write_png(&image, 64, 32);

    stillvid::RenderForm {
        audio: audio.to_string_lossy().into_owned(),
        image: image.to_string_lossy().into_owned(),
        output_dir: root.join("out").to_string_lossy().into_owned(),
        output_name: "song".to_string(),
        resolution: "128x128".to_string(),
        seed: "Guess".to_string(),
        bitrate: "256k".to_string(),
        no_clobber: true,
        ..stillvid::RenderForm::default()
    }
}
