//! Letterboxed still frame composition.
//!
//! The encoder wants `yuv420p`, which only accepts even frame dimensions, so every canvas
//! produced here is rounded down to even width/height before anything is drawn.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::LazyLock,
};

use anyhow::Context as _;
use image::{DynamicImage, GenericImageView as _, RgbaImage, imageops::FilterType};
use regex::Regex;

use crate::error::{StillvidError, StillvidResult};

pub const RESOLUTION_PRESETS: &[&str] = &[
    "1920x1080",
    "1280x720",
    "854x480",
    "1080x1080",
    "640x640",
    "480x480",
    "From Image",
];

static RESOLUTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*[xX]\s*(\d+)\s*$").expect("resolution regex is valid")
});

/// Requested canvas size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Use the source image's own pixel size.
    FromImage,
    Explicit { width: u32, height: u32 },
}

impl Resolution {
    pub fn parse(raw: &str) -> StillvidResult<Self> {
        let trimmed = raw.trim();
        if ["from image", "image", "source", "auto"]
            .iter()
            .any(|k| trimmed.eq_ignore_ascii_case(k))
        {
            return Ok(Self::FromImage);
        }

        let caps = RESOLUTION_RE.captures(trimmed).ok_or_else(|| {
            StillvidError::invalid_resolution(format!(
                "'{raw}' is not of the form WIDTHxHEIGHT"
            ))
        })?;
        let dim = |i: usize| -> StillvidResult<u32> {
            caps[i].parse::<u32>().map_err(|_| {
                StillvidError::invalid_resolution(format!("'{raw}' has an out of range dimension"))
            })
        };
        Ok(Self::Explicit {
            width: dim(1)?,
            height: dim(2)?,
        })
    }
}

impl FromStr for Resolution {
    type Err = StillvidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromImage => f.write_str("From Image"),
            Self::Explicit { width, height } => write!(f, "{width}x{height}"),
        }
    }
}

pub fn round_down_even(v: u32) -> u32 {
    v & !1
}

/// Final canvas size: pick the box, swap it for portrait, then round both sides down to even.
pub fn canvas_size(
    native: (u32, u32),
    resolution: Resolution,
    portrait: bool,
) -> StillvidResult<(u32, u32)> {
    let (mut w, mut h) = match resolution {
        Resolution::FromImage => native,
        Resolution::Explicit { width, height } => (width, height),
    };
    if portrait {
        std::mem::swap(&mut w, &mut h);
    }
    let (w, h) = (round_down_even(w), round_down_even(h));
    if w == 0 || h == 0 {
        return Err(StillvidError::invalid_resolution(format!(
            "canvas {w}x{h} is empty after rounding to even dimensions"
        )));
    }
    Ok((w, h))
}

/// Size of `src` shrunk to fit inside `bounds`, aspect preserved. Never enlarges.
pub fn fit_within(src: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (u64::from(src.0), u64::from(src.1));
    let (bw, bh) = (u64::from(bounds.0), u64::from(bounds.1));
    if sw == 0 || sh == 0 || (sw <= bw && sh <= bh) {
        return src;
    }

    let (w, h) = if sw * bh > sh * bw {
        (bw, (sh * bw * 2 + sw) / (sw * 2))
    } else {
        ((sw * bh * 2 + sh) / (sh * 2), bh)
    };
    (w.clamp(1, bw) as u32, h.clamp(1, bh) as u32)
}

/// Top-left corner that centres `inner` in `outer` (integer division).
pub fn letterbox_offset(outer: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(inner.0) / 2,
        outer.1.saturating_sub(inner.1) / 2,
    )
}

/// Scale `src` into a `width`x`height` black canvas, centred.
///
/// Transparent source pixels are blended over the black background.
pub fn compose_frame(src: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let fitted = fit_within(src.dimensions(), (width, height));
    let scaled = if fitted == src.dimensions() {
        src.to_rgba8()
    } else {
        src.resize_exact(fitted.0, fitted.1, FilterType::Lanczos3)
            .to_rgba8()
    };

    let mut canvas = RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]));
    let (x, y) = letterbox_offset((width, height), scaled.dimensions());
    image::imageops::overlay(&mut canvas, &scaled, i64::from(x), i64::from(y));
    canvas
}

/// A composed frame persisted to disk for the encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedFrame {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

pub fn load_image(path: &Path) -> StillvidResult<DynamicImage> {
    let img = image::ImageReader::open(path)
        .with_context(|| format!("open image '{}'", path.display()))
        .and_then(|r| {
            r.with_guessed_format()
                .with_context(|| format!("sniff image format '{}'", path.display()))
        })
        .and_then(|r| {
            r.decode()
                .with_context(|| format!("decode image '{}'", path.display()))
        })
        .map_err(|e| StillvidError::io(format!("{e:#}")))?;
    Ok(img)
}

/// Load `src_path`, letterbox it onto the resolved canvas, and write an RGB PNG to `out_path`.
pub fn compose_frame_file(
    src_path: &Path,
    resolution: Resolution,
    portrait: bool,
    out_path: &Path,
) -> StillvidResult<ComposedFrame> {
    let src = load_image(src_path)?;
    let (width, height) = canvas_size(src.dimensions(), resolution, portrait)?;
    let canvas = compose_frame(&src, width, height);

    DynamicImage::ImageRgba8(canvas)
        .to_rgb8()
        .save_with_format(out_path, image::ImageFormat::Png)
        .with_context(|| format!("write frame png '{}'", out_path.display()))
        .map_err(|e| StillvidError::io(format!("{e:#}")))?;

    tracing::debug!(
        src = %src_path.display(),
        out = %out_path.display(),
        width,
        height,
        "composed frame"
    );

    Ok(ComposedFrame {
        path: out_path.to_path_buf(),
        width,
        height,
    })
}
