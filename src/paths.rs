use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::{StillvidError, StillvidResult};

pub const OUTPUT_EXTENSION: &str = "mp4";

pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "m4a", "ogg", "aif", "aiff"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp", "tiff"];

/// What a loose input path most likely is, judged the way a file drop is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Audio,
    Image,
    Directory,
    Unknown,
}

/// Expand a leading `~` to the user's home directory.
///
/// `~user` forms are left untouched.
pub fn expand_home(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Home-expand and make absolute against the current working directory.
///
/// The path is not required to exist, so no symlinks are resolved.
pub fn absolutize(raw: &str) -> StillvidResult<PathBuf> {
    if raw.trim().is_empty() {
        return Err(StillvidError::invalid_path("path is empty"));
    }
    let expanded = expand_home(raw);
    if expanded.is_absolute() {
        return Ok(expanded);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| StillvidError::invalid_path(format!("cannot read working directory: {e}")))?;
    Ok(cwd.join(expanded))
}

/// Force a `.mp4` suffix onto a user supplied file name.
///
/// A name with some other extension keeps it and gains `.mp4` on top (`a.mov` -> `a.mov.mp4`).
/// Trailing dots are dropped. Returns `None` when no stem is left (`""`, `"."`, `".mp4"`).
pub fn ensure_mp4_extension(name: &str) -> Option<String> {
    let name = name.trim().trim_end_matches('.');
    let suffix = OUTPUT_EXTENSION.len() + 1;
    let has_mp4 = name.len() >= suffix
        && name.as_bytes()[name.len() - suffix] == b'.'
        && name[name.len() - OUTPUT_EXTENSION.len()..].eq_ignore_ascii_case(OUTPUT_EXTENSION);
    let stem = if has_mp4 {
        &name[..name.len() - suffix]
    } else {
        name
    };
    if stem.trim_end_matches('.').trim().is_empty() {
        return None;
    }
    Some(if has_mp4 {
        name.to_string()
    } else {
        format!("{name}.{OUTPUT_EXTENSION}")
    })
}

/// `song.flac` -> `song.mp4`.
pub fn default_output_name(audio: &Path) -> Option<String> {
    let stem = audio.file_stem()?.to_str()?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{stem}.{OUTPUT_EXTENSION}"))
}

pub fn classify_input(path: &Path) -> InputKind {
    if path.is_dir() {
        return InputKind::Directory;
    }
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return InputKind::Unknown;
    };
    let ext = ext.to_ascii_lowercase();
    if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        InputKind::Audio
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        InputKind::Image
    } else {
        InputKind::Unknown
    }
}

/// Create the output directory (and parents) if it does not exist yet.
pub fn prepare_output_dir(dir: &Path) -> StillvidResult<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))
        .map_err(|e| StillvidError::invalid_path(format!("{e:#}")))
}

/// Pick the path the final video is written to.
///
/// With `no_clobber` set and `dir/name` taken, a zero padded counter is inserted before the
/// extension (`name-000.mp4`, `name-001.mp4`, ...) until a free path turns up.
pub fn resolve_output_path(dir: &Path, name: &str, no_clobber: bool) -> PathBuf {
    let direct = dir.join(name);
    if !no_clobber || !direct.exists() {
        return direct;
    }

    let (stem, ext) = split_name(name);
    let mut counter: u32 = 0;
    loop {
        let candidate = dir.join(format!("{stem}-{counter:03}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

// "a.b.mp4" -> ("a.b", ".mp4"); a leading dot is part of the stem.
fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}
