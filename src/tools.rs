//! Locating the external `ffmpeg`/`ffprobe` binaries.
//!
//! Search order: explicit configured path, then `PATH`, then a fixed list of install
//! locations that GUI launched processes commonly miss (Homebrew, MacPorts, `~/bin`), then
//! any directories added in the config.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    config::ToolSettings,
    error::{StillvidError, StillvidResult},
};

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    pub fn locate(settings: &ToolSettings) -> StillvidResult<Self> {
        let extra = search_dirs(settings);
        Ok(Self {
            ffmpeg: locate_tool(FFMPEG, settings.ffmpeg.as_deref(), &extra)?,
            ffprobe: locate_tool(FFPROBE, settings.ffprobe.as_deref(), &extra)?,
        })
    }
}

/// Whether `program -version` starts and exits successfully.
pub fn is_runnable(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut out = Vec::with_capacity(4);
    if let Some(home) = dirs::home_dir() {
        out.push(home.join("bin"));
    }
    out.extend(
        ["/opt/local/bin", "/opt/homebrew/bin", "/usr/local/bin"]
            .into_iter()
            .map(PathBuf::from),
    );
    out
}

fn search_dirs(settings: &ToolSettings) -> Vec<PathBuf> {
    let mut out = default_search_dirs();
    out.extend(
        settings
            .extra_search_dirs
            .iter()
            .map(|d| crate::paths::expand_home(&d.to_string_lossy())),
    );
    out
}

pub fn locate_tool(
    name: &str,
    explicit: Option<&Path>,
    extra_dirs: &[PathBuf],
) -> StillvidResult<PathBuf> {
    if let Some(path) = explicit {
        let path = crate::paths::expand_home(&path.to_string_lossy());
        if is_executable(&path) {
            return Ok(path);
        }
        return Err(StillvidError::tool_not_found(format!(
            "configured {name} path '{}' is not an executable file",
            path.display()
        )));
    }

    if let Some(found) = find_in_path(name) {
        return Ok(found);
    }

    for dir in extra_dirs {
        if let Some(found) = candidate_in(dir, name) {
            tracing::debug!(tool = name, path = %found.display(), "found outside PATH");
            return Ok(found);
        }
    }

    Err(StillvidError::tool_not_found(format!(
        "could not locate '{name}' on PATH or in {}; install FFmpeg or set its path in the config",
        extra_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| candidate_in(&dir, name))
}

fn candidate_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let full = dir.join(name);
    if is_executable(&full) {
        return Some(full);
    }
    #[cfg(windows)]
    {
        let exe = dir.join(format!("{name}.exe"));
        if is_executable(&exe) {
            return Some(exe);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
