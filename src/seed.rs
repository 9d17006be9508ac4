use std::{fmt, str::FromStr};

use crate::error::{StillvidError, StillvidResult};

pub const SEED_PRESETS: &[&str] = &["60s", "10s", "240s", "Guess"];

/// How long the single encoded seed segment should be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedDuration {
    /// Pick from the total audio length, see [`auto_seed_secs`].
    Auto,
    Explicit(u32),
}

impl SeedDuration {
    /// `"Guess"`/`"Auto"` select the heuristic; anything else has its non-digits stripped.
    pub fn parse(raw: &str) -> StillvidResult<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("guess") || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }

        let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(StillvidError::invalid_setting(format!(
                "seed duration '{raw}' contains no number"
            )));
        }
        let secs = digits.parse::<u32>().map_err(|_| {
            StillvidError::invalid_setting(format!("seed duration '{raw}' is out of range"))
        })?;
        if secs == 0 {
            return Err(StillvidError::invalid_setting(
                "seed duration must be at least one second",
            ));
        }
        Ok(Self::Explicit(secs))
    }

    pub fn resolve(self, audio_secs: f64) -> u32 {
        match self {
            Self::Auto => auto_seed_secs(audio_secs),
            Self::Explicit(secs) => secs,
        }
    }
}

impl FromStr for SeedDuration {
    type Err = StillvidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SeedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("Guess"),
            Self::Explicit(secs) => write!(f, "{secs}s"),
        }
    }
}

/// Short tracks get a short seed; long tracks a long one so the concat list stays small.
pub fn auto_seed_secs(audio_secs: f64) -> u32 {
    if audio_secs < 60.0 {
        10
    } else if audio_secs < 600.0 {
        60
    } else {
        240
    }
}

/// Number of seed repetitions needed to cover the whole track: `ceil(total / seed)`, at least 1.
pub fn loop_count(audio_secs: f64, seed_secs: u32) -> u64 {
    if seed_secs == 0 || !audio_secs.is_finite() || audio_secs <= 0.0 {
        return 1;
    }
    let loops = (audio_secs / f64::from(seed_secs)).ceil();
    (loops as u64).max(1)
}

/// Upper bound on concat manifest entries. Roughly eleven days of audio at a 1s seed.
pub const MAX_LOOPS: u64 = 1_000_000;

/// [`loop_count`], rejecting plans longer than [`MAX_LOOPS`] segments.
pub fn checked_loop_count(audio_secs: f64, seed_secs: u32) -> StillvidResult<u64> {
    let loops = loop_count(audio_secs, seed_secs);
    if loops > MAX_LOOPS {
        return Err(StillvidError::invalid_setting(format!(
            "{audio_secs}s of audio needs {loops} repeats of a {seed_secs}s seed, more than {MAX_LOOPS}; use a longer seed"
        )));
    }
    Ok(loops)
}
