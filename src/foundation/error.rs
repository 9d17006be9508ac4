use std::fmt;

pub type StillvidResult<T> = Result<T, StillvidError>;

/// Which external encoder invocation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodePhase {
    /// Still frame -> short looping seed segment.
    Seed,
    /// Concatenated seed segments + original audio -> final MP4.
    Mux,
}

impl fmt::Display for EncodePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seed => f.write_str("seed"),
            Self::Mux => f.write_str("mux"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StillvidError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("probe error: {0}")]
    Probe(String),

    #[error("encode error ({phase}): {message}")]
    Encode { phase: EncodePhase, message: String },

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("io error: {0}")]
    Io(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StillvidError {
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    pub fn invalid_resolution(msg: impl Into<String>) -> Self {
        Self::InvalidResolution(msg.into())
    }

    pub fn invalid_setting(msg: impl Into<String>) -> Self {
        Self::InvalidSetting(msg.into())
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    pub fn encode(phase: EncodePhase, msg: impl Into<String>) -> Self {
        Self::Encode {
            phase,
            message: msg.into(),
        }
    }

    pub fn tool_not_found(msg: impl Into<String>) -> Self {
        Self::ToolNotFound(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }
}
