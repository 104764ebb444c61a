use thiserror::Error;

/// All errors produced by loqui-core.
#[derive(Debug, Error)]
pub enum LoquiError {
    /// The requested input device could not be opened or started.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("no input device found")]
    NoInputDevice,

    #[error("audio stream error: {0}")]
    AudioStream(String),

    /// Rejected at construction, before any stream is opened.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("capture is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LoquiError>;
