use thiserror::Error;

/// Failure to obtain historical draw data
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("History contains no draws")]
    Empty,

    #[error("History unavailable for this session")]
    Unavailable,
}

/// Failure to load or store draw settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Audio playback failure (always non-fatal)
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio backend unavailable")]
    Unavailable,

    #[error("Playback refused: {0}")]
    Refused(String),
}
