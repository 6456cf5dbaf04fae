use thiserror::Error;

/// Errors surfaced by the bridge and its transport controls
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The sequencer or output device could not be acquired or opened
    #[error("MIDI device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The sequence source rejected the song data, or the sequencer refused the result
    #[error("failed to load song: {0}")]
    ParseFailure(#[from] ParseError),

    /// The operation is not valid in the current transport state
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A rejected piece of song data, with the 1-based line it was found on when known
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{reason}", line_prefix(.line))]
pub struct ParseError {
    pub line: Option<usize>,
    pub reason: String,
}

impl ParseError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            line: None,
            reason: reason.into(),
        }
    }

    pub fn at_line(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            reason: reason.into(),
        }
    }
}

impl From<midir::InitError> for BridgeError {
    fn from(e: midir::InitError) -> Self {
        BridgeError::DeviceUnavailable(e.to_string())
    }
}

impl<T> From<midir::ConnectError<T>> for BridgeError {
    fn from(e: midir::ConnectError<T>) -> Self {
        BridgeError::DeviceUnavailable(e.to_string())
    }
}

impl From<midir::PortInfoError> for BridgeError {
    fn from(e: midir::PortInfoError) -> Self {
        BridgeError::DeviceUnavailable(e.to_string())
    }
}

fn line_prefix(line: &Option<usize>) -> String {
    line.map(|l| format!("line {}: ", l)).unwrap_or_default()
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
