use std::fmt;

use thiserror::Error;

/// Which half of the HTTP exchange a transport failure happened in. The two
/// stages are reported separately so a stalled feed can be told apart from a
/// connection that never came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStage {
    Request,
    ReadBody,
}

impl fmt::Display for TransportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportStage::Request => write!(f, "sending request"),
            TransportStage::ReadBody => write!(f, "reading response body"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PollerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cursor store failure: {0}")]
    Cursor(#[source] std::io::Error),

    #[error("transport failure while {stage}: {source}")]
    Transport {
        stage: TransportStage,
        #[source]
        source: reqwest::Error,
    },

    #[error("feed protocol violation: {0}")]
    Protocol(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PollerError {
    /// Stable label for logs and metrics, one per error family.
    pub fn kind(&self) -> &'static str {
        match self {
            PollerError::Config(_) => "config",
            PollerError::Cursor(_) => "cursor",
            PollerError::Transport { .. } => "transport",
            PollerError::Protocol(_) => "protocol",
            PollerError::Toml(_) => "config",
            PollerError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, PollerError>;
