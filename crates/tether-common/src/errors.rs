use std::path::PathBuf;

/// Failure to parse or build a wire message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("malformed message: expected {expected} fields, found {found}")]
    Malformed { expected: usize, found: usize },

    #[error("unexpected message tag: {0}")]
    UnexpectedTag(String),

    #[error("invalid sequence number: {0}")]
    InvalidSequence(String),

    #[error("invalid binding name: {0}")]
    InvalidName(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("json error: {0}")]
    Json(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("dispatch queue is closed")]
    Closed,

    #[error("script error: {0}")]
    Script(String),
}

/// Settlement failure delivered to a pending hosted-script call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    #[error("call rejected: {0}")]
    Rejected(serde_json::Value),

    #[error("unable to decode result: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TetherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
