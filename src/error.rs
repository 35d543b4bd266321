use thiserror::Error;

/// Tool-call decoding failures. Reported back to the model, never fatal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("invalid arguments for `{tool}`: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

impl CommandError {
    /// Detail string placed in the error-status tool result.
    pub fn tool_detail(&self) -> String {
        match self {
            CommandError::UnknownTool(_) => "Unknown function call.".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no API key configured for the model backend")]
    MissingApiKey,
    #[error("model transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed model response: {0}")]
    Malformed(String),
    #[error("model call aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("a turn is already in flight")]
    Busy,
    #[error("message is empty")]
    EmptyMessage,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture device unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command `/{0}` (try /help)")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}
