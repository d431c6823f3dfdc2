//! Error types and handlers for purge operations

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PurgeError>;

#[derive(Error, Debug, Clone)]
pub enum PurgeError {
    /// Malformed age/duration expression
    #[error("Parse error: {0}")]
    Parse(String),
    /// Invalid tag filter expression
    #[error("Pattern error: {0}")]
    Pattern(String),
    /// Network or HTTP transport failure
    #[error("Transport error: {0}")]
    Transport(String),
    /// Well-formed error response from the registry
    #[error("Registry error ({status}): {code} {message}")]
    Registry {
        status: u16,
        code: String,
        message: String,
    },
    /// Archive record decode/encode or persistence failure
    #[error("Metadata error: {0}")]
    Metadata(String),
    /// Invalid input, such as a reference that is not a digest
    #[error("Validation error: {0}")]
    Validation(String),
    /// Invalid command line or environment configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// A log-and-continue run finished with failed items
    #[error("Purge finished with {failed} failed item(s)")]
    Incomplete { failed: usize },
}

impl PurgeError {
    /// Prefix the message with the operation it came from
    pub fn context(self, context: &str) -> Self {
        match self {
            PurgeError::Parse(msg) => PurgeError::Parse(format!("{}: {}", context, msg)),
            PurgeError::Pattern(msg) => PurgeError::Pattern(format!("{}: {}", context, msg)),
            PurgeError::Transport(msg) => PurgeError::Transport(format!("{}: {}", context, msg)),
            PurgeError::Registry {
                status,
                code,
                message,
            } => PurgeError::Registry {
                status,
                code,
                message: format!("{}: {}", context, message),
            },
            PurgeError::Metadata(msg) => PurgeError::Metadata(format!("{}: {}", context, msg)),
            PurgeError::Validation(msg) => {
                PurgeError::Validation(format!("{}: {}", context, msg))
            }
            PurgeError::Config(msg) => PurgeError::Config(format!("{}: {}", context, msg)),
            other @ PurgeError::Incomplete { .. } => other,
        }
    }
}

impl From<reqwest::Error> for PurgeError {
    fn from(err: reqwest::Error) -> Self {
        PurgeError::Transport(err.to_string())
    }
}

impl From<regex::Error> for PurgeError {
    fn from(err: regex::Error) -> Self {
        PurgeError::Pattern(err.to_string())
    }
}

impl From<serde_json::Error> for PurgeError {
    fn from(err: serde_json::Error) -> Self {
        PurgeError::Metadata(err.to_string())
    }
}

impl From<url::ParseError> for PurgeError {
    fn from(err: url::ParseError) -> Self {
        PurgeError::Config(err.to_string())
    }
}
