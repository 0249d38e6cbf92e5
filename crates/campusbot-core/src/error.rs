use thiserror::Error;

/// Text shown to the user when a request never reached the server.
pub const NETWORK_ERROR_TEXT: &str = "Network error. Please try again.";

/// Top-level error type for the campusbot client.
///
/// Failures fall into three user-visible kinds: validation (caught before
/// any request is sent), transport (the request never completed), and
/// server-reported (non-2xx status or an `{ "error": ... }` payload). The
/// remaining variants cover local configuration and storage.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CampusError {
    #[error("{0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Which of the three user-facing failure kinds an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Transport,
    Server,
    Local,
}

impl CampusError {
    /// Construct a server-reported failure.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        CampusError::Server {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            CampusError::Validation(_) => FailureKind::Validation,
            CampusError::Transport(_) => FailureKind::Transport,
            CampusError::Server { .. } | CampusError::Forbidden(_) => FailureKind::Server,
            _ => FailureKind::Local,
        }
    }

    /// The text to put in front of the user for this failure.
    ///
    /// Validation and server messages are surfaced verbatim; transport
    /// failures collapse to a generic network message.
    pub fn user_message(&self) -> String {
        match self {
            CampusError::Validation(msg) => msg.clone(),
            CampusError::Transport(_) => NETWORK_ERROR_TEXT.to_string(),
            CampusError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for CampusError {
    fn from(err: toml::de::Error) -> Self {
        CampusError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CampusError {
    fn from(err: toml::ser::Error) -> Self {
        CampusError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CampusError {
    fn from(err: serde_json::Error) -> Self {
        CampusError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for campusbot operations.
pub type Result<T> = std::result::Result<T, CampusError>;
