use thiserror::Error;

/// Message shown to callers for every failure the engine did not explain itself.
pub const GENERIC_SERVER_ERROR: &str = "an unknown server error has occurred";

/// Every failure a bolo operation can report.
#[derive(Error, Debug)]
pub enum BoloError {
    /// Connecting, writing or reading the socket failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The reply was empty or did not start with a known frame byte
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The engine answered with an `E` frame. The message is displayed verbatim.
    #[error("{0}")]
    Remote(String),

    /// A result frame was structurally corrupt
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// A connect, write or read exceeded its deadline
    #[error("Timeout error: operation took longer than {timeout_ms}ms")]
    Timeout {
        /// The deadline that expired
        timeout_ms: u64,
    },

    /// Local I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding of output failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A spawned task panicked or was cancelled
    #[error("Async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for bolo operations
pub type Result<T> = std::result::Result<T, BoloError>;

impl BoloError {
    /// Creates a new transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a new protocol error
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Self::Protocol(msg.into())
    }

    /// Creates a new remote error
    pub fn remote<S: Into<String>>(msg: S) -> Self {
        Self::Remote(msg.into())
    }

    /// Creates a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if a later, independent attempt could succeed.
    ///
    /// Nothing in this crate retries on its own; this only informs callers.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. } | Self::Io(_))
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) | Self::Io(_) => "transport",
            Self::Timeout { .. } => "timeout",
            Self::Protocol(_) => "protocol",
            Self::Remote(_) => "remote",
            Self::Decode(_) => "decode",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Join(_) => "async",
        }
    }

    /// The text an end user should see for this error.
    ///
    /// Remote errors come from the engine and are safe to show as-is. Anything
    /// else would leak transport detail, so it collapses to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote(msg) => msg.clone(),
            Self::Config(_) => self.to_string(),
            _ => GENERIC_SERVER_ERROR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_displays_verbatim() {
        let err = BoloError::remote("bad query");
        assert_eq!(err.to_string(), "bad query");
        assert_eq!(err.user_message(), "bad query");
        assert_eq!(err.category(), "remote");
    }

    #[test]
    fn test_empty_remote_error() {
        let err = BoloError::remote("");
        assert_eq!(err.to_string(), "");
        assert_eq!(err.user_message(), "");
    }

    #[test]
    fn test_non_remote_errors_are_generic_for_users() {
        let err = BoloError::protocol("unrecognized reply");
        assert_eq!(err.to_string(), "Protocol error: unrecognized reply");
        assert_eq!(err.user_message(), GENERIC_SERVER_ERROR);

        let err = BoloError::decode("malformed ts:v tuple");
        assert_eq!(err.user_message(), GENERIC_SERVER_ERROR);

        let err = BoloError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.user_message(), GENERIC_SERVER_ERROR);
    }

    #[test]
    fn test_error_recoverability() {
        assert!(BoloError::transport("connection refused").is_recoverable());
        assert!(BoloError::Timeout { timeout_ms: 5000 }.is_recoverable());
        assert!(!BoloError::remote("bad query").is_recoverable());
        assert!(!BoloError::decode("bad tuple").is_recoverable());
    }
}
