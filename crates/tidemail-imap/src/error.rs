//! Error types for the IMAP client.
//!
//! Protocol-negative completions (NO/BAD) carry the server's human-readable
//! text and, when present, the bracketed response-code atom so callers can
//! react to codes like TRYCREATE or NONEXISTENT.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Protocol parsing error.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Server completed a command with NO.
    #[error("Server returned NO: {text}")]
    No {
        /// Human-readable text from the tagged response.
        text: String,
        /// Response-code atom from `[CODE ...]`, if any.
        code: Option<String>,
    },

    /// Server completed a command with BAD.
    #[error("Server returned BAD: {text}")]
    Bad {
        /// Human-readable text from the tagged response.
        text: String,
        /// Response-code atom from `[CODE ...]`, if any.
        code: Option<String>,
    },

    /// Server sent BYE (disconnecting).
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid state for the requested operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid sequence-set syntax.
    #[error("Invalid sequence set: {0}")]
    InvalidSequenceSet(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Connection was lost.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
}

impl Error {
    /// Builds the error for a NO/BAD tagged completion.
    ///
    /// The message falls back to `"Error"` when the server sent no text.
    pub(crate) fn from_completion(
        status: crate::types::Status,
        text: &str,
        code: Option<String>,
    ) -> Self {
        let text = if text.is_empty() {
            "Error".to_string()
        } else {
            text.to_string()
        };
        match status {
            crate::types::Status::Bad => Self::Bad { text, code },
            crate::types::Status::Bye => Self::Bye(text),
            _ => Self::No { text, code },
        }
    }

    /// Returns the server response code attached to this error, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::No { code, .. } | Self::Bad { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns true if this error indicates the connection is dead.
    #[must_use]
    pub const fn is_connection_dead(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Bye(_) | Self::ConnectionLost(_) | Self::Tls(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;

    #[test]
    fn test_completion_error_text_fallback() {
        let err = Error::from_completion(Status::No, "", None);
        match err {
            Error::No { text, code } => {
                assert_eq!(text, "Error");
                assert!(code.is_none());
            }
            _ => panic!("Expected NO error"),
        }
    }

    #[test]
    fn test_completion_error_carries_code() {
        let err = Error::from_completion(Status::No, "mailbox gone", Some("NONEXISTENT".into()));
        assert_eq!(err.code(), Some("NONEXISTENT"));
        assert!(err.to_string().contains("mailbox gone"));
    }

    #[test]
    fn test_bad_completion() {
        let err = Error::from_completion(Status::Bad, "syntax error", None);
        assert!(matches!(err, Error::Bad { .. }));
    }

    #[test]
    fn test_connection_dead() {
        assert!(Error::Bye("closing".into()).is_connection_dead());
        assert!(!Error::Protocol("weird".into()).is_connection_dead());
    }
}
