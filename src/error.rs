//! Error type shared by the catalog loader, chapter fetcher and config layer.

use core::fmt;

/// Failures surfaced by fallible navigator operations.
///
/// Callers at the UI boundary reduce every variant to a fallback message or
/// a navigation back to the home view; the variants exist so logs and the CLI
/// can say what actually went wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavError {
    /// Server answered outside the accepted status range.
    Http { url: String, status: u16 },
    /// Request never produced a response (DNS, TLS, timeout, ...).
    Transport { url: String, message: String },
    /// Response body could not be decoded into the expected shape.
    Decode { what: &'static str, message: String },
    /// Configuration could not be read or parsed.
    Config(String),
    /// Local file access failed.
    Io(String),
}

impl NavError {
    /// Build a decode error for payload `what`.
    pub fn decode(what: &'static str, err: impl fmt::Display) -> Self {
        Self::Decode {
            what,
            message: err.to_string(),
        }
    }

    /// Whether the failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { url, status } => write!(f, "http status {} for {}", status, url),
            Self::Transport { url, message } => {
                write!(f, "transport error for {}: {}", url, message)
            }
            Self::Decode { what, message } => write!(f, "invalid {} payload: {}", what, message),
            Self::Config(message) => write!(f, "config error: {}", message),
            Self::Io(message) => write!(f, "io error: {}", message),
        }
    }
}

impl std::error::Error for NavError {}

impl From<std::io::Error> for NavError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_url() {
        let err = NavError::Http {
            url: "https://example.test/books".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "http status 503 for https://example.test/books");
        assert!(!err.is_transport());
    }

    #[test]
    fn decode_helper_keeps_source_message() {
        let err = NavError::decode("volumes", "expected array");
        assert_eq!(err.to_string(), "invalid volumes payload: expected array");
    }
}
