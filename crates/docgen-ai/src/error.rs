//! Error types for text generation
//!
//! Two layers:
//! - [`GenerationError`]: one failed call to the text-generation service
//! - [`SectionError`]: a section that produced no usable content after the
//!   retry policy gave up

use docgen_model::SectionKey;
use serde::Serialize;

/// Classification driving the retry decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    Server,
    /// HTTP 401 / 403
    Auth,
    /// Any other HTTP 4xx
    Client,
    /// Connection failure or timeout
    Transport,
    /// Response was empty, not JSON, or missing required fields
    InvalidOutput,
}

impl ErrorClass {
    /// Whether another attempt may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Server | Self::Transport | Self::InvalidOutput
        )
    }

    /// Short name for logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Server => "server",
            Self::Auth => "auth",
            Self::Client => "client",
            Self::Transport => "transport",
            Self::InvalidOutput => "invalid_output",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed call to the text-generation service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("rate limited: {body}")]
    RateLimited { body: String },

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("not authorized ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("request rejected ({status}): {body}")]
    Client { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid generation output: {0}")]
    InvalidOutput(String),
}

impl GenerationError {
    /// Map a non-success HTTP status to an error
    #[must_use]
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            429 => Self::RateLimited { body },
            401 | 403 => Self::Auth { status, body },
            500..=599 => Self::Server { status, body },
            _ => Self::Client { status, body },
        }
    }

    /// Classification of this error
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::RateLimited { .. } => ErrorClass::RateLimited,
            Self::Server { .. } => ErrorClass::Server,
            Self::Auth { .. } => ErrorClass::Auth,
            Self::Client { .. } => ErrorClass::Client,
            Self::Transport(_) => ErrorClass::Transport,
            Self::InvalidOutput(_) => ErrorClass::InvalidOutput,
        }
    }

    /// Whether the retry policy should try again
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.class().is_retryable()
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16(), err.to_string());
        }
        Self::Transport(err.to_string())
    }
}

/// A section that failed for good
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{section} failed after {attempts} attempt(s) [{class}]: {message}")]
pub struct SectionError {
    pub section: SectionKey,
    pub class: ErrorClass,
    pub attempts: u32,
    /// Message of the last underlying error
    pub message: String,
}

impl SectionError {
    /// Wrap the last generation error for a section
    #[must_use]
    pub fn new(section: SectionKey, attempts: u32, last: &GenerationError) -> Self {
        Self {
            section,
            class: last.class(),
            attempts,
            message: last.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(
            GenerationError::from_status(429, "").class(),
            ErrorClass::RateLimited
        );
        assert_eq!(GenerationError::from_status(401, "").class(), ErrorClass::Auth);
        assert_eq!(GenerationError::from_status(403, "").class(), ErrorClass::Auth);
        assert_eq!(GenerationError::from_status(503, "").class(), ErrorClass::Server);
        assert_eq!(GenerationError::from_status(400, "").class(), ErrorClass::Client);
    }

    #[test]
    fn retryable_classes() {
        assert!(GenerationError::from_status(429, "slow down").is_retryable());
        assert!(GenerationError::from_status(502, "bad gateway").is_retryable());
        assert!(GenerationError::Transport("reset".into()).is_retryable());
        assert!(GenerationError::InvalidOutput("empty".into()).is_retryable());
        assert!(!GenerationError::from_status(401, "bad key").is_retryable());
        assert!(!GenerationError::from_status(422, "bad request").is_retryable());
    }

    #[test]
    fn section_error_carries_last_message() {
        let err = SectionError::new(
            SectionKey::IncidentNarrative,
            3,
            &GenerationError::from_status(500, "boom"),
        );
        assert_eq!(err.class, ErrorClass::Server);
        assert_eq!(
            err.to_string(),
            "incidentNarrative failed after 3 attempt(s) [server]: server returned 500: boom"
        );
    }
}
