//! Error handling for the lab portal client

use std::fmt;
use thiserror::Error;

/// Unified error type for the lab portal client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Local file errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// A backend service answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Database query errors
    #[error("Database error: {0}")]
    Database(String),

    /// Input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// The operation needs a signed-in user
    #[error("Not logged in")]
    NotAuthenticated,

    /// The operation needs the admin flag on the current profile
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification used when surfacing an error to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never got a usable answer
    Network,
    /// Local input checks failed; nothing was sent
    Validation,
    /// The service (or the session state) rejected the operation
    Service,
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new database error
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Build an API error from a failed response body.
    ///
    /// Supabase services report failures as JSON with one of `msg`,
    /// `message`, `error_description` or `error`; the raw body is kept
    /// when none of them is present.
    pub fn api(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["msg", "message", "error_description", "error"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| body.to_string());

        Error::Api { status, message }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_) => ErrorKind::Network,
            Error::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Service,
        }
    }

    /// Message suitable for an alert or inline notice
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            Error::Validation(msg) => msg.clone(),
            Error::Http(_) => "Network error, please try again.".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_prefers_service_message() {
        let err = Error::api(400, r#"{"code":400,"msg":"Token has expired or is invalid"}"#);
        assert_eq!(err.user_message(), "Token has expired or is invalid");
        assert_eq!(err.kind(), ErrorKind::Service);

        let err = Error::api(502, "Bad Gateway");
        assert_eq!(err.user_message(), "Bad Gateway");
        assert_eq!(err.to_string(), "Request failed with status 502: Bad Gateway");
    }

    #[test]
    fn validation_errors_are_classified() {
        let err = Error::validation("Please fill name, phone and date.");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Please fill name, phone and date.");
    }
}
