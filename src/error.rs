//! Error types for product photo editing.

use std::time::Duration;

/// Message shown when an edit fails without a usable error message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to process image. Please try again.";

/// Maximum length of a remote error body carried in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while loading, editing or rendering images.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// API key missing or rejected.
    #[error("{0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("{}", rate_limit_message(.retry_after))]
    RateLimited {
        /// Wait time from the `Retry-After` header, if the service sent one.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters or input file.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The remote service answered, but not with an image.
    #[error("{0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// String is not a `data:<mime>;base64,<data>` URI.
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Image could not be decoded or composed for display.
    #[error("render failed: {0}")]
    Render(String),

    /// I/O error (e.g., reading an upload or saving a download).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditError {
    /// Returns the message to surface to the user when an edit fails.
    ///
    /// Falls back to [`GENERIC_FAILURE_MESSAGE`] when the error carries no text.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Returns true if this error came from missing or rejected credentials.
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<image::ImageError> for EditError {
    fn from(err: image::ImageError) -> Self {
        Self::Render(err.to_string())
    }
}

fn rate_limit_message(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!(
            "Too many requests. Please try again in {} seconds.",
            wait.as_secs().max(1)
        ),
        None => "Too many requests. Please try again later.".to_string(),
    }
}

/// Result type alias for editing operations.
pub type Result<T> = std::result::Result<T, EditError>;

/// Trims a remote error body and redacts anything that looks like an API key.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            let token = word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-');
            if token.starts_with("AIza") && token.len() >= 30 {
                word.replace(token, "[REDACTED]")
            } else if let Some(pos) = word.find("key=") {
                format!("{}key=[REDACTED]", &word[..pos])
            } else {
                word.to_string()
            }
        })
        .collect();
    let joined = redacted.join(" ");

    if joined.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = joined.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        joined
    }
}

/// Reads a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
