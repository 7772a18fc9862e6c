use reqwest::header::InvalidHeaderValue;
use reqwest::StatusCode;
use std::error::Error as StdError;
use thiserror::Error;

/// Failure to build a chat client at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API key format: {0}")]
    InvalidApiKey(#[from] InvalidHeaderValue),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Failure of a single completion call, as surfaced to the user.
///
/// Every variant keeps the raw upstream text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("{0}")]
    Other(String),
}

impl CompletionError {
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::RateLimited(_) => "rate_limited",
            CompletionError::Unauthorized(_) => "unauthorized",
            CompletionError::ConnectionFailed(_) => "connection_failed",
            CompletionError::Other(_) => "other",
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            CompletionError::RateLimited(s)
            | CompletionError::Unauthorized(s)
            | CompletionError::ConnectionFailed(s)
            | CompletionError::Other(s) => s,
        }
    }

    /// Classifies a non-success HTTP response. 429 and 401 decide by status;
    /// any other status falls back to the text rules.
    pub fn from_status(status: StatusCode, text: String) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited(text),
            StatusCode::UNAUTHORIZED => CompletionError::Unauthorized(text),
            _ => classify_error(&text),
        }
    }
}

/// Best-effort classification by substring, checked in priority order.
pub fn classify_error(text: &str) -> CompletionError {
    let lower = text.to_lowercase();
    let raw = text.to_string();
    if lower.contains("429") || lower.contains("rate") {
        CompletionError::RateLimited(raw)
    } else if lower.contains("401") || lower.contains("invalid") {
        CompletionError::Unauthorized(raw)
    } else if lower.contains("connection") || lower.contains("connect") {
        CompletionError::ConnectionFailed(raw)
    } else {
        CompletionError::Other(raw)
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        // the URL would otherwise leak into substring matching
        let err = err.without_url();
        let text = error_chain(&err);
        if let Some(status) = err.status() {
            return CompletionError::from_status(status, text);
        }
        if err.is_timeout() {
            return CompletionError::Other(format!("Request timed out. ({})", text));
        }
        if err.is_connect() {
            return CompletionError::ConnectionFailed(text);
        }
        classify_error(&text)
    }
}

/// `Display` of the error followed by every `source()` below it.
fn error_chain(err: &dyn StdError) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
