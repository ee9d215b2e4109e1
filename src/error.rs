use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use serde_derive::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// The remote error, if the backend rejected the request.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Rate limit window reported by the backend alongside every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: i64,
    pub remaining: i64,
    /// Unix timestamp (seconds) at which the window resets.
    pub reset: i64,
}

impl RateLimitInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| -> Option<i64> { headers.get(name)?.to_str().ok()?.trim().parse().ok() };
        Some(Self {
            limit: read("X-RateLimit-Limit")?,
            remaining: read("X-RateLimit-Remaining")?,
            reset: read("X-RateLimit-Reset")?,
        })
    }

    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.reset, 0).single()
    }
}

/// Error body returned by the backend for any status >= 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub exception_fields: HashMap<String, String>,
    #[serde(default, rename = "StatusCode")]
    pub status_code: u16,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub more_info: String,
    #[serde(skip)]
    pub rate_limit: Option<RateLimitInfo>,
}

impl ApiError {
    pub fn is_rate_limited(&self) -> bool {
        self.status_code == 429
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chat api error (status {}, code {}): {}",
            self.status_code, self.code, self.message
        )
    }
}

impl std::error::Error for ApiError {}
