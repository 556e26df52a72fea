//! Probe domain types: retry schedules, probe results, and HTTP exchange shapes.
//!
//! Pure data only — the HTTP transport lives behind `application::ports::HttpClient`.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::domain::error::ConfigError;

/// Fixed retry schedule: `max_attempts` tries separated by a constant `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    max_attempts: u32,
    interval: Duration,
}

impl RetrySchedule {
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroAttempts`] when `max_attempts` is zero.
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            interval,
        })
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(2),
        }
    }
}

/// Everything the prober needs besides the target URL.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Delay before the first attempt, covering process start-up of the target.
    pub settle_delay: Duration,
    pub schedule: RetrySchedule,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Sent as `User-Agent` on every attempt.
    pub user_agent: String,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            schedule: RetrySchedule::default(),
            timeout: Duration::from_secs(5),
            user_agent: "echo-deploy-test-client".to_string(),
        }
    }
}

/// Terminal value of a probe run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub success: bool,
    pub message: String,
    pub details: Option<Value>,
}

// ── HTTP exchange ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A single outbound HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Sent as a JSON body when present.
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout,
        }
    }

    #[must_use]
    pub fn post_json(url: impl Into<String>, body: Value, timeout: Duration) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
            timeout,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A response that arrived, whatever its status.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON when the body is JSON, otherwise the raw text as a string value.
    pub body: Value,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Why a request produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    /// Connection refused, reset, or name resolution failure.
    Connect,
    Timeout,
    /// Anything else: invalid URL, body decoding, redirect loops.
    Request,
}

impl HttpErrorKind {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Transport-level failure: no response arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    pub kind: HttpErrorKind,
    pub message: String,
}
