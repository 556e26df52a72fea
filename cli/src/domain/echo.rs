//! Echo-server conformance checks.
//!
//! Each check knows the request it sends and how to judge the response; the
//! application layer only has to send requests and collect verdicts. This
//! module is intentionally free of I/O and async.

use std::time::Duration;

use serde_json::{Value, json};

use crate::domain::probe::{HttpRequest, HttpResponse};
use crate::domain::stack::is_truthy;

/// Header value the header-echo check sends and looks for.
pub const CUSTOM_HEADER_VALUE: &str = "test-value-123";

/// The conformance checks, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoCheck {
    GetOk,
    JsonBody,
    EchoesHeaders,
    AcceptsPost,
    HostInfo,
    QueryParams,
}

impl EchoCheck {
    pub const ALL: [Self; 6] = [
        Self::GetOk,
        Self::JsonBody,
        Self::EchoesHeaders,
        Self::AcceptsPost,
        Self::HostInfo,
        Self::QueryParams,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GetOk => "responds with HTTP 200 on GET",
            Self::JsonBody => "returns a JSON response",
            Self::EchoesHeaders => "echoes request headers",
            Self::AcceptsPost => "handles POST requests",
            Self::HostInfo => "includes host information",
            Self::QueryParams => "handles query parameters",
        }
    }

    /// The request this check sends against `base_url`.
    #[must_use]
    pub fn request(self, base_url: &str, timeout: Duration) -> HttpRequest {
        match self {
            Self::GetOk | Self::JsonBody | Self::HostInfo => HttpRequest::get(base_url, timeout),
            Self::EchoesHeaders => HttpRequest::get(base_url, timeout)
                .header("X-Custom-Header", CUSTOM_HEADER_VALUE),
            Self::AcceptsPost => HttpRequest::post_json(
                base_url,
                json!({ "message": "Hello, Echo Server!" }),
                timeout,
            ),
            Self::QueryParams => HttpRequest::get(format!("{base_url}?test=value&foo=bar"), timeout),
        }
    }

    /// Judge a response. `Err` carries a human-readable reason.
    ///
    /// # Errors
    ///
    /// Returns the reason the response does not satisfy this check.
    pub fn evaluate(self, response: &HttpResponse) -> Result<(), String> {
        if response.status != 200 {
            return Err(format!("expected status 200, got {}", response.status));
        }
        match self {
            Self::GetOk | Self::QueryParams => Ok(()),
            Self::JsonBody => {
                let content_type = response.header("content-type").unwrap_or_default();
                if !content_type.contains("application/json") {
                    return Err(format!("content-type was '{content_type}'"));
                }
                if matches!(response.body, Value::String(_) | Value::Null) {
                    return Err("body is not a JSON document".to_string());
                }
                Ok(())
            }
            Self::EchoesHeaders => {
                let headers = response
                    .body
                    .pointer("/request/headers")
                    .or_else(|| response.body.get("headers"));
                match headers {
                    Some(h) if !h.is_null() => Ok(()),
                    _ => Err("response does not echo request headers".to_string()),
                }
            }
            Self::AcceptsPost => {
                if response.body.is_null() {
                    Err("empty response body".to_string())
                } else {
                    Ok(())
                }
            }
            Self::HostInfo => {
                let body = &response.body;
                let has_host = [
                    body.get("host"),
                    body.get("hostname"),
                    body.pointer("/request/host"),
                ]
                .into_iter()
                .flatten()
                .any(is_truthy);
                if has_host {
                    Ok(())
                } else {
                    Err("response carries no host information".to_string())
                }
            }
        }
    }
}

/// Verdict for one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub detail: Option<String>,
}

impl CheckOutcome {
    #[must_use]
    pub fn pass(check: EchoCheck) -> Self {
        Self {
            name: check.name(),
            passed: true,
            detail: None,
        }
    }

    #[must_use]
    pub fn fail(check: EchoCheck, detail: impl Into<String>) -> Self {
        Self {
            name: check.name(),
            passed: false,
            detail: Some(detail.into()),
        }
    }
}
