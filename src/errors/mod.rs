//! Error types for the GitHub REST core.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Result type alias for GitHub operations.
pub type GitHubResult<T> = Result<T, GitHubError>;

/// Message fragments that identify a 403 response as a rate-limit rejection.
///
/// Matched case-sensitively against the body `message`, mirroring the exact
/// phrases GitHub emits for primary limits, abuse detection, and secondary
/// limits.
const RATE_LIMIT_PHRASES: &[&str] = &[
    "API Rate Limit Exceeded",
    "abuse detection mechanism",
    "secondary rate limit",
];

/// Error kinds for categorizing GitHub errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    // Configuration errors
    /// Missing authentication configuration.
    MissingAuth,
    /// Invalid base URL.
    InvalidBaseUrl,
    /// Invalid configuration.
    InvalidConfiguration,

    // Transport errors
    /// Connection failed.
    ConnectionFailed,
    /// Request timeout.
    Timeout,

    /// The server redirected off the configured base endpoint (scheme, host,
    /// or explicit-port mismatch). Fatal, never followed.
    RedirectedOffBase,

    /// Malformed or unexpected JSON shape.
    Decoding,

    // HTTP-status-derived errors
    /// Bad credentials (401).
    BadCredentials,
    /// Two-factor authentication required (401 with OTP header).
    TwoFactorRequired,
    /// Missing or invalid User-Agent (403).
    BadUserAgent,
    /// Rate limit or abuse detection triggered (403).
    RateLimitExceeded,
    /// Resource not found (404).
    NotFound,
    /// Any other non-success HTTP response.
    Api,

    /// Random access beyond the end of a paginated list.
    IndexOutOfRange,
    /// Completion requested on an object with no canonical URL.
    IncompletableObject,
}

impl fmt::Display for GitHubErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAuth => write!(f, "missing_auth"),
            Self::InvalidBaseUrl => write!(f, "invalid_base_url"),
            Self::InvalidConfiguration => write!(f, "invalid_configuration"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::RedirectedOffBase => write!(f, "redirected_off_base"),
            Self::Decoding => write!(f, "decoding"),
            Self::BadCredentials => write!(f, "bad_credentials"),
            Self::TwoFactorRequired => write!(f, "two_factor_required"),
            Self::BadUserAgent => write!(f, "bad_user_agent"),
            Self::RateLimitExceeded => write!(f, "rate_limit_exceeded"),
            Self::NotFound => write!(f, "not_found"),
            Self::Api => write!(f, "api"),
            Self::IndexOutOfRange => write!(f, "index_out_of_range"),
            Self::IncompletableObject => write!(f, "incompletable_object"),
        }
    }
}

/// GitHub API error carrying the HTTP status, response headers, and decoded
/// body of the response that produced it.
#[derive(Error, Debug)]
pub struct GitHubError {
    /// Error kind.
    kind: GitHubErrorKind,
    /// Error message (for non-HTTP-derived errors).
    message: String,
    /// HTTP status code.
    status: Option<u16>,
    /// Response headers, lowercased names.
    headers: HashMap<String, String>,
    /// Decoded response body, absent when the body was empty or not JSON.
    data: Option<Value>,
    /// Underlying cause.
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for GitHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => match &self.data {
                Some(data) => write!(f, "{} {}", status, render_json(data)),
                None => write!(f, "{} null", status),
            },
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

impl GitHubError {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: GitHubErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            headers: HashMap::new(),
            data: None,
            cause: None,
        }
    }

    /// Classifies a non-2xx response into the error taxonomy.
    ///
    /// Headers are expected with lowercased names; `data` is the decoded JSON
    /// body, or `None` when the body was empty or unparseable.
    pub fn from_response(
        status: u16,
        headers: HashMap<String, String>,
        data: Option<Value>,
    ) -> Self {
        let message = data
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("");

        let kind = if status == 401 && header_requires_otp(&headers) {
            GitHubErrorKind::TwoFactorRequired
        } else if status == 401 {
            GitHubErrorKind::BadCredentials
        } else if status == 403 && RATE_LIMIT_PHRASES.iter().any(|p| message.contains(p)) {
            GitHubErrorKind::RateLimitExceeded
        } else if status == 403 && message.contains("User Agent") {
            GitHubErrorKind::BadUserAgent
        } else if status == 404 {
            GitHubErrorKind::NotFound
        } else {
            GitHubErrorKind::Api
        };

        Self {
            kind,
            message: message.to_string(),
            status: Some(status),
            headers,
            data,
            cause: None,
        }
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the response headers.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the decoded response body.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> GitHubErrorKind {
        self.kind
    }

    /// Gets the HTTP status code, if this error came from a response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Gets the response headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Gets the decoded response body.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Gets the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if this error came from an HTTP error response.
    pub fn is_http(&self) -> bool {
        self.status.is_some()
    }

    // Convenience constructors

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::InvalidConfiguration, message)
    }

    /// Creates a decoding error.
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::Decoding, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::Timeout, message)
    }

    /// Creates a fatal redirect-validation error.
    pub fn redirected_off_base(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::RedirectedOffBase, message)
    }
}

fn header_requires_otp(headers: &HashMap<String, String>) -> bool {
    headers
        .get("x-github-otp")
        .map_or(false, |v| v.contains("required"))
}

/// Renders a JSON value with `", "` and `": "` separators, the format used in
/// the displayable form of HTTP-derived errors.
pub(crate) fn render_json(value: &Value) -> String {
    let mut out = String::new();
    write_json(value, &mut out);
    out
}

fn write_json(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        // serde_json string serialization cannot fail
        Value::String(s) => out.push_str(&serde_json::to_string(s).unwrap_or_default()),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_json(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push_str(": ");
                write_json(item, out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn headers() -> HashMap<String, String> {
        let mut h = HashMap::new();
        h.insert("header".to_string(), "value".to_string());
        h
    }

    #[test]
    fn bad_credentials() {
        let error = GitHubError::from_response(
            401,
            headers(),
            Some(json!({"message": "Bad credentials"})),
        );
        assert_eq!(error.kind(), GitHubErrorKind::BadCredentials);
        assert_eq!(error.status(), Some(401));
        assert_eq!(error.headers(), &headers());
        assert_eq!(error.to_string(), r#"401 {"message": "Bad credentials"}"#);
    }

    #[test]
    fn two_factor_required() {
        let mut h = HashMap::new();
        h.insert("x-github-otp".to_string(), "required; app".to_string());
        let error = GitHubError::from_response(
            401,
            h,
            Some(json!({"message": "Must specify two-factor authentication OTP code."})),
        );
        assert_eq!(error.kind(), GitHubErrorKind::TwoFactorRequired);
    }

    #[test]
    fn bad_user_agent() {
        let error = GitHubError::from_response(
            403,
            headers(),
            Some(json!({"message": "Missing or invalid User Agent string"})),
        );
        assert_eq!(error.kind(), GitHubErrorKind::BadUserAgent);
        assert_eq!(
            error.to_string(),
            r#"403 {"message": "Missing or invalid User Agent string"}"#
        );
    }

    #[test_case("API Rate Limit Exceeded for 92.104.200.119")]
    #[test_case("You have triggered an abuse detection mechanism. Please wait a few minutes before you try again.")]
    #[test_case("You have exceeded a secondary rate limit. Please wait a few minutes before you try again.")]
    fn rate_limit_exceeded(message: &str) {
        let error = GitHubError::from_response(403, headers(), Some(json!({ "message": message })));
        assert_eq!(error.kind(), GitHubErrorKind::RateLimitExceeded);
        assert_eq!(
            error.to_string(),
            format!(r#"403 {{"message": "{}"}}"#, message)
        );
    }

    #[test]
    fn not_found() {
        let error =
            GitHubError::from_response(404, headers(), Some(json!({"message": "Not Found"})));
        assert_eq!(error.kind(), GitHubErrorKind::NotFound);
        assert_eq!(error.to_string(), r#"404 {"message": "Not Found"}"#);
    }

    #[test]
    fn generic_api_error_across_statuses() {
        for status in [400u16, 405, 409, 422, 451, 500, 502, 503, 599] {
            let error = GitHubError::from_response(
                status,
                headers(),
                Some(json!({"message": "Something unknown"})),
            );
            assert_eq!(error.kind(), GitHubErrorKind::Api, "status {}", status);
            assert_eq!(
                error.to_string(),
                format!(r#"{} {{"message": "Something unknown"}}"#, status)
            );
        }
    }

    #[test]
    fn empty_body() {
        let error = GitHubError::from_response(400, HashMap::new(), Some(json!({})));
        assert_eq!(error.to_string(), "400 {}");
    }

    #[test]
    fn absent_body() {
        let error = GitHubError::from_response(502, HashMap::new(), None);
        assert_eq!(error.kind(), GitHubErrorKind::Api);
        assert_eq!(error.to_string(), "502 null");
    }

    #[test]
    fn non_http_display() {
        let error = GitHubError::timeout("request timed out after 30s");
        assert_eq!(error.to_string(), "[timeout] request timed out after 30s");
    }

    #[test]
    fn render_json_nested() {
        let value = json!({
            "message": "Validation Failed",
            "errors": [{"code": "missing_field", "field": "title"}],
            "count": 2,
            "ok": false,
            "extra": null
        });
        assert_eq!(
            render_json(&value),
            r#"{"message": "Validation Failed", "errors": [{"code": "missing_field", "field": "title"}], "count": 2, "ok": false, "extra": null}"#
        );
    }
}
