//! The requester: authenticated, paced HTTP transport with strict redirect
//! validation and typed error translation.

use crate::auth::{AuthMethod, CredentialProvider, StaticCredentialProvider};
use crate::config::RequesterConfig;
use crate::errors::{GitHubError, GitHubErrorKind, GitHubResult};
use crate::observability::{Metrics, RequestObserver, TracingObserver};
use crate::throttle::{Clock, SystemClock, Throttle};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A request handed to the HTTP backend. The URL is always absolute.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: String,
    /// Header pairs, lowercased names.
    pub headers: Vec<(String, String)>,
    /// JSON body text, if any.
    pub body: Option<String>,
}

/// A raw response from the HTTP backend.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lowercased names.
    pub headers: HashMap<String, String>,
    /// Raw body text, if any.
    pub body: Option<String>,
}

/// Transport seam between the requester and the wire.
///
/// The default implementation is [`ReqwestBackend`]; tests use
/// `mocks::MockBackend`. Backends must not follow redirects themselves; the
/// requester validates and follows them.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Sends a single request and returns the raw response.
    async fn send(&self, request: BackendRequest) -> GitHubResult<BackendResponse>;
}

/// HTTP backend built on `reqwest`, with redirect following disabled.
pub struct ReqwestBackend {
    http: reqwest::Client,
}

impl ReqwestBackend {
    /// Creates a new backend from the requester configuration.
    pub fn new(config: &RequesterConfig) -> GitHubResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool.max_idle_per_host)
            .pool_idle_timeout(config.pool.idle_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                GitHubError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: BackendRequest) -> GitHubResult<BackendResponse> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| GitHubError::configuration(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| GitHubError::configuration(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .http
            .request(request.method, &request.url)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GitHubError::timeout(format!("Request timed out: {}", e)).with_cause(e)
            } else if e.is_connect() {
                GitHubError::new(
                    GitHubErrorKind::ConnectionFailed,
                    format!("Connection failed: {}", e),
                )
                .with_cause(e)
            } else {
                GitHubError::new(
                    GitHubErrorKind::ConnectionFailed,
                    format!("Request failed: {}", e),
                )
                .with_cause(e)
            }
        })?;

        let status = response.status().as_u16();
        let mut header_map = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                header_map.insert(name.as_str().to_ascii_lowercase(), v.to_string());
            }
        }

        let text = response.text().await.map_err(|e| {
            GitHubError::new(
                GitHubErrorKind::ConnectionFailed,
                format!("Failed to read response body: {}", e),
            )
            .with_cause(e)
        })?;

        Ok(BackendResponse {
            status,
            headers: header_map,
            body: if text.is_empty() { None } else { Some(text) },
        })
    }
}

/// A decoded API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lowercased names.
    pub headers: HashMap<String, String>,
    /// Decoded JSON body; `None` for empty (e.g. 204) responses.
    pub body: Option<Value>,
}

/// Issues authenticated HTTP calls against the configured base endpoint.
///
/// Owns the pacing state, validates redirects against the base endpoint, and
/// translates non-2xx responses into [`GitHubError`]s. One instance per
/// logical client session; safe to share behind an `Arc`, in which case the
/// throttle serializes pacing decisions across callers.
pub struct Requester {
    config: RequesterConfig,
    credentials: Arc<dyn CredentialProvider>,
    backend: Arc<dyn HttpBackend>,
    throttle: Throttle,
    observer: Arc<dyn RequestObserver>,
    metrics: Arc<Metrics>,
}

impl Requester {
    /// Creates a requester with the default reqwest backend and the given
    /// fixed credentials.
    pub fn new(config: RequesterConfig, auth: AuthMethod) -> GitHubResult<Self> {
        Self::builder()
            .config(config)
            .auth(auth)
            .build()
    }

    /// Creates a new requester builder.
    pub fn builder() -> RequesterBuilder {
        RequesterBuilder::new()
    }

    /// Gets the configuration.
    pub fn config(&self) -> &RequesterConfig {
        &self.config
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Gets the default page size for paginated endpoints.
    pub fn per_page(&self) -> u32 {
        self.config.per_page
    }

    /// Gets the metrics handle.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Makes a GET request.
    pub async fn get(&self, url: &str) -> GitHubResult<ApiResponse> {
        self.request_json(Method::GET, url, &[], &[], None).await
    }

    /// Makes a GET request with query parameters and extra headers.
    pub async fn get_with(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &[(String, String)],
    ) -> GitHubResult<ApiResponse> {
        self.request_json(Method::GET, url, params, headers, None)
            .await
    }

    /// Makes a POST request.
    pub async fn post(&self, url: &str, body: Option<&Value>) -> GitHubResult<ApiResponse> {
        self.request_json(Method::POST, url, &[], &[], body).await
    }

    /// Makes a PATCH request.
    pub async fn patch(&self, url: &str, body: Option<&Value>) -> GitHubResult<ApiResponse> {
        self.request_json(Method::PATCH, url, &[], &[], body).await
    }

    /// Makes a PUT request.
    pub async fn put(&self, url: &str, body: Option<&Value>) -> GitHubResult<ApiResponse> {
        self.request_json(Method::PUT, url, &[], &[], body).await
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, url: &str) -> GitHubResult<ApiResponse> {
        self.request_json(Method::DELETE, url, &[], &[], None).await
    }

    /// Issues a request and decodes the JSON response.
    ///
    /// `url` may be absolute or relative to the configured base endpoint.
    /// `extra_headers` override the defaults (notably `Accept`, for per-call
    /// media-type selection). Pacing is applied before the call; a validated
    /// same-host path-only 301/302 is followed exactly once; any status of
    /// 400 or above becomes an error carrying status, headers, and body.
    pub async fn request_json(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        extra_headers: &[(String, String)],
        body: Option<&Value>,
    ) -> GitHubResult<ApiResponse> {
        let full_url = self.resolve_url(url, params)?;
        let is_write = matches!(method.as_str(), "POST" | "PATCH" | "PUT" | "DELETE");

        let headers = self.build_headers(extra_headers, body.is_some()).await?;
        let body_text = body.map(Value::to_string);

        let waited = self.throttle.acquire(is_write).await;
        if !waited.is_zero() {
            self.metrics.record_throttle_wait();
        }

        let id = Uuid::new_v4();
        self.observer.on_request(id, method.as_str(), &full_url);
        self.metrics.record_request();
        let started = Instant::now();

        let request = BackendRequest {
            method,
            url: full_url.clone(),
            headers,
            body: body_text,
        };
        let mut response = self.backend.send(request.clone()).await?;

        if matches!(response.status, 301 | 302) {
            if let Some(location) = response.headers.get("location").cloned() {
                let target = self.check_redirect(&full_url, &location)?;
                let from_path = path_and_query(&full_url);
                let to_path = path_and_query(&target);
                self.observer.on_redirect(id, &from_path, &to_path);
                self.metrics.record_redirect();

                // Follow once; the follow target is not itself re-validated.
                let mut follow = request;
                follow.url = target;
                response = self.backend.send(follow).await?;
            }
        }

        self.observer
            .on_response(id, response.status, started.elapsed());
        self.metrics.record_latency(started.elapsed());

        let data = decode_body(response.status, response.body)?;
        if response.status >= 400 {
            self.metrics.record_failure();
            return Err(GitHubError::from_response(
                response.status,
                response.headers,
                data,
            ));
        }

        Ok(ApiResponse {
            status: response.status,
            headers: response.headers,
            body: data,
        })
    }

    async fn build_headers(
        &self,
        extra_headers: &[(String, String)],
        has_body: bool,
    ) -> GitHubResult<Vec<(String, String)>> {
        let mut headers = self.credentials.auth_headers().await?;
        headers.push(("user-agent".to_string(), self.config.user_agent.clone()));
        headers.push((
            "x-github-api-version".to_string(),
            self.config.api_version.clone(),
        ));
        if !extra_headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("accept"))
        {
            headers.push((
                "accept".to_string(),
                "application/vnd.github+json".to_string(),
            ));
        }
        if has_body {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        for (name, value) in extra_headers {
            headers.push((name.to_ascii_lowercase(), value.clone()));
        }
        Ok(headers)
    }

    fn resolve_url(&self, url: &str, params: &[(String, String)]) -> GitHubResult<String> {
        let mut full = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        };

        if !params.is_empty() {
            let query = serde_urlencoded::to_string(params).map_err(|e| {
                GitHubError::configuration(format!("Failed to serialize parameters: {}", e))
            })?;
            full.push(if full.contains('?') { '&' } else { '?' });
            full.push_str(&query);
        }

        Ok(full)
    }

    /// Validates a redirect target against the request URL.
    ///
    /// The target must differ in path only. A scheme change, a host change,
    /// or an explicit-vs-implicit port mismatch means the configured base
    /// endpoint is wrong, and following silently would hand credentials to an
    /// unintended host. Explicit default ports (`:443` on https) are
    /// deliberately not normalized away.
    fn check_redirect(&self, requested: &str, location: &str) -> GitHubResult<String> {
        let original = SplitUrl::parse(requested)?;

        let target_url = if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else if location.starts_with('/') {
            format!("{}://{}{}", original.scheme, original.authority, location)
        } else {
            return Err(GitHubError::decoding(format!(
                "Unsupported Location header value: {}",
                location
            )));
        };

        if self.config.allow_cross_redirects {
            return Ok(target_url);
        }

        let target = SplitUrl::parse(&target_url)?;

        if original.scheme != target.scheme {
            return Err(GitHubError::redirected_off_base(format!(
                "Server redirected from {} protocol to {}, please correct the configured base URL",
                original.scheme, target.scheme
            )));
        }
        if original.host != target.host {
            return Err(GitHubError::redirected_off_base(format!(
                "Server redirected from host {} to {}, please correct the configured base URL",
                original.host, target.host
            )));
        }
        if original.port != target.port {
            return Err(GitHubError::redirected_off_base(format!(
                "Requested {} but server redirected to {}, you may need to correct the configured base URL",
                requested, target_url
            )));
        }

        Ok(target_url)
    }
}

impl fmt::Debug for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requester")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

/// Decodes a response body. Empty bodies yield `None`; a 2xx response with an
/// unparseable body is a decoding error, while error responses keep their
/// unparseable body as absent so the status still surfaces.
fn decode_body(status: u16, body: Option<String>) -> GitHubResult<Option<Value>> {
    let text = match body {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Ok(None),
    };
    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(e) if status < 400 => Err(GitHubError::decoding(format!(
            "Invalid JSON in response: {}",
            e
        ))),
        Err(_) => Ok(None),
    }
}

/// URL components compared textually during redirect validation.
#[derive(Debug, PartialEq, Eq)]
struct SplitUrl<'a> {
    scheme: &'a str,
    authority: &'a str,
    host: &'a str,
    /// The textual port, `None` when the URL carries no explicit port.
    port: Option<&'a str>,
    path_and_query: &'a str,
}

impl<'a> SplitUrl<'a> {
    fn parse(url: &'a str) -> GitHubResult<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| GitHubError::decoding(format!("Not an absolute URL: {}", url)))?;
        let (authority, path_and_query) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                (host, Some(port))
            }
            _ => (authority, None),
        };
        Ok(Self {
            scheme,
            authority,
            host,
            port,
            path_and_query,
        })
    }
}

fn path_and_query(url: &str) -> String {
    SplitUrl::parse(url)
        .map(|u| u.path_and_query.to_string())
        .unwrap_or_else(|_| url.to_string())
}

/// Builder for [`Requester`].
pub struct RequesterBuilder {
    config: Option<RequesterConfig>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    backend: Option<Arc<dyn HttpBackend>>,
    clock: Option<Arc<dyn Clock>>,
    observer: Option<Arc<dyn RequestObserver>>,
}

impl RequesterBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            credentials: None,
            backend: None,
            clock: None,
            observer: None,
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: RequesterConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets fixed credentials.
    pub fn auth(mut self, method: AuthMethod) -> Self {
        self.credentials = Some(Arc::new(StaticCredentialProvider::new(method)));
        self
    }

    /// Sets a credential provider.
    pub fn credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Sets the HTTP backend.
    pub fn backend(mut self, backend: Arc<dyn HttpBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the clock used for pacing.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the request observer.
    pub fn observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Builds the requester. Missing credentials mean a missing-auth error;
    /// use [`crate::auth::AnonymousCredentials`] for unauthenticated access.
    pub fn build(self) -> GitHubResult<Requester> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let credentials = self.credentials.ok_or_else(|| {
            GitHubError::new(GitHubErrorKind::MissingAuth, "Authentication required")
        })?;

        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(ReqwestBackend::new(&config)?),
        };

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::default()));
        let throttle = Throttle::new(
            config.seconds_between_requests,
            config.seconds_between_writes,
            clock,
        );

        let observer = self
            .observer
            .unwrap_or_else(|| Arc::new(TracingObserver));

        Ok(Requester {
            config,
            credentials,
            backend,
            throttle,
            observer,
            metrics: Arc::new(Metrics::new()),
        })
    }
}

impl Default for RequesterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockBackend, MockResponse, RecordingObserver};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn requester_with(backend: Arc<MockBackend>) -> Requester {
        Requester::builder()
            .auth(AuthMethod::token("ghp_test"))
            .backend(backend)
            .build()
            .unwrap()
    }

    #[test]
    fn resolve_url_joins_base_and_path() {
        let requester = requester_with(Arc::new(MockBackend::new()));
        assert_eq!(
            requester.resolve_url("/repos/owner/repo", &[]).unwrap(),
            "https://api.github.com/repos/owner/repo"
        );
        assert_eq!(
            requester.resolve_url("repos/owner/repo", &[]).unwrap(),
            "https://api.github.com/repos/owner/repo"
        );
        assert_eq!(
            requester
                .resolve_url("https://elsewhere.test/x", &[])
                .unwrap(),
            "https://elsewhere.test/x"
        );
    }

    #[test]
    fn resolve_url_appends_query() {
        let requester = requester_with(Arc::new(MockBackend::new()));
        let params = vec![
            ("per_page".to_string(), "10".to_string()),
            ("page".to_string(), "3".to_string()),
        ];
        assert_eq!(
            requester.resolve_url("/repos", &params).unwrap(),
            "https://api.github.com/repos?per_page=10&page=3"
        );
    }

    #[test]
    fn split_url_keeps_explicit_port() {
        let split = SplitUrl::parse("https://api.github.com:443/repos/o/r?x=1").unwrap();
        assert_eq!(split.scheme, "https");
        assert_eq!(split.host, "api.github.com");
        assert_eq!(split.port, Some("443"));
        assert_eq!(split.path_and_query, "/repos/o/r?x=1");

        let implicit = SplitUrl::parse("https://api.github.com/repos/o/r").unwrap();
        assert_eq!(implicit.port, None);
    }

    #[tokio::test]
    async fn get_decodes_json() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get("/repos/o/r", MockResponse::ok(&json!({"name": "r"})));
        let requester = requester_with(backend.clone());

        let response = requester.get("/repos/o/r").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Some(json!({"name": "r"})));

        let recorded = backend.requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, "GET");
        assert_eq!(recorded[0].path, "/repos/o/r");
        assert!(recorded[0]
            .headers
            .iter()
            .any(|(k, v)| k == "authorization" && v == "Bearer ghp_test"));
    }

    #[tokio::test]
    async fn accept_header_can_be_overridden_per_call() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get("/repos/o/r", MockResponse::ok(&json!({})));
        let requester = requester_with(backend.clone());

        let headers = vec![(
            "Accept".to_string(),
            "application/vnd.github.raw+json".to_string(),
        )];
        requester
            .request_json(Method::GET, "/repos/o/r", &[], &headers, None)
            .await
            .unwrap();

        let accepts: Vec<_> = backend.requests()[0]
            .headers
            .iter()
            .filter(|(k, _)| k == "accept")
            .map(|(_, v)| v.clone())
            .collect();
        assert_eq!(accepts, vec!["application/vnd.github.raw+json"]);
    }

    #[tokio::test]
    async fn error_statuses_become_typed_errors() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get(
            "/missing",
            MockResponse::with_status(404, &json!({"message": "Not Found"})),
        );
        let requester = requester_with(backend);

        let error = requester.get("/missing").await.unwrap_err();
        assert_eq!(error.kind(), GitHubErrorKind::NotFound);
        assert_eq!(error.to_string(), r#"404 {"message": "Not Found"}"#);
    }

    #[tokio::test]
    async fn no_content_has_no_body() {
        let backend = Arc::new(MockBackend::new());
        backend.on_delete("/repos/o/r/labels/x", MockResponse::no_content());
        let requester = requester_with(backend);

        let response = requester.delete("/repos/o/r/labels/x").await.unwrap();
        assert_eq!(response.status, 204);
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn invalid_json_on_success_is_a_decoding_error() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get("/weird", MockResponse::raw(200, "not json"));
        let requester = requester_with(backend);

        let error = requester.get("/weird").await.unwrap_err();
        assert_eq!(error.kind(), GitHubErrorKind::Decoding);
    }

    #[tokio::test]
    async fn invalid_json_on_error_keeps_the_status() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get("/broken", MockResponse::raw(502, "<html>Bad Gateway</html>"));
        let requester = requester_with(backend);

        let error = requester.get("/broken").await.unwrap_err();
        assert_eq!(error.kind(), GitHubErrorKind::Api);
        assert_eq!(error.to_string(), "502 null");
    }

    #[tokio::test]
    async fn path_only_redirect_is_followed_once_with_diagnostic() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get(
            "/repos/EnricoMi/test",
            MockResponse::redirect(301, "https://api.github.com/repositories/638123443"),
        );
        backend.on_get(
            "/repositories/638123443",
            MockResponse::ok(&json!({"name": "test-renamed"})),
        );

        let observer = Arc::new(RecordingObserver::new());
        let requester = Requester::builder()
            .auth(AuthMethod::token("ghp_test"))
            .backend(backend.clone())
            .observer(observer.clone())
            .build()
            .unwrap();

        let response = requester.get("/repos/EnricoMi/test").await.unwrap();
        assert_eq!(response.body, Some(json!({"name": "test-renamed"})));
        assert_eq!(backend.request_count(), 2);
        assert_eq!(
            observer.redirects(),
            vec![(
                "/repos/EnricoMi/test".to_string(),
                "/repositories/638123443".to_string()
            )]
        );
        assert_eq!(requester.metrics().redirects_followed(), 1);
    }

    #[tokio::test]
    async fn relative_location_is_resolved_against_the_request() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get("/old", MockResponse::redirect(302, "/new"));
        backend.on_get("/new", MockResponse::ok(&json!({"ok": true})));
        let requester = requester_with(backend.clone());

        let response = requester.get("/old").await.unwrap();
        assert_eq!(response.body, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn scheme_change_is_a_fatal_configuration_error() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get(
            "/repos/o/r",
            MockResponse::redirect(301, "https://api.github.com/repos/o/r"),
        );
        let config = RequesterConfig::builder()
            .base_url("http://api.github.com")
            .build()
            .unwrap();
        let requester = Requester::builder()
            .config(config)
            .auth(AuthMethod::token("t"))
            .backend(backend.clone())
            .build()
            .unwrap();

        let error = requester.get("/repos/o/r").await.unwrap_err();
        assert_eq!(error.kind(), GitHubErrorKind::RedirectedOffBase);
        assert!(error.message().contains("http protocol to https"));
        // fails before any further request is made
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn host_change_names_both_hosts() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get(
            "/repos/o/r",
            MockResponse::redirect(301, "https://github.com/repos/o/r"),
        );
        let config = RequesterConfig::builder()
            .base_url("https://www.github.com")
            .build()
            .unwrap();
        let requester = Requester::builder()
            .config(config)
            .auth(AuthMethod::token("t"))
            .backend(backend.clone())
            .build()
            .unwrap();

        let error = requester.get("/repos/o/r").await.unwrap_err();
        assert_eq!(error.kind(), GitHubErrorKind::RedirectedOffBase);
        assert!(error.message().contains("www.github.com"));
        assert!(error.message().contains("to github.com"));
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn explicit_port_mismatch_is_fatal() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get(
            "/repos/o/r",
            MockResponse::redirect(301, "https://api.github.com:443/repos/o/r"),
        );
        let requester = requester_with(backend.clone());

        let error = requester.get("/repos/o/r").await.unwrap_err();
        assert_eq!(error.kind(), GitHubErrorKind::RedirectedOffBase);
        assert!(error
            .message()
            .contains("https://api.github.com:443/repos/o/r"));
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn cross_redirects_can_be_allowed_explicitly() {
        let backend = Arc::new(MockBackend::new());
        backend.on_get(
            "/repos/o/r",
            MockResponse::redirect(301, "https://mirror.example.com/repos/o/r"),
        );
        backend.on_get(
            "https://mirror.example.com/repos/o/r",
            MockResponse::ok(&json!({"ok": true})),
        );
        let config = RequesterConfig::builder().allow_cross_redirects().build().unwrap();
        let requester = Requester::builder()
            .config(config)
            .auth(AuthMethod::token("t"))
            .backend(backend.clone())
            .build()
            .unwrap();

        let response = requester.get("/repos/o/r").await.unwrap();
        assert_eq!(response.body, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn missing_credentials_fail_at_build_time() {
        let error = Requester::builder().build().unwrap_err();
        assert_eq!(error.kind(), GitHubErrorKind::MissingAuth);
    }
}
