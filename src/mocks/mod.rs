//! Test doubles: a scripted HTTP backend, a virtual-time clock, a recording
//! observer, and a pair of fixture resources.
//!
//! Everything here plugs into the seams the requester exposes, so transport
//! behavior, pacing, and the completion protocol can all be tested without a
//! network or real sleeping.

use crate::client::{BackendRequest, BackendResponse, HttpBackend};
use crate::errors::GitHubResult;
use crate::observability::RequestObserver;
use crate::throttle::Clock;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

pub mod fixtures;

/// A request as seen by the [`MockBackend`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method name.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// URL path.
    pub path: String,
    /// Query string, if any.
    pub query: Option<String>,
    /// Header pairs, lowercased names.
    pub headers: Vec<(String, String)>,
    /// Body text, if any.
    pub body: Option<String>,
}

/// A scripted response for the [`MockBackend`].
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl MockResponse {
    /// A 200 response with a JSON body.
    pub fn ok(body: &impl Serialize) -> Self {
        Self::with_status(200, body)
    }

    /// A 201 response with a JSON body.
    pub fn created(body: &impl Serialize) -> Self {
        Self::with_status(201, body)
    }

    /// A response with the given status and JSON body.
    pub fn with_status(status: u16, body: &impl Serialize) -> Self {
        let text = serde_json::to_string(body).expect("mock body must serialize");
        Self {
            status,
            headers: Vec::new(),
            body: Some(text),
        }
    }

    /// An empty 204 response.
    pub fn no_content() -> Self {
        Self {
            status: 204,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A canned 404 error response.
    pub fn not_found() -> Self {
        Self::with_status(404, &serde_json::json!({"message": "Not Found"}))
    }

    /// A canned 401 error response.
    pub fn unauthorized() -> Self {
        Self::with_status(401, &serde_json::json!({"message": "Bad credentials"}))
    }

    /// A canned 403 error response with the given message.
    pub fn forbidden(message: &str) -> Self {
        Self::with_status(403, &serde_json::json!({ "message": message }))
    }

    /// A 200 page of results with a `Link: next` header when `next` is given.
    pub fn page(body: &impl Serialize, next: Option<&str>) -> Self {
        let response = Self::ok(body);
        match next {
            Some(url) => response.with_header("link", &format!("<{}>; rel=\"next\"", url)),
            None => response,
        }
    }

    /// A response with a raw, possibly non-JSON body.
    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Some(body.to_string()),
        }
    }

    /// A redirect response with a Location header and no body.
    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            headers: vec![("location".to_string(), location.to_string())],
            body: None,
        }
    }

    /// Adds a response header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }
}

/// Scripted in-memory HTTP backend.
///
/// Responses are registered per method and path (or full URL). Lookup tries
/// the full URL, then the path with its query string, then the bare path, so
/// a route registered as `/orgs/o/repos` also matches
/// `/orgs/o/repos?per_page=2` while a more specific `?page=2` registration
/// wins for continuation requests. Multiple registrations on one route are
/// consumed in order; the last one repeats.
#[derive(Default)]
pub struct MockBackend {
    routes: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    fallback: Mutex<Option<MockResponse>>,
}

impl MockBackend {
    /// Creates an empty backend. Requests to unregistered routes panic
    /// unless a fallback is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the response for requests that match no registered route.
    pub fn set_fallback(&self, response: MockResponse) {
        *self.fallback.lock().unwrap() = Some(response);
    }

    /// Registers a response for a method and path or full URL.
    pub fn register(&self, method: &str, path_or_url: &str, response: MockResponse) {
        let key = format!("{} {}", method.to_ascii_uppercase(), path_or_url);
        self.routes
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(response);
    }

    /// Registers a GET response.
    pub fn on_get(&self, path_or_url: &str, response: MockResponse) {
        self.register("GET", path_or_url, response);
    }

    /// Registers a POST response.
    pub fn on_post(&self, path_or_url: &str, response: MockResponse) {
        self.register("POST", path_or_url, response);
    }

    /// Registers a PATCH response.
    pub fn on_patch(&self, path_or_url: &str, response: MockResponse) {
        self.register("PATCH", path_or_url, response);
    }

    /// Registers a PUT response.
    pub fn on_put(&self, path_or_url: &str, response: MockResponse) {
        self.register("PUT", path_or_url, response);
    }

    /// Registers a DELETE response.
    pub fn on_delete(&self, path_or_url: &str, response: MockResponse) {
        self.register("DELETE", path_or_url, response);
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests matching a method and path.
    pub fn requests_matching(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Returns true if at least one matching request was seen.
    pub fn verify_request(&self, method: &str, path: &str) -> bool {
        !self.requests_matching(method, path).is_empty()
    }

    fn take_response(&self, method: &str, url: &str) -> Option<MockResponse> {
        let (path, query) = split_request_url(url);
        let candidates = [
            format!("{} {}", method, url),
            match &query {
                Some(q) => format!("{} {}?{}", method, path, q),
                None => format!("{} {}", method, path),
            },
            format!("{} {}", method, path),
        ];

        let mut routes = self.routes.lock().unwrap();
        for key in &candidates {
            if let Some(queue) = routes.get_mut(key) {
                if queue.len() > 1 {
                    return queue.pop_front();
                }
                return queue.front().cloned();
            }
        }
        None
    }
}

#[async_trait]
impl HttpBackend for MockBackend {
    async fn send(&self, request: BackendRequest) -> GitHubResult<BackendResponse> {
        let method = request.method.as_str().to_string();
        let (path, query) = split_request_url(&request.url);

        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.clone(),
            url: request.url.clone(),
            path: path.clone(),
            query,
            headers: request.headers,
            body: request.body,
        });

        let response = self
            .take_response(&method, &request.url)
            .or_else(|| self.fallback.lock().unwrap().clone())
            .unwrap_or_else(|| panic!("no mock response registered for {} {}", method, request.url));

        Ok(BackendResponse {
            status: response.status,
            headers: response.headers.into_iter().collect(),
            body: response.body,
        })
    }
}

fn split_request_url(url: &str) -> (String, Option<String>) {
    let without_scheme = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    let path_and_query = match without_scheme.find('/') {
        Some(i) => &without_scheme[i..],
        None => "/",
    };
    match path_and_query.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (path_and_query.to_string(), None),
    }
}

/// Virtual-time clock. Sleeping records the wait and advances the clock by
/// exactly that amount; no real time passes.
#[derive(Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock without recording a sleep.
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    /// The sequence of sleep durations requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, wait: Duration) {
        self.sleeps.lock().unwrap().push(wait);
        *self.now.lock().unwrap() += wait;
    }
}

/// Observer that records its callbacks for assertions.
#[derive(Default)]
pub struct RecordingObserver {
    requests: Mutex<Vec<(String, String)>>,
    redirects: Mutex<Vec<(String, String)>>,
    responses: Mutex<Vec<u16>>,
}

impl RecordingObserver {
    /// Creates an empty observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded (method, url) pairs.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded (from_path, to_path) redirect pairs.
    pub fn redirects(&self) -> Vec<(String, String)> {
        self.redirects.lock().unwrap().clone()
    }

    /// Recorded response statuses.
    pub fn statuses(&self) -> Vec<u16> {
        self.responses.lock().unwrap().clone()
    }
}

impl RequestObserver for RecordingObserver {
    fn on_request(&self, _id: Uuid, method: &str, url: &str) {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), url.to_string()));
    }

    fn on_redirect(&self, _id: Uuid, from_path: &str, to_path: &str) {
        self.redirects
            .lock()
            .unwrap()
            .push((from_path.to_string(), to_path.to_string()));
    }

    fn on_response(&self, _id: Uuid, status: u16, _elapsed: Duration) {
        self.responses.lock().unwrap().push(status);
    }
}
