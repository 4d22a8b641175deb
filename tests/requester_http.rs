//! End-to-end transport tests against a local mock HTTP server.

use github_rest_core::{AuthMethod, GitHubErrorKind, Requester, RequesterConfig};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn requester_for(server: &MockServer) -> Requester {
    let config = RequesterConfig::builder()
        .base_url(server.uri())
        .build()
        .unwrap();
    Requester::builder()
        .config(config)
        .auth(AuthMethod::token("ghp_integration"))
        .build()
        .unwrap()
}

#[tokio::test]
async fn get_sends_auth_and_version_headers_and_decodes_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello"))
        .and(header("authorization", "Bearer ghp_integration"))
        .and(header("x-github-api-version", "2022-11-28"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "hello"})))
        .expect(1)
        .mount(&server)
        .await;

    let requester = requester_for(&server).await;
    let response = requester.get("/repos/octocat/hello").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, Some(json!({"name": "hello"})));
}

#[tokio::test]
async fn not_found_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let requester = requester_for(&server).await;
    let error = requester.get("/repos/octocat/missing").await.unwrap_err();

    assert_eq!(error.kind(), GitHubErrorKind::NotFound);
    assert_eq!(error.status(), Some(404));
    assert_eq!(error.to_string(), r#"404 {"message": "Not Found"}"#);
}

#[tokio::test]
async fn same_host_redirect_is_followed_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/renamed"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/repositories/42", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repositories/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "renamed"})))
        .expect(1)
        .mount(&server)
        .await;

    let requester = requester_for(&server).await;
    let response = requester.get("/repos/octocat/renamed").await.unwrap();

    assert_eq!(response.body, Some(json!({"name": "renamed"})));
    assert_eq!(requester.metrics().redirects_followed(), 1);
}

#[tokio::test]
async fn cross_host_redirect_fails_without_a_second_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", "http://evil.example.com/repos/octocat/hello"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let requester = requester_for(&server).await;
    let error = requester.get("/repos/octocat/hello").await.unwrap_err();

    assert_eq!(error.kind(), GitHubErrorKind::RedirectedOffBase);
    assert!(error.message().contains("evil.example.com"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_with_no_content_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/repos/octocat/hello/labels/bug"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let requester = requester_for(&server).await;
    let response = requester
        .delete("/repos/octocat/hello/labels/bug")
        .await
        .unwrap();

    assert_eq!(response.status, 204);
    assert!(response.body.is_none());
}

#[tokio::test]
async fn concurrent_gets_share_one_requester() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resources": {}})))
        .expect(4)
        .mount(&server)
        .await;

    let requester = Arc::new(requester_for(&server).await);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let requester = requester.clone();
            tokio::spawn(async move { requester.get("/rate_limit").await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(requester.metrics().total_requests(), 4);
}
