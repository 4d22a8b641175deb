//! Core GitHub REST API client: authenticated transport, lazy resource
//! objects, and paginated collections.
//!
//! The [`Requester`] owns the HTTP session: it attaches credentials, paces
//! outgoing requests, validates server redirects against the configured base
//! endpoint, and translates error responses into typed [`GitHubError`]s.
//! Resource wrappers implement [`ApiObject`] and complete themselves lazily
//! on first access to an unfetched attribute; list endpoints are consumed
//! through [`PaginatedList`], which fetches pages on demand and caches them.
//!
//! ```no_run
//! use github_rest_core::{AuthMethod, GitHubResult, Requester};
//!
//! #[tokio::main]
//! async fn main() -> GitHubResult<()> {
//!     let requester = Requester::builder()
//!         .auth(AuthMethod::token("ghp_your_token"))
//!         .build()?;
//!
//!     let response = requester.get("/repos/rust-lang/rust").await?;
//!     println!("{:#?}", response.body);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod mocks;
pub mod object;
pub mod observability;
pub mod pagination;
pub mod throttle;

pub use auth::{AnonymousCredentials, AuthMethod, CredentialProvider};
pub use client::{ApiResponse, HttpBackend, Requester, RequesterBuilder};
pub use config::{RequesterConfig, RequesterConfigBuilder};
pub use errors::{GitHubError, GitHubErrorKind, GitHubResult};
pub use object::{ApiObject, Attribute, Completable, Opt};
pub use pagination::{PaginatedList, PaginationLinks};
