//! Credential material and header production.
//!
//! The core only needs a "produce auth headers" capability; richer schemes
//! (JWT minting, OAuth refresh flows) belong to external collaborators that
//! implement [`CredentialProvider`].

use crate::errors::{GitHubError, GitHubErrorKind, GitHubResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use secrecy::{ExposeSecret, SecretString};

/// Authentication method for GitHub API requests.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Bearer token (personal access token, fine-grained or classic).
    Token(SecretString),
    /// Basic authentication.
    Basic {
        /// Login name.
        login: String,
        /// Password or token used as the password.
        password: SecretString,
    },
    /// App installation access token.
    InstallationToken(SecretString),
}

impl AuthMethod {
    /// Creates a bearer-token authentication method.
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(SecretString::new(token.into()))
    }

    /// Creates a basic authentication method.
    pub fn basic(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            login: login.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// Creates an installation-token authentication method.
    pub fn installation(token: impl Into<String>) -> Self {
        Self::InstallationToken(SecretString::new(token.into()))
    }

    /// Produces the header pairs to attach to a request.
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        let value = match self {
            Self::Token(token) => format!("Bearer {}", token.expose_secret()),
            Self::Basic { login, password } => {
                let credentials = format!("{}:{}", login, password.expose_secret());
                format!("Basic {}", BASE64.encode(credentials))
            }
            Self::InstallationToken(token) => format!("token {}", token.expose_secret()),
        };
        vec![("authorization".to_string(), value)]
    }

    /// Gets a masked token prefix for logging.
    pub fn token_prefix(&self) -> &'static str {
        match self {
            Self::Token(t) => {
                let exposed = t.expose_secret();
                if exposed.starts_with("ghp_") {
                    "ghp_***"
                } else if exposed.starts_with("github_pat_") {
                    "github_pat_***"
                } else {
                    "***"
                }
            }
            Self::Basic { .. } => "basic_***",
            Self::InstallationToken(_) => "ghs_***",
        }
    }
}

/// Credential provider trait for dynamic credential resolution.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Produces the auth header pairs for the next request.
    async fn auth_headers(&self) -> GitHubResult<Vec<(String, String)>>;
}

/// Static credential provider using fixed credentials.
pub struct StaticCredentialProvider {
    method: AuthMethod,
}

impl StaticCredentialProvider {
    /// Creates a new static credential provider.
    pub fn new(method: AuthMethod) -> Self {
        Self { method }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn auth_headers(&self) -> GitHubResult<Vec<(String, String)>> {
        Ok(self.method.auth_headers())
    }
}

/// Anonymous access: no auth headers attached.
pub struct AnonymousCredentials;

#[async_trait]
impl CredentialProvider for AnonymousCredentials {
    async fn auth_headers(&self) -> GitHubResult<Vec<(String, String)>> {
        Ok(Vec::new())
    }
}

/// Environment variable credential provider.
pub struct EnvCredentialProvider {
    token_var: String,
}

impl EnvCredentialProvider {
    /// Creates a provider from the `GITHUB_TOKEN` environment variable.
    pub fn from_github_token() -> Self {
        Self {
            token_var: "GITHUB_TOKEN".to_string(),
        }
    }

    /// Creates a provider from a custom environment variable.
    pub fn from_env_var(var_name: impl Into<String>) -> Self {
        Self {
            token_var: var_name.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn auth_headers(&self) -> GitHubResult<Vec<(String, String)>> {
        std::env::var(&self.token_var)
            .map(|token| AuthMethod::token(token).auth_headers())
            .map_err(|_| {
                GitHubError::new(
                    GitHubErrorKind::MissingAuth,
                    format!("Environment variable {} not set", self.token_var),
                )
            })
    }
}
