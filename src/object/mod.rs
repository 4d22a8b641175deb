//! Lazy completable resource objects.
//!
//! Every API resource is a set of named [`Attribute`]s plus a requester and a
//! canonical URL. Objects constructed from list elements or embedded payloads
//! are *partial*; the first accessor that finds its attribute unset triggers
//! exactly one fetch-and-merge against the canonical URL, after which the
//! object is *complete* and never refetches on its own.

use crate::client::Requester;
use crate::errors::{GitHubError, GitHubErrorKind, GitHubResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A lazily-or-eagerly-known attribute value with an explicit unset state.
///
/// `NotSet` means the value was never fetched, which is distinct from a
/// fetched-and-null value (model those as `Attribute<Option<T>>`). Reading an
/// attribute never performs I/O; only the owning object's accessor does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Attribute<T> {
    /// The value was never fetched.
    #[default]
    NotSet,
    /// The value as returned by the API.
    Set(T),
}

impl<T> Attribute<T> {
    /// Returns true if the value has been fetched.
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Gets the value, or `None` when unset.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::NotSet => None,
        }
    }

    /// Consumes the attribute and returns the value, or `None` when unset.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Set(value) => Some(value),
            Self::NotSet => None,
        }
    }

    /// Maps a set value, leaving `NotSet` untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attribute<U> {
        match self {
            Self::Set(value) => Attribute::Set(f(value)),
            Self::NotSet => Attribute::NotSet,
        }
    }
}

/// An optional request parameter: provided or omitted entirely.
///
/// Distinguishes "send this value" (including an explicit null) from "leave
/// the field out of the request body".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Opt<T> {
    /// Send this value.
    Provided(T),
    /// Leave the field out of the request.
    #[default]
    Omitted,
}

impl<T: serde::Serialize> Opt<T> {
    /// Returns true if a value was provided.
    pub fn is_provided(&self) -> bool {
        matches!(self, Self::Provided(_))
    }

    /// Inserts the value into a request body map when provided.
    pub fn write_to(&self, map: &mut Map<String, Value>, key: &str) -> GitHubResult<()> {
        if let Self::Provided(value) = self {
            let value = serde_json::to_value(value).map_err(|e| {
                GitHubError::configuration(format!("Failed to serialize parameter {}: {}", key, e))
            })?;
            map.insert(key.to_string(), value);
        }
        Ok(())
    }
}

impl<T> From<T> for Opt<T> {
    fn from(value: T) -> Self {
        Self::Provided(value)
    }
}

/// The completable-object protocol implemented by every resource wrapper.
///
/// `apply_attributes` merges a decoded payload: recognized fields decode and
/// overwrite, fields absent from the payload keep their previous value, and
/// unrecognized fields are ignored so new API fields never break decoding.
pub trait ApiObject: Sized + Send + Sync {
    /// Constructs a resource from a decoded JSON object.
    ///
    /// `completed` is true for direct single-resource fetches and write
    /// responses, false for list elements and embedded payloads.
    fn from_raw(
        requester: Arc<Requester>,
        raw: &Map<String, Value>,
        completed: bool,
    ) -> GitHubResult<Self>;

    /// Merges a decoded JSON object into the attribute set.
    fn apply_attributes(&mut self, raw: &Map<String, Value>) -> GitHubResult<()>;

    /// The canonical resource URL, once known. It is both the fetch endpoint
    /// and the object's identity key within the remote system.
    fn url(&self) -> Option<&str>;

    /// The requester this object fetches through.
    fn requester(&self) -> &Arc<Requester>;

    /// Returns true once all documented fields are confirmed fetched.
    fn is_completed(&self) -> bool;

    /// Marks the completion state.
    fn set_completed(&mut self, completed: bool);
}

/// On-demand completion and re-hydration, provided for every [`ApiObject`].
#[async_trait]
pub trait Completable: ApiObject {
    /// Fetches the canonical URL and merges the result, once.
    ///
    /// A no-op on complete objects. Partial objects without a canonical URL
    /// cannot be completed.
    async fn complete(&mut self) -> GitHubResult<()> {
        if self.is_completed() {
            return Ok(());
        }
        self.refresh().await
    }

    /// Unconditionally re-fetches the canonical URL and merges the result.
    async fn refresh(&mut self) -> GitHubResult<()> {
        let url = self
            .url()
            .ok_or_else(|| {
                GitHubError::new(
                    GitHubErrorKind::IncompletableObject,
                    "Object has no canonical URL to complete from",
                )
            })?
            .to_string();
        let requester = self.requester().clone();
        let response = requester.get(&url).await?;
        let raw = response
            .body
            .as_ref()
            .and_then(Value::as_object)
            .ok_or_else(|| {
                GitHubError::decoding("Expected a JSON object when completing resource")
            })?;
        self.apply_attributes(raw)?;
        self.set_completed(true);
        Ok(())
    }

    /// Applies a write operation's response body.
    ///
    /// Responses that carry a full resource body merge it and mark the object
    /// complete. For empty (204) responses, do not call this; the in-memory
    /// state keeps only the caller's intended edits.
    fn update_from_response(&mut self, raw: &Map<String, Value>) -> GitHubResult<()> {
        self.apply_attributes(raw)?;
        self.set_completed(true);
        Ok(())
    }
}

impl<T: ApiObject> Completable for T {}

/// Decoders from JSON values into attribute payloads.
///
/// Each fails with a decoding error when the value does not match the
/// declared semantic type.
pub mod decode {
    use super::*;

    /// Decodes a string.
    pub fn string(value: &Value) -> GitHubResult<String> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| type_error("string", value))
    }

    /// Decodes a string that may legitimately be null.
    pub fn nullable_string(value: &Value) -> GitHubResult<Option<String>> {
        if value.is_null() {
            return Ok(None);
        }
        string(value).map(Some)
    }

    /// Decodes an integer.
    pub fn int(value: &Value) -> GitHubResult<i64> {
        value.as_i64().ok_or_else(|| type_error("integer", value))
    }

    /// Decodes an integer that may legitimately be null.
    pub fn nullable_int(value: &Value) -> GitHubResult<Option<i64>> {
        if value.is_null() {
            return Ok(None);
        }
        int(value).map(Some)
    }

    /// Decodes a boolean.
    pub fn boolean(value: &Value) -> GitHubResult<bool> {
        value.as_bool().ok_or_else(|| type_error("boolean", value))
    }

    /// Decodes an ISO-8601 timestamp (`2024-01-01T00:00:00Z`), accepting any
    /// RFC 3339 offset as a fallback.
    pub fn timestamp(value: &Value) -> GitHubResult<DateTime<Utc>> {
        let text = value
            .as_str()
            .ok_or_else(|| type_error("timestamp string", value))?;
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%SZ")
            .map(|naive| Utc.from_utc_datetime(&naive))
            .or_else(|_| {
                DateTime::parse_from_rfc3339(text).map(|parsed| parsed.with_timezone(&Utc))
            })
            .map_err(|e| {
                GitHubError::decoding(format!("Malformed timestamp {:?}: {}", text, e))
            })
    }

    /// Decodes a list of strings.
    pub fn string_list(value: &Value) -> GitHubResult<Vec<String>> {
        value
            .as_array()
            .ok_or_else(|| type_error("list of strings", value))?
            .iter()
            .map(string)
            .collect()
    }

    /// Decodes an embedded resource as a partial object, lazily completable
    /// against its own canonical URL.
    pub fn object<T: ApiObject>(requester: &Arc<Requester>, value: &Value) -> GitHubResult<T> {
        let raw = value
            .as_object()
            .ok_or_else(|| type_error("object", value))?;
        T::from_raw(requester.clone(), raw, false)
    }

    /// Decodes a list of embedded resources as partial objects.
    pub fn object_list<T: ApiObject>(
        requester: &Arc<Requester>,
        value: &Value,
    ) -> GitHubResult<Vec<T>> {
        value
            .as_array()
            .ok_or_else(|| type_error("list of objects", value))?
            .iter()
            .map(|item| object(requester, item))
            .collect()
    }

    fn type_error(expected: &str, value: &Value) -> GitHubError {
        GitHubError::decoding(format!("Expected {}, got {}", expected, value))
    }
}
