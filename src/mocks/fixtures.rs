//! Fixture resources exercising the completable-object protocol.
//!
//! Deliberately small: one flat resource and one with an embedded resource, a
//! nullable field, a timestamp, and a write operation. Real resource wrappers
//! follow exactly this shape.

use crate::client::Requester;
use crate::errors::{GitHubError, GitHubErrorKind, GitHubResult};
use crate::object::{decode, ApiObject, Attribute, Completable, Opt};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A minimal user resource.
#[derive(Clone, Debug)]
pub struct FakeUser {
    requester: Arc<Requester>,
    completed: bool,
    url: Attribute<String>,
    login: Attribute<String>,
    name: Attribute<Option<String>>,
}

impl FakeUser {
    /// The login, completing the object if needed.
    pub async fn login(&mut self) -> GitHubResult<String> {
        if !self.login.is_set() {
            self.complete().await?;
        }
        require(self.login.value().cloned(), "login")
    }

    /// The display name, completing the object if needed. Null on the wire
    /// stays `None`.
    pub async fn name(&mut self) -> GitHubResult<Option<String>> {
        if !self.name.is_set() {
            self.complete().await?;
        }
        require(self.name.value().cloned(), "name")
    }
}

impl ApiObject for FakeUser {
    fn from_raw(
        requester: Arc<Requester>,
        raw: &Map<String, Value>,
        completed: bool,
    ) -> GitHubResult<Self> {
        let mut user = Self {
            requester,
            completed,
            url: Attribute::NotSet,
            login: Attribute::NotSet,
            name: Attribute::NotSet,
        };
        user.apply_attributes(raw)?;
        Ok(user)
    }

    fn apply_attributes(&mut self, raw: &Map<String, Value>) -> GitHubResult<()> {
        if let Some(value) = raw.get("url") {
            self.url = Attribute::Set(decode::string(value)?);
        }
        if let Some(value) = raw.get("login") {
            self.login = Attribute::Set(decode::string(value)?);
        }
        if let Some(value) = raw.get("name") {
            self.name = Attribute::Set(decode::nullable_string(value)?);
        }
        Ok(())
    }

    fn url(&self) -> Option<&str> {
        self.url.value().map(String::as_str)
    }

    fn requester(&self) -> &Arc<Requester> {
        &self.requester
    }

    fn is_completed(&self) -> bool {
        self.completed
    }

    fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}

/// A repository resource with an embedded owner and a write operation.
#[derive(Clone)]
pub struct FakeRepository {
    requester: Arc<Requester>,
    completed: bool,
    url: Attribute<String>,
    name: Attribute<String>,
    description: Attribute<Option<String>>,
    stargazers_count: Attribute<i64>,
    archived: Attribute<bool>,
    pushed_at: Attribute<DateTime<Utc>>,
    owner: Attribute<FakeUser>,
    topics: Attribute<Vec<String>>,
}

impl FakeRepository {
    /// The repository name, completing the object if needed.
    pub async fn name(&mut self) -> GitHubResult<String> {
        if !self.name.is_set() {
            self.complete().await?;
        }
        require(self.name.value().cloned(), "name")
    }

    /// The description, completing the object if needed.
    pub async fn description(&mut self) -> GitHubResult<Option<String>> {
        if !self.description.is_set() {
            self.complete().await?;
        }
        require(self.description.value().cloned(), "description")
    }

    /// The stargazer count, completing the object if needed.
    pub async fn stargazers_count(&mut self) -> GitHubResult<i64> {
        if !self.stargazers_count.is_set() {
            self.complete().await?;
        }
        require(self.stargazers_count.value().copied(), "stargazers_count")
    }

    /// Whether the repository is archived, completing the object if needed.
    pub async fn archived(&mut self) -> GitHubResult<bool> {
        if !self.archived.is_set() {
            self.complete().await?;
        }
        require(self.archived.value().copied(), "archived")
    }

    /// The last push time, completing the object if needed.
    pub async fn pushed_at(&mut self) -> GitHubResult<DateTime<Utc>> {
        if !self.pushed_at.is_set() {
            self.complete().await?;
        }
        require(self.pushed_at.value().copied(), "pushed_at")
    }

    /// The owner as a partial user, completing this object if needed.
    pub async fn owner(&mut self) -> GitHubResult<FakeUser> {
        if !self.owner.is_set() {
            self.complete().await?;
        }
        require(self.owner.value().cloned(), "owner")
    }

    /// The topic list, completing the object if needed.
    pub async fn topics(&mut self) -> GitHubResult<Vec<String>> {
        if !self.topics.is_set() {
            self.complete().await?;
        }
        require(self.topics.value().cloned(), "topics")
    }

    /// Edits the repository. Omitted parameters are left out of the request
    /// body entirely; a provided `None` description is sent as null. The
    /// response body is merged back into this object.
    pub async fn edit(
        &mut self,
        name: Opt<String>,
        description: Opt<Option<String>>,
        archived: Opt<bool>,
    ) -> GitHubResult<()> {
        let mut body = Map::new();
        name.write_to(&mut body, "name")?;
        description.write_to(&mut body, "description")?;
        archived.write_to(&mut body, "archived")?;

        let url = require(self.url.value().cloned(), "url").map_err(|_| {
            GitHubError::new(
                GitHubErrorKind::IncompletableObject,
                "Cannot edit a repository without a canonical URL",
            )
        })?;
        let requester = self.requester.clone();
        let response = requester.patch(&url, Some(&Value::Object(body))).await?;
        if let Some(raw) = response.body.as_ref().and_then(Value::as_object) {
            self.update_from_response(raw)?;
        }
        Ok(())
    }
}

impl ApiObject for FakeRepository {
    fn from_raw(
        requester: Arc<Requester>,
        raw: &Map<String, Value>,
        completed: bool,
    ) -> GitHubResult<Self> {
        let mut repo = Self {
            requester,
            completed,
            url: Attribute::NotSet,
            name: Attribute::NotSet,
            description: Attribute::NotSet,
            stargazers_count: Attribute::NotSet,
            archived: Attribute::NotSet,
            pushed_at: Attribute::NotSet,
            owner: Attribute::NotSet,
            topics: Attribute::NotSet,
        };
        repo.apply_attributes(raw)?;
        Ok(repo)
    }

    fn apply_attributes(&mut self, raw: &Map<String, Value>) -> GitHubResult<()> {
        if let Some(value) = raw.get("url") {
            self.url = Attribute::Set(decode::string(value)?);
        }
        if let Some(value) = raw.get("name") {
            self.name = Attribute::Set(decode::string(value)?);
        }
        if let Some(value) = raw.get("description") {
            self.description = Attribute::Set(decode::nullable_string(value)?);
        }
        if let Some(value) = raw.get("stargazers_count") {
            self.stargazers_count = Attribute::Set(decode::int(value)?);
        }
        if let Some(value) = raw.get("archived") {
            self.archived = Attribute::Set(decode::boolean(value)?);
        }
        if let Some(value) = raw.get("pushed_at") {
            self.pushed_at = Attribute::Set(decode::timestamp(value)?);
        }
        if let Some(value) = raw.get("owner") {
            self.owner = Attribute::Set(decode::object(&self.requester, value)?);
        }
        if let Some(value) = raw.get("topics") {
            self.topics = Attribute::Set(decode::string_list(value)?);
        }
        Ok(())
    }

    fn url(&self) -> Option<&str> {
        self.url.value().map(String::as_str)
    }

    fn requester(&self) -> &Arc<Requester> {
        &self.requester
    }

    fn is_completed(&self) -> bool {
        self.completed
    }

    fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}

fn require<T>(value: Option<T>, field: &str) -> GitHubResult<T> {
    value.ok_or_else(|| {
        GitHubError::decoding(format!("Field {} absent after completion", field))
    })
}
