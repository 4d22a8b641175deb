//! Lazy paginated collections.
//!
//! A [`PaginatedList`] is a virtual sequence over a paginated endpoint. No
//! request is made at construction; pages are fetched on first touch and
//! cached for the lifetime of the list. Iteration follows the server's Link
//! headers, random access computes the owning page directly, and a fully
//! consumed list can be walked again without a single request.

use crate::client::Requester;
use crate::errors::{GitHubError, GitHubErrorKind, GitHubResult};
use crate::object::ApiObject;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Pagination links parsed from an RFC 8288 `Link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationLinks {
    /// URL of the next page.
    pub next: Option<String>,
    /// URL of the previous page.
    pub prev: Option<String>,
    /// URL of the first page.
    pub first: Option<String>,
    /// URL of the last page.
    pub last: Option<String>,
}

impl PaginationLinks {
    /// Parses a `Link` header value.
    ///
    /// Entries look like `<https://api.github.com/...?page=2>; rel="next"`.
    /// Unknown rels and malformed entries are skipped.
    pub fn from_header(header: &str) -> Self {
        let mut links = Self::default();
        for entry in header.split(',') {
            let mut url = None;
            let mut rel = None;
            for part in entry.split(';') {
                let part = part.trim();
                if part.starts_with('<') && part.ends_with('>') {
                    url = Some(part[1..part.len() - 1].to_string());
                } else if let Some(value) = part.strip_prefix("rel=") {
                    rel = Some(value.trim_matches('"').to_string());
                }
            }
            if let (Some(url), Some(rel)) = (url, rel) {
                match rel.as_str() {
                    "next" => links.next = Some(url),
                    "prev" => links.prev = Some(url),
                    "first" => links.first = Some(url),
                    "last" => links.last = Some(url),
                    _ => {}
                }
            }
        }
        links
    }

    /// Parses the `Link` header out of a response header map.
    pub fn from_header_map(headers: &HashMap<String, String>) -> Self {
        headers
            .get("link")
            .map(|value| Self::from_header(value))
            .unwrap_or_default()
    }

    /// Returns true if a next page exists.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// The total page count, read from the `page` parameter of the last-page
    /// URL when the server provides one.
    pub fn total_pages(&self) -> Option<u32> {
        let last = self.last.as_deref()?;
        let query = last.split_once('?')?.1;
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("page=") {
                return value.parse().ok();
            }
        }
        None
    }
}

/// A lazily fetched, cached sequence of API resources.
///
/// Pages are indexed from zero internally; the wire protocol's `page`
/// parameter is one-based. Elements decode as partial objects, completable on
/// first unset-attribute access. The cache never invalidates; drop the list
/// and build a new one to observe server-side changes.
pub struct PaginatedList<T: ApiObject + Clone> {
    requester: Arc<Requester>,
    base_url: String,
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    per_page: u32,
    /// Envelope key for endpoints that wrap results, e.g. `items` for search.
    list_item: Option<String>,
    pages: HashMap<usize, Vec<T>>,
    /// Continuation URLs taken from Link headers, keyed by target page.
    next_urls: HashMap<usize, String>,
    last_page: Option<usize>,
    total_count: Option<u64>,
}

impl<T: ApiObject + Clone> PaginatedList<T> {
    /// Creates a list over an endpoint. Nothing is fetched yet.
    pub fn new(requester: Arc<Requester>, url: impl Into<String>) -> Self {
        let per_page = requester.per_page();
        Self {
            requester,
            base_url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            per_page,
            list_item: None,
            pages: HashMap::new(),
            next_urls: HashMap::new(),
            last_page: None,
            total_count: None,
        }
    }

    /// Adds a query parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Adds a request header, e.g. a per-call `Accept` media type.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Overrides the page size for this list.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.min(100).max(1);
        self
    }

    /// Reads results from an envelope key instead of a top-level array, and
    /// captures the envelope's `total_count`.
    pub fn with_list_item(mut self, key: impl Into<String>) -> Self {
        self.list_item = Some(key.into());
        self
    }

    /// The element at `index`, fetching only the owning page.
    pub async fn get(&mut self, index: usize) -> GitHubResult<T> {
        let page = index / self.per_page as usize;
        let offset = index % self.per_page as usize;

        self.ensure_page(page).await?;
        self.pages
            .get(&page)
            .and_then(|items| items.get(offset))
            .cloned()
            .ok_or_else(|| {
                GitHubError::new(
                    GitHubErrorKind::IndexOutOfRange,
                    format!("Index {} is out of range", index),
                )
            })
    }

    /// The first `n` elements, fetching no more pages than needed.
    pub async fn take(&mut self, n: usize) -> GitHubResult<Vec<T>> {
        let mut items = Vec::new();
        let mut iter = self.iter();
        while items.len() < n {
            match iter.next().await? {
                Some(item) => items.push(item),
                None => break,
            }
        }
        Ok(items)
    }

    /// Every element, fetching all pages.
    pub async fn collect_all(&mut self) -> GitHubResult<Vec<T>> {
        let mut items = Vec::new();
        let mut iter = self.iter();
        while let Some(item) = iter.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// An iterator over the list, fetching pages on demand.
    pub fn iter(&mut self) -> ListIter<'_, T> {
        ListIter {
            list: self,
            page: 0,
            offset: 0,
        }
    }

    /// The total result count, fetching the first page if needed.
    ///
    /// Known from the envelope when the endpoint provides one, or by summing
    /// once every page is cached; otherwise `None`.
    pub async fn total_count(&mut self) -> GitHubResult<Option<u64>> {
        self.ensure_page(0).await?;
        if self.total_count.is_some() {
            return Ok(self.total_count);
        }
        if let Some(last) = self.last_page {
            if (0..=last).all(|page| self.pages.contains_key(&page)) {
                let sum = self.pages.values().map(|items| items.len() as u64).sum();
                return Ok(Some(sum));
            }
        }
        Ok(None)
    }

    /// Fetches and caches a page if it is not already known.
    async fn ensure_page(&mut self, page: usize) -> GitHubResult<()> {
        if self.pages.contains_key(&page) {
            return Ok(());
        }
        if let Some(last) = self.last_page {
            if page > last {
                return Ok(());
            }
        }

        let response = match self.next_urls.get(&page) {
            // continuation URL carries its own query string
            Some(url) => {
                let url = url.clone();
                self.requester.get_with(&url, &[], &self.headers).await?
            }
            None => {
                let mut params = self.params.clone();
                params.push(("per_page".to_string(), self.per_page.to_string()));
                if page > 0 {
                    params.push(("page".to_string(), (page + 1).to_string()));
                }
                self.requester
                    .get_with(&self.base_url, &params, &self.headers)
                    .await?
            }
        };

        let body = response.body.unwrap_or(Value::Null);
        let elements = match &self.list_item {
            Some(key) => {
                let envelope = body.as_object().ok_or_else(|| {
                    GitHubError::decoding("Expected an envelope object in paginated response")
                })?;
                if let Some(count) = envelope.get("total_count").and_then(Value::as_u64) {
                    self.total_count = Some(count);
                }
                envelope.get(key).cloned().unwrap_or(Value::Array(Vec::new()))
            }
            None => body,
        };
        let raw_items = elements.as_array().ok_or_else(|| {
            GitHubError::decoding("Expected a JSON array in paginated response")
        })?;

        let mut items = Vec::with_capacity(raw_items.len());
        for raw in raw_items {
            let raw = raw.as_object().ok_or_else(|| {
                GitHubError::decoding("Expected JSON objects as paginated elements")
            })?;
            items.push(T::from_raw(self.requester.clone(), raw, false)?);
        }

        let links = PaginationLinks::from_header_map(&response.headers);
        // an empty page ends the list even if the server still advertises
        // a next link
        if items.is_empty() || !links.has_next() {
            self.last_page = Some(self.last_page.map_or(page, |last| last.min(page)));
        } else if let Some(next) = links.next {
            self.next_urls.insert(page + 1, next);
        }

        self.pages.insert(page, items);
        Ok(())
    }

    fn cached_page(&self, page: usize) -> Option<&Vec<T>> {
        self.pages.get(&page)
    }
}

/// Iterator over a [`PaginatedList`]. Borrows the list mutably so fetched
/// pages land in the shared cache.
pub struct ListIter<'a, T: ApiObject + Clone> {
    list: &'a mut PaginatedList<T>,
    page: usize,
    offset: usize,
}

impl<'a, T: ApiObject + Clone> ListIter<'a, T> {
    /// The next element, or `None` past the end of the list.
    pub async fn next(&mut self) -> GitHubResult<Option<T>> {
        loop {
            self.list.ensure_page(self.page).await?;
            let items = match self.list.cached_page(self.page) {
                Some(items) => items,
                None => return Ok(None),
            };
            if let Some(item) = items.get(self.offset) {
                self.offset += 1;
                return Ok(Some(item.clone()));
            }
            // page exhausted; stop at the known end of the list
            if self.list.last_page == Some(self.page) {
                return Ok(None);
            }
            self.page += 1;
            self.offset = 0;
        }
    }
}
