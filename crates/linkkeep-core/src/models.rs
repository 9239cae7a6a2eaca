//! Data models for linkkeep
//!
//! Defines the `Link` entity plus the flat record and patch shapes used to
//! move links in and out of the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Schemes that are stored as given
const KNOWN_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Scheme prepended to URLs entered without one
const DEFAULT_SCHEME: &str = "https://";

/// Input that clears a label list when editing
pub const CLEAR_SENTINEL: &str = "!";

/// Rejected input for link construction and label operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("URL cannot be empty")]
    EmptyUrl,

    #[error("Category or tag cannot be blank")]
    BlankLabel,
}

/// Normalize a raw URL for storage
///
/// Trims whitespace and prepends `https://` unless the URL already starts
/// with `http://` or `https://`.
pub fn normalize_url(raw: &str) -> Result<String, ValidationError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    if KNOWN_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        Ok(url.to_string())
    } else {
        Ok(format!("{}{}", DEFAULT_SCHEME, url))
    }
}

/// Split comma-separated user input into trimmed, non-empty parts
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim labels, drop blanks and duplicates, keep first-seen order
fn sanitize_labels<I>(labels: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        let label = label.as_ref().trim();
        if !label.is_empty() && !out.iter().any(|l| l == label) {
            out.push(label.to_string());
        }
    }
    out
}

/// A saved bookmark with metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Link {
    id: Uuid,
    url: String,
    description: String,
    categories: Vec<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl Link {
    /// Create a new link for the given URL
    ///
    /// The URL is normalized; an empty URL is rejected.
    pub fn new(url: &str) -> Result<Self, ValidationError> {
        let url = normalize_url(url)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            url,
            description: String::new(),
            categories: Vec::new(),
            tags: Vec::new(),
            created_at: now,
            last_updated: now,
        })
    }

    /// Set the description during construction
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.trim().to_string();
        self
    }

    /// Set the categories during construction
    pub fn with_categories<I>(mut self, categories: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.categories = sanitize_labels(categories);
        self
    }

    /// Set the tags during construction
    pub fn with_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.tags = sanitize_labels(tags);
        self
    }

    /// Rebuild a link from persisted fields
    pub(crate) fn hydrate(
        id: Uuid,
        url: &str,
        description: &str,
        categories: Vec<String>,
        tags: Vec<String>,
        created_at: DateTime<Utc>,
        last_updated: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            url: normalize_url(url)?,
            description: description.to_string(),
            categories: sanitize_labels(categories),
            tags: sanitize_labels(tags),
            created_at,
            last_updated,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category.trim())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag.trim())
    }

    /// Replace the URL
    pub fn update_url(&mut self, url: &str) -> Result<(), ValidationError> {
        self.url = normalize_url(url)?;
        self.touch();
        Ok(())
    }

    /// Replace the description
    pub fn update_description(&mut self, description: &str) {
        self.description = description.trim().to_string();
        self.touch();
    }

    /// Add a category
    ///
    /// Returns `false` if the category was blank or already present.
    pub fn add_category(&mut self, category: &str) -> bool {
        let category = category.trim();
        if category.is_empty() || self.has_category(category) {
            return false;
        }
        self.categories.push(category.to_string());
        self.touch();
        true
    }

    /// Remove a category, returning whether it was present
    pub fn remove_category(&mut self, category: &str) -> bool {
        let category = category.trim();
        match self.categories.iter().position(|c| c == category) {
            Some(pos) => {
                self.categories.remove(pos);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Add several tags at once
    ///
    /// Tags already present are skipped. The update timestamp is refreshed
    /// once if anything was added. Returns the number of tags added.
    pub fn add_tags<I>(&mut self, tags: I) -> usize
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut added = 0;
        for tag in sanitize_labels(tags) {
            if !self.has_tag(&tag) {
                self.tags.push(tag);
                added += 1;
            }
        }
        if added > 0 {
            self.touch();
        }
        added
    }

    /// Add a single tag, returning whether it was new
    pub fn add_tag(&mut self, tag: &str) -> bool {
        self.add_tags([tag]) == 1
    }

    /// Remove a tag, returning whether it was present
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        match self.tags.iter().position(|t| t == tag) {
            Some(pos) => {
                self.tags.remove(pos);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Set all categories (replacing existing)
    pub fn set_categories<I>(&mut self, categories: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.categories = sanitize_labels(categories);
        self.touch();
    }

    /// Set all tags (replacing existing)
    pub fn set_tags<I>(&mut self, tags: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.tags = sanitize_labels(tags);
        self.touch();
    }

    fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

/// Flat link record exchanged with import/export collaborators
///
/// Timestamps are filled in on export and ignored on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl LinkRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

impl From<&Link> for LinkRecord {
    fn from(link: &Link) -> Self {
        Self {
            url: link.url.clone(),
            description: link.description.clone(),
            categories: link.categories.clone(),
            tags: link.tags.clone(),
            created_at: Some(link.created_at),
            last_updated: Some(link.last_updated),
        }
    }
}

/// Edit applied to a link's category or tag list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListEdit {
    /// Leave the list as it is
    #[default]
    Keep,
    /// Empty the list
    Clear,
    /// Replace the list
    Replace(Vec<String>),
}

impl ListEdit {
    /// Interpret edit-prompt input
    ///
    /// Empty input keeps the list, `!` clears it, anything else is a
    /// comma-separated replacement.
    pub fn from_input(input: &str) -> Self {
        match input.trim() {
            "" => ListEdit::Keep,
            CLEAR_SENTINEL => ListEdit::Clear,
            other => ListEdit::Replace(split_list(other)),
        }
    }
}

/// Partial update for a link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPatch {
    pub url: Option<String>,
    pub description: Option<String>,
    pub categories: ListEdit,
    pub tags: ListEdit,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.description.is_none()
            && self.categories == ListEdit::Keep
            && self.tags == ListEdit::Keep
    }
}
