//! Link search
//!
//! Two query shapes are supported, both case-insensitive substring matches
//! against a link's URL, description, categories or tags:
//!
//! - `SearchQuery`: one term per field, combined with AND or OR
//! - `AdvancedQuery`: several alternative terms per field; a field matches
//!   if any of its terms does, and every constrained field must match
//!
//! Searches only read links; results borrow from the searched slice.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::{split_list, Link};

/// Unparseable search field or mode name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unknown search field '{0}' (expected url, description, categories or tags)")]
    UnknownField(String),

    #[error("Unknown search mode '{0}' (expected AND or OR)")]
    UnknownMode(String),
}

/// A searchable link field
///
/// Fields are evaluated in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchField {
    Url,
    Description,
    Categories,
    Tags,
}

impl SearchField {
    /// Every field, in evaluation order
    pub const ALL: [SearchField; 4] = [
        SearchField::Url,
        SearchField::Description,
        SearchField::Categories,
        SearchField::Tags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Url => "url",
            SearchField::Description => "description",
            SearchField::Categories => "categories",
            SearchField::Tags => "tags",
        }
    }

    /// Check whether this field of `link` contains `needle`
    ///
    /// `needle` must already be lowercase. Collection fields match if any
    /// element contains it.
    fn matches(self, link: &Link, needle: &str) -> bool {
        match self {
            SearchField::Url => contains(link.url(), needle),
            SearchField::Description => contains(link.description(), needle),
            SearchField::Categories => link.categories().iter().any(|c| contains(c, needle)),
            SearchField::Tags => link.tags().iter().any(|t| contains(t, needle)),
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "url" => Ok(SearchField::Url),
            "description" | "desc" => Ok(SearchField::Description),
            "categories" | "category" => Ok(SearchField::Categories),
            "tags" | "tag" => Ok(SearchField::Tags),
            _ => Err(QueryError::UnknownField(s.to_string())),
        }
    }
}

/// How per-field matches combine in a `SearchQuery`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Every field with a term must match
    #[default]
    And,
    /// At least one field with a term must match
    Or,
}

impl FromStr for SearchMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AND" => Ok(SearchMode::And),
            "OR" => Ok(SearchMode::Or),
            _ => Err(QueryError::UnknownMode(s.to_string())),
        }
    }
}

/// One search term per field, kept in the order fields were first set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<(SearchField, String)>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same term on every field
    pub fn everywhere(term: &str) -> Self {
        SearchField::ALL
            .iter()
            .fold(Self::new(), |query, field| query.with(*field, term))
    }

    /// Set the term for a field
    pub fn with(mut self, field: SearchField, term: &str) -> Self {
        self.set(field, term);
        self
    }

    /// Setting a field again replaces its term without moving it
    pub fn set(&mut self, field: SearchField, term: &str) {
        match self.terms.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => *existing = term.to_string(),
            None => self.terms.push((field, term.to_string())),
        }
    }

    /// Non-blank terms, lowercased, in insertion order
    fn active_terms(&self) -> Vec<(SearchField, String)> {
        self.terms
            .iter()
            .map(|(field, term)| (*field, term.trim().to_lowercase()))
            .filter(|(_, term)| !term.is_empty())
            .collect()
    }

    /// Whether no field carries a usable term
    pub fn is_empty(&self) -> bool {
        self.active_terms().is_empty()
    }
}

/// Alternative terms per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvancedQuery {
    terms: BTreeMap<SearchField, Vec<String>>,
}

impl AdvancedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field's terms from comma-separated input
    pub fn with_input(self, field: SearchField, input: &str) -> Self {
        self.with_terms(field, split_list(input))
    }

    /// Set a field's terms
    ///
    /// Blank terms are dropped; a field left with none is unconstrained.
    pub fn with_terms<I>(mut self, field: SearchField, terms: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let terms: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            self.terms.remove(&field);
        } else {
            self.terms.insert(field, terms);
        }
        self
    }

    /// Terms for a field (lowercased)
    pub fn terms(&self, field: SearchField) -> &[String] {
        self.terms.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether no field is constrained
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Run a combined search
///
/// Blank terms are ignored; with no terms left the result is empty.
///
/// Fields are evaluated in the order they were added to the query.
///
/// - `And`: starting from every link, each field narrows the candidates to
///   those that match it.
/// - `Or`: fields are visited in turn and, for each, every link is checked;
///   a link is appended the first time any field matches it, so each link
///   appears at most once.
pub fn search<'a>(links: &'a [Link], query: &SearchQuery, mode: SearchMode) -> Vec<&'a Link> {
    let terms = query.active_terms();
    if terms.is_empty() {
        return Vec::new();
    }

    match mode {
        SearchMode::And => {
            let mut results: Vec<&Link> = links.iter().collect();
            for (field, term) in &terms {
                results.retain(|link| field.matches(link, term));
            }
            results
        }
        SearchMode::Or => {
            let mut seen = vec![false; links.len()];
            let mut results = Vec::new();
            for (field, term) in &terms {
                for (index, link) in links.iter().enumerate() {
                    if !seen[index] && field.matches(link, term) {
                        seen[index] = true;
                        results.push(link);
                    }
                }
            }
            results
        }
    }
}

/// Run an advanced search
///
/// A link qualifies when, for every constrained field, at least one of that
/// field's terms matches. An unconstrained query matches every link.
pub fn advanced_search<'a>(links: &'a [Link], query: &AdvancedQuery) -> Vec<&'a Link> {
    links
        .iter()
        .filter(|link| {
            query
                .terms
                .iter()
                .all(|(field, terms)| terms.iter().any(|term| field.matches(link, term)))
        })
        .collect()
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
