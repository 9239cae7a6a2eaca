//! In-memory link repository
//!
//! The `Store` owns every `Link` and the global category and tag sets
//! derived from them. It never touches the filesystem; see
//! `storage::JsonPersistence` for loading and saving.
//!
//! ## Indices
//!
//! Index-addressed operations use a link's position in `links()`. Adding
//! appends, so existing indices stay valid, but removing a link shifts every
//! later link down by one. Callers holding indices across a removal must
//! re-fetch the listing, or keep the link's `id()` and resolve it again with
//! `position()`.
//!
//! ## Label sets
//!
//! `categories()` and `tags()` are recomputed from the links after every
//! mutation that can change membership, so they never hold a label no link
//! uses and never miss one a link does use.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::new();
//! store.add_link("rust-lang.org", "Rust", ["dev"], ["rust"])?;
//! store.bulk_add_tag("reading", None)?;
//! let hits = store.search(&SearchQuery::new().with(SearchField::Tags, "rust"), SearchMode::And);
//! ```

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Link, LinkPatch, LinkRecord, ListEdit, ValidationError};
use crate::query::{self, AdvancedQuery, SearchMode, SearchQuery};

/// Errors returned by store mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Input was rejected before anything changed
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The index does not address a link
    #[error("Index {index} is out of range ({len} links stored)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Counts reported by `Store::bulk_import`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} links added, {} errors", self.added, self.errors)
    }
}

/// Authoritative in-memory collection of links
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    links: Vec<Link>,
    categories: BTreeSet<String>,
    tags: BTreeSet<String>,
}

impl Store {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from existing links, deriving the label sets
    pub fn from_links(links: Vec<Link>) -> Self {
        let mut store = Self {
            links,
            ..Self::default()
        };
        store.refresh_labels();
        store
    }

    // ==================== Reads ====================

    /// All links in store order
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Get the link at `index`
    pub fn get(&self, index: usize) -> Option<&Link> {
        self.links.get(index)
    }

    /// Get a link by its stable ID
    pub fn get_by_id(&self, id: Uuid) -> Option<&Link> {
        self.links.iter().find(|l| l.id() == id)
    }

    /// Current index of the link with the given ID
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.links.iter().position(|l| l.id() == id)
    }

    /// Every category used by at least one link, sorted
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// Every tag used by at least one link, sorted
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Categories with the number of links using each
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        self.categories
            .iter()
            .map(|c| {
                let count = self.links.iter().filter(|l| l.has_category(c)).count();
                (c.clone(), count)
            })
            .collect()
    }

    /// Tags with the number of links using each
    pub fn tag_counts(&self) -> Vec<(String, usize)> {
        self.tags
            .iter()
            .map(|t| {
                let count = self.links.iter().filter(|l| l.has_tag(t)).count();
                (t.clone(), count)
            })
            .collect()
    }

    /// Combined AND/OR search (see `query::search`)
    pub fn search(&self, query: &SearchQuery, mode: SearchMode) -> Vec<&Link> {
        query::search(&self.links, query, mode)
    }

    /// Multi-term search (see `query::advanced_search`)
    pub fn advanced_search(&self, query: &AdvancedQuery) -> Vec<&Link> {
        query::advanced_search(&self.links, query)
    }

    /// Export every link as a flat record, in store order
    pub fn export_records(&self) -> Vec<LinkRecord> {
        self.links.iter().map(LinkRecord::from).collect()
    }

    // ==================== Link Operations ====================

    /// Add a new link
    ///
    /// The URL is normalized; an empty URL is rejected without changing
    /// the store.
    pub fn add_link<C, T>(
        &mut self,
        url: &str,
        description: &str,
        categories: C,
        tags: T,
    ) -> StoreResult<&Link>
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let link = Link::new(url)?
            .with_description(description)
            .with_categories(categories)
            .with_tags(tags);
        debug!(url = link.url(), "Adding link");

        self.links.push(link);
        self.refresh_labels();
        Ok(&self.links[self.links.len() - 1])
    }

    /// Remove the link at `index`
    ///
    /// Every later link moves down one position.
    pub fn remove_link(&mut self, index: usize) -> StoreResult<Link> {
        self.check_index(index)?;
        let removed = self.links.remove(index);
        debug!(url = removed.url(), index, "Removed link");
        self.refresh_labels();
        Ok(removed)
    }

    /// Replace the URL of the link at `index`
    pub fn update_link_url(&mut self, index: usize, url: &str) -> StoreResult<()> {
        self.link_mut(index)?.update_url(url)?;
        Ok(())
    }

    /// Replace the description of the link at `index`
    pub fn update_link_description(&mut self, index: usize, description: &str) -> StoreResult<()> {
        self.link_mut(index)?.update_description(description);
        Ok(())
    }

    /// Add a category to the link at `index`
    ///
    /// Returns whether the link gained the category.
    pub fn add_link_category(&mut self, index: usize, category: &str) -> StoreResult<bool> {
        let category = non_blank(category)?;
        let added = self.link_mut(index)?.add_category(category);
        self.refresh_labels();
        Ok(added)
    }

    /// Add a tag to the link at `index`
    ///
    /// Returns whether the link gained the tag.
    pub fn add_link_tag(&mut self, index: usize, tag: &str) -> StoreResult<bool> {
        let tag = non_blank(tag)?;
        let added = self.link_mut(index)?.add_tag(tag);
        self.refresh_labels();
        Ok(added)
    }

    /// Remove a category from the link at `index`
    ///
    /// Returns whether the link had the category.
    pub fn remove_link_category(&mut self, index: usize, category: &str) -> StoreResult<bool> {
        let removed = self.link_mut(index)?.remove_category(category);
        if removed {
            self.refresh_labels();
        }
        Ok(removed)
    }

    /// Remove a tag from the link at `index`
    ///
    /// Returns whether the link had the tag.
    pub fn remove_link_tag(&mut self, index: usize, tag: &str) -> StoreResult<bool> {
        let removed = self.link_mut(index)?.remove_tag(tag);
        if removed {
            self.refresh_labels();
        }
        Ok(removed)
    }

    /// Apply a partial update to the link at `index`
    ///
    /// The patch is validated first, so a rejected patch changes nothing.
    pub fn edit_link(&mut self, index: usize, patch: &LinkPatch) -> StoreResult<&Link> {
        self.check_index(index)?;
        if let Some(url) = &patch.url {
            crate::models::normalize_url(url)?;
        }

        let link = &mut self.links[index];
        if let Some(url) = &patch.url {
            link.update_url(url)?;
        }
        if let Some(description) = &patch.description {
            link.update_description(description);
        }
        match &patch.categories {
            ListEdit::Keep => {}
            ListEdit::Clear => link.set_categories(Vec::<String>::new()),
            ListEdit::Replace(categories) => link.set_categories(categories),
        }
        match &patch.tags {
            ListEdit::Keep => {}
            ListEdit::Clear => link.set_tags(Vec::<String>::new()),
            ListEdit::Replace(tags) => link.set_tags(tags),
        }

        self.refresh_labels();
        Ok(&self.links[index])
    }

    // ==================== Bulk Operations ====================

    /// Add a tag to the links at `indices`, or to every link if `None`
    ///
    /// Out-of-range and repeated indices are skipped. Returns the number of
    /// links visited.
    pub fn bulk_add_tag(&mut self, tag: &str, indices: Option<&[usize]>) -> StoreResult<usize> {
        let tag = non_blank(tag)?;
        let touched = self.for_each_target(indices, |link| {
            link.add_tag(tag);
        });
        self.refresh_labels();
        Ok(touched)
    }

    /// Add a category to the links at `indices`, or to every link if `None`
    ///
    /// Out-of-range and repeated indices are skipped. Returns the number of
    /// links visited.
    pub fn bulk_add_category(
        &mut self,
        category: &str,
        indices: Option<&[usize]>,
    ) -> StoreResult<usize> {
        let category = non_blank(category)?;
        let touched = self.for_each_target(indices, |link| {
            link.add_category(category);
        });
        self.refresh_labels();
        Ok(touched)
    }

    /// Remove a tag from every link that has it
    pub fn bulk_remove_tag(&mut self, tag: &str) -> usize {
        let count = self
            .links
            .iter_mut()
            .map(|link| link.remove_tag(tag))
            .filter(|removed| *removed)
            .count();
        self.refresh_labels();
        count
    }

    /// Remove a category from every link that has it
    pub fn bulk_remove_category(&mut self, category: &str) -> usize {
        let count = self
            .links
            .iter_mut()
            .map(|link| link.remove_category(category))
            .filter(|removed| *removed)
            .count();
        self.refresh_labels();
        count
    }

    /// Add links from flat records
    ///
    /// A record with an empty URL is counted as an error and skipped; the
    /// rest of the batch still goes in. Record timestamps are ignored.
    pub fn bulk_import<I>(&mut self, records: I) -> ImportSummary
    where
        I: IntoIterator<Item = LinkRecord>,
    {
        let mut summary = ImportSummary::default();

        for record in records {
            match Link::new(&record.url) {
                Ok(link) => {
                    self.links.push(
                        link.with_description(&record.description)
                            .with_categories(&record.categories)
                            .with_tags(&record.tags),
                    );
                    summary.added += 1;
                }
                Err(e) => {
                    warn!("Skipping import record {:?}: {}", record.url, e);
                    summary.errors += 1;
                }
            }
        }

        if summary.added > 0 {
            self.refresh_labels();
        }
        debug!(added = summary.added, errors = summary.errors, "Bulk import finished");
        summary
    }

    // ==================== Internals ====================

    fn check_index(&self, index: usize) -> StoreResult<()> {
        if index < self.links.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                index,
                len: self.links.len(),
            })
        }
    }

    fn link_mut(&mut self, index: usize) -> StoreResult<&mut Link> {
        let len = self.links.len();
        self.links
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })
    }

    /// Run `f` once per distinct, in-range target link
    fn for_each_target<F>(&mut self, indices: Option<&[usize]>, mut f: F) -> usize
    where
        F: FnMut(&mut Link),
    {
        match indices {
            None => {
                self.links.iter_mut().for_each(&mut f);
                self.links.len()
            }
            Some(indices) => {
                let mut seen = HashSet::new();
                for &index in indices {
                    if index < self.links.len() && seen.insert(index) {
                        f(&mut self.links[index]);
                    }
                }
                seen.len()
            }
        }
    }

    /// Recompute the global label sets from the links
    fn refresh_labels(&mut self) {
        self.categories = self
            .links
            .iter()
            .flat_map(|l| l.categories().iter().cloned())
            .collect();
        self.tags = self
            .links
            .iter()
            .flat_map(|l| l.tags().iter().cloned())
            .collect();
    }
}

fn non_blank(label: &str) -> Result<&str, ValidationError> {
    let label = label.trim();
    if label.is_empty() {
        Err(ValidationError::BlankLabel)
    } else {
        Ok(label)
    }
}
