//! The storage contract a data provider is built on.
//!
//! Item and set storage live outside this crate. Implementations must return
//! entries in a stable order for a fixed filter and offset, so that a listing
//! paged across several stateless requests is one deterministic iteration.
//! [`crate::provider::memory`] holds an in-memory implementation.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{About, Metadata, ResumptionValue, Set};
use crate::provider::config::RepositoryConfiguration;
use crate::provider::filter::ScopedFilter;

/// Identity of an item: everything needed to decide visibility and to build
/// its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemIdentifier {
    /// Unique identifier.
    pub identifier: String,
    /// Last modification (or deletion) date.
    pub datestamp: DateTime<Utc>,
    /// Specs of the repository sets the item belongs to.
    pub sets: Vec<String>,
    /// Whether the item is deleted.
    pub deleted: bool,
}

impl ItemIdentifier {
    /// A live item without set memberships.
    #[must_use]
    pub fn new(identifier: impl Into<String>, datestamp: DateTime<Utc>) -> Self {
        ItemIdentifier {
            identifier: identifier.into(),
            datestamp,
            sets: Vec::new(),
            deleted: false,
        }
    }

    /// Adds a set membership.
    #[must_use]
    pub fn with_set(mut self, spec: impl Into<String>) -> Self {
        self.sets.push(spec.into());
        self
    }

    /// Marks the item deleted.
    #[must_use]
    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }
}

/// An item with its metadata.
#[derive(Debug)]
pub struct Item {
    /// Identity and header data.
    pub identifier: ItemIdentifier,
    /// Metadata as stored; absent for deleted items.
    pub metadata: Option<Metadata>,
    /// `about` blocks.
    pub about: Vec<About>,
}

impl Item {
    /// An item without metadata.
    #[must_use]
    pub fn new(identifier: ItemIdentifier) -> Self {
        Item {
            identifier,
            metadata: None,
            about: Vec::new(),
        }
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Appends an `about` block.
    #[must_use]
    pub fn with_about(mut self, about: About) -> Self {
        self.about.push(about);
        self
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsPage<T> {
    /// Entries on this page, at most the requested length.
    pub items: Vec<T>,
    /// Whether entries remain after this page.
    pub has_more: bool,
    /// Total number of entries in the whole listing, when known.
    pub total: Option<u64>,
}

impl<T> ResultsPage<T> {
    /// A page with no entries and nothing after it.
    #[must_use]
    pub fn empty() -> Self {
        ResultsPage {
            items: Vec::new(),
            has_more: false,
            total: Some(0),
        }
    }
}

/// Read access to items.
pub trait ItemRepository: Send + Sync {
    /// Looks up one item.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OaiError::Repository`] if storage fails. An unknown
    /// identifier is `Ok(None)`.
    fn get_item(&self, identifier: &str) -> Result<Option<Item>>;

    /// Returns up to `length` items passing every filter and matching the
    /// set, date bounds and offset of `query`.
    ///
    /// The set in `query` selects the set and all its descendants. Date
    /// bounds compare datestamps at second precision, as
    /// [`ResumptionValue::covers_datestamp`] does.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OaiError::Repository`] if storage fails.
    fn get_items(
        &self,
        filters: &[ScopedFilter],
        query: &ResumptionValue,
        length: usize,
    ) -> Result<ResultsPage<Item>>;

    /// Like [`ItemRepository::get_items`], without metadata.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OaiError::Repository`] if storage fails.
    fn get_item_identifiers(
        &self,
        filters: &[ScopedFilter],
        query: &ResumptionValue,
        length: usize,
    ) -> Result<ResultsPage<ItemIdentifier>>;
}

/// Read access to repository-backed sets.
pub trait SetRepository: Send + Sync {
    /// Whether the repository organizes items in sets at all.
    fn supports_sets(&self) -> bool;

    /// Returns up to `length` sets starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OaiError::Repository`] if storage fails.
    fn get_sets(&self, offset: u64, length: usize) -> Result<ResultsPage<Set>>;

    /// Whether a set with this spec exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OaiError::Repository`] if storage fails.
    fn exists(&self, spec: &str) -> Result<bool>;
}

/// Configuration plus item and set storage.
#[derive(Clone)]
pub struct Repository {
    configuration: RepositoryConfiguration,
    items: Arc<dyn ItemRepository>,
    sets: Arc<dyn SetRepository>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("configuration", &self.configuration)
            .field("supports_sets", &self.sets.supports_sets())
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Bundles configuration and storage.
    pub fn new(
        configuration: RepositoryConfiguration,
        items: Arc<dyn ItemRepository>,
        sets: Arc<dyn SetRepository>,
    ) -> Self {
        Repository {
            configuration,
            items,
            sets,
        }
    }

    /// The repository configuration.
    #[must_use]
    pub fn configuration(&self) -> &RepositoryConfiguration {
        &self.configuration
    }

    /// Item storage.
    #[must_use]
    pub fn items(&self) -> &dyn ItemRepository {
        self.items.as_ref()
    }

    /// Set storage.
    #[must_use]
    pub fn sets(&self) -> &dyn SetRepository {
        self.sets.as_ref()
    }
}
