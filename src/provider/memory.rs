//! In-memory repositories for tests, demos and small static collections.
//!
//! Items keep insertion order, which is the listing order.
//!
//! # Examples
//!
//! ```
//! use oaipmh::provider::memory::InMemoryItemRepository;
//! use oaipmh::provider::repository::ItemRepository;
//! use oaipmh::model::ResumptionValue;
//!
//! let repository = InMemoryItemRepository::new().with_random_items(12);
//! let page = repository.get_item_identifiers(&[], &ResumptionValue::new(), 5)?;
//! assert_eq!(page.items.len(), 5);
//! assert!(page.has_more);
//! assert_eq!(page.total, Some(12));
//! # Ok::<(), oaipmh::OaiError>(())
//! ```

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{is_under_set_spec, About, Metadata, ResumptionValue, Set};
use crate::provider::filter::{passes_all, ScopedFilter};
use crate::provider::repository::{
    Item, ItemIdentifier, ItemRepository, ResultsPage, SetRepository,
};

/// First datestamp handed out by [`InMemoryItemRepository::with_random_items`].
const GENERATED_EPOCH: i64 = 1_577_836_800;

/// A stored item: identity plus serialized metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryItem {
    /// Identity and header data.
    pub identifier: ItemIdentifier,
    /// Serialized metadata.
    pub metadata: Option<String>,
    /// Serialized `about` blocks.
    pub about: Vec<String>,
}

impl MemoryItem {
    fn to_item(&self) -> Item {
        let mut item = Item::new(self.identifier.clone());
        if !self.identifier.deleted {
            item.metadata = self.metadata.clone().map(Metadata::from_xml);
            item.about = self.about.iter().cloned().map(About).collect();
        }
        item
    }
}

/// Item storage backed by a `Vec`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemRepository {
    items: Vec<MemoryItem>,
}

impl InMemoryItemRepository {
    /// An empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item.
    #[must_use]
    pub fn with_item(mut self, identifier: ItemIdentifier, metadata: Option<String>) -> Self {
        self.items.push(MemoryItem {
            identifier,
            metadata,
            about: Vec::new(),
        });
        self
    }

    /// Adds a fully specified item.
    #[must_use]
    pub fn with_memory_item(mut self, item: MemoryItem) -> Self {
        self.items.push(item);
        self
    }

    /// Adds `count` items named `oai:memory:N`, one hour apart, each with a
    /// small Dublin Core record.
    #[must_use]
    pub fn with_random_items(mut self, count: usize) -> Self {
        let start = self.items.len();
        for n in start..start + count {
            let offset = i64::try_from(n).unwrap_or(i64::MAX / 3600) * 3600;
            let datestamp = DateTime::<Utc>::from_timestamp(GENERATED_EPOCH + offset, 0)
                .unwrap_or_default();
            let identifier = format!("oai:memory:{n}");
            let metadata = format!(
                "<oai_dc:dc xmlns:oai_dc=\"http://www.openarchives.org/OAI/2.0/oai_dc/\" \
                 xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\
                 <dc:title>Item {n}</dc:title></oai_dc:dc>"
            );
            self.items.push(MemoryItem {
                identifier: ItemIdentifier::new(identifier, datestamp),
                metadata: Some(metadata),
                about: Vec::new(),
            });
        }
        self
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn select<'a>(
        &'a self,
        filters: &'a [ScopedFilter],
        query: &'a ResumptionValue,
    ) -> impl Iterator<Item = &'a MemoryItem> + 'a {
        self.items
            .iter()
            .filter(move |item| matches_query(&item.identifier, query))
            .filter(move |item| passes_all(filters, &item.identifier))
    }

    fn page<'a, T>(
        &'a self,
        filters: &'a [ScopedFilter],
        query: &'a ResumptionValue,
        length: usize,
        convert: impl Fn(&MemoryItem) -> T,
    ) -> ResultsPage<T> {
        let total = self.select(filters, query).count();
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let items: Vec<T> = self
            .select(filters, query)
            .skip(offset)
            .take(length)
            .map(convert)
            .collect();
        ResultsPage {
            has_more: offset.saturating_add(items.len()) < total,
            total: Some(total as u64),
            items,
        }
    }
}

fn matches_query(item: &ItemIdentifier, query: &ResumptionValue) -> bool {
    query.covers_datestamp(&item.datestamp)
        && query.set_spec.as_deref().map_or(true, |spec| {
            item.sets.iter().any(|member| is_under_set_spec(spec, member))
        })
}

impl ItemRepository for InMemoryItemRepository {
    fn get_item(&self, identifier: &str) -> Result<Option<Item>> {
        Ok(self
            .items
            .iter()
            .find(|item| item.identifier.identifier == identifier)
            .map(MemoryItem::to_item))
    }

    fn get_items(
        &self,
        filters: &[ScopedFilter],
        query: &ResumptionValue,
        length: usize,
    ) -> Result<ResultsPage<Item>> {
        Ok(self.page(filters, query, length, MemoryItem::to_item))
    }

    fn get_item_identifiers(
        &self,
        filters: &[ScopedFilter],
        query: &ResumptionValue,
        length: usize,
    ) -> Result<ResultsPage<ItemIdentifier>> {
        Ok(self.page(filters, query, length, |item| item.identifier.clone()))
    }
}

/// Set storage backed by a `Vec`.
#[derive(Debug, Clone)]
pub struct InMemorySetRepository {
    supports_sets: bool,
    sets: Vec<Set>,
}

impl Default for InMemorySetRepository {
    fn default() -> Self {
        InMemorySetRepository {
            supports_sets: true,
            sets: Vec::new(),
        }
    }
}

impl InMemorySetRepository {
    /// An empty repository that supports sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that the repository has no set hierarchy.
    #[must_use]
    pub fn without_set_support(mut self) -> Self {
        self.supports_sets = false;
        self
    }

    /// Adds a set.
    #[must_use]
    pub fn with_set(mut self, set: Set) -> Self {
        self.sets.push(set);
        self
    }

    /// Adds `count` sets named `setN`.
    #[must_use]
    pub fn with_random_sets(mut self, count: usize) -> Self {
        let start = self.sets.len();
        for n in start..start + count {
            self.sets.push(Set::new(format!("set{n}"), format!("Set {n}")));
        }
        self
    }
}

impl SetRepository for InMemorySetRepository {
    fn supports_sets(&self) -> bool {
        self.supports_sets
    }

    fn get_sets(&self, offset: u64, length: usize) -> Result<ResultsPage<Set>> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let items: Vec<Set> = self.sets.iter().skip(offset).take(length).cloned().collect();
        Ok(ResultsPage {
            has_more: offset.saturating_add(items.len()) < self.sets.len(),
            total: Some(self.sets.len() as u64),
            items,
        })
    }

    fn exists(&self, spec: &str) -> Result<bool> {
        Ok(self.sets.iter().any(|set| set.spec == spec))
    }
}
