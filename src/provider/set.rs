//! Virtual sets: sets defined by a condition instead of repository storage.

use crate::model;
use crate::provider::filter::{is_item_shown, Condition, Scope, ScopedFilter};
use crate::provider::repository::ItemIdentifier;

/// A set registered in the provider context.
///
/// Listing a virtual set selects the items its condition shows. Virtual sets
/// are listed ahead of repository sets in ListSets, whatever their condition.
#[derive(Debug, Clone)]
pub struct Set {
    spec: String,
    name: String,
    condition: Option<Condition>,
    descriptions: Vec<String>,
}

impl Set {
    /// A set whose name defaults to its spec.
    #[must_use]
    pub fn new(spec: impl Into<String>) -> Self {
        let spec = spec.into();
        Set {
            name: spec.clone(),
            spec,
            condition: None,
            descriptions: Vec::new(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the membership condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Adds a raw `setDescription` fragment.
    #[must_use]
    pub fn with_description(mut self, xml: impl Into<String>) -> Self {
        self.descriptions.push(xml.into());
        self
    }

    /// The set spec.
    #[must_use]
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The membership condition, if any.
    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// The condition as a set-scoped filter.
    #[must_use]
    pub fn scoped_filter(&self) -> Option<ScopedFilter> {
        self.condition
            .clone()
            .map(|condition| ScopedFilter::new(condition, Scope::Set))
    }

    /// Whether `item` belongs to this set.
    #[must_use]
    pub fn is_item_shown(&self, item: Option<&ItemIdentifier>) -> bool {
        is_item_shown(self.condition.as_ref(), item)
    }

    /// The wire description.
    #[must_use]
    pub fn to_oai(&self) -> model::Set {
        let mut set = model::Set::new(&*self.spec, &*self.name);
        set.descriptions.clone_from(&self.descriptions);
        set
    }
}
