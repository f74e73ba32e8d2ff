//! Item visibility: filters, conditions and their scopes.
//!
//! A [`Condition`] decides whether an item is exposed. Conditions attach to
//! the whole context ([`Scope::Global`]), to a metadata format
//! ([`Scope::MetadataFormat`]) or to a virtual set ([`Scope::Set`]). Handlers
//! hand the applicable [`ScopedFilter`]s to the repository, which applies them
//! before paging, so page boundaries are computed on the visible items only.
//!
//! Each condition is evaluated on its own: a set's condition does not inherit
//! the conditions of its ancestor sets.
//!
//! # Examples
//!
//! ```
//! use oaipmh::provider::filter::Condition;
//!
//! let public = Condition::from_fn(|item| !item.identifier.contains("private"));
//! let recent = Condition::from_fn(|item| item.datestamp.timestamp() > 0);
//! let shown = public.and(recent.not());
//! # let _ = shown;
//! ```

use std::fmt;
use std::sync::Arc;

use crate::provider::repository::ItemIdentifier;

/// A predicate over item identity.
pub trait Filter: Send + Sync {
    /// Whether `item` is exposed.
    fn is_item_shown(&self, item: &ItemIdentifier) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&ItemIdentifier) -> bool + Send + Sync,
{
    fn is_item_shown(&self, item: &ItemIdentifier) -> bool {
        self(item)
    }
}

/// A composable visibility condition.
#[derive(Clone)]
pub enum Condition {
    /// Every item is shown.
    AlwaysTrue,
    /// No item is shown.
    AlwaysFalse,
    /// A user-supplied filter.
    Custom(Arc<dyn Filter>),
    /// Both conditions hold.
    And(Box<Condition>, Box<Condition>),
    /// Either condition holds.
    Or(Box<Condition>, Box<Condition>),
    /// The condition does not hold.
    Not(Box<Condition>),
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlwaysTrue => f.write_str("AlwaysTrue"),
            Self::AlwaysFalse => f.write_str("AlwaysFalse"),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::And(a, b) => f.debug_tuple("And").field(a).field(b).finish(),
            Self::Or(a, b) => f.debug_tuple("Or").field(a).field(b).finish(),
            Self::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
        }
    }
}

impl Condition {
    /// Shows every item.
    #[must_use]
    pub fn always_true() -> Self {
        Self::AlwaysTrue
    }

    /// Hides every item.
    #[must_use]
    pub fn always_false() -> Self {
        Self::AlwaysFalse
    }

    /// Wraps a closure.
    #[must_use]
    pub fn from_fn<F>(filter: F) -> Self
    where
        F: Fn(&ItemIdentifier) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(filter))
    }

    /// Wraps a shared filter.
    #[must_use]
    pub fn from_filter(filter: Arc<dyn Filter>) -> Self {
        Self::Custom(filter)
    }

    /// Conjunction.
    #[must_use]
    pub fn and(self, other: Condition) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Disjunction.
    #[must_use]
    pub fn or(self, other: Condition) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negation.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

impl Filter for Condition {
    fn is_item_shown(&self, item: &ItemIdentifier) -> bool {
        match self {
            Self::AlwaysTrue => true,
            Self::AlwaysFalse => false,
            Self::Custom(filter) => filter.is_item_shown(item),
            Self::And(a, b) => a.is_item_shown(item) && b.is_item_shown(item),
            Self::Or(a, b) => a.is_item_shown(item) || b.is_item_shown(item),
            Self::Not(inner) => !inner.is_item_shown(item),
        }
    }
}

/// Where a condition was attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The whole context.
    Global,
    /// One metadata format.
    MetadataFormat,
    /// One virtual set.
    Set,
}

/// A condition together with the scope it came from.
#[derive(Debug, Clone)]
pub struct ScopedFilter {
    /// The condition.
    pub condition: Condition,
    /// Its origin.
    pub scope: Scope,
}

impl ScopedFilter {
    /// Pairs a condition with its scope.
    #[must_use]
    pub fn new(condition: Condition, scope: Scope) -> Self {
        ScopedFilter { condition, scope }
    }

    /// Whether `item` passes the condition.
    #[must_use]
    pub fn is_item_shown(&self, item: &ItemIdentifier) -> bool {
        self.condition.is_item_shown(item)
    }
}

/// Visibility of a possibly absent item under an optional condition.
///
/// An absent item is never shown. A present item with no condition is
/// always shown.
#[must_use]
pub fn is_item_shown(condition: Option<&Condition>, item: Option<&ItemIdentifier>) -> bool {
    let Some(item) = item else {
        return false;
    };
    match condition {
        Some(condition) => condition.is_item_shown(item),
        None => true,
    }
}

/// Whether `item` passes every filter in `filters`.
#[must_use]
pub fn passes_all(filters: &[ScopedFilter], item: &ItemIdentifier) -> bool {
    filters.iter().all(|filter| filter.is_item_shown(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(id: &str) -> ItemIdentifier {
        ItemIdentifier::new(id, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_absent_item_is_never_shown() {
        assert!(!is_item_shown(None, None));
        assert!(!is_item_shown(Some(&Condition::always_true()), None));
    }

    #[test]
    fn test_no_condition_shows_item() {
        assert!(is_item_shown(None, Some(&item("a"))));
        assert!(!is_item_shown(Some(&Condition::always_false()), Some(&item("a"))));
    }

    #[test]
    fn test_combinators() {
        let starts_a = Condition::from_fn(|i| i.identifier.starts_with('a'));
        let ends_z = Condition::from_fn(|i| i.identifier.ends_with('z'));
        let both = starts_a.clone().and(ends_z.clone());
        let either = starts_a.clone().or(ends_z);
        let neither = either.clone().not();

        assert!(both.is_item_shown(&item("abz")));
        assert!(!both.is_item_shown(&item("ab")));
        assert!(either.is_item_shown(&item("xz")));
        assert!(neither.is_item_shown(&item("xy")));
        assert!(!starts_a.not().is_item_shown(&item("a")));
    }

    #[test]
    fn test_scoped_filters_compose() {
        let filters = vec![
            ScopedFilter::new(Condition::from_fn(|i| i.identifier != "b"), Scope::Global),
            ScopedFilter::new(Condition::always_true(), Scope::MetadataFormat),
        ];
        assert!(passes_all(&filters, &item("a")));
        assert!(!passes_all(&filters, &item("b")));
        assert!(passes_all(&[], &item("b")));
        assert_eq!(filters[1].scope, Scope::MetadataFormat);
    }

    #[test]
    fn test_debug_hides_closures() {
        let condition = Condition::from_fn(|_| true).and(Condition::always_false());
        assert_eq!(format!("{condition:?}"), "And(Custom(..), AlwaysFalse)");
    }
}
