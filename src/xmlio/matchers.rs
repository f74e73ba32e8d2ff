//! Composable predicates over streaming XML events.
//!
//! Every branch point of a parser is written as an explicit disjunction of
//! acceptable next events. Matchers are plain values: they can be built once,
//! cloned, combined with [`EventMatcher::and`], [`EventMatcher::or`] and
//! [`EventMatcher::not`], and described for error messages.
//!
//! # Examples
//!
//! ```
//! use oaipmh::xmlio::matchers::{EventMatcher, start_element_named, end_element_named};
//!
//! let set_or_end = start_element_named("set")
//!     .or(end_element_named("ListSets"))
//!     .or(EventMatcher::EndDocument);
//! assert!(set_or_end.to_string().contains("set"));
//! ```

use std::fmt;

use crate::xmlio::reader::{QualifiedName, XmlEvent};

/// Predicate over a string value (element names, attribute values, text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatcher {
    /// Matches anything.
    Any,
    /// Matches exactly this value.
    EqualTo(String),
    /// Matches when the value starts with this prefix.
    StartsWith(String),
}

impl TextMatcher {
    /// Returns `true` if `value` satisfies this matcher.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::EqualTo(expected) => value == expected,
            Self::StartsWith(prefix) => value.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for TextMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("anything"),
            Self::EqualTo(v) => write!(f, "\"{v}\""),
            Self::StartsWith(v) => write!(f, "starting with \"{v}\""),
        }
    }
}

/// Predicate over one [`XmlEvent`].
///
/// Name-based variants compare the **local part** of qualified names, so
/// `oai:record` and `record` are matched alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventMatcher {
    /// Any start-element event.
    StartElement,
    /// Any end-element event.
    EndElement,
    /// A text event.
    Text,
    /// The end of the document.
    EndDocument,
    /// A start or end element whose local name matches.
    ElementName(TextMatcher),
    /// A start element carrying an attribute with a matching local name and value.
    Attribute {
        /// Matcher over the attribute's local name.
        name: TextMatcher,
        /// Matcher over the attribute's value.
        value: TextMatcher,
    },
    /// A text event whose content matches.
    TextContent(TextMatcher),
    /// All inner matchers accept the event.
    AllOf(Vec<EventMatcher>),
    /// At least one inner matcher accepts the event.
    AnyOf(Vec<EventMatcher>),
    /// The inner matcher rejects the event.
    Not(Box<EventMatcher>),
}

impl EventMatcher {
    /// Returns `true` if `event` satisfies this matcher.
    #[must_use]
    pub fn matches(&self, event: &XmlEvent) -> bool {
        match self {
            Self::StartElement => matches!(event, XmlEvent::StartElement { .. }),
            Self::EndElement => matches!(event, XmlEvent::EndElement { .. }),
            Self::Text => matches!(event, XmlEvent::Text(_)),
            Self::EndDocument => matches!(event, XmlEvent::EndDocument),
            Self::ElementName(name) => event
                .name()
                .is_some_and(|qname: &QualifiedName| name.matches(&qname.local)),
            Self::Attribute { name, value } => match event {
                XmlEvent::StartElement { attributes, .. } => attributes
                    .iter()
                    .any(|attr| name.matches(&attr.name.local) && value.matches(&attr.value)),
                _ => false,
            },
            Self::TextContent(content) => match event {
                XmlEvent::Text(text) => content.matches(text),
                _ => false,
            },
            Self::AllOf(inner) => inner.iter().all(|m| m.matches(event)),
            Self::AnyOf(inner) => inner.iter().any(|m| m.matches(event)),
            Self::Not(inner) => !inner.matches(event),
        }
    }

    /// Conjunction of `self` and `other`.
    #[must_use]
    pub fn and(self, other: EventMatcher) -> EventMatcher {
        match self {
            Self::AllOf(mut inner) => {
                inner.push(other);
                Self::AllOf(inner)
            },
            first => Self::AllOf(vec![first, other]),
        }
    }

    /// Disjunction of `self` and `other`.
    #[must_use]
    pub fn or(self, other: EventMatcher) -> EventMatcher {
        match self {
            Self::AnyOf(mut inner) => {
                inner.push(other);
                Self::AnyOf(inner)
            },
            first => Self::AnyOf(vec![first, other]),
        }
    }

    /// Negation of `self`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> EventMatcher {
        Self::Not(Box::new(self))
    }
}

impl fmt::Display for EventMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartElement => f.write_str("a start element"),
            Self::EndElement => f.write_str("an end element"),
            Self::Text => f.write_str("text"),
            Self::EndDocument => f.write_str("the end of the document"),
            Self::ElementName(name) => write!(f, "element named {name}"),
            Self::Attribute { name, value } => write!(f, "attribute {name} = {value}"),
            Self::TextContent(content) => write!(f, "text {content}"),
            Self::AllOf(inner) => write_joined(f, inner, " and "),
            Self::AnyOf(inner) => write_joined(f, inner, " or "),
            Self::Not(inner) => write!(f, "not ({inner})"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, inner: &[EventMatcher], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, matcher) in inner.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{matcher}")?;
    }
    f.write_str(")")
}

/// Describes a list of alternatives the way [`EventMatcher::AnyOf`] would.
pub(crate) fn describe_alternatives(matchers: &[EventMatcher]) -> String {
    match matchers {
        [single] => single.to_string(),
        many => EventMatcher::AnyOf(many.to_vec()).to_string(),
    }
}

/// Matches a start or end element with the given local name.
#[must_use]
pub fn element_named(local: &str) -> EventMatcher {
    EventMatcher::ElementName(TextMatcher::EqualTo(local.to_string()))
}

/// Matches a start element with the given local name.
#[must_use]
pub fn start_element_named(local: &str) -> EventMatcher {
    EventMatcher::StartElement.and(element_named(local))
}

/// Matches an end element with the given local name.
#[must_use]
pub fn end_element_named(local: &str) -> EventMatcher {
    EventMatcher::EndElement.and(element_named(local))
}

/// Matches a start element carrying `name="value"`.
#[must_use]
pub fn attribute_equal_to(name: &str, value: &str) -> EventMatcher {
    EventMatcher::Attribute {
        name: TextMatcher::EqualTo(name.to_string()),
        value: TextMatcher::EqualTo(value.to_string()),
    }
}
