//! Streaming XML plumbing shared by the provider and the harvester.
//!
//! - [`matchers`]: predicates over single events
//! - [`reader`]: a pull cursor that asserts each step against matchers
//! - [`writer`]: a push writer with a raw passthrough channel
//! - [`copy`]: byte-safe splicing of serialized fragments into a writer

pub mod copy;
pub mod matchers;
pub mod reader;
pub mod writer;

pub use copy::copy_fragment;
pub use matchers::{EventMatcher, TextMatcher};
pub use reader::{QualifiedName, XmlEvent, XmlReader};
pub use writer::{XmlWritable, XmlWriter};
