//! Read-only element tree consumed by the mapping binder.
//!
//! Documents are parsed elsewhere; this crate only describes the shape the
//! binder walks: named elements with ordered attributes, ordered children and
//! text content. Elements are reference counted so deferred binding work can
//! hold on to a subtree without copying it.

mod builder;


pub use builder::{ElementBuilder, element};

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;

///
/// Element
///
/// One node of a parsed mapping document. Cloning is cheap.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Element {
    inner: Arc<ElementData>,
}

///
/// ElementData
///

#[derive(Debug, Default, Eq, PartialEq, Serialize)]
struct ElementData {
    name: String,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    attributes: IndexMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Element>,

    #[serde(skip_serializing_if = "String::is_empty")]
    text: String,
}

impl Element {
    pub(crate) fn from_parts(
        name: String,
        attributes: IndexMap<String, String>,
        children: Vec<Self>,
        text: String,
    ) -> Self {
        Self {
            inner: Arc::new(ElementData {
                name,
                attributes,
                children,
                text,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Value of a named attribute, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.inner.attributes.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.inner.attributes.contains_key(name)
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.inner.children
    }

    /// Children with the given element name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.inner.children.iter().filter(move |c| c.name() == name)
    }

    /// First child with the given element name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.inner.children.iter().find(|c| c.name() == name)
    }

    /// Raw text content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.inner.text
    }

    /// Text content with surrounding whitespace removed.
    #[must_use]
    pub fn text_trim(&self) -> &str {
        self.inner.text.trim()
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

impl From<ElementBuilder> for Element {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

///
/// Document
///
/// A parsed mapping unit. `origin` names where it came from (a file name,
/// a resource path) and only shows up in diagnostics.
///

#[derive(Clone, Debug, Serialize)]
pub struct Document {
    pub root: Element,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Document {
    #[must_use]
    pub const fn new(root: Element) -> Self {
        Self { root, origin: None }
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Origin for log lines, falling back to the root element name.
    #[must_use]
    pub fn describe(&self) -> &str {
        self.origin.as_deref().unwrap_or_else(|| self.root.name())
    }
}

impl From<Element> for Document {
    fn from(root: Element) -> Self {
        Self::new(root)
    }
}
