use crate::Element;
use indexmap::IndexMap;

// element
/// Start building an element with the given name.
#[must_use]
pub fn element(name: impl Into<String>) -> ElementBuilder {
    ElementBuilder::new(name)
}

///
/// ElementBuilder
///
/// Used by parsers and tests to assemble trees. Setting an attribute twice
/// keeps the original position and the latest value.
///

#[derive(Clone, Debug, Default)]
pub struct ElementBuilder {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Element>,
    text: String,
}

impl ElementBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set an attribute only when a value is supplied.
    #[must_use]
    pub fn attr_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn children<I, E>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Append text content.
    #[must_use]
    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        self.text.push_str(text.as_ref());
        self
    }

    #[must_use]
    pub fn build(self) -> Element {
        Element::from_parts(self.name, self.attributes, self.children, self.text)
    }
}
