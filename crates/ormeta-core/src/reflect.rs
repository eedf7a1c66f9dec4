//! Property type inference capability.
//!
//! The binder never inspects implementation types itself. When a mapping
//! leaves out a type it asks a [`PropertyTypeResolver`], which may know the
//! answer or report nothing.

use std::{collections::BTreeMap, fmt};

///
/// PropertyTypeResolver
///

pub trait PropertyTypeResolver: fmt::Debug + Send + Sync {
    /// Type name of `property` on `class_name`, or `None` when unknown.
    fn property_type(&self, class_name: &str, property: &str) -> Option<String>;
}

///
/// NoReflection
///
/// Knows nothing. Every untyped property stays untyped.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoReflection;

impl PropertyTypeResolver for NoReflection {
    fn property_type(&self, _: &str, _: &str) -> Option<String> {
        None
    }
}

///
/// StaticReflection
///
/// Table-backed resolver, filled in up front by the caller.
///

#[derive(Clone, Debug, Default)]
pub struct StaticReflection {
    classes: BTreeMap<String, BTreeMap<String, String>>,
}

impl StaticReflection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_property(
        mut self,
        class_name: impl Into<String>,
        property: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.insert(class_name, property, type_name);
        self
    }

    pub fn insert(
        &mut self,
        class_name: impl Into<String>,
        property: impl Into<String>,
        type_name: impl Into<String>,
    ) {
        self.classes
            .entry(class_name.into())
            .or_default()
            .insert(property.into(), type_name.into());
    }
}

impl PropertyTypeResolver for StaticReflection {
    fn property_type(&self, class_name: &str, property: &str) -> Option<String> {
        self.classes.get(class_name)?.get(property).cloned()
    }
}
