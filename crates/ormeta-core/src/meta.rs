//! Meta-attributes: free-form `<meta attribute="..">text</meta>` tags that
//! flow from the document down to classes, properties and collections.

use ormeta_tree::Element;
use serde::{Serialize, Serializer};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

///
/// MetaAttribute
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MetaAttribute {
    pub name: String,
    pub values: Vec<String>,
    pub inheritable: bool,
}

impl MetaAttribute {
    #[must_use]
    pub fn new(name: impl Into<String>, inheritable: bool) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            inheritable,
        }
    }

    /// First value, for single-valued metas.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    #[must_use]
    pub const fn is_multi_valued(&self) -> bool {
        self.values.len() > 1
    }
}

///
/// MetaMap
///
/// Persistent name → attribute map. Clones share storage; a merge copies
/// only when it has something to write, so a parent's map is never touched.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MetaMap(Arc<BTreeMap<String, MetaAttribute>>);

impl MetaMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetaAttribute> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetaAttribute> {
        self.0.values()
    }

    /// Insert or replace a whole attribute.
    pub fn insert(&mut self, attribute: MetaAttribute) {
        Arc::make_mut(&mut self.0).insert(attribute.name.clone(), attribute);
    }

    /// Only the entries marked inheritable, as handed down to child scopes.
    #[must_use]
    pub fn inheritable(&self) -> Self {
        if self.0.values().all(|m| m.inheritable) {
            return self.clone();
        }

        let map = self
            .0
            .iter()
            .filter(|(_, m)| m.inheritable)
            .map(|(k, m)| (k.clone(), m.clone()))
            .collect();

        Self(Arc::new(map))
    }
}

impl FromIterator<MetaAttribute> for MetaMap {
    fn from_iter<I: IntoIterator<Item = MetaAttribute>>(iter: I) -> Self {
        Self(Arc::new(
            iter.into_iter().map(|m| (m.name.clone(), m)).collect(),
        ))
    }
}

impl Serialize for MetaMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

// get_metas
/// Merge the `<meta>` children of `node` over `inherited`.
///
/// A locally declared name replaces the inherited entry; repeated local tags
/// of the same name accumulate. With `only_inheritable` set, local tags
/// declared `inherit="false"` are skipped. Merging the same node twice over
/// the same inherited map yields equal maps.
#[must_use]
pub fn get_metas(node: &Element, inherited: &MetaMap, only_inheritable: bool) -> MetaMap {
    let mut map = inherited.clone();
    let mut overridden = BTreeSet::new();

    for meta in node.children_named("meta") {
        let inheritable = meta
            .attribute("inherit")
            .is_none_or(|v| v.eq_ignore_ascii_case("true"));

        if only_inheritable && !inheritable {
            continue;
        }

        let Some(name) = meta.attribute("attribute") else {
            continue;
        };

        let entries = Arc::make_mut(&mut map.0);
        if overridden.insert(name.to_string()) {
            entries.insert(name.to_string(), MetaAttribute::new(name, inheritable));
        }

        if let Some(entry) = entries.get_mut(name) {
            entry.inheritable = inheritable;
            entry.values.push(meta.text().to_string());
        }
    }

    map
}
