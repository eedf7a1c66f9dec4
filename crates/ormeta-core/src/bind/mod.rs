//! Binders: walk a parsed mapping document and populate the registry.
//!
//! Every binder takes the registry and a [`Scope`] explicitly. Nothing here
//! keeps state between calls; work that must wait for other entities is
//! queued as a [`SecondPass`](crate::second_pass::SecondPass).

mod collection;
mod columns;
mod component;
mod document;
mod entity;
mod filter;
mod identifier;
mod property;
mod query;
mod value;

#[cfg(test)]
mod tests;

pub(crate) use collection::{
    bind_collection_second_pass, bind_identifier_collection_second_pass, bind_list_second_pass,
    bind_map_second_pass,
};
pub use document::{BindOutcome, bind_document, extends_needed};
pub(crate) use value::bind_property_ref_constraint;

use crate::{
    defaults::DocumentDefaults,
    error::MappingError,
    meta::MetaMap,
    model::{CacheSettings, CollectionKind, CustomSql, EntityMapping, TableId},
    registry::Mappings,
};
use ormeta_tree::Element;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, LazyLock},
};

///
/// Tag
///
/// Element kinds the binders dispatch on. Resolved once per element through
/// a lookup table.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub(crate) enum Tag {
    Any,
    Array,
    Bag,
    Cache,
    Component,
    CompositeElement,
    CompositeId,
    CompositeIndex,
    Discriminator,
    DynamicComponent,
    Element,
    Filter,
    IdBag,
    Identifier,
    Index,
    IndexManyToAny,
    IndexManyToMany,
    Join,
    JoinedSubclass,
    Key,
    KeyManyToOne,
    KeyProperty,
    List,
    ManyToAny,
    ManyToMany,
    ManyToOne,
    Map,
    NaturalId,
    NestedCompositeElement,
    OneToOne,
    Parent,
    PrimitiveArray,
    Properties,
    Property,
    Query,
    ResultSet,
    Set,
    SqlQuery,
    Subclass,
    Timestamp,
    UnionSubclass,
    Version,
}

static TAGS: LazyLock<HashMap<&'static str, Tag>> = LazyLock::new(|| {
    HashMap::from([
        ("any", Tag::Any),
        ("array", Tag::Array),
        ("bag", Tag::Bag),
        ("cache", Tag::Cache),
        ("component", Tag::Component),
        ("composite-element", Tag::CompositeElement),
        ("composite-id", Tag::CompositeId),
        ("composite-index", Tag::CompositeIndex),
        ("composite-map-key", Tag::CompositeIndex),
        ("discriminator", Tag::Discriminator),
        ("dynamic-component", Tag::DynamicComponent),
        ("element", Tag::Element),
        ("filter", Tag::Filter),
        ("id", Tag::Identifier),
        ("idbag", Tag::IdBag),
        ("index", Tag::Index),
        ("index-many-to-any", Tag::IndexManyToAny),
        ("index-many-to-many", Tag::IndexManyToMany),
        ("join", Tag::Join),
        ("joined-subclass", Tag::JoinedSubclass),
        ("key", Tag::Key),
        ("key-many-to-one", Tag::KeyManyToOne),
        ("key-property", Tag::KeyProperty),
        ("list", Tag::List),
        ("many-to-any", Tag::ManyToAny),
        ("many-to-many", Tag::ManyToMany),
        ("many-to-one", Tag::ManyToOne),
        ("map", Tag::Map),
        ("map-key", Tag::Index),
        ("map-key-many-to-many", Tag::IndexManyToMany),
        ("natural-id", Tag::NaturalId),
        ("nested-composite-element", Tag::NestedCompositeElement),
        ("one-to-one", Tag::OneToOne),
        ("parent", Tag::Parent),
        ("primitive-array", Tag::PrimitiveArray),
        ("properties", Tag::Properties),
        ("property", Tag::Property),
        ("query", Tag::Query),
        ("resultset", Tag::ResultSet),
        ("set", Tag::Set),
        ("sql-query", Tag::SqlQuery),
        ("subclass", Tag::Subclass),
        ("timestamp", Tag::Timestamp),
        ("union-subclass", Tag::UnionSubclass),
        ("version", Tag::Version),
    ])
});

impl Tag {
    pub(crate) fn of(element: &Element) -> Option<Self> {
        let tag = TAGS.get(element.name()).copied();
        tracing::trace!(element = element.name(), ?tag, "dispatch");

        tag
    }

    pub(crate) const fn collection_kind(self) -> Option<CollectionKind> {
        match self {
            Self::Array => Some(CollectionKind::Array),
            Self::Bag => Some(CollectionKind::Bag),
            Self::IdBag => Some(CollectionKind::IdentifierBag),
            Self::List => Some(CollectionKind::List),
            Self::Map => Some(CollectionKind::Map),
            Self::PrimitiveArray => Some(CollectionKind::PrimitiveArray),
            Self::Set => Some(CollectionKind::Set),
            _ => None,
        }
    }
}

///
/// Scope
///
/// What a binder inherits from its enclosing elements: the document
/// defaults and the meta-attributes handed down so far.
///

#[derive(Clone, Debug)]
pub struct Scope {
    pub(crate) defaults: Arc<DocumentDefaults>,
    pub(crate) metas: MetaMap,
}

impl Scope {
    #[must_use]
    pub const fn new(defaults: Arc<DocumentDefaults>, metas: MetaMap) -> Self {
        Self { defaults, metas }
    }

    #[must_use]
    pub fn defaults(&self) -> &DocumentDefaults {
        &self.defaults
    }

    #[must_use]
    pub const fn metas(&self) -> &MetaMap {
        &self.metas
    }

    /// The same defaults with the inheritable metas of `node` merged in.
    pub(crate) fn descend(&self, node: &Element) -> Self {
        Self {
            defaults: Arc::clone(&self.defaults),
            metas: crate::meta::get_metas(node, &self.metas, true),
        }
    }

    pub(crate) fn qualify_class(&self, name: &str) -> String {
        self.defaults.qualify_class(name)
    }

    /// Schema of `node`, falling back to the document default.
    pub(crate) fn schema_of<'a>(&'a self, node: &'a Element) -> Option<&'a str> {
        node.attribute("schema").or(self.defaults.schema.as_deref())
    }

    pub(crate) fn catalog_of<'a>(&'a self, node: &'a Element) -> Option<&'a str> {
        node.attribute("catalog").or(self.defaults.catalog.as_deref())
    }

    /// Class name of a class-valued attribute, qualified by the package.
    pub(crate) fn class_attribute(&self, node: &Element, attribute: &str) -> Option<String> {
        node.attribute(attribute).map(|name| self.qualify_class(name))
    }

    /// Explicit `entity-name`, else the qualified `class` attribute.
    pub(crate) fn entity_name_of(&self, node: &Element) -> Option<String> {
        node.attribute("entity-name")
            .map(str::to_string)
            .or_else(|| self.class_attribute(node, "class"))
    }
}

///
/// Owner
///
/// The entity whose properties are being bound.
///

#[derive(Clone, Debug)]
pub(crate) struct Owner {
    pub entity_name: String,
    pub class_name: Option<String>,
    pub node_name: String,
    pub table: TableId,
}

impl Owner {
    /// Owner view of an entity that is already registered.
    pub(crate) fn of(mappings: &Mappings, entity_name: &str) -> Result<Self, MappingError> {
        mappings.entity(entity_name).map(Self::from_entity).ok_or_else(|| {
            MappingError::second_pass(format!("Unknown owning entity: {entity_name}"))
        })
    }

    pub(crate) fn from_entity(entity: &EntityMapping) -> Self {
        Self {
            entity_name: entity.entity_name.clone(),
            class_name: entity.class_name.clone(),
            node_name: entity.node_name.clone(),
            table: entity.table,
        }
    }
}

//
// attribute helpers
//

pub(crate) fn attr_is(node: &Element, name: &str, literal: &str) -> bool {
    node.attribute(name) == Some(literal)
}

/// True when the attribute is absent or "true".
pub(crate) fn attr_default_true(node: &Element, name: &str) -> bool {
    node.attribute(name).is_none_or(|v| v == "true")
}

pub(crate) fn attr_u32(node: &Element, name: &str) -> Result<Option<u32>, MappingError> {
    node.attribute(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| MappingError::invalid_number(node.name(), name, raw))
        })
        .transpose()
}

pub(crate) fn attr_i32(node: &Element, name: &str) -> Result<Option<i32>, MappingError> {
    node.attribute(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| MappingError::invalid_number(node.name(), name, raw))
        })
        .transpose()
}

/// Subselect given as an attribute or as a child element.
pub(crate) fn subselect_of(node: &Element) -> Option<String> {
    node.attribute("subselect")
        .map(str::to_string)
        .or_else(|| node.child("subselect").map(|s| s.text().to_string()))
}

/// Custom SQL held in the named child element.
pub(crate) fn custom_sql(node: &Element, child: &str) -> Option<CustomSql> {
    node.child(child).map(|e| CustomSql {
        sql: e.text_trim().to_string(),
        callable: attr_is(e, "callable", "true"),
    })
}

/// `<cache>` settings of an entity or collection.
pub(crate) fn cache_settings(node: &Element) -> Result<CacheSettings, MappingError> {
    let usage = node
        .attribute("usage")
        .ok_or_else(|| MappingError::document("<cache> must specify a usage"))?;

    Ok(CacheSettings {
        usage: usage.to_string(),
        region: node.attribute("region").map(str::to_string),
        include_lazy: !attr_is(node, "include", "non-lazy"),
    })
}

pub(crate) fn synchronized_tables(node: &Element) -> Vec<String> {
    node.children_named("synchronize")
        .filter_map(|s| s.attribute("table"))
        .map(str::to_string)
        .collect()
}

/// Tuplizer class per entity mode; the first declaration of a mode wins.
pub(crate) fn tuplizers(node: &Element) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for tuplizer in node.children_named("tuplizer") {
        if let (Some(mode), Some(class)) = (tuplizer.attribute("entity-mode"), tuplizer.attribute("class")) {
            map.entry(mode.to_string()).or_insert_with(|| class.to_string());
        }
    }

    map
}

/// `name` attribute, required by every property-like element.
pub(crate) fn property_name(node: &Element) -> Result<&str, MappingError> {
    node.attribute("name").ok_or_else(|| {
        MappingError::property(format!("<{}> must specify a name", node.name()))
    })
}

// qualify
pub(crate) fn qualify(prefix: &str, name: &str) -> String {
    format!("{prefix}.{name}")
}
