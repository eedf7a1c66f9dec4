use crate::{
    meta::MetaMap,
    model::{Component, Join, Property, SimpleValue, TableId, Value},
};
use derive_more::Display;
use serde::Serialize;
use std::collections::BTreeMap;

///
/// EntityMapping
///
/// A persistent type. Fields shared by every variant live here; the
/// variant-specific part is in `kind`.
///

#[derive(Clone, Debug, Serialize)]
pub struct EntityMapping {
    pub entity_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_interface: Option<String>,

    pub node_name: String,
    pub kind: EntityKind,

    /// Table rows of this entity live in. Plain subclasses share it with
    /// their superclass.
    pub table: TableId,

    pub lazy: bool,
    pub discriminator_value: String,
    pub dynamic_update: bool,
    pub dynamic_insert: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,

    pub select_before_update: bool,
    pub optimistic_lock: OptimisticLock,

    #[serde(skip_serializing_if = "MetaMap::is_empty")]
    pub metas: MetaMap,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub persister: Option<String>,

    pub custom_sql: CustomSqlSet,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader_query: Option<String>,

    pub synchronized_tables: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_abstract: Option<bool>,

    pub properties: Vec<Property>,
    pub joins: Vec<Join>,
    pub subclasses: Vec<String>,
    pub filters: Vec<FilterUse>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tuplizers: BTreeMap<String, String>,

    pub subselect_loadable_collections: bool,
}

impl EntityMapping {
    #[must_use]
    pub fn new(entity_name: impl Into<String>, kind: EntityKind, table: TableId) -> Self {
        let entity_name = entity_name.into();

        Self {
            node_name: entity_name.clone(),
            discriminator_value: entity_name.clone(),
            entity_name,
            class_name: None,
            proxy_interface: None,
            kind,
            table,
            lazy: true,
            dynamic_update: false,
            dynamic_insert: false,
            batch_size: None,
            select_before_update: false,
            optimistic_lock: OptimisticLock::Version,
            metas: MetaMap::new(),
            persister: None,
            custom_sql: CustomSqlSet::default(),
            loader_query: None,
            synchronized_tables: Vec::new(),
            is_abstract: None,
            properties: Vec::new(),
            joins: Vec::new(),
            subclasses: Vec::new(),
            filters: Vec::new(),
            tuplizers: BTreeMap::new(),
            subselect_loadable_collections: false,
        }
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self.kind, EntityKind::Root(_))
    }

    #[must_use]
    pub const fn root(&self) -> Option<&RootData> {
        match &self.kind {
            EntityKind::Root(root) => Some(root),
            _ => None,
        }
    }

    pub const fn root_mut(&mut self) -> Option<&mut RootData> {
        match &mut self.kind {
            EntityKind::Root(root) => Some(root),
            _ => None,
        }
    }

    #[must_use]
    pub fn superclass(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Root(_) => None,
            EntityKind::Subclass { superclass }
            | EntityKind::JoinedSubclass { superclass, .. }
            | EntityKind::UnionSubclass { superclass } => Some(superclass),
        }
    }

    /// Declared property by name, looking into joins as well.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .chain(self.joins.iter().flat_map(|j| j.properties.iter()))
            .find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        let Self {
            properties, joins, ..
        } = self;

        properties
            .iter_mut()
            .chain(joins.iter_mut().flat_map(|j| j.properties.iter_mut()))
            .find(|p| p.name == name)
    }

    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Properties flagged as part of the natural identifier.
    pub fn natural_id_properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.natural_identifier)
    }
}

///
/// EntityKind
///

#[derive(Clone, Debug, Serialize)]
pub enum EntityKind {
    Root(Box<RootData>),
    Subclass {
        superclass: String,
    },
    JoinedSubclass {
        superclass: String,
        key: Box<Value>,
    },
    UnionSubclass {
        superclass: String,
    },
}

impl EntityKind {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Root(_) => "class",
            Self::Subclass { .. } => "subclass",
            Self::JoinedSubclass { .. } => "joined-subclass",
            Self::UnionSubclass { .. } => "union-subclass",
        }
    }
}

///
/// RootData
///
/// Settings only a hierarchy root carries.
///

#[derive(Clone, Debug, Serialize)]
pub struct RootData {
    pub identifier: Option<IdentifierBinding>,
    pub embedded_identifier: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_mapper: Option<Component>,

    /// Name of the version or timestamp property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,

    pub polymorphic: bool,
    pub explicit_polymorphism: bool,
    pub mutable: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSettings>,

    /// Persister chosen by the hierarchy shape when none is set explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_persister: Option<PersisterStrategy>,
}

impl Default for RootData {
    fn default() -> Self {
        Self {
            identifier: None,
            embedded_identifier: false,
            identifier_mapper: None,
            version: None,
            discriminator: None,
            polymorphic: false,
            explicit_polymorphism: false,
            mutable: true,
            where_clause: None,
            cache: None,
            default_persister: None,
        }
    }
}

impl RootData {
    #[must_use]
    pub const fn identifier_value(&self) -> Option<&Value> {
        match &self.identifier {
            Some(IdentifierBinding::Named(p)) => Some(&p.value),
            Some(IdentifierBinding::Unnamed(v)) => Some(v),
            None => None,
        }
    }

    #[must_use]
    pub const fn identifier_property(&self) -> Option<&Property> {
        match &self.identifier {
            Some(IdentifierBinding::Named(p)) => Some(p),
            _ => None,
        }
    }
}

///
/// IdentifierBinding
///
/// Named identifiers are reachable as a property; unnamed ones only as a
/// value.
///

#[derive(Clone, Debug, Serialize)]
pub enum IdentifierBinding {
    Named(Property),
    Unnamed(Value),
}

///
/// Discriminator
///

#[derive(Clone, Debug, Serialize)]
pub struct Discriminator {
    pub value: SimpleValue,
    pub force: bool,
    pub insertable: bool,
}

///
/// CacheSettings
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CacheSettings {
    pub usage: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    pub include_lazy: bool,
}

///
/// OptimisticLock
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum OptimisticLock {
    #[display("all")]
    All,
    #[display("dirty")]
    Dirty,
    #[display("none")]
    None,
    #[default]
    #[display("version")]
    Version,
}

impl OptimisticLock {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "all" => Some(Self::All),
            "dirty" => Some(Self::Dirty),
            "none" => Some(Self::None),
            "version" => Some(Self::Version),
            _ => None,
        }
    }
}

///
/// PersisterStrategy
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum PersisterStrategy {
    #[display("single-table")]
    SingleTable,
    #[display("joined-subclass")]
    JoinedSubclass,
    #[display("union-subclass")]
    UnionSubclass,
}

///
/// CustomSql
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CustomSql {
    pub sql: String,
    pub callable: bool,
}

///
/// CustomSqlSet
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CustomSqlSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert: Option<CustomSql>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<CustomSql>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<CustomSql>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_all: Option<CustomSql>,
}

///
/// FilterUse
///
/// A filter applied to an entity or collection, with its resolved condition.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FilterUse {
    pub name: String,
    pub condition: String,
}
