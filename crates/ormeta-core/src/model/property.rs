use crate::{meta::MetaMap, model::Value};
use serde::Serialize;

///
/// Property
///
/// A named slot on an entity, join or component.
///

#[derive(Clone, Debug, Serialize)]
pub struct Property {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,

    pub value: Value,
    pub access: String,
    pub cascade: String,
    pub insertable: bool,
    pub updatable: bool,
    pub optimistic_locked: bool,
    pub lazy: bool,
    pub optional: bool,
    pub generation: PropertyGeneration,
    pub natural_identifier: bool,

    /// False for synthetic properties that never appear in a select list.
    pub selectable: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backref: Option<Backref>,

    #[serde(skip_serializing_if = "MetaMap::is_empty")]
    pub metas: MetaMap,
}

impl Property {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            node_name: None,
            value,
            access: "property".to_string(),
            cascade: "none".to_string(),
            insertable: true,
            updatable: true,
            optimistic_locked: true,
            lazy: false,
            optional: false,
            generation: PropertyGeneration::Never,
            natural_identifier: false,
            selectable: true,
            backref: None,
            metas: MetaMap::new(),
        }
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.value.is_nullable()
    }

    #[must_use]
    pub const fn is_backref(&self) -> bool {
        self.backref.is_some()
    }

    /// Cascade styles in declaration order.
    pub fn cascade_styles(&self) -> impl Iterator<Item = &str> {
        cascade_tokens(&self.cascade)
    }
}

// cascade_tokens
/// Split a cascade attribute such as `all, delete-orphan`.
pub fn cascade_tokens(cascade: &str) -> impl Iterator<Item = &str> {
    cascade
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
}

// cascades_delete_orphan
/// True when a cascade attribute asks for orphan delete, alone or as part
/// of `all-delete-orphan`.
#[must_use]
pub fn cascades_delete_orphan(cascade: &str) -> bool {
    cascade_tokens(cascade).any(|t| matches!(t, "delete-orphan" | "all-delete-orphan"))
}

///
/// PropertyGeneration
///
/// Whether the database generates the value, and when.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum PropertyGeneration {
    Always,
    Insert,
    #[default]
    Never,
}

impl PropertyGeneration {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "always" => Some(Self::Always),
            "insert" => Some(Self::Insert),
            "never" => Some(Self::Never),
            _ => None,
        }
    }
}

///
/// Backref
///
/// Marks a synthetic property that exposes collection ownership from the
/// element side.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Backref {
    pub kind: BackrefKind,
    pub collection_role: String,
    pub entity_name: String,
}

///
/// BackrefKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum BackrefKind {
    Collection,
    Index,
}
