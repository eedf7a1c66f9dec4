use crate::{
    meta::MetaMap,
    model::{Column, Property, Selectable, TableId},
};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

///
/// Value
///
/// The typed, column-bearing payload of a property. Tables are referenced
/// by id; the registry owns them.
///

#[derive(Clone, Debug, Serialize)]
pub enum Value {
    Any(AnyValue),
    Collection(CollectionRef),
    Component(Component),
    Dependant(DependantValue),
    ManyToOne(ManyToOne),
    OneToMany(OneToMany),
    OneToOne(OneToOne),
    Simple(SimpleValue),
}

impl Value {
    /// The simple-value core of every column-bearing variant.
    #[must_use]
    pub const fn simple(&self) -> Option<&SimpleValue> {
        match self {
            Self::Simple(v) => Some(v),
            Self::Dependant(v) => Some(&v.base),
            Self::ManyToOne(v) => Some(&v.base),
            Self::OneToOne(v) => Some(&v.base),
            Self::Any(v) => Some(&v.base),
            Self::Component(_) | Self::Collection(_) | Self::OneToMany(_) => None,
        }
    }

    pub const fn simple_mut(&mut self) -> Option<&mut SimpleValue> {
        match self {
            Self::Simple(v) => Some(v),
            Self::Dependant(v) => Some(&mut v.base),
            Self::ManyToOne(v) => Some(&mut v.base),
            Self::OneToOne(v) => Some(&mut v.base),
            Self::Any(v) => Some(&mut v.base),
            Self::Component(_) | Self::Collection(_) | Self::OneToMany(_) => None,
        }
    }

    #[must_use]
    pub const fn to_one(&self) -> Option<&ToOne> {
        match self {
            Self::ManyToOne(v) => Some(&v.to_one),
            Self::OneToOne(v) => Some(&v.to_one),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_component(&self) -> Option<&Component> {
        match self {
            Self::Component(c) => Some(c),
            _ => None,
        }
    }

    /// Columns and formulas in order, flattening components.
    #[must_use]
    pub fn selectables(&self) -> Vec<&Selectable> {
        match self {
            Self::Component(c) => c
                .properties
                .iter()
                .flat_map(|p| p.value.selectables())
                .collect(),
            other => other
                .simple()
                .map(|s| s.selectables.iter().collect())
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> Vec<&Column> {
        self.selectables()
            .into_iter()
            .filter_map(Selectable::as_column)
            .collect()
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns().into_iter().map(|c| c.name.clone()).collect()
    }

    #[must_use]
    pub fn column_span(&self) -> usize {
        self.selectables().len()
    }

    #[must_use]
    pub fn has_formula(&self) -> bool {
        self.selectables().iter().any(|s| s.is_formula())
    }

    /// Nullable when a formula is involved or every column is nullable.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Dependant(d) => d.nullable,
            Self::Component(c) => c.properties.iter().all(|p| p.value.is_nullable()),
            Self::Collection(_) | Self::OneToMany(_) => true,
            other => {
                let selectables = other.selectables();
                selectables.iter().any(|s| s.is_formula())
                    || selectables
                        .iter()
                        .filter_map(|s| s.as_column())
                        .all(|c| c.nullable)
            }
        }
    }

    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.simple().and_then(|s| s.type_name.as_deref())
    }

    #[must_use]
    pub fn table(&self) -> Option<TableId> {
        match self {
            Self::Component(c) => c.table,
            Self::OneToMany(o) => o.associated_table,
            other => other.simple().and_then(|s| s.table),
        }
    }

    /// Set every column's nullability.
    pub fn set_nullable(&mut self, nullable: bool) {
        match self {
            Self::Component(c) => {
                for p in &mut c.properties {
                    p.value.set_nullable(nullable);
                }
            }
            other => {
                if let Some(simple) = other.simple_mut() {
                    for s in &mut simple.selectables {
                        if let Selectable::Column(c) = s {
                            c.nullable = nullable;
                        }
                    }
                }
            }
        }
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }
}

///
/// SimpleValue
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct SimpleValue {
    pub table: Option<TableId>,
    pub selectables: Vec<Selectable>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub type_parameters: IndexMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<IdentifierGenerator>,

    /// Sentinel distinguishing transient from persistent instances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsaved_value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key_name: Option<String>,

    pub cascade_delete: bool,
    pub alternate_unique_key: bool,
}

impl SimpleValue {
    #[must_use]
    pub fn new(table: Option<TableId>) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.selectables.iter().filter_map(Selectable::as_column)
    }

    #[must_use]
    pub fn has_formula(&self) -> bool {
        self.selectables.iter().any(Selectable::is_formula)
    }

    #[must_use]
    pub fn generator_strategy(&self) -> Option<&str> {
        self.generator.as_ref().map(|g| g.strategy.as_str())
    }
}

///
/// IdentifierGenerator
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IdentifierGenerator {
    pub strategy: String,
    pub parameters: IndexMap<String, String>,
}

///
/// DependantValue
///
/// A foreign key whose type comes from the value it references.
///

#[derive(Clone, Debug, Serialize)]
pub struct DependantValue {
    pub base: SimpleValue,
    pub wrapped: Box<Value>,
    pub nullable: bool,
    pub updatable: bool,
}

///
/// FetchMode
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum FetchMode {
    #[default]
    Default,
    Join,
    Select,
}

///
/// ToOne
///

#[derive(Clone, Debug, Serialize)]
pub struct ToOne {
    pub referenced_entity: Option<String>,
    pub referenced_property: Option<String>,
    pub fetch: FetchMode,
    pub lazy: bool,
    pub unwrap_proxy: bool,
    pub embedded: bool,
}

impl Default for ToOne {
    fn default() -> Self {
        Self {
            referenced_entity: None,
            referenced_property: None,
            fetch: FetchMode::Default,
            lazy: true,
            unwrap_proxy: false,
            embedded: true,
        }
    }
}

///
/// ManyToOne
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct ManyToOne {
    pub base: SimpleValue,
    pub to_one: ToOne,
    pub ignore_not_found: bool,
}

///
/// ForeignKeyDirection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum ForeignKeyDirection {
    FromParent,
    ToParent,
}

///
/// OneToOne
///

#[derive(Clone, Debug, Serialize)]
pub struct OneToOne {
    pub base: SimpleValue,
    pub to_one: ToOne,
    pub constrained: bool,
    pub foreign_key_direction: ForeignKeyDirection,
    pub property_name: String,
    pub owner_entity: String,
}

///
/// AnyValue
///
/// Polymorphic association keyed by a discriminator and an id.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct AnyValue {
    pub base: SimpleValue,
    pub identifier_type: Option<String>,
    pub meta_type: Option<String>,
    pub meta_values: BTreeMap<String, String>,
    pub lazy: bool,
}

///
/// Component
///

#[derive(Clone, Debug, Serialize)]
pub struct Component {
    pub table: Option<TableId>,
    pub owner_entity: String,
    pub role_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_class: Option<String>,

    pub dynamic: bool,
    pub embedded: bool,
    pub key: bool,

    /// Identifier sentinel when this component is a composite identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsaved_value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_property: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,

    pub properties: Vec<Property>,

    #[serde(skip_serializing_if = "MetaMap::is_empty")]
    pub metas: MetaMap,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tuplizers: BTreeMap<String, String>,
}

impl Component {
    #[must_use]
    pub fn new(table: Option<TableId>, owner_entity: &str, role_name: &str) -> Self {
        Self {
            table,
            owner_entity: owner_entity.to_string(),
            role_name: role_name.to_string(),
            component_class: None,
            dynamic: false,
            embedded: false,
            key: false,
            unsaved_value: None,
            parent_property: None,
            node_name: None,
            properties: Vec::new(),
            metas: MetaMap::new(),
            tuplizers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

///
/// OneToMany
///
/// Element of a one-to-many collection. The table is only known after the
/// target entity is bound.
///

#[derive(Clone, Debug, Serialize)]
pub struct OneToMany {
    pub referenced_entity: Option<String>,
    pub associated_table: Option<TableId>,
    pub embedded: bool,
    pub ignore_not_found: bool,
}

///
/// CollectionRef
///
/// Property payload pointing at a registered collection by role.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CollectionRef {
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, nullable: bool) -> Selectable {
        let mut c = Column::new(name);
        c.nullable = nullable;
        Selectable::Column(c)
    }

    #[test]
    fn nullability_follows_columns_and_formulas() {
        let mut v = SimpleValue::new(None);
        v.selectables = vec![column("a", true), column("b", false)];
        let value = Value::Simple(v.clone());
        assert!(!value.is_nullable());

        v.selectables.push(Selectable::Formula("a + b".into()));
        assert!(Value::Simple(v).is_nullable());
    }

    #[test]
    fn set_nullable_reaches_component_columns() {
        let mut inner = SimpleValue::new(None);
        inner.selectables = vec![column("street", true)];
        let mut component = Component::new(None, "Person", "Person.address");
        component
            .properties
            .push(Property::new("street", Value::Simple(inner)));

        let mut value = Value::Component(component);
        value.set_nullable(false);

        assert!(!value.is_nullable());
        assert_eq!(value.column_names(), ["street"]);
    }
}
