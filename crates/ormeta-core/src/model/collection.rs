use crate::{
    meta::MetaMap,
    model::{CacheSettings, CustomSqlSet, FetchMode, FilterUse, TableId, Value},
};
use derive_more::Display;
use serde::Serialize;

///
/// CollectionKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum CollectionKind {
    #[display("array")]
    Array,
    #[display("bag")]
    Bag,
    #[display("idbag")]
    IdentifierBag,
    #[display("list")]
    List,
    #[display("map")]
    Map,
    #[display("primitive-array")]
    PrimitiveArray,
    #[display("set")]
    Set,
}

impl CollectionKind {
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        matches!(
            self,
            Self::Array | Self::List | Self::Map | Self::PrimitiveArray
        )
    }

    #[must_use]
    pub const fn is_list_like(self) -> bool {
        matches!(self, Self::Array | Self::List | Self::PrimitiveArray)
    }
}

///
/// SortStrategy
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub enum SortStrategy {
    Comparator(String),
    Natural,
    #[default]
    Unsorted,
}

impl SortStrategy {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("unsorted") => Self::Unsorted,
            Some("natural") => Self::Natural,
            Some(comparator) => Self::Comparator(comparator.to_string()),
        }
    }

    #[must_use]
    pub const fn is_sorted(&self) -> bool {
        !matches!(self, Self::Unsorted)
    }
}

///
/// Collection
///
/// Created by the owning entity's property walk; key, element and index
/// are attached by the collection's second pass.
///

#[derive(Clone, Debug, Serialize)]
pub struct Collection {
    pub role: String,
    pub owner_entity: String,
    pub kind: CollectionKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_table: Option<TableId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<Value>,

    /// First index value of a list or array.
    pub base_index: i32,

    /// `node` name of a list index or simple map index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_node_name: Option<String>,

    /// Surrogate key of an identifier bag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Value>,

    pub inverse: bool,
    pub mutable: bool,
    pub optimistic_locked: bool,
    pub lazy: bool,
    pub extra_lazy: bool,
    pub fetch: FetchMode,
    pub subselect_loadable: bool,
    pub embedded: bool,
    pub orphan_delete: bool,
    pub sort: SortStrategy,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub many_to_many_where: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub many_to_many_order_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_node_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub persister: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_class: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_property: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader_query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSettings>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,

    pub custom_sql: CustomSqlSet,
    pub filters: Vec<FilterUse>,
    pub many_to_many_filters: Vec<FilterUse>,
    pub synchronized_tables: Vec<String>,

    #[serde(skip_serializing_if = "MetaMap::is_empty")]
    pub metas: MetaMap,
}

impl Collection {
    #[must_use]
    pub fn new(role: impl Into<String>, owner_entity: impl Into<String>, kind: CollectionKind) -> Self {
        Self {
            role: role.into(),
            owner_entity: owner_entity.into(),
            kind,
            collection_table: None,
            key: None,
            element: None,
            index: None,
            base_index: 0,
            index_node_name: None,
            identifier: None,
            inverse: false,
            mutable: true,
            optimistic_locked: true,
            lazy: true,
            extra_lazy: false,
            fetch: FetchMode::Default,
            subselect_loadable: false,
            embedded: true,
            orphan_delete: false,
            sort: SortStrategy::Unsorted,
            order_by: None,
            where_clause: None,
            many_to_many_where: None,
            many_to_many_order_by: None,
            batch_size: None,
            node_name: None,
            element_node_name: None,
            persister: None,
            type_name: None,
            element_class: None,
            referenced_property: None,
            loader_query: None,
            cache: None,
            check: None,
            custom_sql: CustomSqlSet::default(),
            filters: Vec::new(),
            many_to_many_filters: Vec::new(),
            synchronized_tables: Vec::new(),
            metas: MetaMap::new(),
        }
    }

    #[must_use]
    pub const fn is_one_to_many(&self) -> bool {
        matches!(self.element, Some(Value::OneToMany(_)))
    }

    /// Unqualified property name of the role.
    #[must_use]
    pub fn property_name(&self) -> &str {
        crate::naming::unqualify(&self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_attribute_parses_three_ways() {
        assert_eq!(SortStrategy::parse(None), SortStrategy::Unsorted);
        assert_eq!(SortStrategy::parse(Some("natural")), SortStrategy::Natural);
        assert_eq!(
            SortStrategy::parse(Some("org.zoo.ByName")),
            SortStrategy::Comparator("org.zoo.ByName".into())
        );
        assert!(!SortStrategy::parse(Some("unsorted")).is_sorted());
    }

    #[test]
    fn property_name_is_role_suffix() {
        let c = Collection::new("org.zoo.Cat.kittens", "org.zoo.Cat", CollectionKind::Set);
        assert_eq!(c.property_name(), "kittens");
        assert!(!c.kind.is_indexed());
        assert!(CollectionKind::Array.is_list_like());
    }
}
