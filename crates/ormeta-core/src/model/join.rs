use crate::model::{CustomSqlSet, Property, TableId, Value};
use serde::Serialize;

///
/// Join
///
/// A secondary table holding some of an entity's properties.
///

#[derive(Clone, Debug, Serialize)]
pub struct Join {
    pub table: TableId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,

    pub sequential_select: bool,
    pub inverse: bool,
    pub optional: bool,
    pub properties: Vec<Property>,
    pub custom_sql: CustomSqlSet,
}

impl Join {
    #[must_use]
    pub fn new(table: TableId) -> Self {
        Self {
            table,
            key: None,
            sequential_select: false,
            inverse: false,
            optional: false,
            properties: Vec::new(),
            custom_sql: CustomSqlSet::default(),
        }
    }
}
