use crate::types::TypeRef;
use indexmap::IndexMap;
use serde::Serialize;

///
/// TypeDef
///
/// Named alias for a custom type class with default parameters.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TypeDef {
    pub name: String,
    pub type_class: String,
    pub parameters: IndexMap<String, String>,
}

///
/// FilterDefinition
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FilterDefinition {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_condition: Option<String>,

    pub parameter_types: IndexMap<String, TypeRef>,
}

///
/// AuxiliaryDatabaseObject
///
/// Extra DDL emitted alongside the mapped schema.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum AuxiliaryDatabaseObject {
    Custom {
        definition_class: String,
        dialect_scopes: Vec<String>,
    },
    Simple {
        create: String,
        drop: String,
        dialect_scopes: Vec<String>,
    },
}

impl AuxiliaryDatabaseObject {
    #[must_use]
    pub fn dialect_scopes(&self) -> &[String] {
        match self {
            Self::Custom { dialect_scopes, .. } | Self::Simple { dialect_scopes, .. } => {
                dialect_scopes
            }
        }
    }

    /// Applies to `dialect` when unscoped or when listed.
    #[must_use]
    pub fn applies_to(&self, dialect: &str) -> bool {
        let scopes = self.dialect_scopes();
        scopes.is_empty() || scopes.iter().any(|s| s == dialect)
    }
}
