use crate::types::TypeRef;
use derive_more::Display;
use indexmap::IndexMap;
use serde::Serialize;

///
/// LockMode
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum LockMode {
    #[display("none")]
    None,
    #[default]
    #[display("read")]
    Read,
    #[display("upgrade")]
    Upgrade,
    #[display("upgrade-nowait")]
    UpgradeNoWait,
    #[display("write")]
    Write,
}

///
/// FlushMode
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum FlushMode {
    #[display("always")]
    Always,
    #[display("auto")]
    Auto,
    #[display("commit")]
    Commit,
    #[display("never")]
    Never,
}

///
/// CacheMode
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum CacheMode {
    #[display("get")]
    Get,
    #[display("ignore")]
    Ignore,
    #[display("normal")]
    Normal,
    #[display("put")]
    Put,
    #[display("refresh")]
    Refresh,
}

///
/// QuerySettings
///
/// Settings shared by object queries and native queries.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct QuerySettings {
    pub cacheable: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_mode: Option<FlushMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_mode: Option<CacheMode>,

    pub read_only: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Declared parameter types in declaration order.
    pub parameter_types: IndexMap<String, TypeRef>,
}

///
/// NamedQuery
///

#[derive(Clone, Debug, Serialize)]
pub struct NamedQuery {
    pub name: String,
    pub query: String,
    pub settings: QuerySettings,
}

///
/// NamedSqlQuery
///

#[derive(Clone, Debug, Serialize)]
pub struct NamedSqlQuery {
    pub name: String,
    pub query: String,
    pub settings: QuerySettings,
    pub results: SqlQueryResults,
    pub synchronized_tables: Vec<String>,
    pub callable: bool,
}

///
/// SqlQueryResults
///
/// Either a reference to a registered result set or one declared inline.
///

#[derive(Clone, Debug, Serialize)]
pub enum SqlQueryResults {
    Inline(ResultSetMapping),
    Ref(String),
}

///
/// ResultSetMapping
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct ResultSetMapping {
    pub name: String,
    pub scalars: Vec<ScalarReturn>,
    pub returns: Vec<EntityReturn>,
}

impl ResultSetMapping {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn return_by_alias(&self, alias: &str) -> Option<&EntityReturn> {
        self.returns.iter().find(|r| r.alias() == alias)
    }
}

///
/// ScalarReturn
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ScalarReturn {
    pub column: String,
    pub ty: TypeRef,
}

///
/// EntityReturn
///

#[derive(Clone, Debug, Serialize)]
pub enum EntityReturn {
    Collection(CollectionReturn),
    Join(JoinReturn),
    Root(RootReturn),
}

impl EntityReturn {
    #[must_use]
    pub fn alias(&self) -> &str {
        match self {
            Self::Collection(r) => &r.alias,
            Self::Join(r) => &r.alias,
            Self::Root(r) => &r.alias,
        }
    }

    #[must_use]
    pub const fn property_results(&self) -> &IndexMap<String, Vec<String>> {
        match self {
            Self::Collection(r) => &r.property_results,
            Self::Join(r) => &r.property_results,
            Self::Root(r) => &r.property_results,
        }
    }
}

///
/// RootReturn
///

#[derive(Clone, Debug, Serialize)]
pub struct RootReturn {
    pub alias: String,
    pub entity_name: String,
    pub lock_mode: LockMode,
    pub property_results: IndexMap<String, Vec<String>>,
}

///
/// JoinReturn
///

#[derive(Clone, Debug, Serialize)]
pub struct JoinReturn {
    pub alias: String,
    pub owner_alias: String,
    pub owner_property: String,
    pub lock_mode: LockMode,
    pub property_results: IndexMap<String, Vec<String>>,
}

///
/// CollectionReturn
///

#[derive(Clone, Debug, Serialize)]
pub struct CollectionReturn {
    pub alias: String,
    pub owner_entity_name: String,
    pub owner_property: String,
    pub lock_mode: LockMode,
    pub property_results: IndexMap<String, Vec<String>>,
}
