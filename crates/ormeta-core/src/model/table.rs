use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

///
/// TableId
///
/// Stable handle of a table inside the registry that created it.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TableId(pub(crate) usize);

impl TableId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

///
/// TableKey
///
/// Registry identity of a table. Two lookups with equal keys return the
/// same table.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TableKey {
    pub schema: Option<String>,
    pub catalog: Option<String>,
    pub name: String,
}

impl TableKey {
    #[must_use]
    pub fn new(schema: Option<&str>, catalog: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.map(str::to_string),
            catalog: catalog.map(str::to_string),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(catalog) = &self.catalog {
            write!(f, "{catalog}.")?;
        }
        if let Some(schema) = &self.schema {
            write!(f, "{schema}.")?;
        }
        write!(f, "{}", self.name)
    }
}

///
/// Column
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub quoted: bool,
    pub nullable: bool,
    pub unique: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Position of this column within a multi-column type.
    pub type_index: usize,
}

impl Column {
    /// A nullable column. Backtick-quoted names are unquoted and flagged.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let (name, quoted) = match name.strip_prefix('`') {
            Some(rest) => (rest.trim_end_matches('`'), true),
            None => (name, false),
        };

        Self {
            name: name.to_string(),
            quoted,
            nullable: true,
            unique: false,
            length: None,
            precision: None,
            scale: None,
            check: None,
            default: None,
            sql_type: None,
            comment: None,
            type_index: 0,
        }
    }
}

///
/// Selectable
///
/// One column or SQL formula carried by a value.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Selectable {
    Column(Column),
    Formula(String),
}

impl Selectable {
    #[must_use]
    pub const fn as_column(&self) -> Option<&Column> {
        match self {
            Self::Column(c) => Some(c),
            Self::Formula(_) => None,
        }
    }

    #[must_use]
    pub const fn is_formula(&self) -> bool {
        matches!(self, Self::Formula(_))
    }
}

///
/// PrimaryKey
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PrimaryKey {
    pub columns: Vec<String>,
}

///
/// UniqueKey
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct UniqueKey {
    pub name: String,
    pub columns: Vec<String>,
}

impl UniqueKey {
    pub fn add_column(&mut self, column: &str) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
    }
}

///
/// Index
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
}

///
/// ForeignKey
///
/// Empty `referenced_columns` means the referenced entity's primary key.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_entity: String,
    pub referenced_columns: Vec<String>,
    pub cascade_delete: bool,
}

///
/// Table
///

#[derive(Clone, Debug, Serialize)]
pub struct Table {
    pub key: TableKey,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subselect: Option<String>,

    pub is_abstract: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,

    pub columns: IndexMap<String, Column>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,

    pub unique_keys: IndexMap<String, UniqueKey>,
    pub indexes: IndexMap<String, Index>,
    pub foreign_keys: IndexMap<String, ForeignKey>,
    pub checks: Vec<String>,

    /// Parent whose columns this table repeats (union subclasses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denormalized_parent: Option<TableId>,
}

impl Table {
    #[must_use]
    pub fn new(key: TableKey, subselect: Option<String>, is_abstract: bool) -> Self {
        Self {
            key,
            subselect,
            is_abstract,
            comment: None,
            row_id: None,
            columns: IndexMap::new(),
            primary_key: None,
            unique_keys: IndexMap::new(),
            indexes: IndexMap::new(),
            foreign_keys: IndexMap::new(),
            checks: Vec::new(),
            denormalized_parent: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.key.name
    }

    #[must_use]
    pub const fn is_subselect(&self) -> bool {
        self.subselect.is_some()
    }

    /// Add a column unless one with the same name exists; the existing
    /// definition wins.
    pub fn add_column(&mut self, column: Column) {
        self.columns.entry(column.name.clone()).or_insert(column);
    }

    /// Replace a column definition, adding it if missing.
    pub fn put_column(&mut self, column: Column) {
        self.columns.insert(column.name.clone(), column);
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    pub fn unique_key_mut(&mut self, name: &str) -> &mut UniqueKey {
        self.unique_keys
            .entry(name.to_string())
            .or_insert_with(|| UniqueKey {
                name: name.to_string(),
                columns: Vec::new(),
            })
    }

    pub fn index_mut(&mut self, name: &str) -> &mut Index {
        self.indexes.entry(name.to_string()).or_insert_with(|| Index {
            name: name.to_string(),
            columns: Vec::new(),
        })
    }

    /// Add a unique key over `columns` with a generated name.
    pub fn create_unique_key(&mut self, columns: &[String]) -> String {
        let name = constraint_name("UK", self.name(), columns);
        let key = self.unique_key_mut(&name);
        for column in columns {
            key.add_column(column);
        }

        name
    }

    pub fn set_primary_key(&mut self, columns: Vec<String>) {
        self.primary_key = Some(PrimaryKey { columns });
    }

    /// Add a foreign key, generating its name when none is given.
    pub fn create_foreign_key(
        &mut self,
        name: Option<&str>,
        columns: Vec<String>,
        referenced_entity: &str,
        referenced_columns: Vec<String>,
        cascade_delete: bool,
    ) -> String {
        let name = name.map_or_else(
            || constraint_name("FK", self.name(), &columns),
            str::to_string,
        );

        self.foreign_keys.insert(
            name.clone(),
            ForeignKey {
                name: name.clone(),
                columns,
                referenced_entity: referenced_entity.to_string(),
                referenced_columns,
                cascade_delete,
            },
        );

        name
    }

    pub fn add_check(&mut self, constraint: &str) {
        self.checks.push(constraint.to_string());
    }
}

// constraint_name
/// Deterministic constraint name: prefix plus a hash of table and columns.
#[must_use]
pub fn constraint_name(prefix: &str, table: &str, columns: &[String]) -> String {
    let mut input = String::from(table);
    for column in columns {
        input.push('\u{1f}');
        input.push_str(column);
    }

    format!("{prefix}{:016X}", xxh3_64(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backticked_column_names_are_quoted() {
        let c = Column::new("`order`");

        assert_eq!(c.name, "order");
        assert!(c.quoted);
        assert!(c.nullable);
        assert!(!Column::new("plain").quoted);
    }

    #[test]
    fn add_column_keeps_the_first_definition() {
        let mut t = Table::new(TableKey::new(None, None, "CATS"), None, false);
        let mut first = Column::new("name");
        first.length = Some(20);
        t.add_column(first);
        t.add_column(Column::new("name"));

        assert_eq!(t.columns.len(), 1);
        assert_eq!(t.column("name").unwrap().length, Some(20));
    }

    #[test]
    fn constraint_names_are_stable_and_column_sensitive() {
        let a = constraint_name("FK", "CATS", &["mate_id".into()]);
        let b = constraint_name("FK", "CATS", &["mate_id".into()]);
        let c = constraint_name("FK", "CATS", &["owner_id".into()]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("FK"));
        assert_eq!(a.len(), 18);
    }

    #[test]
    fn table_key_displays_qualified() {
        let key = TableKey::new(Some("zoo"), Some("main"), "CATS");
        assert_eq!(key.to_string(), "main.zoo.CATS");
        assert_eq!(TableKey::new(None, None, "CATS").to_string(), "CATS");
    }
}
