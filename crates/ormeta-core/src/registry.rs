//! The mapping registry: the store every binder reads from and writes to.

use crate::{
    defaults::DocumentDefaults,
    error::MappingError,
    meta::MetaMap,
    model::{
        AuxiliaryDatabaseObject, Collection, Column, EntityMapping, FilterDefinition, NamedQuery,
        NamedSqlQuery, Property, ResultSetMapping, Table, TableId, TableKey, TypeDef, Value,
    },
    naming::{DefaultNamingStrategy, NamingStrategy},
    reflect::{NoReflection, PropertyTypeResolver},
    second_pass::SecondPass,
};
use indexmap::IndexMap;
use ormeta_tree::Document;
use std::{collections::VecDeque, sync::Arc};

///
/// PropertyReference
///
/// A property addressed through `property-ref`. Unique references turn the
/// property into an alternate unique key once every entity is bound.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyReference {
    pub entity: String,
    pub property: String,
    pub unique: bool,
}

///
/// PendingDocument
///
/// A document waiting in the extends queue for superclasses that are not
/// registered yet.
///

#[derive(Clone, Debug)]
pub struct PendingDocument {
    pub document: Document,
    pub metas: MetaMap,
    pub missing: Vec<String>,
}

///
/// Mappings
///
/// Process-scoped store of everything bound so far. Single writer; the
/// binder never holds on to references across calls, only names and
/// [`TableId`]s.
///

#[derive(Debug)]
pub struct Mappings {
    naming: Arc<dyn NamingStrategy>,
    reflection: Arc<dyn PropertyTypeResolver>,
    reject_conflicting_auto_imports: bool,

    entities: IndexMap<String, EntityMapping>,
    tables: IndexMap<TableKey, Table>,
    table_bindings: IndexMap<TableKey, String>,
    collections: IndexMap<String, Collection>,
    imports: IndexMap<String, String>,
    type_defs: IndexMap<String, TypeDef>,
    filter_defs: IndexMap<String, FilterDefinition>,
    queries: IndexMap<String, NamedQuery>,
    sql_queries: IndexMap<String, NamedSqlQuery>,
    result_sets: IndexMap<String, ResultSetMapping>,
    auxiliary: Vec<AuxiliaryDatabaseObject>,
    property_references: Vec<PropertyReference>,
    second_passes: VecDeque<SecondPass>,
    extends_queue: Vec<PendingDocument>,
    defaults: Arc<DocumentDefaults>,
}

impl Default for Mappings {
    fn default() -> Self {
        Self::new(Arc::new(DefaultNamingStrategy), Arc::new(NoReflection))
    }
}

impl Mappings {
    #[must_use]
    pub fn new(
        naming: Arc<dyn NamingStrategy>,
        reflection: Arc<dyn PropertyTypeResolver>,
    ) -> Self {
        Self {
            naming,
            reflection,
            reject_conflicting_auto_imports: true,
            entities: IndexMap::new(),
            tables: IndexMap::new(),
            table_bindings: IndexMap::new(),
            collections: IndexMap::new(),
            imports: IndexMap::new(),
            type_defs: IndexMap::new(),
            filter_defs: IndexMap::new(),
            queries: IndexMap::new(),
            sql_queries: IndexMap::new(),
            result_sets: IndexMap::new(),
            auxiliary: Vec::new(),
            property_references: Vec::new(),
            second_passes: VecDeque::new(),
            extends_queue: Vec::new(),
            defaults: Arc::new(DocumentDefaults::default()),
        }
    }

    #[must_use]
    pub const fn with_conflicting_auto_imports_rejected(mut self, reject: bool) -> Self {
        self.reject_conflicting_auto_imports = reject;
        self
    }

    #[must_use]
    pub fn naming_strategy(&self) -> &dyn NamingStrategy {
        self.naming.as_ref()
    }

    #[must_use]
    pub fn reflection(&self) -> &dyn PropertyTypeResolver {
        self.reflection.as_ref()
    }

    ///
    /// DEFAULTS
    ///

    /// Defaults of the document bound most recently.
    #[must_use]
    pub fn defaults(&self) -> &DocumentDefaults {
        &self.defaults
    }

    pub fn set_defaults(&mut self, defaults: Arc<DocumentDefaults>) {
        self.defaults = defaults;
    }

    ///
    /// ENTITIES
    ///

    pub fn add_entity(&mut self, entity: EntityMapping) -> Result<(), MappingError> {
        if self.entities.contains_key(&entity.entity_name) {
            return Err(MappingError::registry(format!(
                "Duplicate class/entity mapping {}",
                entity.entity_name
            )));
        }

        self.entities.insert(entity.entity_name.clone(), entity);

        Ok(())
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityMapping> {
        self.entities.get(name)
    }

    pub fn entity_mut(&mut self, name: &str) -> Option<&mut EntityMapping> {
        self.entities.get_mut(name)
    }

    #[must_use]
    pub fn has_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Entities in registration order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityMapping> {
        self.entities.values()
    }

    /// Entity name as registered, resolving import aliases.
    #[must_use]
    pub fn resolve_entity_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.entities.contains_key(name) {
            return Some(name);
        }

        self.imports
            .get(name)
            .map(String::as_str)
            .filter(|target| self.entities.contains_key(*target))
    }

    /// The entity followed by its superclasses, ending at the root.
    #[must_use]
    pub fn superclass_chain(&self, name: &str) -> Vec<&EntityMapping> {
        let mut chain = Vec::new();
        let mut current = self.entities.get(name);

        while let Some(entity) = current {
            // a hierarchy never revisits a name; guard against corrupt input
            if chain.len() > self.entities.len() {
                break;
            }
            chain.push(entity);
            current = entity.superclass().and_then(|s| self.entities.get(s));
        }

        chain
    }

    #[must_use]
    pub fn root_of(&self, name: &str) -> Option<&EntityMapping> {
        self.superclass_chain(name)
            .into_iter()
            .last()
            .filter(|e| e.is_root())
    }

    pub fn root_of_mut(&mut self, name: &str) -> Option<&mut EntityMapping> {
        let root = self.root_of(name)?.entity_name.clone();
        self.entities.get_mut(&root)
    }

    /// Identifier value of the hierarchy `name` belongs to.
    #[must_use]
    pub fn identifier_value(&self, name: &str) -> Option<&Value> {
        self.root_of(name)?.root()?.identifier_value()
    }

    /// True when a persister is set on the entity, any superclass, or as the
    /// root's hierarchy default.
    #[must_use]
    pub fn has_persister(&self, name: &str) -> bool {
        let chain = self.superclass_chain(name);
        chain.iter().any(|e| e.persister.is_some())
            || chain
                .last()
                .and_then(|root| root.root())
                .is_some_and(|r| r.default_persister.is_some())
    }

    /// Property reachable from `entity` by a possibly dotted path: the
    /// identifier property, declared and joined properties of the entity or
    /// its superclasses, then component sub-properties.
    #[must_use]
    pub fn referenced_property(&self, entity: &str, path: &str) -> Option<&Property> {
        let (head, rest) = split_path(path);

        let property = self.superclass_chain(entity).into_iter().find_map(|e| {
            e.property(head).or_else(|| {
                e.root()
                    .and_then(|r| r.identifier_property())
                    .filter(|p| p.name == head)
            })
        })?;

        match rest {
            None => Some(property),
            Some(rest) => component_property(property, rest),
        }
    }

    fn referenced_property_mut(&mut self, entity: &str, path: &str) -> Option<&mut Property> {
        let (head, rest) = split_path(path);

        let owner = self
            .superclass_chain(entity)
            .into_iter()
            .find(|e| {
                e.property(head).is_some()
                    || e.root()
                        .and_then(|r| r.identifier_property())
                        .is_some_and(|p| p.name == head)
            })?
            .entity_name
            .clone();

        let entity = self.entities.get_mut(&owner)?;
        let in_properties = entity.property(head).is_some();
        let property = if in_properties {
            entity.property_mut(head)?
        } else {
            match entity.root_mut()?.identifier.as_mut()? {
                crate::model::IdentifierBinding::Named(p) => p,
                crate::model::IdentifierBinding::Unnamed(_) => return None,
            }
        };

        match rest {
            None => Some(property),
            Some(rest) => component_property_mut(property, rest),
        }
    }

    ///
    /// TABLES
    ///

    /// Get or create a table. A subselect-backed table is keyed by its
    /// subselect text. Re-adding a table as concrete clears its abstract flag.
    pub fn add_table(
        &mut self,
        schema: Option<&str>,
        catalog: Option<&str>,
        name: &str,
        subselect: Option<&str>,
        is_abstract: bool,
    ) -> TableId {
        let key = match subselect {
            Some(sql) => TableKey::new(None, None, sql),
            None => TableKey::new(schema, catalog, name),
        };

        if let Some((index, _, table)) = self.tables.get_full_mut(&key) {
            if !is_abstract {
                table.is_abstract = false;
            }
            return TableId(index);
        }

        let table = Table::new(key.clone(), subselect.map(str::to_string), is_abstract);
        let (index, _) = self.tables.insert_full(key, table);

        TableId(index)
    }

    /// Create a table repeating the columns of `parent`.
    pub fn add_denormalized_table(
        &mut self,
        schema: Option<&str>,
        catalog: Option<&str>,
        name: &str,
        subselect: Option<&str>,
        is_abstract: bool,
        parent: TableId,
    ) -> Result<TableId, MappingError> {
        let key = match subselect {
            Some(sql) => TableKey::new(None, None, sql),
            None => TableKey::new(schema, catalog, name),
        };

        if self.tables.contains_key(&key) {
            return Err(MappingError::registry(format!(
                "Duplicate table mapping {name}"
            )));
        }

        let mut table = Table::new(key.clone(), subselect.map(str::to_string), is_abstract);
        table.denormalized_parent = Some(parent);
        let (index, _) = self.tables.insert_full(key, table);

        Ok(TableId(index))
    }

    #[must_use]
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get_index(id.0).map(|(_, t)| t)
    }

    pub fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.get_index_mut(id.0).map(|(_, t)| t)
    }

    #[must_use]
    pub fn find_table(&self, key: &TableKey) -> Option<TableId> {
        self.tables.get_index_of(key).map(TableId)
    }

    pub fn tables(&self) -> impl Iterator<Item = (TableId, &Table)> {
        self.tables.values().enumerate().map(|(i, t)| (TableId(i), t))
    }

    /// Name of a table, or empty when the id is unknown.
    #[must_use]
    pub fn table_name(&self, id: TableId) -> &str {
        self.table(id).map_or("", Table::name)
    }

    /// Own columns, preceded by the inherited ones for denormalized tables.
    #[must_use]
    pub fn all_columns(&self, id: TableId) -> Vec<&Column> {
        let Some(table) = self.table(id) else {
            return Vec::new();
        };

        let mut columns = table
            .denormalized_parent
            .filter(|parent| *parent != id)
            .map(|parent| self.all_columns(parent))
            .unwrap_or_default();
        columns.extend(table.columns.values());

        columns
    }

    /// Record the physical name a logical table name resolved to.
    pub fn add_table_binding(
        &mut self,
        schema: Option<&str>,
        catalog: Option<&str>,
        logical: &str,
        physical: &str,
    ) {
        self.table_bindings
            .insert(TableKey::new(schema, catalog, logical), physical.to_string());
    }

    #[must_use]
    pub fn physical_table_name(&self, logical: &TableKey) -> Option<&str> {
        self.table_bindings.get(logical).map(String::as_str)
    }

    ///
    /// DEFINITIONS
    ///

    pub fn add_type_def(&mut self, type_def: TypeDef) {
        tracing::debug!(name = %type_def.name, class = %type_def.type_class, "added type definition");
        self.type_defs.insert(type_def.name.clone(), type_def);
    }

    #[must_use]
    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.type_defs.get(name)
    }

    pub fn add_filter_definition(&mut self, definition: FilterDefinition) {
        self.filter_defs.insert(definition.name.clone(), definition);
    }

    #[must_use]
    pub fn filter_definition(&self, name: &str) -> Option<&FilterDefinition> {
        self.filter_defs.get(name)
    }

    ///
    /// QUERIES
    ///

    fn check_query_name(&self, name: &str) -> Result<(), MappingError> {
        if self.queries.contains_key(name) || self.sql_queries.contains_key(name) {
            return Err(MappingError::registry(format!(
                "Duplicate query mapping {name}"
            )));
        }

        Ok(())
    }

    pub fn add_query(&mut self, query: NamedQuery) -> Result<(), MappingError> {
        self.check_query_name(&query.name)?;
        self.queries.insert(query.name.clone(), query);

        Ok(())
    }

    #[must_use]
    pub fn query(&self, name: &str) -> Option<&NamedQuery> {
        self.queries.get(name)
    }

    pub fn queries(&self) -> impl Iterator<Item = &NamedQuery> {
        self.queries.values()
    }

    pub fn add_sql_query(&mut self, query: NamedSqlQuery) -> Result<(), MappingError> {
        self.check_query_name(&query.name)?;
        self.sql_queries.insert(query.name.clone(), query);

        Ok(())
    }

    #[must_use]
    pub fn sql_query(&self, name: &str) -> Option<&NamedSqlQuery> {
        self.sql_queries.get(name)
    }

    pub fn add_result_set_mapping(&mut self, mapping: ResultSetMapping) -> Result<(), MappingError> {
        if self.result_sets.contains_key(&mapping.name) {
            return Err(MappingError::registry(format!(
                "Duplicate resultset mapping {}",
                mapping.name
            )));
        }
        self.result_sets.insert(mapping.name.clone(), mapping);

        Ok(())
    }

    #[must_use]
    pub fn result_set_mapping(&self, name: &str) -> Option<&ResultSetMapping> {
        self.result_sets.get(name)
    }

    ///
    /// IMPORTS
    ///

    /// Register an explicit alias. Re-registering the same target is a
    /// no-op; a different target is an error.
    pub fn add_import(&mut self, target: &str, alias: &str) -> Result<(), MappingError> {
        self.insert_import(target, alias, true)
    }

    /// Register an alias implied by auto-import. Conflicts are rejected
    /// unless the registry was built to let the latest alias win.
    pub fn add_auto_import(&mut self, target: &str, alias: &str) -> Result<(), MappingError> {
        self.insert_import(target, alias, self.reject_conflicting_auto_imports)
    }

    fn insert_import(&mut self, target: &str, alias: &str, reject: bool) -> Result<(), MappingError> {
        match self.imports.get(alias) {
            Some(existing) if existing == target => {
                tracing::debug!(alias, target, "duplicate import");
                Ok(())
            }
            Some(existing) if reject => Err(MappingError::registry(format!(
                "duplicate import: {alias} refers to both {target} and {existing} (try using auto-import=\"false\")"
            ))),
            _ => {
                tracing::debug!(alias, target, "import");
                self.imports.insert(alias.to_string(), target.to_string());
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn import(&self, alias: &str) -> Option<&str> {
        self.imports.get(alias).map(String::as_str)
    }

    pub fn add_auxiliary_database_object(&mut self, object: AuxiliaryDatabaseObject) {
        self.auxiliary.push(object);
    }

    #[must_use]
    pub fn auxiliary_database_objects(&self) -> &[AuxiliaryDatabaseObject] {
        &self.auxiliary
    }

    ///
    /// COLLECTIONS
    ///

    pub fn add_collection(&mut self, collection: Collection) -> Result<(), MappingError> {
        if self.collections.contains_key(&collection.role) {
            return Err(MappingError::registry(format!(
                "Duplicate collection role mapping {}",
                collection.role
            )));
        }
        self.collections.insert(collection.role.clone(), collection);

        Ok(())
    }

    #[must_use]
    pub fn collection(&self, role: &str) -> Option<&Collection> {
        self.collections.get(role)
    }

    pub fn collection_mut(&mut self, role: &str) -> Option<&mut Collection> {
        self.collections.get_mut(role)
    }

    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    ///
    /// PROPERTY REFERENCES
    ///

    pub fn add_property_reference(&mut self, entity: &str, property: &str) {
        self.property_references.push(PropertyReference {
            entity: entity.to_string(),
            property: property.to_string(),
            unique: false,
        });
    }

    pub fn add_unique_property_reference(&mut self, entity: &str, property: &str) {
        self.property_references.push(PropertyReference {
            entity: entity.to_string(),
            property: property.to_string(),
            unique: true,
        });
    }

    #[must_use]
    pub fn property_references(&self) -> &[PropertyReference] {
        &self.property_references
    }

    // apply_property_references
    // every reference must resolve; unique ones become alternate keys
    pub(crate) fn apply_property_references(&mut self) -> Result<(), MappingError> {
        let references = self.property_references.clone();

        for reference in references {
            let Some(entity) = self.resolve_entity_name(&reference.entity).map(str::to_string)
            else {
                return Err(MappingError::second_pass(format!(
                    "property-ref to unmapped class: {}",
                    reference.entity
                )));
            };

            let Some(property) = self.referenced_property_mut(&entity, &reference.property) else {
                return Err(MappingError::second_pass(format!(
                    "property-ref not found: {} on {entity}",
                    reference.property
                )));
            };

            if reference.unique
                && let Some(simple) = property.value.simple_mut()
            {
                simple.alternate_unique_key = true;
            }
        }

        Ok(())
    }

    ///
    /// SECOND PASSES
    ///

    pub fn add_second_pass(&mut self, pass: SecondPass) {
        tracing::trace!(pass = %pass, "queued second pass");
        self.second_passes.push_back(pass);
    }

    /// Take the oldest queued pass.
    pub fn next_second_pass(&mut self) -> Option<SecondPass> {
        self.second_passes.pop_front()
    }

    #[must_use]
    pub fn pending_second_passes(&self) -> usize {
        self.second_passes.len()
    }

    ///
    /// EXTENDS QUEUE
    ///

    pub fn enqueue_extends(&mut self, pending: PendingDocument) {
        tracing::debug!(
            document = pending.document.describe(),
            missing = ?pending.missing,
            "deferred document until superclasses are mapped"
        );
        self.extends_queue.push(pending);
    }

    /// Remove and return the queued documents whose missing superclasses are
    /// all registered now.
    pub fn take_ready_extends(&mut self) -> Vec<PendingDocument> {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.extends_queue)
            .into_iter()
            .partition(|p| p.missing.iter().all(|name| self.entities.contains_key(name)));
        self.extends_queue = waiting;

        ready
    }

    /// Superclass names queued documents are still waiting for.
    #[must_use]
    pub fn extends_queue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .extends_queue
            .iter()
            .flat_map(|p| p.missing.iter())
            .filter(|name| !self.entities.contains_key(*name))
            .cloned()
            .collect();
        names.sort();
        names.dedup();

        names
    }

    #[must_use]
    pub fn is_extends_queue_empty(&self) -> bool {
        self.extends_queue.is_empty()
    }
}

// split_path
fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

fn component_property<'a>(property: &'a Property, path: &str) -> Option<&'a Property> {
    let (head, rest) = split_path(path);
    let inner = property.value.as_component()?.property(head)?;

    match rest {
        None => Some(inner),
        Some(rest) => component_property(inner, rest),
    }
}

fn component_property_mut<'a>(property: &'a mut Property, path: &str) -> Option<&'a mut Property> {
    let (head, rest) = split_path(path);
    let Value::Component(component) = &mut property.value else {
        return None;
    };
    let inner = component.properties.iter_mut().find(|p| p.name == head)?;

    match rest {
        None => Some(inner),
        Some(rest) => component_property_mut(inner, rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKind, RootData};

    fn root_entity(mappings: &mut Mappings, name: &str) -> TableId {
        let table = mappings.add_table(None, None, name, None, false);
        let entity = EntityMapping::new(name, EntityKind::Root(Box::default()), table);
        mappings.add_entity(entity).unwrap();

        table
    }

    #[test]
    fn tables_are_identified_by_key() {
        let mut m = Mappings::default();
        let a = m.add_table(Some("zoo"), None, "CATS", None, true);
        let b = m.add_table(Some("zoo"), None, "CATS", None, false);
        let c = m.add_table(None, None, "CATS", None, false);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!m.table(a).unwrap().is_abstract);
        assert_eq!(m.find_table(&TableKey::new(Some("zoo"), None, "CATS")), Some(a));
    }

    #[test]
    fn abstract_flag_survives_only_abstract_re_adds() {
        let mut m = Mappings::default();
        let a = m.add_table(None, None, "BASE", None, true);
        m.add_table(None, None, "BASE", None, true);

        assert!(m.table(a).unwrap().is_abstract);
    }

    #[test]
    fn denormalized_tables_include_parent_columns() {
        let mut m = Mappings::default();
        let parent = m.add_table(None, None, "ANIMAL", None, false);
        m.table_mut(parent).unwrap().add_column(Column::new("id"));

        let child = m
            .add_denormalized_table(None, None, "DOG", None, false, parent)
            .unwrap();
        m.table_mut(child).unwrap().add_column(Column::new("bark"));

        let names: Vec<_> = m.all_columns(child).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "bark"]);

        let err = m
            .add_denormalized_table(None, None, "DOG", None, false, parent)
            .unwrap_err();
        assert_eq!(err.message, "Duplicate table mapping DOG");
    }

    #[test]
    fn duplicate_entities_are_rejected() {
        let mut m = Mappings::default();
        root_entity(&mut m, "Cat");

        let table = m.add_table(None, None, "Cat", None, false);
        let err = m
            .add_entity(EntityMapping::new(
                "Cat",
                EntityKind::Root(Box::new(RootData::default())),
                table,
            ))
            .unwrap_err();

        assert_eq!(err.message, "Duplicate class/entity mapping Cat");
    }

    #[test]
    fn imports_accept_repeats_and_reject_conflicts() {
        let mut m = Mappings::default();
        m.add_import("org.zoo.Cat", "Cat").unwrap();
        m.add_import("org.zoo.Cat", "Cat").unwrap();

        let err = m.add_auto_import("org.farm.Cat", "Cat").unwrap_err();
        assert!(err.message.starts_with("duplicate import: Cat refers to both"));
        assert_eq!(m.import("Cat"), Some("org.zoo.Cat"));

        let mut lenient = Mappings::default().with_conflicting_auto_imports_rejected(false);
        lenient.add_auto_import("org.zoo.Cat", "Cat").unwrap();
        lenient.add_auto_import("org.farm.Cat", "Cat").unwrap();
        assert_eq!(lenient.import("Cat"), Some("org.farm.Cat"));
    }

    #[test]
    fn queries_share_one_namespace() {
        let mut m = Mappings::default();
        m.add_query(NamedQuery {
            name: "cats".into(),
            query: "from Cat".into(),
            settings: crate::model::QuerySettings::default(),
        })
        .unwrap();

        let err = m
            .add_sql_query(NamedSqlQuery {
                name: "cats".into(),
                query: "select * from CATS".into(),
                settings: crate::model::QuerySettings::default(),
                results: crate::model::SqlQueryResults::Ref("cats".into()),
                synchronized_tables: Vec::new(),
                callable: false,
            })
            .unwrap_err();

        assert_eq!(err.message, "Duplicate query mapping cats");
    }

    #[test]
    fn resolve_entity_name_follows_imports() {
        let mut m = Mappings::default();
        root_entity(&mut m, "org.zoo.Cat");
        m.add_import("org.zoo.Cat", "Cat").unwrap();
        m.add_import("org.zoo.Ghost", "Ghost").unwrap();

        assert_eq!(m.resolve_entity_name("Cat"), Some("org.zoo.Cat"));
        assert_eq!(m.resolve_entity_name("org.zoo.Cat"), Some("org.zoo.Cat"));
        assert_eq!(m.resolve_entity_name("Ghost"), None);
    }

    #[test]
    fn unresolved_property_reference_fails() {
        let mut m = Mappings::default();
        root_entity(&mut m, "Cat");
        m.add_unique_property_reference("Cat", "serial");

        let err = m.apply_property_references().unwrap_err();
        assert_eq!(err.message, "property-ref not found: serial on Cat");

        let mut m = Mappings::default();
        m.add_property_reference("Dog", "serial");
        let err = m.apply_property_references().unwrap_err();
        assert_eq!(err.message, "property-ref to unmapped class: Dog");
    }
}
