use crate::{
    bind::{
        Owner, Scope, Tag, attr_is, attr_u32, cache_settings,
        collection::bind_collection,
        component::{ComponentSite, bind_component},
        custom_sql,
        filter::parse_filter,
        identifier::{bind_composite_id, bind_discriminator, bind_simple_id, bind_version},
        property::create_property,
        qualify,
        query::{bind_named_query, bind_named_sql_query, bind_result_set},
        subselect_of, synchronized_tables, tuplizers,
        value::{
            bind_any, bind_many_to_one, bind_one_to_one, bind_simple_value,
            create_foreign_key_of_entity,
        },
    },
    error::MappingError,
    meta::get_metas,
    model::{
        AnyValue, Component, DependantValue, EntityKind, EntityMapping, ForeignKeyDirection, Join,
        ManyToOne, OneToOne, OptimisticLock, PersisterStrategy, SimpleValue, TableId, ToOne, Value,
    },
    naming::unqualify,
    registry::Mappings,
};
use ormeta_tree::Element;

const NATURAL_ID_KEY: &str = "_UniqueKey";

///
/// PropertyWalk
///
/// Settings applied to every property of one walk over a class body. A
/// natural-id group walks its children with its own settings.
///

#[derive(Clone, Copy, Debug)]
struct PropertyWalk {
    mutable: bool,
    nullable: bool,
    natural_id: bool,
}

impl Default for PropertyWalk {
    fn default() -> Self {
        Self {
            mutable: true,
            nullable: true,
            natural_id: false,
        }
    }
}

// bind_root_class
// header, table and identifier first; the entity is registered before its
// properties so nested subclasses and joins can find it
pub(crate) fn bind_root_class(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
) -> Result<(), MappingError> {
    let entity_name = entity_name_of(scope, node)?;
    let schema = scope.schema_of(node);
    let catalog = scope.catalog_of(node);

    let table_name = class_table_name(mappings, &entity_name, node, schema, catalog);
    let subselect = subselect_of(node);
    let table = mappings.add_table(
        schema,
        catalog,
        &table_name,
        subselect.as_deref(),
        abstract_flag(node).unwrap_or(false),
    );
    bind_comment(mappings, table, node);

    let mut entity = EntityMapping::new(&entity_name, EntityKind::Root(Box::default()), table);
    bind_class(mappings, scope, node, &mut entity)?;

    tracing::info!(entity = %entity_name, table = mappings.table_name(table), "mapping class");

    if let Some(t) = mappings.table_mut(table) {
        if let Some(check) = node.attribute("check") {
            t.add_check(check);
        }
        if let Some(row_id) = node.attribute("rowid") {
            t.row_id = Some(row_id.to_string());
        }
    }

    if let Some(root) = entity.root_mut() {
        root.mutable = !node.attribute("mutable").is_some_and(|m| m != "true");
        root.where_clause = node.attribute("where").map(str::to_string);
        root.explicit_polymorphism = attr_is(node, "polymorphism", "explicit");
    }

    let inner = scope.descend(node);
    for child in node.children() {
        match Tag::of(child) {
            Some(Tag::Identifier) => bind_simple_id(mappings, &inner, child, &mut entity)?,
            Some(Tag::CompositeId) => bind_composite_id(mappings, &inner, child, &mut entity)?,
            Some(Tag::Version | Tag::Timestamp) => {
                bind_version(mappings, &inner, child, &mut entity)?;
            }
            Some(Tag::Discriminator) => bind_discriminator(mappings, child, &mut entity)?,
            Some(Tag::Cache) => {
                let cache = cache_settings(child)?;
                if let Some(root) = entity.root_mut() {
                    root.cache = Some(cache);
                }
            }
            _ => {}
        }
    }

    let key_columns = entity
        .root()
        .and_then(|r| r.identifier_value())
        .map(Value::column_names)
        .unwrap_or_default();
    if !key_columns.is_empty()
        && let Some(t) = mappings.table_mut(table)
    {
        t.set_primary_key(key_columns);
    }

    mappings.add_entity(entity)?;

    create_class_properties(mappings, &inner, node, &entity_name, PropertyWalk::default())?;

    Ok(())
}

// bind_subclass
// shares the superclass table; the hierarchy defaults to a single-table
// persister
pub(crate) fn bind_subclass(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    superclass: &str,
) -> Result<(), MappingError> {
    let table = superclass_table(mappings, superclass)?;
    let entity_name = entity_name_of(scope, node)?;

    let kind = EntityKind::Subclass {
        superclass: superclass.to_string(),
    };
    let mut entity = EntityMapping::new(&entity_name, kind, table);
    bind_class(mappings, scope, node, &mut entity)?;
    register_subclass(mappings, entity, PersisterStrategy::SingleTable)?;

    tracing::info!(entity = %entity_name, table = mappings.table_name(table), "mapping subclass");

    create_class_properties(
        mappings,
        &scope.descend(node),
        node,
        &entity_name,
        PropertyWalk::default(),
    )?;

    Ok(())
}

// bind_joined_subclass
// own table keyed by the superclass identifier; the key is the primary key
// and a foreign key to the superclass
pub(crate) fn bind_joined_subclass(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    superclass: &str,
) -> Result<(), MappingError> {
    let entity_name = entity_name_of(scope, node)?;
    let schema = scope.schema_of(node);
    let catalog = scope.catalog_of(node);

    let table_name = class_table_name(mappings, &entity_name, node, schema, catalog);
    let subselect = subselect_of(node);
    let table = mappings.add_table(schema, catalog, &table_name, subselect.as_deref(), false);
    bind_comment(mappings, table, node);

    tracing::info!(entity = %entity_name, table = mappings.table_name(table), "mapping joined-subclass");

    let key_node = node.child("key").ok_or_else(|| {
        MappingError::entity(format!("<joined-subclass> must declare a key: {entity_name}"))
    })?;
    let key = bind_dependant_key(mappings, key_node, table, superclass, &entity_name)?;

    if let Some(check) = node.attribute("check")
        && let Some(t) = mappings.table_mut(table)
    {
        t.add_check(check);
    }

    let kind = EntityKind::JoinedSubclass {
        superclass: superclass.to_string(),
        key: Box::new(key),
    };
    let mut entity = EntityMapping::new(&entity_name, kind, table);
    bind_class(mappings, scope, node, &mut entity)?;
    register_subclass(mappings, entity, PersisterStrategy::JoinedSubclass)?;

    create_class_properties(
        mappings,
        &scope.descend(node),
        node,
        &entity_name,
        PropertyWalk::default(),
    )?;

    Ok(())
}

// bind_union_subclass
// own table repeating the superclass columns
pub(crate) fn bind_union_subclass(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    superclass: &str,
) -> Result<(), MappingError> {
    let parent_table = superclass_table(mappings, superclass)?;
    let entity_name = entity_name_of(scope, node)?;
    let schema = scope.schema_of(node);
    let catalog = scope.catalog_of(node);

    let table_name = class_table_name(mappings, &entity_name, node, schema, catalog);
    let subselect = subselect_of(node);
    let table = mappings.add_denormalized_table(
        schema,
        catalog,
        &table_name,
        subselect.as_deref(),
        abstract_flag(node).unwrap_or(false),
        parent_table,
    )?;

    let kind = EntityKind::UnionSubclass {
        superclass: superclass.to_string(),
    };
    let mut entity = EntityMapping::new(&entity_name, kind, table);
    bind_class(mappings, scope, node, &mut entity)?;
    register_subclass(mappings, entity, PersisterStrategy::UnionSubclass)?;

    tracing::info!(entity = %entity_name, table = mappings.table_name(table), "mapping union-subclass");

    create_class_properties(
        mappings,
        &scope.descend(node),
        node,
        &entity_name,
        PropertyWalk::default(),
    )?;

    Ok(())
}

// bind_class
// settings every entity variant shares
fn bind_class(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    entity: &mut EntityMapping,
) -> Result<(), MappingError> {
    entity.lazy = node
        .attribute("lazy")
        .map_or(scope.defaults.default_lazy, |lazy| lazy == "true");

    entity.class_name = scope.class_attribute(node, "name");
    match scope.class_attribute(node, "proxy") {
        Some(proxy) => {
            entity.proxy_interface = Some(proxy);
            entity.lazy = true;
        }
        None if entity.lazy => entity.proxy_interface.clone_from(&entity.class_name),
        None => {}
    }

    entity.node_name = node
        .attribute("node")
        .unwrap_or_else(|| unqualify(&entity.entity_name))
        .to_string();
    entity.tuplizers = tuplizers(node);

    if let Some(value) = node.attribute("discriminator-value") {
        entity.discriminator_value = value.to_string();
    }
    entity.dynamic_update = attr_is(node, "dynamic-update", "true");
    entity.dynamic_insert = attr_is(node, "dynamic-insert", "true");

    let name = entity.entity_name.as_str();
    mappings.add_import(name, name)?;
    if scope.defaults.auto_import && name.contains('.') {
        mappings.add_auto_import(name, unqualify(name))?;
    }

    entity.batch_size = attr_u32(node, "batch-size")?;
    if let Some(select) = node.attribute("select-before-update") {
        entity.select_before_update = select == "true";
    }
    if let Some(mode) = node.attribute("optimistic-lock") {
        entity.optimistic_lock = OptimisticLock::parse(mode).ok_or_else(|| {
            MappingError::entity(format!("Unsupported optimistic-lock style: {mode}"))
        })?;
    }

    entity.metas = get_metas(node, &scope.metas, false);
    entity.persister = scope.class_attribute(node, "persister");

    entity.custom_sql.insert = custom_sql(node, "sql-insert");
    entity.custom_sql.update = custom_sql(node, "sql-update");
    entity.custom_sql.delete = custom_sql(node, "sql-delete");
    entity.loader_query = node
        .child("loader")
        .and_then(|l| l.attribute("query-ref"))
        .map(str::to_string);
    entity.synchronized_tables = synchronized_tables(node);
    entity.is_abstract = abstract_flag(node);

    Ok(())
}

// create_class_properties
// one walk over a class body; returns the columns of the properties it
// added, which a natural-id group turns into its unique key
fn create_class_properties(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    entity_name: &str,
    walk: PropertyWalk,
) -> Result<Vec<String>, MappingError> {
    let owner = Owner::of(mappings, entity_name)?;
    let mut columns = Vec::new();

    for child in node.children() {
        let Some(tag) = Tag::of(child) else {
            continue;
        };
        let name = child.attribute("name").unwrap_or_default();

        let value = if let Some(kind) = tag.collection_kind() {
            let role = qualify(entity_name, name);
            bind_collection(mappings, scope, child, kind, &role, &owner)?
        } else {
            match tag {
                Tag::ManyToOne => {
                    let mut value = ManyToOne {
                        base: SimpleValue::new(Some(owner.table)),
                        ..ManyToOne::default()
                    };
                    bind_many_to_one(mappings, scope, child, &mut value, name, walk.nullable)?;
                    Value::ManyToOne(value)
                }
                Tag::Any => {
                    let mut value = AnyValue {
                        base: SimpleValue::new(Some(owner.table)),
                        ..AnyValue::default()
                    };
                    bind_any(mappings, scope, child, &mut value, walk.nullable)?;
                    Value::Any(value)
                }
                Tag::OneToOne => {
                    let mut value = OneToOne {
                        base: SimpleValue::new(Some(owner.table)),
                        to_one: ToOne::default(),
                        constrained: false,
                        foreign_key_direction: ForeignKeyDirection::ToParent,
                        property_name: String::new(),
                        owner_entity: entity_name.to_string(),
                    };
                    bind_one_to_one(mappings, scope, child, &mut value, name, true)?;
                    Value::OneToOne(value)
                }
                Tag::Property => {
                    let mut value = SimpleValue::new(Some(owner.table));
                    bind_simple_value(mappings, child, &mut value, walk.nullable, name)?;
                    Value::Simple(value)
                }
                Tag::Component | Tag::DynamicComponent | Tag::Properties => {
                    let path = qualify(entity_name, name);
                    let mut component = Component::new(Some(owner.table), entity_name, &path);
                    let site = ComponentSite {
                        owner: &owner,
                        owner_class: owner.class_name.as_deref(),
                        parent_property: Some(name),
                        path: &path,
                        nullable: true,
                        embedded: tag == Tag::Properties,
                        id_mapper: false,
                    };
                    bind_component(mappings, scope, child, &mut component, &site)?;
                    Value::Component(component)
                }
                Tag::Join => {
                    let join = bind_join(mappings, scope, child, &owner)?;
                    entity_of(mappings, entity_name)?.joins.push(join);
                    continue;
                }
                Tag::Subclass => {
                    bind_subclass(mappings, scope, child, entity_name)?;
                    continue;
                }
                Tag::JoinedSubclass => {
                    bind_joined_subclass(mappings, scope, child, entity_name)?;
                    continue;
                }
                Tag::UnionSubclass => {
                    bind_union_subclass(mappings, scope, child, entity_name)?;
                    continue;
                }
                Tag::Filter => {
                    let filter = parse_filter(mappings, child)?;
                    entity_of(mappings, entity_name)?.filters.push(filter);
                    continue;
                }
                Tag::NaturalId => {
                    let natural = PropertyWalk {
                        mutable: attr_is(child, "mutable", "true"),
                        nullable: false,
                        natural_id: true,
                    };
                    let key_columns =
                        create_class_properties(mappings, scope, child, entity_name, natural)?;
                    if let Some(table) = mappings.table_mut(owner.table) {
                        let key = table.unique_key_mut(NATURAL_ID_KEY);
                        for column in &key_columns {
                            key.add_column(column);
                        }
                    }
                    continue;
                }
                Tag::Query => {
                    bind_named_query(mappings, child, Some(entity_name))?;
                    continue;
                }
                Tag::SqlQuery => {
                    bind_named_sql_query(mappings, scope, child, Some(entity_name))?;
                    continue;
                }
                Tag::ResultSet => {
                    bind_result_set(mappings, scope, child, Some(entity_name))?;
                    continue;
                }
                _ => continue,
            }
        };

        let mut property = create_property(
            mappings,
            scope,
            child,
            value,
            owner.class_name.as_deref(),
            entity_name,
        )?;
        if !walk.mutable {
            property.updatable = false;
        }
        if walk.natural_id {
            property.natural_identifier = true;
        }
        columns.extend(property.value.column_names());

        entity_of(mappings, entity_name)?.add_property(property);
    }

    Ok(columns)
}

// bind_join
// secondary table keyed by the owner's identifier
fn bind_join(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    owner: &Owner,
) -> Result<Join, MappingError> {
    let entity_name = owner.entity_name.as_str();
    let schema = scope.schema_of(node);
    let catalog = scope.catalog_of(node);

    let table_name = class_table_name(mappings, entity_name, node, schema, catalog);
    let subselect = subselect_of(node);
    let table = mappings.add_table(schema, catalog, &table_name, subselect.as_deref(), false);
    bind_comment(mappings, table, node);

    let mut join = Join::new(table);
    if let Some(fetch) = node.attribute("fetch") {
        join.sequential_select = fetch == "select";
    }
    if let Some(inverse) = node.attribute("inverse") {
        join.inverse = inverse == "true";
    }
    if let Some(optional) = node.attribute("optional") {
        join.optional = optional == "true";
    }

    tracing::info!(entity = entity_name, table = mappings.table_name(table), "mapping class join");

    let key_node = node.child("key").ok_or_else(|| {
        MappingError::entity(format!("<join> must declare a key: {entity_name}"))
    })?;
    join.key = Some(bind_dependant_key(mappings, key_node, table, entity_name, entity_name)?);

    for child in node.children() {
        let name = child.attribute("name").unwrap_or_default();
        let value = match Tag::of(child) {
            Some(Tag::ManyToOne) => {
                let mut value = ManyToOne {
                    base: SimpleValue::new(Some(table)),
                    ..ManyToOne::default()
                };
                bind_many_to_one(mappings, scope, child, &mut value, name, true)?;
                Value::ManyToOne(value)
            }
            Some(Tag::Any) => {
                let mut value = AnyValue {
                    base: SimpleValue::new(Some(table)),
                    ..AnyValue::default()
                };
                bind_any(mappings, scope, child, &mut value, true)?;
                Value::Any(value)
            }
            Some(Tag::Property) => {
                let mut value = SimpleValue::new(Some(table));
                bind_simple_value(mappings, child, &mut value, true, name)?;
                Value::Simple(value)
            }
            Some(Tag::Component | Tag::DynamicComponent) => {
                let path = qualify(entity_name, name);
                let mut component = Component::new(Some(table), entity_name, &path);
                let site = ComponentSite {
                    owner,
                    owner_class: owner.class_name.as_deref(),
                    parent_property: Some(name),
                    path: &path,
                    nullable: true,
                    embedded: false,
                    id_mapper: false,
                };
                bind_component(mappings, scope, child, &mut component, &site)?;
                Value::Component(component)
            }
            _ => continue,
        };

        let mut property = create_property(
            mappings,
            scope,
            child,
            value,
            owner.class_name.as_deref(),
            entity_name,
        )?;
        property.optional = join.optional;
        join.properties.push(property);
    }

    join.custom_sql.insert = custom_sql(node, "sql-insert");
    join.custom_sql.update = custom_sql(node, "sql-update");
    join.custom_sql.delete = custom_sql(node, "sql-delete");

    Ok(join)
}

// bind_dependant_key
// key column(s) of a joined-subclass or join table, wrapping the identifier
// of `referenced`: the table's primary key and a foreign key to it
fn bind_dependant_key(
    mappings: &mut Mappings,
    node: &Element,
    table: TableId,
    referenced: &str,
    path: &str,
) -> Result<Value, MappingError> {
    let identifier = mappings.identifier_value(referenced).cloned().ok_or_else(|| {
        MappingError::entity(format!("Could not find identifier of {referenced}"))
    })?;

    let mut base = SimpleValue::new(Some(table));
    base.cascade_delete = attr_is(node, "on-delete", "cascade");
    bind_simple_value(mappings, node, &mut base, false, path)?;

    let columns: Vec<String> = base.columns().map(|c| c.name.clone()).collect();
    if let Some(t) = mappings.table_mut(table) {
        t.set_primary_key(columns);
    }
    create_foreign_key_of_entity(mappings, &base, referenced);

    Ok(Value::Dependant(DependantValue {
        base,
        wrapped: Box::new(identifier),
        nullable: false,
        updatable: true,
    }))
}

// register_subclass
// links the subclass to its superclass and picks the hierarchy's default
// persister unless one is set already
fn register_subclass(
    mappings: &mut Mappings,
    entity: EntityMapping,
    strategy: PersisterStrategy,
) -> Result<(), MappingError> {
    let name = entity.entity_name.clone();
    let superclass = entity.superclass().unwrap_or_default().to_string();

    mappings.add_entity(entity)?;
    entity_of(mappings, &superclass)?.subclasses.push(name.clone());

    if !mappings.has_persister(&name)
        && let Some(root) = mappings.root_of_mut(&name).and_then(EntityMapping::root_mut)
    {
        root.default_persister = Some(strategy);
    }

    Ok(())
}

// entity_name_of
// explicit entity-name, else the package-qualified class name
fn entity_name_of(scope: &Scope, node: &Element) -> Result<String, MappingError> {
    node.attribute("entity-name")
        .map(str::to_string)
        .or_else(|| scope.class_attribute(node, "name"))
        .ok_or_else(|| MappingError::entity("Unable to determine entity name"))
}

// class_table_name
// records the logical to physical binding on the way
fn class_table_name(
    mappings: &mut Mappings,
    entity_name: &str,
    node: &Element,
    schema: Option<&str>,
    catalog: Option<&str>,
) -> String {
    let (logical, physical) = match node.attribute("table") {
        Some(table) => (table.to_string(), mappings.naming_strategy().table_name(table)),
        None => (
            unqualify(entity_name).to_string(),
            mappings.naming_strategy().class_to_table_name(entity_name),
        ),
    };
    mappings.add_table_binding(schema, catalog, &logical, &physical);

    physical
}

fn bind_comment(mappings: &mut Mappings, table: TableId, node: &Element) {
    if let Some(comment) = node.child("comment")
        && let Some(t) = mappings.table_mut(table)
    {
        t.comment = Some(comment.text_trim().to_string());
    }
}

/// `abstract` as a tri-state: anything but "true"/"false" is unspecified.
fn abstract_flag(node: &Element) -> Option<bool> {
    match node.attribute("abstract") {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

fn superclass_table(mappings: &Mappings, superclass: &str) -> Result<TableId, MappingError> {
    mappings
        .entity(superclass)
        .map(|e| e.table)
        .ok_or_else(|| MappingError::entity(format!("Cannot extend unmapped class {superclass}")))
}

fn entity_of<'a>(
    mappings: &'a mut Mappings,
    entity_name: &str,
) -> Result<&'a mut EntityMapping, MappingError> {
    mappings
        .entity_mut(entity_name)
        .ok_or_else(|| MappingError::entity(format!("Unknown entity: {entity_name}")))
}
