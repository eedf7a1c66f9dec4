use crate::{
    bind::{
        Owner, Scope, Tag, attr_default_true, attr_i32, attr_is, attr_u32, cache_settings,
        component::{ComponentSite, bind_component},
        custom_sql,
        filter::parse_filter,
        identifier::make_identifier,
        qualify, subselect_of, synchronized_tables,
        value::{
            bind_any, bind_many_to_one, bind_one_to_many, bind_simple_value,
            create_foreign_key_of_entity, create_value_foreign_key, outer_join_fetch,
            queue_property_ref_constraint,
        },
    },
    error::MappingError,
    meta::get_metas,
    model::{
        AnyValue, Backref, BackrefKind, Collection, CollectionKind, CollectionRef, Component,
        DependantValue, FetchMode, ManyToOne, Property, Selectable, SimpleValue, SortStrategy,
        Value, cascades_delete_orphan,
    },
    registry::Mappings,
    second_pass::{CollectionPass, SecondPass},
};
use ormeta_tree::Element;

const DEFAULT_KEY_COLUMN: &str = "id";
const DEFAULT_ELEMENT_COLUMN: &str = "elt";
const DEFAULT_INDEX_COLUMN: &str = "idx";
const DEFAULT_IDENTIFIER_COLUMN: &str = "id";

// bind_collection
// first pass: everything the collection element says about itself; key,
// element and index wait for the queued second pass
pub(crate) fn bind_collection(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    kind: CollectionKind,
    role: &str,
    owner: &Owner,
) -> Result<Value, MappingError> {
    let mut collection = Collection::new(role, &owner.entity_name, kind);

    if let Some(inverse) = node.attribute("inverse") {
        collection.inverse = inverse == "true";
    }
    collection.mutable = !attr_is(node, "mutable", "false");
    collection.optimistic_locked = attr_default_true(node, "optimistic-lock");
    collection.order_by = node.attribute("order-by").map(str::to_string);
    collection.where_clause = node.attribute("where").map(str::to_string);
    collection.batch_size = attr_u32(node, "batch-size")?;
    collection.node_name = node
        .attribute("node")
        .or_else(|| node.attribute("name"))
        .map(str::to_string);
    collection.embedded = attr_default_true(node, "embed-xml");
    collection.persister = scope.class_attribute(node, "persister");
    collection.type_name = node.attribute("collection-type").map(str::to_string);

    let (fetch, _) = outer_join_fetch(node, false);
    collection.fetch = fetch;
    if attr_is(node, "fetch", "subselect") {
        collection.subselect_loadable = true;
        if let Some(entity) = mappings.entity_mut(&owner.entity_name) {
            entity.subselect_loadable_collections = true;
        }
    }

    match node.attribute("lazy") {
        None => collection.lazy = scope.defaults.default_lazy,
        Some("extra") => {
            collection.lazy = true;
            collection.extra_lazy = true;
        }
        Some(lazy) => collection.lazy = lazy == "true",
    }

    if let Some(one_to_many) = node.child("one-to-many") {
        collection.element = Some(Value::OneToMany(bind_one_to_many(scope, one_to_many)));
    } else {
        let table_name = match node.attribute("table") {
            Some(name) => mappings.naming_strategy().table_name(name),
            None => {
                let owner_table = mappings.table_name(owner.table).to_string();
                mappings
                    .naming_strategy()
                    .collection_table_name(&owner_table, None, role)
            }
        };
        let subselect = subselect_of(node);
        let table = mappings.add_table(
            scope.schema_of(node),
            scope.catalog_of(node),
            &table_name,
            subselect.as_deref(),
            false,
        );
        if let Some(comment) = node.child("comment")
            && let Some(t) = mappings.table_mut(table)
        {
            t.comment = Some(comment.text_trim().to_string());
        }
        collection.collection_table = Some(table);

        tracing::info!(role, table = mappings.table_name(table), "mapping collection");
    }

    collection.sort = SortStrategy::parse(node.attribute("sort"));
    collection.orphan_delete = node
        .attribute("cascade")
        .is_some_and(cascades_delete_orphan);

    collection.custom_sql.insert = custom_sql(node, "sql-insert");
    collection.custom_sql.update = custom_sql(node, "sql-update");
    collection.custom_sql.delete = custom_sql(node, "sql-delete");
    collection.custom_sql.delete_all = custom_sql(node, "sql-delete-all");

    for filter in node.children_named("filter") {
        collection.filters.push(parse_filter(mappings, filter)?);
    }
    collection.synchronized_tables = synchronized_tables(node);
    collection.loader_query = node
        .child("loader")
        .and_then(|l| l.attribute("query-ref"))
        .map(str::to_string);
    collection.referenced_property = node
        .child("key")
        .and_then(|k| k.attribute("property-ref"))
        .map(str::to_string);

    if matches!(kind, CollectionKind::Array | CollectionKind::PrimitiveArray) {
        collection.element_class = scope.class_attribute(node, "element-class");
    }

    collection.metas = get_metas(node, &scope.metas, false);
    mappings.add_collection(collection)?;

    let pass = CollectionPass {
        role: role.to_string(),
        node: node.clone(),
        scope: scope.clone(),
    };
    mappings.add_second_pass(match kind {
        CollectionKind::Array | CollectionKind::List | CollectionKind::PrimitiveArray => {
            SecondPass::List(pass)
        }
        CollectionKind::Map => SecondPass::Map(pass),
        CollectionKind::IdentifierBag => SecondPass::IdentifierCollection(pass),
        CollectionKind::Bag | CollectionKind::Set => SecondPass::Collection(pass),
    });

    Ok(Value::Collection(CollectionRef {
        role: role.to_string(),
    }))
}

// bind_collection_second_pass
pub(crate) fn bind_collection_second_pass(
    mappings: &mut Mappings,
    pass: &CollectionPass,
) -> Result<(), MappingError> {
    let collection = bind_contents(mappings, pass)?;

    store(mappings, collection)
}

// bind_identifier_collection_second_pass
pub(crate) fn bind_identifier_collection_second_pass(
    mappings: &mut Mappings,
    pass: &CollectionPass,
) -> Result<(), MappingError> {
    let mut collection = bind_contents(mappings, pass)?;

    let id_node = pass.node.child("collection-id").ok_or_else(|| {
        MappingError::collection(format!("<idbag> must declare a collection-id: {}", pass.role))
    })?;
    let mut id = SimpleValue::new(collection.collection_table);
    bind_simple_value(mappings, id_node, &mut id, false, DEFAULT_IDENTIFIER_COLUMN)?;
    make_identifier(&pass.scope, id_node, &mut id)?;
    collection.identifier = Some(Value::Simple(id));

    store(mappings, collection)
}

// bind_list_second_pass
// lists and arrays carry an integer position, zero-based unless `base` says
// otherwise
pub(crate) fn bind_list_second_pass(
    mappings: &mut Mappings,
    pass: &CollectionPass,
) -> Result<(), MappingError> {
    let mut collection = bind_contents(mappings, pass)?;

    let index_node = pass
        .node
        .child("list-index")
        .or_else(|| pass.node.child("index"))
        .ok_or_else(|| {
            MappingError::collection(format!(
                "<{}> must declare an index: {}",
                pass.node.name(),
                pass.role
            ))
        })?;

    let mut index = SimpleValue::new(collection.collection_table);
    bind_simple_value(
        mappings,
        index_node,
        &mut index,
        collection.is_one_to_many(),
        DEFAULT_INDEX_COLUMN,
    )?;
    index.type_name = Some("integer".to_string());
    collection.base_index = attr_i32(index_node, "base")?.unwrap_or(0);
    collection.index_node_name = index_node.attribute("node").map(str::to_string);
    collection.index = Some(Value::Simple(index));

    add_index_backref(mappings, &pass.node, &collection)?;

    store(mappings, collection)
}

// bind_map_second_pass
pub(crate) fn bind_map_second_pass(
    mappings: &mut Mappings,
    pass: &CollectionPass,
) -> Result<(), MappingError> {
    let mut collection = bind_contents(mappings, pass)?;
    let CollectionPass { role, node, scope } = pass;
    let table = collection.collection_table;
    let nullable = collection.is_one_to_many();

    for child in node.children() {
        let index = match Tag::of(child) {
            Some(Tag::Index) => {
                let mut index = SimpleValue::new(table);
                bind_simple_value(mappings, child, &mut index, nullable, DEFAULT_INDEX_COLUMN)?;
                if index.type_name.is_none() {
                    return Err(MappingError::collection(format!(
                        "map index element must specify a type: {role}"
                    )));
                }
                collection.index_node_name = child.attribute("node").map(str::to_string);
                Value::Simple(index)
            }
            Some(Tag::IndexManyToMany) => {
                let mut index = ManyToOne {
                    base: SimpleValue::new(table),
                    ..ManyToOne::default()
                };
                bind_many_to_one(mappings, scope, child, &mut index, DEFAULT_INDEX_COLUMN, nullable)?;
                if let (Some(entity), Some(property)) = (
                    &index.to_one.referenced_entity,
                    &index.to_one.referenced_property,
                ) {
                    mappings.add_unique_property_reference(entity, property);
                }
                queue_property_ref_constraint(mappings, &index);
                let index = Value::ManyToOne(index);
                create_value_foreign_key(mappings, &index);
                index
            }
            Some(Tag::CompositeIndex) => {
                let owner = Owner::of(mappings, &collection.owner_entity)?;
                let path = qualify(role, "index");
                let mut component = Component::new(table, &owner.entity_name, &path);
                let site = ComponentSite {
                    owner: &owner,
                    owner_class: None,
                    parent_property: None,
                    path: &path,
                    nullable,
                    embedded: false,
                    id_mapper: false,
                };
                bind_component(mappings, scope, child, &mut component, &site)?;
                Value::Component(component)
            }
            Some(Tag::IndexManyToAny) => {
                let mut index = AnyValue {
                    base: SimpleValue::new(table),
                    ..AnyValue::default()
                };
                bind_any(mappings, scope, child, &mut index, nullable)?;
                Value::Any(index)
            }
            _ => continue,
        };
        collection.index = Some(index);
    }

    if collection.index.is_none() {
        return Err(MappingError::collection(format!(
            "<map> must declare an index: {role}"
        )));
    }

    add_index_backref(mappings, node, &collection)?;

    store(mappings, collection)
}

// bind_contents
// resolves the one-to-many target, then binds key, element and cache; adds
// the ownership backref once the key is known
fn bind_contents(mappings: &mut Mappings, pass: &CollectionPass) -> Result<Collection, MappingError> {
    let CollectionPass { role, node, scope } = pass;
    let mut collection = mappings
        .collection(role)
        .cloned()
        .ok_or_else(|| MappingError::second_pass(format!("Unknown collection role: {role}")))?;
    let owner = Owner::of(mappings, &collection.owner_entity)?;

    if let Some(Value::OneToMany(one_to_many)) = &mut collection.element {
        let target = one_to_many.referenced_entity.clone().unwrap_or_default();
        let (entity_name, table) = mappings
            .resolve_entity_name(&target)
            .and_then(|name| mappings.entity(name))
            .map(|entity| (entity.entity_name.clone(), entity.table))
            .ok_or_else(|| {
                MappingError::collection(format!(
                    "Association references unmapped class: {target}"
                ))
            })?;

        one_to_many.referenced_entity = Some(entity_name);
        one_to_many.associated_table = Some(table);
        collection.collection_table = Some(table);

        tracing::info!(role, table = mappings.table_name(table), "mapping collection");
    }

    if let Some(check) = node.attribute("check") {
        if let Some(table) = collection.collection_table.and_then(|id| mappings.table_mut(id)) {
            table.add_check(check);
        }
        collection.check = Some(check.to_string());
    }

    let table = collection.collection_table;
    for child in node.children() {
        let Some(tag) = Tag::of(child) else {
            continue;
        };

        match tag {
            Tag::Key => {
                collection.key = Some(bind_key(mappings, child, &collection, &owner)?);
            }
            Tag::Element => {
                let mut element = SimpleValue::new(table);
                bind_simple_value(mappings, child, &mut element, true, DEFAULT_ELEMENT_COLUMN)?;
                collection.element = Some(Value::Simple(element));
            }
            Tag::ManyToMany => {
                let element = bind_many_to_many(mappings, scope, child, &mut collection)?;
                collection.element = Some(Value::ManyToOne(element));
            }
            Tag::CompositeElement => {
                let path = qualify(role, "element");
                let mut element = Component::new(table, &owner.entity_name, &path);
                let site = ComponentSite {
                    owner: &owner,
                    owner_class: None,
                    parent_property: None,
                    path: &path,
                    nullable: true,
                    embedded: false,
                    id_mapper: false,
                };
                bind_component(mappings, scope, child, &mut element, &site)?;
                collection.element = Some(Value::Component(element));
            }
            Tag::ManyToAny => {
                let mut element = AnyValue {
                    base: SimpleValue::new(table),
                    ..AnyValue::default()
                };
                bind_any(mappings, scope, child, &mut element, true)?;
                collection.element = Some(Value::Any(element));
            }
            Tag::Cache => {
                collection.cache = Some(cache_settings(child)?);
                continue;
            }
            _ => continue,
        }

        if tag != Tag::Key
            && let Some(node_name) = child.attribute("node")
        {
            collection.element_node_name = Some(node_name.to_string());
        }
    }

    if collection.referenced_property.is_none() {
        if let Some(Value::Dependant(key)) = &collection.key {
            create_foreign_key_of_entity(mappings, &key.base, &owner.entity_name);
        }
        if let Some(element) = &collection.element {
            create_value_foreign_key(mappings, element);
        }
    }

    add_backref(mappings, node, &collection, BackrefKind::Collection)?;

    Ok(collection)
}

// bind_key
// the key wraps the owner's identifier, or the property named by
// property-ref; it is non-nullable when declared so or when orphans are
// deleted
fn bind_key(
    mappings: &mut Mappings,
    node: &Element,
    collection: &Collection,
    owner: &Owner,
) -> Result<Value, MappingError> {
    let wrapped = match &collection.referenced_property {
        None => mappings.identifier_value(&owner.entity_name).cloned().ok_or_else(|| {
            MappingError::collection(format!(
                "collection key references an entity without identifier: {}",
                owner.entity_name
            ))
        })?,
        Some(property) => mappings
            .referenced_property(&owner.entity_name, property)
            .map(|p| p.value.clone())
            .ok_or_else(|| {
                MappingError::collection(format!(
                    "Could not find property {property} on {}",
                    owner.entity_name
                ))
            })?,
    };

    let mut base = SimpleValue::new(collection.collection_table);
    base.cascade_delete = attr_is(node, "on-delete", "cascade");
    bind_simple_value(mappings, node, &mut base, collection.is_one_to_many(), DEFAULT_KEY_COLUMN)?;

    let nullable = match node.attribute("not-null") {
        Some(not_null) => not_null == "false",
        None => !collection.orphan_delete,
    };
    if !nullable {
        for selectable in &mut base.selectables {
            if let Selectable::Column(column) = selectable {
                column.nullable = false;
            }
        }
        let columns: Vec<String> = base.columns().map(|c| c.name.clone()).collect();
        if let Some(table) = base.table.and_then(|id| mappings.table_mut(id)) {
            for name in &columns {
                if let Some(column) = table.column_mut(name) {
                    column.nullable = false;
                }
            }
        }
    }

    Ok(Value::Dependant(DependantValue {
        base,
        wrapped: Box::new(wrapped),
        nullable,
        updatable: attr_default_true(node, "update"),
    }))
}

// bind_many_to_many
fn bind_many_to_many(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    collection: &mut Collection,
) -> Result<ManyToOne, MappingError> {
    let mut element = ManyToOne {
        base: SimpleValue::new(collection.collection_table),
        ..ManyToOne::default()
    };
    bind_many_to_one(mappings, scope, node, &mut element, DEFAULT_ELEMENT_COLUMN, false)?;
    if let (Some(entity), Some(property)) = (
        &element.to_one.referenced_entity,
        &element.to_one.referenced_property,
    ) {
        mappings.add_unique_property_reference(entity, property);
    }

    collection.many_to_many_where = node.attribute("where").map(str::to_string);
    collection.many_to_many_order_by = node.attribute("order-by").map(str::to_string);

    let filters = node
        .children_named("filter")
        .map(|filter| parse_filter(mappings, filter))
        .collect::<Result<Vec<_>, _>>()?;

    let restricted = !filters.is_empty() || collection.many_to_many_where.is_some();
    if restricted && collection.fetch == FetchMode::Join && element.to_one.fetch != FetchMode::Join {
        return Err(MappingError::collection(format!(
            "many-to-many defining filter or where without join fetching not valid within collection using join fetching [{}]",
            collection.role
        )));
    }
    collection.many_to_many_filters = filters;

    Ok(element)
}

// add_index_backref
fn add_index_backref(
    mappings: &mut Mappings,
    node: &Element,
    collection: &Collection,
) -> Result<(), MappingError> {
    if collection.index.as_ref().is_some_and(Value::has_formula) {
        return Ok(());
    }

    add_backref(mappings, node, collection, BackrefKind::Index)
}

// add_backref
// a non-inverse one-to-many with a non-nullable key exposes its ownership
// on the element entity through a synthetic, read-only property
fn add_backref(
    mappings: &mut Mappings,
    node: &Element,
    collection: &Collection,
    kind: BackrefKind,
) -> Result<(), MappingError> {
    let Some(Value::OneToMany(one_to_many)) = &collection.element else {
        return Ok(());
    };
    let Some(key) = &collection.key else {
        return Ok(());
    };
    if collection.inverse || key.is_nullable() {
        return Ok(());
    }

    let name = node
        .attribute("name")
        .unwrap_or_else(|| collection.property_name());
    let (property_name, access, value) = match kind {
        BackrefKind::Collection => (format!("_{name}Backref"), "backref", key.clone()),
        BackrefKind::Index => {
            let Some(index) = &collection.index else {
                return Ok(());
            };
            (format!("_{name}IndexBackref"), "index-backref", index.clone())
        }
    };

    let target = one_to_many.referenced_entity.clone().unwrap_or_default();
    let entity = mappings.entity_mut(&target).ok_or_else(|| {
        MappingError::collection(format!("Association references unmapped class: {target}"))
    })?;

    let mut property = Property::new(&property_name, value);
    property.access = access.to_string();
    property.updatable = false;
    property.selectable = false;
    property.backref = Some(Backref {
        kind,
        collection_role: collection.role.clone(),
        entity_name: collection.owner_entity.clone(),
    });
    entity.add_property(property);

    tracing::debug!(entity = %target, property = %property_name, "added backref");

    Ok(())
}

// store
fn store(mappings: &mut Mappings, collection: Collection) -> Result<(), MappingError> {
    let slot = mappings.collection_mut(&collection.role).ok_or_else(|| {
        MappingError::second_pass(format!("Unknown collection role: {}", collection.role))
    })?;
    *slot = collection;

    Ok(())
}
