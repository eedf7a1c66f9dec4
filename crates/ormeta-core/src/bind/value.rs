use crate::{
    bind::{Scope, attr_default_true, attr_is, columns::bind_columns},
    error::MappingError,
    model::{
        AnyValue, FetchMode, ForeignKeyDirection, ManyToOne, OneToMany, OneToOne, Selectable,
        SimpleValue, ToOne, Value, cascades_delete_orphan,
    },
    registry::Mappings,
    second_pass::{PropertyRefPass, SecondPass},
};
use indexmap::IndexMap;
use ormeta_tree::Element;

// bind_simple_value
pub(crate) fn bind_simple_value(
    mappings: &mut Mappings,
    node: &Element,
    value: &mut SimpleValue,
    nullable: bool,
    path: &str,
) -> Result<(), MappingError> {
    bind_simple_value_type(mappings, node, value);
    bind_columns_or_formula(mappings, node, value, path, nullable)?;

    if let Some(name) = node.attribute("foreign-key") {
        value.foreign_key_name = Some(name.to_string());
    }

    Ok(())
}

// bind_simple_value_type
// an explicit type attribute wins over a nested <type>; a type definition
// supplies the class and default parameters, local parameters override them
pub(crate) fn bind_simple_value_type(mappings: &Mappings, node: &Element, value: &mut SimpleValue) {
    let mut type_name = node
        .attribute("type")
        .or_else(|| node.attribute("id-type"))
        .map(str::to_string);
    let mut parameters = IndexMap::new();

    if type_name.is_none()
        && let Some(type_node) = node.child("type")
    {
        type_name = type_node.attribute("name").map(str::to_string);
        for param in type_node.children_named("param") {
            if let Some(name) = param.attribute("name") {
                parameters.insert(name.to_string(), param.text_trim().to_string());
            }
        }
    }

    if let Some(def) = type_name.as_deref().and_then(|name| mappings.type_def(name)) {
        let mut merged = def.parameters.clone();
        merged.extend(parameters);
        parameters = merged;
        type_name = Some(def.type_class.clone());
    }

    if !parameters.is_empty() {
        value.type_parameters = parameters;
    }
    if type_name.is_some() {
        value.type_name = type_name;
    }
}

fn bind_columns_or_formula(
    mappings: &mut Mappings,
    node: &Element,
    value: &mut SimpleValue,
    path: &str,
    nullable: bool,
) -> Result<(), MappingError> {
    match node.attribute("formula") {
        Some(formula) => {
            value.selectables.push(Selectable::Formula(formula.to_string()));
            Ok(())
        }
        None => bind_columns(mappings, node, value, nullable, true, path),
    }
}

// outer_join_fetch
// fetch style and eager default of an association; many-to-many joins
// eagerly and an unconstrained one-to-one cannot be proxied
pub(crate) fn outer_join_fetch(node: &Element, constrained: bool) -> (FetchMode, bool) {
    if let Some(fetch) = node.attribute("fetch") {
        let mode = if fetch == "join" {
            FetchMode::Join
        } else {
            FetchMode::Select
        };
        return (mode, true);
    }

    match node.attribute("outer-join") {
        Some("auto") => (FetchMode::Default, true),
        Some("true") => (FetchMode::Join, true),
        Some(_) => (FetchMode::Select, true),
        None => match node.name() {
            "many-to-many" => (FetchMode::Join, false),
            "one-to-one" if constrained => (FetchMode::Default, true),
            "one-to-one" => (FetchMode::Join, false),
            _ => (FetchMode::Default, true),
        },
    }
}

// to_one_laziness
fn to_one_laziness(node: &Element, to_one: &mut ToOne) {
    match node.attribute("lazy") {
        Some("no-proxy") => {
            to_one.unwrap_proxy = true;
            to_one.lazy = true;
        }
        Some(lazy) => to_one.lazy = lazy == "proxy",
        None => {}
    }
}

// validate_cascade
fn validate_cascade(node: &Element, path: &str) -> Result<(), MappingError> {
    let orphan = node
        .attribute("cascade")
        .is_some_and(cascades_delete_orphan);

    if orphan {
        return Err(MappingError::value(format!(
            "single-valued associations do not support orphan delete: {path}"
        )));
    }

    Ok(())
}

// bind_many_to_one
pub(crate) fn bind_many_to_one(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    value: &mut ManyToOne,
    path: &str,
    nullable: bool,
) -> Result<(), MappingError> {
    bind_columns_or_formula(mappings, node, &mut value.base, path, nullable)?;

    let (fetch, lazy) = outer_join_fetch(node, false);
    value.to_one.fetch = fetch;
    value.to_one.lazy = lazy;
    to_one_laziness(node, &mut value.to_one);

    value.to_one.referenced_property = node.attribute("property-ref").map(str::to_string);
    value.to_one.referenced_entity = scope.entity_name_of(node);
    value.to_one.embedded = attr_default_true(node, "embed-xml");
    value.ignore_not_found = attr_is(node, "not-found", "ignore");

    if let Some(name) = node.attribute("foreign-key") {
        value.base.foreign_key_name = Some(name.to_string());
    }

    validate_cascade(node, path)
}

// bind_one_to_one
pub(crate) fn bind_one_to_one(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    value: &mut OneToOne,
    path: &str,
    nullable: bool,
) -> Result<(), MappingError> {
    bind_columns(mappings, node, &mut value.base, nullable, false, path)?;

    value.constrained = attr_is(node, "constrained", "true");
    value.foreign_key_direction = if value.constrained {
        ForeignKeyDirection::FromParent
    } else {
        ForeignKeyDirection::ToParent
    };

    let (fetch, lazy) = outer_join_fetch(node, value.constrained);
    value.to_one.fetch = fetch;
    value.to_one.lazy = lazy;
    to_one_laziness(node, &mut value.to_one);
    value.to_one.embedded = attr_is(node, "embed-xml", "true");

    if let Some(name) = node.attribute("foreign-key") {
        value.base.foreign_key_name = Some(name.to_string());
    }
    value.to_one.referenced_property = node.attribute("property-ref").map(str::to_string);
    value.property_name = node.attribute("name").unwrap_or_default().to_string();
    value.to_one.referenced_entity = scope.entity_name_of(node);

    validate_cascade(node, path)
}

// bind_one_to_many
pub(crate) fn bind_one_to_many(scope: &Scope, node: &Element) -> OneToMany {
    OneToMany {
        referenced_entity: scope.entity_name_of(node),
        associated_table: None,
        embedded: attr_default_true(node, "embed-xml"),
        ignore_not_found: attr_is(node, "not-found", "ignore"),
    }
}

// bind_any
pub(crate) fn bind_any(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    value: &mut AnyValue,
    nullable: bool,
) -> Result<(), MappingError> {
    bind_simple_value_type(mappings, node, &mut value.base);
    value.identifier_type.clone_from(&value.base.type_name);

    if let Some(meta_type) = node.attribute("meta-type") {
        value.meta_type = Some(meta_type.to_string());
        for meta_value in node.children_named("meta-value") {
            if let (Some(key), Some(class)) = (meta_value.attribute("value"), meta_value.attribute("class")) {
                value
                    .meta_values
                    .insert(key.to_string(), scope.qualify_class(class));
            }
        }
    }

    bind_columns(mappings, node, &mut value.base, nullable, false, "")
}

// create_value_foreign_key
// associations that point at the referenced entity's primary key get their
// constraint immediately; property-ref constraints wait for a second pass
pub(crate) fn create_value_foreign_key(mappings: &mut Mappings, value: &Value) {
    match value {
        Value::ManyToOne(m) if m.to_one.referenced_property.is_none() => {
            if let Some(entity) = &m.to_one.referenced_entity {
                create_foreign_key_of_entity(mappings, &m.base, entity);
            }
        }
        Value::OneToOne(o) if o.constrained && o.to_one.referenced_property.is_none() => {
            if let Some(entity) = &o.to_one.referenced_entity {
                create_foreign_key_of_entity(mappings, &o.base, entity);
            }
        }
        Value::Component(c) => {
            for property in &c.properties {
                create_value_foreign_key(mappings, &property.value);
            }
        }
        _ => {}
    }
}

// create_foreign_key_of_entity
pub(crate) fn create_foreign_key_of_entity(mappings: &mut Mappings, value: &SimpleValue, entity: &str) {
    if value.has_formula() || value.foreign_key_name.as_deref() == Some("none") {
        return;
    }
    let columns: Vec<String> = value.columns().map(|c| c.name.clone()).collect();
    if columns.is_empty() {
        return;
    }

    if let Some(table) = value.table.and_then(|id| mappings.table_mut(id)) {
        let name = table.create_foreign_key(
            value.foreign_key_name.as_deref(),
            columns,
            entity,
            Vec::new(),
            value.cascade_delete,
        );
        tracing::trace!(foreign_key = %name, entity, "created foreign key");
    }
}

// queue_property_ref_constraint
pub(crate) fn queue_property_ref_constraint(mappings: &mut Mappings, value: &ManyToOne) {
    let (Some(entity), Some(property)) = (
        value.to_one.referenced_entity.as_ref(),
        value.to_one.referenced_property.as_ref(),
    ) else {
        return;
    };
    if value.ignore_not_found {
        return;
    }

    mappings.add_second_pass(SecondPass::ManyToOnePropertyRef(PropertyRefPass {
        table: value.base.table,
        columns: value.base.columns().map(|c| c.name.clone()).collect(),
        has_formula: value.base.has_formula(),
        referenced_entity: entity.clone(),
        referenced_property: property.clone(),
        foreign_key_name: value.base.foreign_key_name.clone(),
        cascade_delete: value.base.cascade_delete,
    }));
}

// bind_property_ref_constraint
pub(crate) fn bind_property_ref_constraint(
    mappings: &mut Mappings,
    pass: &PropertyRefPass,
) -> Result<(), MappingError> {
    let entity = mappings
        .resolve_entity_name(&pass.referenced_entity)
        .map(str::to_string)
        .ok_or_else(|| {
            MappingError::second_pass(format!(
                "property-ref to unmapped class: {}",
                pass.referenced_entity
            ))
        })?;

    let referenced_columns = mappings
        .referenced_property(&entity, &pass.referenced_property)
        .map(|p| p.value.column_names())
        .ok_or_else(|| {
            MappingError::second_pass(format!(
                "Could not find property {} on {entity}",
                pass.referenced_property
            ))
        })?;

    if pass.has_formula || pass.foreign_key_name.as_deref() == Some("none") {
        return Ok(());
    }

    if let Some(table) = pass.table.and_then(|id| mappings.table_mut(id)) {
        table.create_foreign_key(
            pass.foreign_key_name.as_deref(),
            pass.columns.clone(),
            &entity,
            referenced_columns,
            pass.cascade_delete,
        );
    }

    Ok(())
}
