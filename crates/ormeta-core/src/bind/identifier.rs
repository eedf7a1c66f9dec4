use crate::{
    bind::{
        Owner, Scope, attr_is, property_name,
        component::{ComponentSite, bind_component},
        property::bind_property,
        qualify,
        value::bind_simple_value,
    },
    error::MappingError,
    model::{
        Component, Discriminator, EntityMapping, IdentifierBinding, IdentifierGenerator, Property,
        PropertyGeneration, RootData, SimpleValue, Value,
    },
    registry::Mappings,
};
use indexmap::IndexMap;
use ormeta_tree::Element;

const ASSIGNED: &str = "assigned";
const UNDEFINED: &str = "undefined";

// root_data
fn root_data(entity: &mut EntityMapping) -> Result<&mut RootData, MappingError> {
    let name = entity.entity_name.clone();

    entity
        .root_mut()
        .ok_or_else(|| MappingError::identifier(format!("{name} is not a hierarchy root")))
}

// make_identifier
// generator strategy and parameters, plus the unsaved-value sentinel; the
// document schema and catalog are handed to every generator. Without a
// <generator> the strategy is "assigned"; a <generator> must name its class.
pub(crate) fn make_identifier(
    scope: &Scope,
    node: &Element,
    value: &mut SimpleValue,
) -> Result<(), MappingError> {
    if let Some(generator) = node.child("generator") {
        let strategy = generator.attribute("class").ok_or_else(|| {
            MappingError::identifier(format!(
                "<generator> must specify a class: {}",
                node.attribute("name").unwrap_or_else(|| node.name())
            ))
        })?;

        let mut parameters = IndexMap::new();
        if let Some(schema) = &scope.defaults.schema {
            parameters.insert("schema".to_string(), schema.clone());
        }
        if let Some(catalog) = &scope.defaults.catalog {
            parameters.insert("catalog".to_string(), catalog.clone());
        }
        for param in generator.children_named("param") {
            if let Some(name) = param.attribute("name") {
                parameters.insert(name.to_string(), param.text().to_string());
            }
        }

        value.generator = Some(IdentifierGenerator {
            strategy: strategy.to_string(),
            parameters,
        });
    }

    value.unsaved_value = match node.attribute("unsaved-value") {
        Some(sentinel) => Some(sentinel.to_string()),
        None if value.generator_strategy().unwrap_or(ASSIGNED) == ASSIGNED => {
            Some(UNDEFINED.to_string())
        }
        None => None,
    };

    Ok(())
}

// bind_simple_id
pub(crate) fn bind_simple_id(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    entity: &mut EntityMapping,
) -> Result<(), MappingError> {
    let name = node.attribute("name");
    let mut id = SimpleValue::new(Some(entity.table));
    bind_simple_value(mappings, node, &mut id, false, name.unwrap_or("id"))?;

    match (name, entity.class_name.as_deref()) {
        (Some(name), Some(class_name)) if id.type_name.is_none() => {
            id.type_name = mappings.reflection().property_type(class_name, name);
        }
        _ => {}
    }
    if id.type_name.is_none() {
        return Err(MappingError::identifier(format!(
            "must specify an identifier type: {}",
            entity.entity_name
        )));
    }

    make_identifier(scope, node, &mut id)?;

    let binding = match name {
        Some(name) => IdentifierBinding::Named(bind_property(scope, node, Value::Simple(id), name)?),
        None => IdentifierBinding::Unnamed(Value::Simple(id)),
    };
    root_data(entity)?.identifier = Some(binding);

    Ok(())
}

// bind_composite_id
pub(crate) fn bind_composite_id(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    entity: &mut EntityMapping,
) -> Result<(), MappingError> {
    let name = node.attribute("name");
    if name.is_some() && attr_is(node, "mapped", "true") {
        return Err(MappingError::identifier(
            "cannot combine mapped=\"true\" with specified name",
        ));
    }

    let owner = Owner::from_entity(entity);
    let path = qualify(&entity.entity_name, name.unwrap_or("id"));
    let embedded = !node.has_attribute("class") && name.is_none();

    let mut id = Component::new(Some(entity.table), &entity.entity_name, &path);
    id.key = true;
    bind_component(
        mappings,
        scope,
        node,
        &mut id,
        &ComponentSite {
            owner: &owner,
            owner_class: owner.class_name.as_deref(),
            parent_property: name,
            path: &path,
            nullable: false,
            embedded,
            id_mapper: false,
        },
    )?;

    if attr_is(node, "mapped", "true") {
        let mut mapper = Component::new(Some(entity.table), &entity.entity_name, &path);
        bind_component(
            mappings,
            scope,
            node,
            &mut mapper,
            &ComponentSite {
                owner: &owner,
                owner_class: owner.class_name.as_deref(),
                parent_property: None,
                path: &path,
                nullable: false,
                embedded: true,
                id_mapper: true,
            },
        )?;

        let mut property = Property::new("_identifierMapper", Value::Component(mapper.clone()));
        property.node_name = Some("id".to_string());
        property.insertable = false;
        property.updatable = false;
        property.access = "embedded".to_string();

        entity.add_property(property);
        root_data(entity)?.identifier_mapper = Some(mapper);
    }

    id.unsaved_value = Some(node.attribute("unsaved-value").unwrap_or(UNDEFINED).to_string());

    let has_class = entity.class_name.is_some();
    let root = root_data(entity)?;
    match name {
        Some(name) => {
            let property = bind_property(scope, node, Value::Component(id), name)?;
            root.identifier = Some(IdentifierBinding::Named(property));
        }
        None => {
            root.embedded_identifier = id.embedded;
            if id.embedded {
                id.dynamic = !has_class;
            }
            root.identifier = Some(IdentifierBinding::Unnamed(Value::Component(id)));
        }
    }

    Ok(())
}

// bind_version
// version defaults to an integer counter, timestamp to a timestamp read
// from the database or the VM
pub(crate) fn bind_version(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    entity: &mut EntityMapping,
) -> Result<(), MappingError> {
    let name = property_name(node)?.to_string();
    let mut value = SimpleValue::new(Some(entity.table));
    bind_simple_value(mappings, node, &mut value, false, &name)?;

    if value.type_name.is_none() {
        let default = match node.name() {
            "version" => "integer",
            _ if attr_is(node, "source", "db") => "dbtimestamp",
            _ => "timestamp",
        };
        value.type_name = Some(default.to_string());
    }
    value.unsaved_value = Some(node.attribute("unsaved-value").unwrap_or(UNDEFINED).to_string());

    let property = bind_property(scope, node, Value::Simple(value), &name)?;
    if property.generation == PropertyGeneration::Insert {
        return Err(MappingError::property(
            "'generated' attribute cannot be 'insert' for versioning property",
        ));
    }

    root_data(entity)?.version = Some(name);
    entity.add_property(property);

    Ok(())
}

// bind_discriminator
pub(crate) fn bind_discriminator(
    mappings: &mut Mappings,
    node: &Element,
    entity: &mut EntityMapping,
) -> Result<(), MappingError> {
    let mut value = SimpleValue::new(Some(entity.table));
    bind_simple_value(mappings, node, &mut value, false, "class")?;
    if value.type_name.is_none() {
        value.type_name = Some("string".to_string());
    }

    let root = root_data(entity)?;
    root.polymorphic = true;
    root.discriminator = Some(Discriminator {
        value,
        force: attr_is(node, "force", "true"),
        insertable: !attr_is(node, "insert", "false"),
    });

    Ok(())
}
