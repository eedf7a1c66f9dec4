use crate::{
    bind::{
        Scope, Tag, attr_default_true, property_name,
        value::{create_value_foreign_key, queue_property_ref_constraint},
    },
    error::MappingError,
    meta::get_metas,
    model::{Property, PropertyGeneration, Value},
    registry::Mappings,
};
use ormeta_tree::Element;

// create_property
// finishes a bound value: reflected types, property references and foreign
// keys, then the property settings themselves
pub(crate) fn create_property(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    mut value: Value,
    class_name: Option<&str>,
    owner_entity: &str,
) -> Result<Property, MappingError> {
    let name = property_name(node)?.to_string();

    if let Some(class_name) = class_name {
        reflect_type(mappings, &mut value, class_name, &name);
    }

    match &value {
        Value::ManyToOne(m) => {
            if let (Some(entity), Some(property)) =
                (&m.to_one.referenced_entity, &m.to_one.referenced_property)
            {
                mappings.add_unique_property_reference(entity, property);
            }
            if Tag::of(node) != Some(Tag::ManyToMany) {
                queue_property_ref_constraint(mappings, m);
            }
        }
        Value::OneToOne(o) => {
            if let (Some(entity), Some(property)) =
                (&o.to_one.referenced_entity, &o.to_one.referenced_property)
            {
                mappings.add_unique_property_reference(entity, property);
            }
        }
        Value::Collection(r) => {
            let referenced = mappings
                .collection(&r.role)
                .and_then(|c| c.referenced_property.clone());
            if let Some(property) = referenced {
                mappings.add_property_reference(owner_entity, &property);
            }
        }
        _ => {}
    }

    create_value_foreign_key(mappings, &value);

    bind_property(scope, node, value, &name)
}

// reflect_type
// fills in what the mapping left implicit from the backing class, when the
// resolver knows it
fn reflect_type(mappings: &Mappings, value: &mut Value, class_name: &str, property: &str) {
    let missing = match value {
        Value::Simple(s) => s.type_name.is_none(),
        Value::ManyToOne(m) => m.to_one.referenced_entity.is_none(),
        Value::OneToOne(o) => o.to_one.referenced_entity.is_none(),
        _ => false,
    };
    if !missing {
        return;
    }

    let Some(reflected) = mappings.reflection().property_type(class_name, property) else {
        tracing::trace!(class = class_name, property, "no reflected type");
        return;
    };

    match value {
        Value::Simple(s) => s.type_name = Some(reflected),
        Value::ManyToOne(m) => m.to_one.referenced_entity = Some(reflected),
        Value::OneToOne(o) => o.to_one.referenced_entity = Some(reflected),
        _ => {}
    }
}

// bind_property
pub(crate) fn bind_property(
    scope: &Scope,
    node: &Element,
    value: Value,
    name: &str,
) -> Result<Property, MappingError> {
    let tag = Tag::of(node);
    let mut property = Property::new(name, value);

    property.node_name = Some(node.attribute("node").unwrap_or(name).to_string());
    property.access = match node.attribute("access") {
        Some(access) => access.to_string(),
        None if tag == Some(Tag::Properties) => "embedded".to_string(),
        None => scope.defaults.default_access.clone(),
    };
    property.cascade = node
        .attribute("cascade")
        .map_or_else(|| scope.defaults.default_cascade.clone(), str::to_string);
    property.updatable = attr_default_true(node, "update");
    property.insertable = attr_default_true(node, "insert");
    property.optimistic_locked = attr_default_true(node, "optimistic-lock");

    if let Some(raw) = node.attribute("generated") {
        property.generation = PropertyGeneration::parse(raw).ok_or_else(|| {
            MappingError::property(format!("unknown property generation type: {raw}"))
        })?;
    }
    apply_generation(node, &mut property, name)?;

    if matches!(
        tag,
        Some(Tag::Property | Tag::Component | Tag::ManyToOne | Tag::OneToOne | Tag::Any)
    ) {
        property.lazy = node.attribute("lazy") == Some("true");
    }

    tracing::debug!(
        property = name,
        columns = ?property.value.column_names(),
        "mapped property"
    );

    property.metas = get_metas(node, &scope.metas, false);

    Ok(property)
}

// apply_generation
// generated values are never written by insert; always-generated ones are
// not written by update either, and saying otherwise explicitly is an error
fn apply_generation(node: &Element, property: &mut Property, name: &str) -> Result<(), MappingError> {
    let generation = property.generation;
    if generation == PropertyGeneration::Never {
        return Ok(());
    }
    let label = node.attribute("generated").unwrap_or_default();

    if property.insertable {
        if node.has_attribute("insert") {
            return Err(MappingError::property(format!(
                "cannot specify both insert=\"true\" and generated=\"{label}\" for property: {name}"
            )));
        }
        property.insertable = false;
    }

    if property.updatable && generation == PropertyGeneration::Always {
        if node.has_attribute("update") {
            return Err(MappingError::property(format!(
                "cannot specify both update=\"true\" and generated=\"{label}\" for property: {name}"
            )));
        }
        property.updatable = false;
    }

    Ok(())
}
