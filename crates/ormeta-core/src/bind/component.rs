use crate::{
    bind::{
        Owner, Scope, Tag, attr_is,
        collection::bind_collection,
        property::create_property,
        qualify, tuplizers,
        value::{bind_any, bind_many_to_one, bind_one_to_one, bind_simple_value},
    },
    error::MappingError,
    meta::get_metas,
    model::{
        AnyValue, Component, ForeignKeyDirection, ManyToOne, OneToOne, SimpleValue, ToOne, Value,
    },
    registry::Mappings,
};
use ormeta_tree::Element;
use std::sync::Arc;

///
/// ComponentSite
///
/// Where a component is declared: its owning entity, the class and property
/// it is reached through, and the flags threaded down to its properties.
///

pub(crate) struct ComponentSite<'a> {
    pub owner: &'a Owner,
    pub owner_class: Option<&'a str>,
    pub parent_property: Option<&'a str>,
    pub path: &'a str,
    pub nullable: bool,
    pub embedded: bool,
    pub id_mapper: bool,
}

impl ComponentSite<'_> {
    // relative_path
    // embedded components name columns after the bare property; others use
    // the path below the owning entity
    fn relative_path(&self, name: &str, subpath: &str) -> String {
        if self.embedded {
            return name.to_string();
        }

        subpath
            .strip_prefix(self.owner.entity_name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(subpath)
            .to_string()
    }
}

// bind_component
pub(crate) fn bind_component(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    component: &mut Component,
    site: &ComponentSite<'_>,
) -> Result<(), MappingError> {
    component.embedded = site.embedded;
    site.path.clone_into(&mut component.role_name);

    let metas = get_metas(node, &scope.metas, false);
    let inner = Scope::new(Arc::clone(&scope.defaults), metas.inheritable());
    component.metas = metas;

    let class_attribute = if site.id_mapper {
        None
    } else {
        scope.class_attribute(node, "class")
    };

    if let Some(class) = class_attribute {
        component.component_class = Some(class);
    } else if Tag::of(node) == Some(Tag::DynamicComponent) {
        component.dynamic = true;
    } else if site.embedded {
        match &site.owner.class_name {
            Some(class) => component.component_class = Some(class.clone()),
            None => component.dynamic = true,
        }
    } else if site.owner.class_name.is_some() {
        if let (Some(class), Some(property)) = (site.owner_class, site.parent_property) {
            component.component_class = mappings.reflection().property_type(class, property);
        }
    } else {
        component.dynamic = true;
    }

    component.node_name = Some(
        node.attribute("node")
            .or_else(|| node.attribute("name"))
            .unwrap_or(&site.owner.node_name)
            .to_string(),
    );

    for child in node.children() {
        let Some(tag) = Tag::of(child) else {
            continue;
        };
        if tag == Tag::Parent {
            component.parent_property = child.attribute("name").map(str::to_string);
            continue;
        }

        let name = child.attribute("name").unwrap_or_default();
        let subpath = qualify(site.path, name);
        let class = component.component_class.clone();

        let value = if let Some(kind) = tag.collection_kind() {
            bind_collection(mappings, &inner, child, kind, &subpath, site.owner)?
        } else {
            match tag {
                Tag::ManyToOne | Tag::KeyManyToOne => {
                    let mut value = ManyToOne {
                        base: SimpleValue::new(component.table),
                        ..ManyToOne::default()
                    };
                    let path = site.relative_path(name, &subpath);
                    bind_many_to_one(mappings, &inner, child, &mut value, &path, site.nullable)?;
                    Value::ManyToOne(value)
                }
                Tag::OneToOne => {
                    let mut value = OneToOne {
                        base: SimpleValue::new(component.table),
                        to_one: ToOne::default(),
                        constrained: false,
                        foreign_key_direction: ForeignKeyDirection::ToParent,
                        property_name: String::new(),
                        owner_entity: site.owner.entity_name.clone(),
                    };
                    let path = site.relative_path(name, &subpath);
                    bind_one_to_one(mappings, &inner, child, &mut value, &path, site.nullable)?;
                    Value::OneToOne(value)
                }
                Tag::Any => {
                    let mut value = AnyValue {
                        base: SimpleValue::new(component.table),
                        ..AnyValue::default()
                    };
                    bind_any(mappings, &inner, child, &mut value, site.nullable)?;
                    Value::Any(value)
                }
                Tag::Property | Tag::KeyProperty => {
                    let mut value = SimpleValue::new(component.table);
                    let path = site.relative_path(name, &subpath);
                    bind_simple_value(mappings, child, &mut value, site.nullable, &path)?;
                    Value::Simple(value)
                }
                Tag::Component | Tag::DynamicComponent | Tag::NestedCompositeElement => {
                    let mut nested = Component::new(component.table, &component.owner_entity, &subpath);
                    let nested_site = ComponentSite {
                        owner: site.owner,
                        owner_class: class.as_deref(),
                        parent_property: Some(name),
                        path: &subpath,
                        nullable: site.nullable,
                        embedded: site.embedded,
                        id_mapper: site.id_mapper,
                    };
                    bind_component(mappings, &inner, child, &mut nested, &nested_site)?;
                    Value::Component(nested)
                }
                _ => continue,
            }
        };

        let mut property = create_property(
            mappings,
            &inner,
            child,
            value,
            class.as_deref(),
            &site.owner.entity_name,
        )?;
        if site.id_mapper {
            property.insertable = false;
            property.updatable = false;
        }
        component.properties.push(property);
    }

    if attr_is(node, "unique", "true") {
        let columns: Vec<String> = component
            .properties
            .iter()
            .flat_map(|p| p.value.column_names())
            .collect();
        if let Some(table) = mappings.table_mut(site.owner.table) {
            table.create_unique_key(&columns);
        }
    }

    component.tuplizers = tuplizers(node);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{defaults::DocumentDefaults, meta::MetaMap, reflect::StaticReflection};
    use ormeta_tree::element;

    fn owner(mappings: &mut Mappings, class_name: Option<&str>) -> Owner {
        Owner {
            entity_name: "Person".into(),
            class_name: class_name.map(str::to_string),
            node_name: "Person".into(),
            table: mappings.add_table(None, None, "PEOPLE", None, false),
        }
    }

    fn scope() -> Scope {
        Scope::new(Arc::new(DocumentDefaults::default()), MetaMap::new())
    }

    #[test]
    fn component_properties_take_relative_column_names() {
        let mut mappings = Mappings::default();
        let owner = owner(&mut mappings, None);
        let node = element("component")
            .attr("name", "address")
            .attr("class", "Address")
            .attr("unique", "true")
            .child(element("property").attr("name", "street"))
            .child(element("property").attr("name", "city").attr("column", "CITY"))
            .child(element("parent").attr("name", "person"))
            .build();
        let mut component = Component::new(Some(owner.table), "Person", "Person.address");
        let site = ComponentSite {
            owner: &owner,
            owner_class: None,
            parent_property: Some("address"),
            path: "Person.address",
            nullable: true,
            embedded: false,
            id_mapper: false,
        };

        bind_component(&mut mappings, &scope(), &node, &mut component, &site).unwrap();

        assert_eq!(component.component_class.as_deref(), Some("Address"));
        assert_eq!(component.parent_property.as_deref(), Some("person"));
        assert_eq!(component.node_name.as_deref(), Some("address"));
        let columns: Vec<_> = component.properties.iter().flat_map(|p| p.value.column_names()).collect();
        assert_eq!(columns, ["street", "CITY"]);

        let table = mappings.table(owner.table).unwrap();
        assert_eq!(table.unique_keys.len(), 1);
        assert_eq!(table.unique_keys[0].columns, ["street", "CITY"]);
    }

    #[test]
    fn component_class_falls_back_to_reflection_or_dynamic() {
        let mut mappings = Mappings::new(
            Arc::new(crate::naming::DefaultNamingStrategy),
            Arc::new(StaticReflection::new().with_property("Person", "address", "Address")),
        );
        let with_class = owner(&mut mappings, Some("Person"));
        let node = element("component").attr("name", "address").build();
        let site = ComponentSite {
            owner: &with_class,
            owner_class: Some("Person"),
            parent_property: Some("address"),
            path: "Person.address",
            nullable: true,
            embedded: false,
            id_mapper: false,
        };
        let mut component = Component::new(None, "Person", "Person.address");
        bind_component(&mut mappings, &scope(), &node, &mut component, &site).unwrap();
        assert_eq!(component.component_class.as_deref(), Some("Address"));
        assert!(!component.dynamic);

        let classless = owner(&mut mappings, None);
        let site = ComponentSite { owner: &classless, owner_class: None, ..site };
        let mut component = Component::new(None, "Person", "Person.address");
        bind_component(&mut mappings, &scope(), &node, &mut component, &site).unwrap();
        assert!(component.dynamic);
    }

    #[test]
    fn id_mapper_properties_are_read_only() {
        let mut mappings = Mappings::default();
        let owner = owner(&mut mappings, Some("Person"));
        let node = element("composite-id")
            .attr("class", "PersonKey")
            .child(element("key-property").attr("name", "ssn").attr("type", "string"))
            .build();
        let site = ComponentSite {
            owner: &owner,
            owner_class: Some("Person"),
            parent_property: None,
            path: "Person.id",
            nullable: false,
            embedded: true,
            id_mapper: true,
        };
        let mut component = Component::new(Some(owner.table), "Person", "Person.id");

        bind_component(&mut mappings, &scope(), &node, &mut component, &site).unwrap();

        assert_eq!(component.component_class.as_deref(), Some("Person"));
        let ssn = component.property("ssn").unwrap();
        assert!(!ssn.insertable && !ssn.updatable);
    }

    #[test]
    fn properties_inherit_only_inheritable_component_metas() {
        let mut mappings = Mappings::default();
        let owner = owner(&mut mappings, None);
        let node = element("component")
            .attr("name", "address")
            .attr("class", "Address")
            .child(element("meta").attr("attribute", "scope").text("public"))
            .child(
                element("meta")
                    .attr("attribute", "audit")
                    .attr("inherit", "false")
                    .text("component-only"),
            )
            .child(element("property").attr("name", "street"))
            .build();
        let site = ComponentSite {
            owner: &owner,
            owner_class: None,
            parent_property: Some("address"),
            path: "Person.address",
            nullable: true,
            embedded: false,
            id_mapper: false,
        };
        let mut component = Component::new(Some(owner.table), "Person", "Person.address");

        bind_component(&mut mappings, &scope(), &node, &mut component, &site).unwrap();

        assert!(component.metas.get("audit").is_some());
        let street = component.property("street").unwrap();
        assert_eq!(street.metas.get("scope").and_then(|m| m.value()), Some("public"));
        assert!(street.metas.get("audit").is_none());
    }
}
