use ormeta::prelude::*;

fn document(root: ormeta::tree::ElementBuilder) -> Document {
    Document::new(root.build())
}

fn class(name: &str) -> ormeta::tree::ElementBuilder {
    element("class")
        .attr("name", name)
        .child(element("id").attr("name", "id").attr("type", "long"))
}

fn zoo(package: &str) -> Document {
    document(
        element("hibernate-mapping")
            .attr("package", package)
            .child(class("Cat").attr("table", format!("{package}_cats"))),
    )
}

#[test]
fn documents_bind_in_any_order_across_the_build() {
    let mut configuration = Configuration::new(&MappingConfig::default());

    let kittens = document(
        element("hibernate-mapping").child(
            element("subclass")
                .attr("name", "Kitten")
                .attr("extends", "Cat")
                .child(element("property").attr("name", "age").attr("type", "integer")),
        ),
    )
    .with_origin("kittens.xml");
    let cats = document(
        element("hibernate-mapping").child(
            class("Cat")
                .child(element("discriminator").attr("column", "kind"))
                .child(element("property").attr("name", "name").attr("type", "string")),
        ),
    )
    .with_origin("cats.xml");

    assert!(matches!(
        configuration.add_document(&kittens).unwrap(),
        BindOutcome::Deferred { ref missing } if missing == &["Cat".to_string()]
    ));
    assert_eq!(configuration.add_document(&cats).unwrap(), BindOutcome::Bound);
    assert_eq!(configuration.deferred_documents(), 1);

    let mappings = configuration.finish().unwrap();
    let kitten = mappings.entity("Kitten").unwrap();
    assert_eq!(kitten.superclass(), Some("Cat"));
    assert_eq!(kitten.table, mappings.entity("Cat").unwrap().table);
    assert!(mappings.table(kitten.table).unwrap().column("age").is_some());
}

#[test]
fn missing_superclass_fails_the_build() {
    let mut configuration = Configuration::new(&MappingConfig::default());
    configuration
        .add_document(&document(
            element("hibernate-mapping").child(
                element("union-subclass")
                    .attr("name", "Lion")
                    .attr("extends", "BigCat"),
            ),
        ))
        .unwrap();

    let err = configuration.finish().unwrap_err();
    assert!(matches!(err, Error::Mapping(_)));
    assert_eq!(
        err.to_string(),
        "superclasses referenced in extends not found: BigCat"
    );
}

#[test]
fn improved_naming_snake_cases_tables_and_columns() {
    let mut configuration =
        Configuration::from_toml_str("[naming]\nstrategy = \"improved\"\n").unwrap();

    configuration
        .add_document(&document(
            element("hibernate-mapping").child(
                class("ShippingAddress")
                    .child(element("property").attr("name", "streetName").attr("type", "string"))
                    .child(
                        element("set")
                            .attr("name", "deliveryNotes")
                            .child(element("key").attr("column", "address_id"))
                            .child(element("element").attr("column", "note").attr("type", "string")),
                    ),
            ),
        ))
        .unwrap();
    let mappings = configuration.finish().unwrap();

    let address = mappings.entity("ShippingAddress").unwrap();
    assert_eq!(mappings.table_name(address.table), "shipping_address");
    assert_eq!(
        address.property("streetName").unwrap().value.column_names(),
        ["street_name"]
    );

    let notes = mappings.collection("ShippingAddress.deliveryNotes").unwrap();
    let table = notes.collection_table.unwrap();
    assert_eq!(mappings.table_name(table), "shipping_address_delivery_notes");
}

#[test]
fn conflicting_auto_imports_follow_the_configured_policy() {
    let mut strict = Configuration::new(&MappingConfig::default());
    strict.add_document(&zoo("north")).unwrap();
    let err = strict.add_document(&zoo("south")).unwrap_err();
    assert!(err.to_string().starts_with("duplicate import: Cat refers to both"));

    let mut lenient = Configuration::from_toml_str(
        "[imports]\nreject_conflicting_auto_imports = false\n",
    )
    .unwrap();
    lenient.add_document(&zoo("north")).unwrap();
    lenient.add_document(&zoo("south")).unwrap();

    let mappings = lenient.finish().unwrap();
    assert_eq!(mappings.import("Cat"), Some("south.Cat"));
    assert!(mappings.has_entity("north.Cat"));
}

#[test]
fn reflection_types_untyped_identifiers() {
    let reflection = StaticReflection::new().with_property("Cat", "id", "long");
    let mut configuration =
        Configuration::with_reflection(&MappingConfig::default(), std::sync::Arc::new(reflection));

    configuration
        .add_document(&document(
            element("hibernate-mapping")
                .child(element("class").attr("name", "Cat").child(element("id").attr("name", "id"))),
        ))
        .unwrap();
    let mappings = configuration.finish().unwrap();

    let cat = mappings.entity("Cat").unwrap();
    let identifier = cat.root().and_then(|r| r.identifier_property()).unwrap();
    assert_eq!(identifier.value.type_name(), Some("long"));
}

#[test]
fn bound_model_serializes_for_inspection() {
    let mut configuration = Configuration::new(&MappingConfig::default());
    configuration.add_document(&zoo("shelter")).unwrap();
    let mappings = configuration.finish().unwrap();

    let json = serde_json::to_value(mappings.entity("shelter.Cat").unwrap()).unwrap();
    assert_eq!(json["entity_name"], "shelter.Cat");
}

#[test]
fn version_matches_the_workspace() {
    assert!(!ormeta::VERSION.is_empty());
}
