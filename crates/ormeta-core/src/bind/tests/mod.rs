
use crate::{
    bind::BindOutcome,
    error::MappingError,
    model::{BackrefKind, EntityMapping, PersisterStrategy, TableKey, Value},
    registry::Mappings,
    session::MappingSession,
};
use ormeta_tree::{Document, ElementBuilder, element};

fn mapping() -> ElementBuilder {
    element("hibernate-mapping")
}

fn id(name: &str, ty: &str) -> ElementBuilder {
    element("id").attr("name", name).attr("type", ty)
}

fn class(name: &str) -> ElementBuilder {
    element("class").attr("name", name).child(id("id", "long"))
}

fn bind(root: ElementBuilder) -> Result<Mappings, MappingError> {
    let mut session = MappingSession::default();
    session.add_document(&Document::new(root.build()))?;

    session.finish()
}

fn entity<'a>(mappings: &'a Mappings, name: &str) -> &'a EntityMapping {
    mappings
        .entity(name)
        .unwrap_or_else(|| panic!("entity {name} not mapped"))
}

fn persister_of(mappings: &Mappings, name: &str) -> Option<PersisterStrategy> {
    mappings
        .root_of(name)
        .and_then(EntityMapping::root)
        .and_then(|r| r.default_persister)
}

#[test]
fn cat_maps_table_identifier_and_defaults() {
    let mappings = bind(
        mapping().child(
            element("class")
                .attr("name", "Cat")
                .attr("table", "CATS")
                .child(id("id", "long"))
                .child(element("property").attr("name", "name")),
        ),
    )
    .unwrap();

    let cat = entity(&mappings, "Cat");
    assert!(cat.is_root());
    assert_eq!(mappings.table_name(cat.table), "CATS");

    let identifier = cat.root().and_then(|r| r.identifier_property()).unwrap();
    assert_eq!(identifier.name, "id");
    assert_eq!(identifier.value.type_name(), Some("long"));

    let name = cat.property("name").unwrap();
    assert_eq!(name.access, "property");
    assert_eq!(name.cascade, "none");

    let table = mappings.table(cat.table).unwrap();
    assert_eq!(table.primary_key.as_ref().unwrap().columns, ["id"]);
    assert!(table.column("name").is_some());
}

#[test]
fn subclass_declared_before_its_superclass_binds_in_one_pass() {
    let mut session = MappingSession::default();
    let document = Document::new(
        mapping()
            .child(
                element("subclass")
                    .attr("name", "Dog")
                    .attr("extends", "Animal")
                    .attr("discriminator-value", "D")
                    .child(element("property").attr("name", "breed").attr("type", "string")),
            )
            .child(class("Animal").child(element("discriminator").attr("column", "kind")))
            .build(),
    );

    assert_eq!(
        session.add_document(&document).unwrap(),
        crate::bind::BindOutcome::Bound
    );
    let mappings = session.finish().unwrap();

    let dog = entity(&mappings, "Dog");
    let animal = entity(&mappings, "Animal");
    assert_eq!(dog.superclass(), Some("Animal"));
    assert_eq!(dog.table, animal.table);
    assert_eq!(dog.discriminator_value, "D");
    assert_eq!(animal.discriminator_value, "Animal");
    assert_eq!(animal.subclasses, ["Dog"]);
    assert_eq!(persister_of(&mappings, "Dog"), Some(PersisterStrategy::SingleTable));

    let root = animal.root().unwrap();
    assert!(root.polymorphic);
    assert!(mappings.table(animal.table).unwrap().column("breed").is_some());
}

#[test]
fn top_level_subclasses_extend_registered_classes() {
    let mut mappings = Mappings::default();
    let document = Document::new(
        mapping()
            .child(class("Animal"))
            .child(element("subclass").attr("name", "Dog").attr("extends", "Animal"))
            .build(),
    );
    crate::bind::bind_document(&mut mappings, &document, &Default::default()).unwrap();

    let again = Document::new(
        mapping()
            .child(element("subclass").attr("name", "Cub").attr("extends", "Animal"))
            .child(element("subclass").attr("name", "Pup").attr("extends", "Dog"))
            .build(),
    );
    crate::bind::bind_document(&mut mappings, &again, &Default::default()).unwrap();

    assert!(mappings.has_entity("Cub"));
    assert!(mappings.has_entity("Pup"));
    assert_eq!(
        mappings.superclass_chain("Pup").iter().map(|e| e.entity_name.as_str()).collect::<Vec<_>>(),
        ["Pup", "Dog", "Animal"]
    );
}

#[test]
fn every_subclass_kind_binds_its_own_properties() {
    let property = |name: &str| element("property").attr("name", name).attr("type", "string");
    let mappings = bind(
        mapping()
            .child(
                class("Animal")
                    .child(element("discriminator").attr("column", "kind"))
                    .child(
                        element("joined-subclass")
                            .attr("name", "Cat")
                            .child(element("key").attr("column", "animal_id"))
                            .child(property("lives")),
                    ),
            )
            .child(
                element("subclass")
                    .attr("name", "Dog")
                    .attr("extends", "Animal")
                    .child(property("breed")),
            )
            .child(
                element("union-subclass")
                    .attr("name", "Bird")
                    .attr("extends", "Animal")
                    .child(property("wingspan")),
            ),
    )
    .unwrap();

    for (name, own) in [("Cat", "lives"), ("Dog", "breed"), ("Bird", "wingspan")] {
        let subclass = entity(&mappings, name);
        assert_eq!(subclass.superclass(), Some("Animal"), "{name}");
        assert!(subclass.property(own).is_some(), "{name}.{own}");
        assert!(
            mappings.table(subclass.table).unwrap().column(own).is_some(),
            "{name}.{own}"
        );
    }
    assert_eq!(entity(&mappings, "Animal").subclasses, ["Cat", "Dog", "Bird"]);
}

#[test]
fn chained_documents_bind_as_their_superclasses_arrive() {
    let orphan_set = |name: &str, key: &str| {
        element("set")
            .attr("name", name)
            .attr("cascade", "all-delete-orphan")
            .child(element("key").attr("column", key))
            .child(element("one-to-many").attr("class", "Toy"))
    };
    let mut session = MappingSession::default();

    let kittens = Document::new(
        mapping()
            .child(
                element("subclass")
                    .attr("name", "Kitten")
                    .attr("extends", "Cat")
                    .child(orphan_set("toys", "kitten_id")),
            )
            .build(),
    );
    let cats = Document::new(
        mapping()
            .child(
                element("subclass")
                    .attr("name", "Cat")
                    .attr("extends", "Animal")
                    .child(orphan_set("beds", "cat_id")),
            )
            .build(),
    );
    let animals = Document::new(
        mapping()
            .child(
                class("Animal")
                    .child(element("discriminator").attr("column", "kind"))
                    .child(orphan_set("tags", "animal_id")),
            )
            .child(class("Toy"))
            .build(),
    );

    assert_eq!(
        session.add_document(&kittens).unwrap(),
        BindOutcome::Deferred {
            missing: vec!["Cat".to_string()]
        }
    );
    assert_eq!(
        session.add_document(&cats).unwrap(),
        BindOutcome::Deferred {
            missing: vec!["Animal".to_string()]
        }
    );
    assert_eq!(session.add_document(&animals).unwrap(), BindOutcome::Bound);
    assert!(session.mappings().is_extends_queue_empty());
    assert_eq!(session.mappings().pending_second_passes(), 3);

    let mappings = session.finish().unwrap();
    assert_eq!(
        mappings
            .superclass_chain("Kitten")
            .iter()
            .map(|e| e.entity_name.as_str())
            .collect::<Vec<_>>(),
        ["Kitten", "Cat", "Animal"]
    );

    // second passes run in the order their documents were bound
    let backrefs: Vec<_> = entity(&mappings, "Toy")
        .properties
        .iter()
        .filter(|p| p.backref.is_some())
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(backrefs, ["_tagsBackref", "_bedsBackref", "_toysBackref"]);
}

#[test]
fn schema_qualified_class_table_is_found_by_its_key() {
    let mappings = bind(
        mapping()
            .attr("schema", "zoo")
            .child(class("Cat").attr("table", "CATS"))
            .child(class("Lion").attr("table", "CATS").attr("schema", "zoo"))
            .child(class("Dog").attr("table", "CATS").attr("schema", "kennel")),
    )
    .unwrap();

    let key = TableKey::new(Some("zoo"), None, "CATS");
    let cat = entity(&mappings, "Cat").table;
    assert_eq!(mappings.find_table(&key), Some(cat));
    assert_eq!(mappings.find_table(&key), Some(entity(&mappings, "Lion").table));
    assert_ne!(entity(&mappings, "Dog").table, cat);
    assert_eq!(
        mappings.find_table(&TableKey::new(Some("kennel"), None, "CATS")),
        Some(entity(&mappings, "Dog").table)
    );
    assert_eq!(mappings.find_table(&TableKey::new(None, None, "CATS")), None);
}

#[test]
fn subclass_of_a_later_sibling_subclass_is_rejected() {
    let err = bind(
        mapping()
            .child(class("Animal"))
            .child(element("subclass").attr("name", "Kitten").attr("extends", "Cat"))
            .child(element("subclass").attr("name", "Cat").attr("extends", "Animal")),
    )
    .unwrap_err();

    assert_eq!(err.message, "Cannot extend unmapped class Cat");
}

#[test]
fn delete_orphan_set_adds_backref_to_the_element_entity() {
    let mappings = bind(
        mapping()
            .child(
                class("Person").child(
                    element("set")
                        .attr("name", "toys")
                        .attr("cascade", "all,delete-orphan")
                        .child(element("key").attr("column", "owner_id"))
                        .child(element("one-to-many").attr("class", "Toy")),
                ),
            )
            .child(class("Toy")),
    )
    .unwrap();

    let toys = mappings.collection("Person.toys").unwrap();
    assert!(toys.orphan_delete);
    assert!(toys.is_one_to_many());
    assert_eq!(toys.collection_table, Some(entity(&mappings, "Toy").table));
    assert!(!toys.key.as_ref().unwrap().is_nullable());

    let backref = entity(&mappings, "Toy").property("_toysBackref").unwrap();
    assert_eq!(backref.access, "backref");
    assert!(!backref.updatable);
    assert!(!backref.selectable);
    let link = backref.backref.as_ref().unwrap();
    assert_eq!(link.kind, BackrefKind::Collection);
    assert_eq!(link.collection_role, "Person.toys");
    assert_eq!(link.entity_name, "Person");

    let toy_table = mappings.table(entity(&mappings, "Toy").table).unwrap();
    assert!(!toy_table.column("owner_id").unwrap().nullable);
    assert!(
        toy_table
            .foreign_keys
            .values()
            .any(|fk| fk.referenced_entity == "Person" && fk.columns == ["owner_id"])
    );
}

#[test]
fn inverse_or_nullable_one_to_many_has_no_backref() {
    let mappings = bind(
        mapping()
            .child(
                class("Person")
                    .child(
                        element("set")
                            .attr("name", "toys")
                            .attr("inverse", "true")
                            .attr("cascade", "delete-orphan")
                            .child(element("key").attr("column", "owner_id"))
                            .child(element("one-to-many").attr("class", "Toy")),
                    )
                    .child(
                        element("bag")
                            .attr("name", "gifts")
                            .child(element("key").attr("column", "giver_id"))
                            .child(element("one-to-many").attr("class", "Toy")),
                    ),
            )
            .child(class("Toy")),
    )
    .unwrap();

    let toy = entity(&mappings, "Toy");
    assert!(toy.property("_toysBackref").is_none());
    assert!(toy.property("_giftsBackref").is_none());
}

#[test]
fn one_to_many_to_unmapped_class_fails_at_finish() {
    let err = bind(
        mapping().child(
            class("Person").child(
                element("set")
                    .attr("name", "toys")
                    .child(element("key").attr("column", "owner_id"))
                    .child(element("one-to-many").attr("class", "Toy")),
            ),
        ),
    )
    .unwrap_err();

    assert_eq!(err.message, "Association references unmapped class: Toy");
}

#[test]
fn value_set_gets_its_own_table() {
    let mappings = bind(
        mapping().child(
            element("class")
                .attr("name", "Person")
                .attr("table", "PEOPLE")
                .child(id("id", "long"))
                .child(
                    element("set")
                        .attr("name", "nicknames")
                        .child(element("key").attr("column", "person_id"))
                        .child(element("element").attr("column", "nickname").attr("type", "string")),
                ),
        ),
    )
    .unwrap();

    let nicknames = mappings.collection("Person.nicknames").unwrap();
    let table = nicknames.collection_table.unwrap();
    assert_eq!(mappings.table_name(table), "PEOPLE_nicknames");
    assert_eq!(nicknames.element.as_ref().unwrap().type_name(), Some("string"));
    assert!(
        mappings
            .table(table)
            .unwrap()
            .foreign_keys
            .values()
            .any(|fk| fk.referenced_entity == "Person")
    );
}

#[test]
fn query_param_types_keep_declaration_order() {
    let mappings = bind(
        mapping().child(
            element("query")
                .attr("name", "adults")
                .text("from Person where age > :age")
                .child(element("query-param").attr("name", "age").attr("type", "integer")),
        ),
    )
    .unwrap();

    let query = mappings.query("adults").unwrap();
    let params: Vec<_> = query
        .settings
        .parameter_types
        .iter()
        .map(|(name, ty)| (name.as_str(), ty.to_string()))
        .collect();
    assert_eq!(params, [("age", "integer".to_string())]);
}

#[test]
fn entity_scoped_query_is_named_after_the_entity() {
    let mappings = bind(
        mapping().child(
            class("Cat").child(
                element("query")
                    .attr("name", "all")
                    .text("from Cat"),
            ),
        ),
    )
    .unwrap();

    assert!(mappings.query("Cat.all").is_some());
    assert!(mappings.query("all").is_none());
}

#[test]
fn joined_subclass_key_is_primary_and_foreign_key() {
    let mappings = bind(
        mapping().child(
            element("class")
                .attr("name", "Animal")
                .attr("table", "ANIMALS")
                .child(id("id", "long"))
                .child(
                    element("joined-subclass")
                        .attr("name", "Cat")
                        .attr("table", "CATS")
                        .child(element("key").attr("column", "animal_id").attr("on-delete", "cascade"))
                        .child(element("property").attr("name", "lives").attr("type", "integer")),
                ),
        ),
    )
    .unwrap();

    let cat = entity(&mappings, "Cat");
    assert_eq!(cat.superclass(), Some("Animal"));
    assert_eq!(persister_of(&mappings, "Cat"), Some(PersisterStrategy::JoinedSubclass));

    let table = mappings.table(cat.table).unwrap();
    assert_eq!(table.name(), "CATS");
    assert_eq!(table.primary_key.as_ref().unwrap().columns, ["animal_id"]);
    let fk = table
        .foreign_keys
        .values()
        .find(|fk| fk.columns == ["animal_id"])
        .unwrap();
    assert_eq!(fk.referenced_entity, "Animal");
    assert!(fk.cascade_delete);
    assert!(table.column("lives").is_some());

    let crate::model::EntityKind::JoinedSubclass { key, .. } = &cat.kind else {
        panic!("expected a joined subclass");
    };
    assert!(matches!(key.as_ref(), Value::Dependant(d) if !d.nullable));
}

#[test]
fn joined_subclass_without_key_is_rejected() {
    let err = bind(
        mapping().child(
            class("Animal").child(element("joined-subclass").attr("name", "Cat").attr("table", "CATS")),
        ),
    )
    .unwrap_err();

    assert_eq!(err.message, "<joined-subclass> must declare a key: Cat");
}

#[test]
fn union_subclass_repeats_the_superclass_columns() {
    let mappings = bind(
        mapping().child(
            element("class")
                .attr("name", "Animal")
                .attr("table", "ANIMALS")
                .attr("abstract", "true")
                .child(id("id", "long"))
                .child(element("property").attr("name", "name").attr("type", "string"))
                .child(
                    element("union-subclass")
                        .attr("name", "Dog")
                        .attr("table", "DOGS")
                        .child(element("property").attr("name", "bark").attr("type", "string")),
                ),
        ),
    )
    .unwrap();

    let dog = entity(&mappings, "Dog");
    assert_eq!(persister_of(&mappings, "Dog"), Some(PersisterStrategy::UnionSubclass));
    assert_eq!(entity(&mappings, "Animal").is_abstract, Some(true));

    let columns: Vec<_> = mappings
        .all_columns(dog.table)
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(columns, ["id", "name", "bark"]);
}

#[test]
fn list_index_gets_an_index_backref() {
    let mappings = bind(
        mapping()
            .child(
                class("Person").child(
                    element("list")
                        .attr("name", "kids")
                        .child(element("key").attr("column", "parent_id").attr("not-null", "true"))
                        .child(
                            element("list-index")
                                .attr("column", "pos")
                                .attr("base", "1")
                                .attr("node", "@pos"),
                        )
                        .child(element("one-to-many").attr("class", "Kid")),
                ),
            )
            .child(class("Kid")),
    )
    .unwrap();

    let kids = mappings.collection("Person.kids").unwrap();
    assert_eq!(kids.base_index, 1);
    assert_eq!(kids.index_node_name.as_deref(), Some("@pos"));
    let index = kids.index.as_ref().unwrap();
    assert_eq!(index.type_name(), Some("integer"));
    assert_eq!(index.column_names(), ["pos"]);

    let kid = entity(&mappings, "Kid");
    assert!(kid.property("_kidsBackref").is_some());
    let index_backref = kid.property("_kidsIndexBackref").unwrap();
    assert_eq!(index_backref.access, "index-backref");
    assert_eq!(index_backref.backref.as_ref().unwrap().kind, BackrefKind::Index);
}

#[test]
fn list_without_index_is_rejected() {
    let err = bind(
        mapping().child(
            class("Person").child(
                element("list")
                    .attr("name", "names")
                    .child(element("key").attr("column", "person_id"))
                    .child(element("element").attr("column", "name").attr("type", "string")),
            ),
        ),
    )
    .unwrap_err();

    assert_eq!(err.message, "<list> must declare an index: Person.names");
}

#[test]
fn map_index_requires_a_type() {
    let err = bind(
        mapping().child(
            class("Player").child(
                element("map")
                    .attr("name", "scores")
                    .attr("table", "SCORES")
                    .child(element("key").attr("column", "player_id"))
                    .child(element("map-key").attr("column", "game"))
                    .child(element("element").attr("column", "score").attr("type", "integer")),
            ),
        ),
    )
    .unwrap_err();

    assert_eq!(err.message, "map index element must specify a type: Player.scores");
}

#[test]
fn typed_map_index_is_bound_into_the_collection_table() {
    let mappings = bind(
        mapping().child(
            class("Player").child(
                element("map")
                    .attr("name", "scores")
                    .attr("table", "SCORES")
                    .child(element("key").attr("column", "player_id"))
                    .child(
                        element("map-key")
                            .attr("column", "game")
                            .attr("type", "string")
                            .attr("node", "@game"),
                    )
                    .child(element("element").attr("column", "score").attr("type", "integer")),
            ),
        ),
    )
    .unwrap();

    let scores = mappings.collection("Player.scores").unwrap();
    let table = mappings.table(scores.collection_table.unwrap()).unwrap();
    assert_eq!(table.name(), "SCORES");
    assert!(table.column("game").is_some());
    assert_eq!(scores.index.as_ref().unwrap().type_name(), Some("string"));
    assert_eq!(scores.index_node_name.as_deref(), Some("@game"));
}

#[test]
fn idbag_binds_its_identifier() {
    let mappings = bind(
        mapping().child(
            class("Post").child(
                element("idbag")
                    .attr("name", "tags")
                    .attr("table", "POST_TAGS")
                    .child(
                        element("collection-id")
                            .attr("column", "tag_id")
                            .attr("type", "long")
                            .child(element("generator").attr("class", "sequence")),
                    )
                    .child(element("key").attr("column", "post_id"))
                    .child(element("element").attr("column", "tag").attr("type", "string")),
            ),
        ),
    )
    .unwrap();

    let tags = mappings.collection("Post.tags").unwrap();
    let identifier = tags.identifier.as_ref().and_then(Value::simple).unwrap();
    assert_eq!(identifier.generator_strategy(), Some("sequence"));
    assert_eq!(identifier.columns().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["tag_id"]);
}

#[test]
fn natural_id_properties_form_a_unique_key() {
    let mappings = bind(
        mapping().child(
            class("Citizen").child(
                element("natural-id").child(element("property").attr("name", "ssn").attr("type", "string")),
            ),
        ),
    )
    .unwrap();

    let citizen = entity(&mappings, "Citizen");
    let ssn = citizen.property("ssn").unwrap();
    assert!(ssn.natural_identifier);
    assert!(!ssn.updatable);

    let table = mappings.table(citizen.table).unwrap();
    assert_eq!(table.unique_keys["_UniqueKey"].columns, ["ssn"]);
    assert!(!table.column("ssn").unwrap().nullable);
}

#[test]
fn join_table_is_keyed_by_the_owner_identifier() {
    let mappings = bind(
        mapping().child(
            class("Person").child(
                element("join")
                    .attr("table", "ADDRESSES")
                    .attr("optional", "true")
                    .child(element("key").attr("column", "person_id"))
                    .child(element("property").attr("name", "street").attr("type", "string")),
            ),
        ),
    )
    .unwrap();

    let person = entity(&mappings, "Person");
    let join = &person.joins[0];
    assert!(join.optional);
    assert!(join.properties[0].optional);

    let table = mappings.table(join.table).unwrap();
    assert_eq!(table.name(), "ADDRESSES");
    assert_eq!(table.primary_key.as_ref().unwrap().columns, ["person_id"]);
    assert!(table.column("street").is_some());
    assert!(person.property("street").is_some());
}

#[test]
fn property_ref_becomes_a_unique_key_and_foreign_key() {
    let mappings = bind(
        mapping()
            .child(
                element("class")
                    .attr("name", "Order")
                    .attr("table", "ORDERS")
                    .child(id("id", "long"))
                    .child(
                        element("many-to-one")
                            .attr("name", "customer")
                            .attr("class", "Customer")
                            .attr("property-ref", "email")
                            .attr("column", "customer_email"),
                    ),
            )
            .child(
                class("Customer").child(element("property").attr("name", "email").attr("type", "string")),
            ),
    )
    .unwrap();

    let email = entity(&mappings, "Customer").property("email").unwrap();
    assert!(email.value.simple().unwrap().alternate_unique_key);

    let orders = mappings.table(entity(&mappings, "Order").table).unwrap();
    let fk = orders
        .foreign_keys
        .values()
        .find(|fk| fk.columns == ["customer_email"])
        .unwrap();
    assert_eq!(fk.referenced_entity, "Customer");
    assert_eq!(fk.referenced_columns, ["email"]);
}

#[test]
fn duplicate_entity_is_rejected() {
    let err = bind(mapping().child(class("Cat")).child(class("Cat"))).unwrap_err();

    assert!(err.message.contains("Cat"));
}

#[test]
fn unsupported_optimistic_lock_is_rejected() {
    let err = bind(mapping().child(class("Cat").attr("optimistic-lock", "sometimes"))).unwrap_err();

    assert_eq!(err.message, "Unsupported optimistic-lock style: sometimes");
}

#[test]
fn package_qualifies_class_and_auto_imports_the_short_name() {
    let mappings = bind(
        element("hibernate-mapping")
            .attr("package", "zoo")
            .child(class("Cat").attr("proxy", "CatProxy"))
            .child(element("import").attr("class", "Keeper")),
    )
    .unwrap();

    let cat = entity(&mappings, "zoo.Cat");
    assert_eq!(cat.class_name.as_deref(), Some("zoo.Cat"));
    assert_eq!(cat.proxy_interface.as_deref(), Some("zoo.CatProxy"));
    assert!(cat.lazy);
    assert_eq!(cat.node_name, "Cat");
    assert_eq!(mappings.import("Cat"), Some("zoo.Cat"));
    assert_eq!(mappings.import("Keeper"), Some("zoo.Keeper"));
}

#[test]
fn database_objects_keep_their_dialect_scopes() {
    let mappings = bind(
        mapping().child(
            element("database-object")
                .child(element("create").text(" create view V as select 1 "))
                .child(element("drop").text("drop view V"))
                .child(element("dialect-scope").attr("name", "postgres")),
        ),
    )
    .unwrap();

    let objects = mappings.auxiliary_database_objects();
    assert_eq!(objects.len(), 1);
    assert!(objects[0].applies_to("postgres"));
    assert!(!objects[0].applies_to("mysql"));
    assert!(matches!(
        &objects[0],
        crate::model::AuxiliaryDatabaseObject::Simple { create, .. } if create == "create view V as select 1"
    ));
}
