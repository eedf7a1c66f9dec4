use crate::{
    bind::{
        Scope,
        entity::{bind_joined_subclass, bind_root_class, bind_subclass, bind_union_subclass},
        filter::bind_filter_def,
        query::{bind_named_query, bind_named_sql_query, bind_result_set},
    },
    defaults::DocumentDefaults,
    error::MappingError,
    meta::{MetaMap, get_metas},
    model::{AuxiliaryDatabaseObject, TypeDef},
    naming::unqualify,
    registry::{Mappings, PendingDocument},
};
use indexmap::IndexMap;
use ormeta_tree::{Document, Element};
use std::{collections::BTreeSet, sync::Arc};

const SUBCLASS_TAGS: [&str; 3] = ["subclass", "joined-subclass", "union-subclass"];

///
/// BindOutcome
///
/// Whether a document was bound now or parked until the superclasses it
/// extends are mapped.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BindOutcome {
    Bound,
    Deferred { missing: Vec<String> },
}

// extends_needed
/// Superclasses named by `extends` that are neither registered nor declared
/// in the document itself. Sorted, without duplicates.
#[must_use]
pub fn extends_needed(document: &Document, mappings: &Mappings) -> Vec<String> {
    let defaults = DocumentDefaults::from_root(&document.root);

    let mut missing = BTreeSet::new();
    collect_extends(&document.root, &defaults, mappings, &mut missing);
    if missing.is_empty() {
        return Vec::new();
    }

    let mut declared = BTreeSet::new();
    collect_declared(&document.root, &defaults, &mut declared);

    missing.difference(&declared).cloned().collect()
}

fn collect_extends(
    node: &Element,
    defaults: &DocumentDefaults,
    mappings: &Mappings,
    missing: &mut BTreeSet<String>,
) {
    for child in node.children() {
        if SUBCLASS_TAGS.contains(&child.name())
            && let Some(extends) = child.attribute("extends")
        {
            let superclass = defaults.qualify_class(extends);
            if !mappings.has_entity(&superclass) {
                missing.insert(superclass);
            }
        }
    }
}

// collect_declared
// every class the document declares at any depth, by entity name and by
// qualified class name
fn collect_declared(node: &Element, defaults: &DocumentDefaults, declared: &mut BTreeSet<String>) {
    for child in node.children() {
        if child.name() == "class" || SUBCLASS_TAGS.contains(&child.name()) {
            if let Some(entity_name) = child.attribute("entity-name") {
                declared.insert(entity_name.to_string());
            }
            if let Some(name) = child.attribute("name") {
                declared.insert(defaults.qualify_class(name));
            }
        }
        collect_declared(child, defaults, declared);
    }
}

// bind_document
/// Bind one mapping document into `mappings`. A document whose superclasses
/// are not mapped yet is queued instead and reported as deferred.
pub fn bind_document(
    mappings: &mut Mappings,
    document: &Document,
    metas: &MetaMap,
) -> Result<BindOutcome, MappingError> {
    let missing = extends_needed(document, mappings);
    if !missing.is_empty() {
        mappings.enqueue_extends(PendingDocument {
            document: document.clone(),
            metas: metas.clone(),
            missing: missing.clone(),
        });

        return Ok(BindOutcome::Deferred { missing });
    }

    let root = &document.root;
    tracing::debug!(document = document.describe(), "binding mapping document");

    let defaults = Arc::new(DocumentDefaults::from_root(root));
    mappings.set_defaults(Arc::clone(&defaults));
    let scope = Scope::new(defaults, get_metas(root, metas, true));

    for node in root.children_named("filter-def") {
        bind_filter_def(mappings, node)?;
    }
    for node in root.children_named("typedef") {
        bind_type_def(mappings, node)?;
    }

    for node in root.children_named("class") {
        bind_root_class(mappings, &scope, node)?;
    }
    for node in root.children_named("subclass") {
        let superclass = superclass_of(mappings, &scope, node)?;
        bind_subclass(mappings, &scope, node, &superclass)?;
    }
    for node in root.children_named("joined-subclass") {
        let superclass = superclass_of(mappings, &scope, node)?;
        bind_joined_subclass(mappings, &scope, node, &superclass)?;
    }
    for node in root.children_named("union-subclass") {
        let superclass = superclass_of(mappings, &scope, node)?;
        bind_union_subclass(mappings, &scope, node, &superclass)?;
    }

    for node in root.children_named("query") {
        bind_named_query(mappings, node, None)?;
    }
    for node in root.children_named("sql-query") {
        bind_named_sql_query(mappings, &scope, node, None)?;
    }
    for node in root.children_named("resultset") {
        bind_result_set(mappings, &scope, node, None)?;
    }

    for node in root.children_named("import") {
        bind_import(mappings, &scope, node)?;
    }
    for node in root.children_named("database-object") {
        mappings.add_auxiliary_database_object(database_object(node));
    }

    Ok(BindOutcome::Bound)
}

fn bind_type_def(mappings: &mut Mappings, node: &Element) -> Result<(), MappingError> {
    let name = node
        .attribute("name")
        .ok_or_else(|| MappingError::document("<typedef> must specify a name"))?;
    let type_class = node
        .attribute("class")
        .map(str::to_string)
        .ok_or_else(|| MappingError::document(format!("<typedef> must specify a class: {name}")))?;

    let mut parameters = IndexMap::new();
    for param in node.children_named("param") {
        if let Some(param_name) = param.attribute("name") {
            parameters.insert(param_name.to_string(), param.text_trim().to_string());
        }
    }

    tracing::debug!(typedef = name, class = %type_class, "type definition");
    mappings.add_type_def(TypeDef {
        name: name.to_string(),
        type_class,
        parameters,
    });

    Ok(())
}

fn superclass_of(mappings: &Mappings, scope: &Scope, node: &Element) -> Result<String, MappingError> {
    let extends = node.attribute("extends").ok_or_else(|| {
        MappingError::entity(format!("<{}> must specify the class it extends", node.name()))
    })?;
    let superclass = scope.qualify_class(extends);

    if !mappings.has_entity(&superclass) {
        return Err(MappingError::entity(format!(
            "Cannot extend unmapped class {superclass}"
        )));
    }

    Ok(superclass)
}

// bind_import
// the alias defaults to the unqualified class name
fn bind_import(mappings: &mut Mappings, scope: &Scope, node: &Element) -> Result<(), MappingError> {
    let class = scope
        .class_attribute(node, "class")
        .ok_or_else(|| MappingError::document("<import> must specify a class"))?;
    let rename = node.attribute("rename").unwrap_or_else(|| unqualify(&class));

    tracing::debug!(alias = rename, class = %class, "import");
    mappings.add_import(&class, rename)
}

fn database_object(node: &Element) -> AuxiliaryDatabaseObject {
    let dialect_scopes = node
        .children_named("dialect-scope")
        .filter_map(|s| s.attribute("name"))
        .map(str::to_string)
        .collect();

    let definition_class = node
        .child("definition")
        .and_then(|d| d.attribute("class"))
        .map(str::to_string);

    match definition_class {
        Some(definition_class) => AuxiliaryDatabaseObject::Custom {
            definition_class,
            dialect_scopes,
        },
        None => AuxiliaryDatabaseObject::Simple {
            create: node.child("create").map(Element::text_trim).unwrap_or_default().to_string(),
            drop: node.child("drop").map(Element::text_trim).unwrap_or_default().to_string(),
            dialect_scopes,
        },
    }
}
