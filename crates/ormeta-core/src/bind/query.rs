use crate::{
    bind::{Scope, attr_is, attr_u32, qualify, synchronized_tables},
    error::MappingError,
    model::{
        CacheMode, CollectionReturn, EntityReturn, FlushMode, JoinReturn, LockMode, NamedQuery,
        NamedSqlQuery, QuerySettings, ResultSetMapping, RootReturn, ScalarReturn, SqlQueryResults,
    },
    registry::Mappings,
    types::TypeRef,
};
use indexmap::IndexMap;
use ormeta_tree::Element;

const DISCRIMINATOR_RESULT: &str = "class";

// bind_named_query
pub(crate) fn bind_named_query(
    mappings: &mut Mappings,
    node: &Element,
    path: Option<&str>,
) -> Result<(), MappingError> {
    let name = query_name(node, path)?;
    let query = node.text_trim().to_string();
    tracing::debug!(query = %name, text = %query, "named query");

    let settings = query_settings(node)?;
    mappings.add_query(NamedQuery {
        name,
        query,
        settings,
    })
}

// bind_named_sql_query
// results come from a registered result set when resultset-ref is given,
// otherwise from the returns declared inline
pub(crate) fn bind_named_sql_query(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    path: Option<&str>,
) -> Result<(), MappingError> {
    let name = query_name(node, path)?;
    let query = node.text_trim().to_string();
    let settings = query_settings(node)?;

    let results = match node.attribute("resultset-ref").filter(|r| !r.is_empty()) {
        Some(reference) => SqlQueryResults::Ref(reference.to_string()),
        None => SqlQueryResults::Inline(build_result_set(scope, node, &name)?),
    };

    tracing::debug!(query = %name, text = %query, "named sql query");

    mappings.add_sql_query(NamedSqlQuery {
        name,
        query,
        settings,
        results,
        synchronized_tables: synchronized_tables(node),
        callable: attr_is(node, "callable", "true"),
    })
}

// bind_result_set
pub(crate) fn bind_result_set(
    mappings: &mut Mappings,
    scope: &Scope,
    node: &Element,
    path: Option<&str>,
) -> Result<(), MappingError> {
    let name = query_name(node, path)?;
    let mapping = build_result_set(scope, node, &name)?;

    mappings.add_result_set_mapping(mapping)
}

fn query_name(node: &Element, path: Option<&str>) -> Result<String, MappingError> {
    let name = node.attribute("name").ok_or_else(|| {
        MappingError::query(format!("<{}> must specify a name", node.name()))
    })?;

    Ok(path.map_or_else(|| name.to_string(), |p| qualify(p, name)))
}

fn query_settings(node: &Element) -> Result<QuerySettings, MappingError> {
    let mut parameter_types = IndexMap::new();
    for param in node.children_named("query-param") {
        if let (Some(name), Some(ty)) = (param.attribute("name"), param.attribute("type")) {
            parameter_types.insert(name.to_string(), TypeRef::heuristic(ty));
        }
    }

    Ok(QuerySettings {
        cacheable: attr_is(node, "cacheable", "true"),
        cache_region: node.attribute("cache-region").map(str::to_string),
        timeout: attr_u32(node, "timeout")?,
        fetch_size: attr_u32(node, "fetch-size")?,
        flush_mode: node.attribute("flush-mode").map(flush_mode).transpose()?,
        cache_mode: node.attribute("cache-mode").map(cache_mode).transpose()?,
        read_only: attr_is(node, "read-only", "true"),
        comment: node.attribute("comment").map(str::to_string),
        parameter_types,
    })
}

fn flush_mode(raw: &str) -> Result<FlushMode, MappingError> {
    match raw {
        "always" => Ok(FlushMode::Always),
        "auto" => Ok(FlushMode::Auto),
        "commit" => Ok(FlushMode::Commit),
        "never" => Ok(FlushMode::Never),
        _ => Err(MappingError::query(format!("unknown flushmode: {raw}"))),
    }
}

fn cache_mode(raw: &str) -> Result<CacheMode, MappingError> {
    match raw {
        "get" => Ok(CacheMode::Get),
        "ignore" => Ok(CacheMode::Ignore),
        "normal" => Ok(CacheMode::Normal),
        "put" => Ok(CacheMode::Put),
        "refresh" => Ok(CacheMode::Refresh),
        _ => Err(MappingError::query(format!("Unknown Cache Mode: {raw}"))),
    }
}

// lock_mode
// absent means read
fn lock_mode(node: &Element) -> Result<LockMode, MappingError> {
    match node.attribute("lock-mode") {
        None | Some("read") => Ok(LockMode::Read),
        Some("none") => Ok(LockMode::None),
        Some("upgrade") => Ok(LockMode::Upgrade),
        Some("upgrade-nowait") => Ok(LockMode::UpgradeNoWait),
        Some("write") => Ok(LockMode::Write),
        Some(raw) => Err(MappingError::query(format!("unknown lockmode: {raw}"))),
    }
}

// build_result_set
// scalars first; entity returns are numbered by their position among all
// children, which names an alias-less return
fn build_result_set(
    scope: &Scope,
    node: &Element,
    name: &str,
) -> Result<ResultSetMapping, MappingError> {
    let mut mapping = ResultSetMapping::new(name);

    for scalar in node.children_named("return-scalar") {
        let column = scalar.attribute("column").unwrap_or_default();
        let ty = scalar
            .attribute("type")
            .or_else(|| scalar.child("type").and_then(|t| t.attribute("name")))
            .map(TypeRef::heuristic)
            .ok_or_else(|| {
                MappingError::query(format!("could not determine type of scalar column {column}"))
            })?;
        mapping.scalars.push(ScalarReturn {
            column: column.to_string(),
            ty,
        });
    }

    for (position, child) in node.children().iter().enumerate() {
        let entry = match child.name() {
            "return" => bind_return(scope, child, position + 1)?,
            "return-join" => bind_return_join(child)?,
            "load-collection" => bind_load_collection(scope, child)?,
            _ => continue,
        };
        mapping.returns.push(entry);
    }

    Ok(mapping)
}

fn bind_return(scope: &Scope, node: &Element, position: usize) -> Result<EntityReturn, MappingError> {
    let alias = node
        .attribute("alias")
        .filter(|a| !a.is_empty())
        .map_or_else(|| format!("alias_{position}"), str::to_string);

    let entity_name = scope.entity_name_of(node).ok_or_else(|| {
        MappingError::query(format!(
            "<return alias='{alias}'> must specify either a class or entity-name"
        ))
    })?;
    let lock_mode = lock_mode(node)?;
    let property_results = property_results(&alias, node)?;

    Ok(EntityReturn::Root(RootReturn {
        alias,
        entity_name,
        lock_mode,
        property_results,
    }))
}

fn bind_return_join(node: &Element) -> Result<EntityReturn, MappingError> {
    let alias = node.attribute("alias").unwrap_or_default().to_string();
    let lock_mode = lock_mode(node)?;

    let (owner_alias, owner_property) = node
        .attribute("property")
        .and_then(|p| p.rsplit_once('.'))
        .ok_or_else(|| {
            MappingError::query(format!(
                "Role attribute for sql query return [alias={alias}] not formatted correctly {{owningAlias.propertyName}}"
            ))
        })?;
    let property_results = property_results(&alias, node)?;

    Ok(EntityReturn::Join(JoinReturn {
        owner_alias: owner_alias.to_string(),
        owner_property: owner_property.to_string(),
        alias,
        lock_mode,
        property_results,
    }))
}

fn bind_load_collection(scope: &Scope, node: &Element) -> Result<EntityReturn, MappingError> {
    let alias = node.attribute("alias").unwrap_or_default().to_string();
    let lock_mode = lock_mode(node)?;

    let (owner, property) = node
        .attribute("role")
        .and_then(|r| r.rsplit_once('.'))
        .ok_or_else(|| {
            MappingError::query(format!(
                "Collection attribute for sql query return [alias={alias}] not formatted correctly {{OwnerClassName.propertyName}}"
            ))
        })?;
    let property_results = property_results(&alias, node)?;

    Ok(EntityReturn::Collection(CollectionReturn {
        owner_entity_name: scope.qualify_class(owner),
        owner_property: property.to_string(),
        alias,
        lock_mode,
        property_results,
    }))
}

// property_results
// the discriminator is reported under "class", which is reserved for it
fn property_results(
    alias: &str,
    node: &Element,
) -> Result<IndexMap<String, Vec<String>>, MappingError> {
    let mut results = IndexMap::new();

    if let Some(discriminator) = node.child("return-discriminator") {
        results.insert(DISCRIMINATOR_RESULT.to_string(), result_columns(discriminator));
    }

    for property in node.children_named("return-property") {
        let name = property.attribute("name").unwrap_or_default();
        if name == DISCRIMINATOR_RESULT {
            return Err(MappingError::query(
                "class is not a valid property name to use in a <return-property>, use <return-discriminator> instead",
            ));
        }

        let columns = result_columns(property);
        if columns.is_empty() {
            return Err(MappingError::query(format!(
                "return-property for alias {alias} must specify at least one column or return-column name"
            )));
        }
        if results.insert(name.to_string(), columns).is_some() {
            return Err(MappingError::query(format!(
                "duplicate return-property for property {name} on alias {alias}"
            )));
        }
    }

    Ok(results)
}

fn result_columns(node: &Element) -> Vec<String> {
    node.attribute("column")
        .into_iter()
        .chain(node.children_named("return-column").filter_map(|c| c.attribute("name")))
        .map(|c| unquote(c).to_string())
        .collect()
}

/// Strip one pair of backticks from a quoted column name.
fn unquote(name: &str) -> &str {
    name.strip_prefix('`')
        .map_or(name, |rest| rest.strip_suffix('`').unwrap_or(rest))
}
