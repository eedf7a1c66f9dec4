use crate::{
    error::MappingError,
    model::{FilterDefinition, FilterUse},
    registry::Mappings,
    types::TypeRef,
};
use indexmap::IndexMap;
use ormeta_tree::Element;

// bind_filter_def
pub(crate) fn bind_filter_def(mappings: &mut Mappings, node: &Element) -> Result<(), MappingError> {
    let name = node
        .attribute("name")
        .ok_or_else(|| MappingError::filter("<filter-def> must specify a name"))?;
    tracing::debug!(filter = name, "parsing filter-def");

    let default_condition = condition_of(node);

    let mut parameter_types = IndexMap::new();
    for param in node.children_named("filter-param") {
        let (Some(param_name), Some(type_name)) = (param.attribute("name"), param.attribute("type"))
        else {
            continue;
        };
        let ty = TypeRef::heuristic(type_name);
        tracing::debug!(filter = name, parameter = param_name, ?ty, "filter parameter");
        parameter_types.insert(param_name.to_string(), ty);
    }

    mappings.add_filter_definition(FilterDefinition {
        name: name.to_string(),
        default_condition,
        parameter_types,
    });

    Ok(())
}

// parse_filter
// the condition comes from the element text, then the condition attribute,
// then the default of a filter definition bound earlier
pub(crate) fn parse_filter(mappings: &Mappings, node: &Element) -> Result<FilterUse, MappingError> {
    let name = node
        .attribute("name")
        .ok_or_else(|| MappingError::filter("<filter> must specify a name"))?;

    let condition = condition_of(node)
        .or_else(|| {
            mappings
                .filter_definition(name)
                .and_then(|def| def.default_condition.clone())
        })
        .ok_or_else(|| MappingError::filter(format!("no filter condition found for filter: {name}")))?;

    tracing::debug!(filter = name, condition = %condition, "applying filter");

    Ok(FilterUse {
        name: name.to_string(),
        condition,
    })
}

fn condition_of(node: &Element) -> Option<String> {
    let text = node.text_trim();
    if !text.is_empty() {
        return Some(text.to_string());
    }

    node.attribute("condition")
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
