use crate::{
    bind::{attr_is, attr_u32},
    error::MappingError,
    model::{Column, Selectable, SimpleValue, TableId},
    registry::Mappings,
};
use ormeta_tree::Element;

// bind_columns
// columns come from a `column` attribute or from nested <column>/<formula>
// elements, never both; with neither, one column may be synthesized from the
// property path
pub(crate) fn bind_columns(
    mappings: &mut Mappings,
    node: &Element,
    value: &mut SimpleValue,
    nullable: bool,
    auto_column: bool,
    path: &str,
) -> Result<(), MappingError> {
    if let Some(name) = node.attribute("column") {
        if node.child("column").is_some() {
            return Err(MappingError::value(
                "column attribute may not be used together with <column> subelement",
            ));
        }
        if node.child("formula").is_some() {
            return Err(MappingError::value(
                "column attribute may not be used together with <formula> subelement",
            ));
        }

        let mut column = Column::new(&mappings.naming_strategy().column_name(name));
        bind_column(node, &mut column, nullable)?;
        add_column(mappings, value, column, &[node]);
    } else {
        let mut count = 0;
        for child in node.children() {
            match child.name() {
                "column" => {
                    let name = child.attribute("name").ok_or_else(|| {
                        MappingError::value(format!("<column> of {path} must specify a name"))
                    })?;
                    let mut column = Column::new(&mappings.naming_strategy().column_name(name));
                    column.type_index = count;
                    count += 1;
                    bind_column(child, &mut column, nullable)?;
                    add_column(mappings, value, column, &[child, node]);
                }
                "formula" => value
                    .selectables
                    .push(Selectable::Formula(child.text_trim().to_string())),
                _ => {}
            }
        }
    }

    if auto_column && value.selectables.is_empty() {
        let name = mappings.naming_strategy().property_to_column_name(path);
        tracing::trace!(path, column = %name, "synthesized column");

        let mut column = Column::new(&name);
        bind_column(node, &mut column, nullable)?;
        add_column(mappings, value, column, &[node]);
    }

    Ok(())
}

// bind_column
fn bind_column(node: &Element, column: &mut Column, nullable: bool) -> Result<(), MappingError> {
    column.length = attr_u32(node, "length")?;
    column.scale = attr_u32(node, "scale")?;
    column.precision = attr_u32(node, "precision")?;
    column.nullable = node.attribute("not-null").map_or(nullable, |v| v == "false");
    column.unique = attr_is(node, "unique", "true");
    column.check = node.attribute("check").map(str::to_string);
    column.default = node.attribute("default").map(str::to_string);
    column.sql_type = node.attribute("sql-type").map(str::to_string);
    column.comment = node.child("comment").map(|c| c.text_trim().to_string());

    Ok(())
}

// add_column
// registers the column on the value's table along with any index or unique
// key named by the column element or its owner
fn add_column(mappings: &mut Mappings, value: &mut SimpleValue, column: Column, sources: &[&Element]) {
    if let Some(table) = value.table {
        add_to_table(mappings, table, &column, sources);
    }

    value.selectables.push(Selectable::Column(column));
}

fn add_to_table(mappings: &mut Mappings, id: TableId, column: &Column, sources: &[&Element]) {
    let Some(table) = mappings.table_mut(id) else {
        return;
    };
    table.add_column(column.clone());

    for source in sources {
        for name in source.attribute("index").into_iter().flat_map(constraint_names) {
            let index = table.index_mut(name);
            if !index.columns.contains(&column.name) {
                index.columns.push(column.name.clone());
            }
        }
        for name in source.attribute("unique-key").into_iter().flat_map(constraint_names) {
            table.unique_key_mut(name).add_column(&column.name);
        }
    }
}

// constraint_names
// index and unique-key attributes list names separated by commas or spaces
fn constraint_names(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([',', ' ']).filter(|s| !s.is_empty())
}
