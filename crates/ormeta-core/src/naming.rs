//! Pluggable mapping from logical names to physical table/column names.

use convert_case::{Case, Casing};
use std::fmt;

///
/// NamingStrategy
///
/// Consulted whenever a mapping omits a physical name or supplies one that
/// must be normalized.
///

pub trait NamingStrategy: fmt::Debug + Send + Sync {
    /// Table name for an entity mapped without an explicit `table`.
    fn class_to_table_name(&self, class_name: &str) -> String;

    /// Column name for a value mapped without any explicit column.
    fn property_to_column_name(&self, property_path: &str) -> String;

    /// Normalize an explicitly given table name.
    fn table_name(&self, table_name: &str) -> String;

    /// Normalize an explicitly given column name.
    fn column_name(&self, column_name: &str) -> String;

    /// Table name for a collection mapped without an explicit `table`.
    fn collection_table_name(
        &self,
        owner_table: &str,
        associated_table: Option<&str>,
        property_path: &str,
    ) -> String;
}

// unqualify
/// Text after the last '.', or the whole input.
#[must_use]
pub fn unqualify(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, tail)| tail)
}

// qualifier
/// Text before the last '.', or empty.
#[must_use]
pub fn qualifier(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(head, _)| head)
}

///
/// DefaultNamingStrategy
///
/// Uses unqualified class and property names as they are.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNamingStrategy;

impl NamingStrategy for DefaultNamingStrategy {
    fn class_to_table_name(&self, class_name: &str) -> String {
        unqualify(class_name).to_string()
    }

    fn property_to_column_name(&self, property_path: &str) -> String {
        unqualify(property_path).to_string()
    }

    fn table_name(&self, table_name: &str) -> String {
        table_name.to_string()
    }

    fn column_name(&self, column_name: &str) -> String {
        column_name.to_string()
    }

    fn collection_table_name(
        &self,
        owner_table: &str,
        associated_table: Option<&str>,
        property_path: &str,
    ) -> String {
        let tail = associated_table.unwrap_or_else(|| unqualify(property_path));
        self.table_name(&format!("{owner_table}_{tail}"))
    }
}

///
/// ImprovedNamingStrategy
///
/// Lower snake case for everything: `OrderLine` → `order_line`,
/// `shippingAddress` → `shipping_address`.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ImprovedNamingStrategy;

impl ImprovedNamingStrategy {
    fn snake(name: &str) -> String {
        name.to_case(Case::Snake)
    }
}

impl NamingStrategy for ImprovedNamingStrategy {
    fn class_to_table_name(&self, class_name: &str) -> String {
        Self::snake(unqualify(class_name))
    }

    fn property_to_column_name(&self, property_path: &str) -> String {
        Self::snake(unqualify(property_path))
    }

    fn table_name(&self, table_name: &str) -> String {
        Self::snake(table_name)
    }

    fn column_name(&self, column_name: &str) -> String {
        Self::snake(column_name)
    }

    fn collection_table_name(
        &self,
        owner_table: &str,
        associated_table: Option<&str>,
        property_path: &str,
    ) -> String {
        let tail = associated_table.unwrap_or_else(|| unqualify(property_path));
        format!("{}_{}", Self::snake(owner_table), Self::snake(tail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unqualify_and_qualifier_split_on_last_dot() {
        assert_eq!(unqualify("org.zoo.Cat"), "Cat");
        assert_eq!(unqualify("Cat"), "Cat");
        assert_eq!(qualifier("org.zoo.Cat"), "org.zoo");
        assert_eq!(qualifier("Cat"), "");
    }

    #[test]
    fn default_strategy_keeps_names() {
        let ns = DefaultNamingStrategy;

        assert_eq!(ns.class_to_table_name("org.zoo.Cat"), "Cat");
        assert_eq!(ns.property_to_column_name("Cat.mate.name"), "name");
        assert_eq!(ns.table_name("CATS"), "CATS");
        assert_eq!(ns.collection_table_name("CATS", None, "Cat.kittens"), "CATS_kittens");
        assert_eq!(
            ns.collection_table_name("CATS", Some("TOYS"), "Cat.toys"),
            "CATS_TOYS"
        );
    }

    #[test]
    fn improved_strategy_snake_cases() {
        let ns = ImprovedNamingStrategy;

        assert_eq!(ns.class_to_table_name("org.shop.OrderLine"), "order_line");
        assert_eq!(ns.property_to_column_name("shippingAddress"), "shipping_address");
        assert_eq!(ns.column_name("unitPrice"), "unit_price");
        assert_eq!(
            ns.collection_table_name("Order", None, "Order.lineItems"),
            "order_line_items"
        );
    }
}
