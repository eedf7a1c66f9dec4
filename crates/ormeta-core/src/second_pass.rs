//! Deferred binding work.
//!
//! A second pass captures the element it came from plus the context needed
//! to finish binding once every entity of the current unit is registered.
//! Passes run exactly once, in the order they were queued.

use crate::{
    bind::{self, Scope},
    error::MappingError,
    model::TableId,
    registry::Mappings,
};
use derive_more::Display;
use ormeta_tree::Element;

///
/// SecondPass
///

#[derive(Clone, Debug, Display)]
pub enum SecondPass {
    #[display("collection {}", _0.role)]
    Collection(CollectionPass),

    #[display("identifier collection {}", _0.role)]
    IdentifierCollection(CollectionPass),

    #[display("list {}", _0.role)]
    List(CollectionPass),

    #[display("map {}", _0.role)]
    Map(CollectionPass),

    #[display("property-ref {}.{}", _0.referenced_entity, _0.referenced_property)]
    ManyToOnePropertyRef(PropertyRefPass),
}

impl SecondPass {
    /// Finish the deferred binding against a registry that now holds every
    /// entity of the unit.
    pub fn run(self, mappings: &mut Mappings) -> Result<(), MappingError> {
        tracing::debug!(pass = %self, "running second pass");

        match self {
            Self::Collection(pass) => bind::bind_collection_second_pass(mappings, &pass),
            Self::IdentifierCollection(pass) => {
                bind::bind_identifier_collection_second_pass(mappings, &pass)
            }
            Self::List(pass) => bind::bind_list_second_pass(mappings, &pass),
            Self::Map(pass) => bind::bind_map_second_pass(mappings, &pass),
            Self::ManyToOnePropertyRef(pass) => bind::bind_property_ref_constraint(mappings, &pass),
        }
    }
}

///
/// CollectionPass
///
/// The collection element and the scope it was declared in. The collection
/// itself is already registered under `role`.
///

#[derive(Clone, Debug)]
pub struct CollectionPass {
    pub role: String,
    pub node: Element,
    pub scope: Scope,
}

///
/// PropertyRefPass
///
/// A many-to-one pointing at a non-identifier property. Its foreign key can
/// only be built once the referenced property's columns are known.
///

#[derive(Clone, Debug)]
pub struct PropertyRefPass {
    pub table: Option<TableId>,
    pub columns: Vec<String>,
    pub has_formula: bool,
    pub referenced_entity: String,
    pub referenced_property: String,
    pub foreign_key_name: Option<String>,
    pub cascade_delete: bool,
}
