//! Core of ormeta: binds parsed object/relational mapping documents into a
//! typed mapping model held by the [`Mappings`](registry::Mappings)
//! registry.
//!
//! Binding runs in two phases. The first walks each document and registers
//! entities, tables and named definitions; anything that needs entities
//! from other parts of the unit is queued as a second pass. A
//! [`MappingSession`](session::MappingSession) drives both phases and the
//! extends queue for documents that arrive before their superclasses.

// public exports are one module level down
pub mod bind;
pub mod defaults;
pub mod error;
pub mod meta;
pub mod model;
pub mod naming;
pub mod reflect;
pub mod registry;
pub mod second_pass;
pub mod session;
pub mod types;

///
/// Prelude
///
/// Prelude contains the mapping vocabulary and the session entry points.
///

pub mod prelude {
    pub use crate::{
        bind::BindOutcome,
        error::MappingError,
        meta::MetaMap,
        model::{Collection, EntityKind, EntityMapping, Property, Table, Value},
        naming::{DefaultNamingStrategy, ImprovedNamingStrategy, NamingStrategy},
        reflect::{PropertyTypeResolver, StaticReflection},
        registry::Mappings,
        session::{MappingSession, SessionOptions},
    };
}
