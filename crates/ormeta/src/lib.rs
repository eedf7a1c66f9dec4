//! ## Crate layout
//! - `config`: TOML configuration of a mapping build.
//! - `core`: mapping model, `Mappings` registry, binders and the session.
//! - `tree`: the parsed element tree that binders read.
//!
//! [`Configuration`] is the usual entry point: build it from a
//! [`MappingConfig`](config::MappingConfig), add documents in any order,
//! then `finish` to get the bound [`Mappings`](core::registry::Mappings).

pub use ormeta_config as config;
pub use ormeta_core as core;
pub use ormeta_tree as tree;

mod configuration;
mod error;

pub use configuration::{Configuration, session_options};
pub use error::Error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Configuration, Error,
        config::{MappingConfig, NamingStrategyKind},
        tree::{Document, Element, element},
    };
    pub use ormeta_core::prelude::*;
}
