use ormeta_config::ConfigError;
use ormeta_core::error::MappingError;
use thiserror::Error as ThisError;

///
/// Error
/// Top-level error of a mapping build.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}
