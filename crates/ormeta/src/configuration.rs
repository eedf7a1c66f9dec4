use crate::Error;
use ormeta_config::{MappingConfig, NamingStrategyKind};
use ormeta_core::{
    bind::BindOutcome,
    meta::MetaMap,
    naming::{DefaultNamingStrategy, ImprovedNamingStrategy, NamingStrategy},
    reflect::{NoReflection, PropertyTypeResolver},
    registry::Mappings,
    session::{MappingSession, SessionOptions},
};
use ormeta_tree::Document;
use std::sync::Arc;

///
/// Configuration
///
/// One mapping build. Documents are bound as they are added; `finish`
/// resolves everything that had to wait for the whole set.
///

#[derive(Debug)]
pub struct Configuration {
    session: MappingSession,
    deferred: usize,
}

impl Configuration {
    #[must_use]
    pub fn new(config: &MappingConfig) -> Self {
        Self::with_reflection(config, Arc::new(NoReflection))
    }

    // with_reflection
    /// Build with a resolver for properties whose mapping omits the type.
    #[must_use]
    pub fn with_reflection(
        config: &MappingConfig,
        reflection: Arc<dyn PropertyTypeResolver>,
    ) -> Self {
        tracing::debug!(
            naming = %config.naming.strategy,
            reject_conflicting_auto_imports = config.imports.reject_conflicting_auto_imports,
            "starting mapping build"
        );

        Self {
            session: MappingSession::new(session_options(config, reflection)),
            deferred: 0,
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        Ok(Self::new(&MappingConfig::from_toml_str(source)?))
    }

    #[must_use]
    pub const fn mappings(&self) -> &Mappings {
        self.session.mappings()
    }

    pub fn add_document(&mut self, document: &Document) -> Result<BindOutcome, Error> {
        self.add_document_with_metas(document, &MetaMap::new())
    }

    pub fn add_document_with_metas(
        &mut self,
        document: &Document,
        metas: &MetaMap,
    ) -> Result<BindOutcome, Error> {
        let outcome = self.session.add_document_with_metas(document, metas)?;
        if let BindOutcome::Deferred { missing } = &outcome {
            self.deferred += 1;
            tracing::debug!(
                document = document.describe(),
                missing = ?missing,
                "document waits for its superclasses"
            );
        }

        Ok(outcome)
    }

    /// Number of documents that had to wait for a superclass when added.
    #[must_use]
    pub const fn deferred_documents(&self) -> usize {
        self.deferred
    }

    pub fn finish(self) -> Result<Mappings, Error> {
        Ok(self.session.finish()?)
    }
}

// session_options
/// Session options described by `config`.
#[must_use]
pub fn session_options(
    config: &MappingConfig,
    reflection: Arc<dyn PropertyTypeResolver>,
) -> SessionOptions {
    let naming: Arc<dyn NamingStrategy> = match config.naming.strategy {
        NamingStrategyKind::Default => Arc::new(DefaultNamingStrategy),
        NamingStrategyKind::Improved => Arc::new(ImprovedNamingStrategy),
    };

    SessionOptions {
        naming,
        reflection,
        reject_conflicting_auto_imports: config.imports.reject_conflicting_auto_imports,
    }
}
