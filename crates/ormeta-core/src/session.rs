//! Session driver: binds documents, re-drives the extends queue and runs
//! the deferred work once every document is in.

use crate::{
    bind::{BindOutcome, bind_document},
    error::MappingError,
    meta::MetaMap,
    naming::{DefaultNamingStrategy, NamingStrategy},
    reflect::{NoReflection, PropertyTypeResolver},
    registry::Mappings,
};
use ormeta_tree::Document;
use std::sync::Arc;

///
/// SessionOptions
///

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub naming: Arc<dyn NamingStrategy>,
    pub reflection: Arc<dyn PropertyTypeResolver>,
    pub reject_conflicting_auto_imports: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            naming: Arc::new(DefaultNamingStrategy),
            reflection: Arc::new(NoReflection),
            reject_conflicting_auto_imports: true,
        }
    }
}

///
/// MappingSession
///
/// Owns the registry for one configuration build. Documents may arrive in
/// any order; a document that extends an unmapped class waits in the
/// extends queue until its superclasses are registered.
///

#[derive(Debug)]
pub struct MappingSession {
    mappings: Mappings,
}

impl Default for MappingSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl MappingSession {
    #[must_use]
    pub fn new(options: SessionOptions) -> Self {
        let mappings = Mappings::new(options.naming, options.reflection)
            .with_conflicting_auto_imports_rejected(options.reject_conflicting_auto_imports);

        Self { mappings }
    }

    #[must_use]
    pub const fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    pub fn add_document(&mut self, document: &Document) -> Result<BindOutcome, MappingError> {
        self.add_document_with_metas(document, &MetaMap::new())
    }

    // add_document_with_metas
    /// Bind `document` with `metas` inherited from outside it. Binding a
    /// document may unblock queued ones, so the queue is re-driven after
    /// every successful bind.
    pub fn add_document_with_metas(
        &mut self,
        document: &Document,
        metas: &MetaMap,
    ) -> Result<BindOutcome, MappingError> {
        let outcome = bind_document(&mut self.mappings, document, metas)?;
        if outcome == BindOutcome::Bound {
            self.process_extends_queue()?;
        }

        Ok(outcome)
    }

    // process_extends_queue
    /// Bind queued documents whose superclasses are now registered, round
    /// after round, until a round finds nothing ready. Every round binds at
    /// least one document, so the loop ends. Returns how many were bound.
    pub fn process_extends_queue(&mut self) -> Result<usize, MappingError> {
        let mut bound = 0;
        let mut round = 0_usize;

        loop {
            let ready = self.mappings.take_ready_extends();
            if ready.is_empty() {
                break;
            }
            round += 1;
            tracing::debug!(round, documents = ready.len(), "re-binding deferred documents");

            for pending in ready {
                if bind_document(&mut self.mappings, &pending.document, &pending.metas)?
                    == BindOutcome::Bound
                {
                    bound += 1;
                }
            }
        }

        Ok(bound)
    }

    // finish
    /// Fail on superclasses that never appeared, then run the queued second
    /// passes in order and apply property references.
    pub fn finish(mut self) -> Result<Mappings, MappingError> {
        self.process_extends_queue()?;

        if !self.mappings.is_extends_queue_empty() {
            let missing = self.mappings.extends_queue_names().join(", ");
            return Err(MappingError::document(format!(
                "superclasses referenced in extends not found: {missing}"
            )));
        }

        let mut mappings = self.mappings;
        tracing::debug!(passes = mappings.pending_second_passes(), "running second passes");
        while let Some(pass) = mappings.next_second_pass() {
            pass.run(&mut mappings)?;
        }
        mappings.apply_property_references()?;

        tracing::debug!(
            entities = mappings.entities().count(),
            collections = mappings.collections().count(),
            "mapping session finished"
        );

        Ok(mappings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormeta_tree::element;

    fn document(root: ormeta_tree::ElementBuilder) -> Document {
        Document::new(root.build())
    }

    #[test]
    fn deferred_document_binds_once_superclass_arrives() {
        let mut session = MappingSession::default();

        let dogs = document(element("hibernate-mapping").child(
            element("subclass")
                .attr("name", "Dog")
                .attr("extends", "Animal")
                .attr("discriminator-value", "D"),
        ));
        let outcome = session.add_document(&dogs).unwrap();
        assert_eq!(
            outcome,
            BindOutcome::Deferred {
                missing: vec!["Animal".to_string()]
            }
        );
        assert!(!session.mappings().has_entity("Dog"));

        let animals = document(
            element("hibernate-mapping").child(
                element("class")
                    .attr("name", "Animal")
                    .child(element("id").attr("name", "id").attr("type", "long"))
                    .child(element("discriminator").attr("column", "kind")),
            ),
        );
        assert_eq!(session.add_document(&animals).unwrap(), BindOutcome::Bound);
        assert!(session.mappings().has_entity("Dog"));

        let mappings = session.finish().unwrap();
        assert_eq!(mappings.entity("Dog").unwrap().superclass(), Some("Animal"));
    }

    #[test]
    fn finish_reports_superclasses_that_never_appear() {
        let mut session = MappingSession::default();
        let orphan = document(
            element("hibernate-mapping")
                .child(element("subclass").attr("name", "Dog").attr("extends", "Wolf"))
                .child(element("joined-subclass").attr("name", "Cub").attr("extends", "Bear")),
        );
        session.add_document(&orphan).unwrap();

        let err = session.finish().unwrap_err();
        assert_eq!(
            err.message,
            "superclasses referenced in extends not found: Bear, Wolf"
        );
    }

    #[test]
    fn long_superclass_chain_delivered_child_first_resolves() {
        const DEPTH: usize = 140;
        let mut session = MappingSession::default();

        for level in (1..=DEPTH).rev() {
            let outcome = session
                .add_document(&document(element("hibernate-mapping").child(
                    element("subclass")
                        .attr("name", format!("C{level}"))
                        .attr("extends", format!("C{}", level - 1)),
                )))
                .unwrap();
            assert!(matches!(outcome, BindOutcome::Deferred { .. }));
        }

        let root = document(
            element("hibernate-mapping").child(
                element("class")
                    .attr("name", "C0")
                    .child(element("id").attr("name", "id").attr("type", "long"))
                    .child(element("discriminator").attr("column", "kind")),
            ),
        );
        assert_eq!(session.add_document(&root).unwrap(), BindOutcome::Bound);
        assert!(session.mappings().is_extends_queue_empty());

        let mappings = session.finish().unwrap();
        let chain = mappings.superclass_chain(&format!("C{DEPTH}"));
        assert_eq!(chain.len(), DEPTH + 1);
        assert_eq!(chain.last().unwrap().entity_name, "C0");
    }
}
