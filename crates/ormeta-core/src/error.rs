use std::fmt;
use thiserror::Error as ThisError;

///
/// MappingError
///
/// The one configuration error the binder raises. There is no recovery
/// inside the binder: the first error aborts the bind in progress.
/// `origin` only classifies where the error was raised for diagnostics.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct MappingError {
    pub origin: ErrorOrigin,
    pub message: String,
}

impl MappingError {
    pub fn new(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            origin,
            message: message.into(),
        }
    }

    pub(crate) fn document(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::Document, message)
    }

    pub(crate) fn entity(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::Entity, message)
    }

    pub(crate) fn identifier(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::Identifier, message)
    }

    pub(crate) fn property(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::Property, message)
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::Value, message)
    }

    pub(crate) fn collection(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::Collection, message)
    }

    pub(crate) fn filter(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::Filter, message)
    }

    pub(crate) fn query(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::Query, message)
    }

    pub(crate) fn registry(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::Registry, message)
    }

    pub(crate) fn second_pass(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::SecondPass, message)
    }

    // invalid_number
    // numeric attributes that do not parse are reported with their element
    pub(crate) fn invalid_number(element: &str, attribute: &str, raw: &str) -> Self {
        Self::value(format!(
            "attribute '{attribute}' of <{element}> is not a valid number: '{raw}'"
        ))
    }

    #[must_use]
    pub fn display_with_origin(&self) -> String {
        format!("{}: {}", self.origin, self.message)
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    Collection,
    Document,
    Entity,
    Filter,
    Identifier,
    Property,
    Query,
    Registry,
    SecondPass,
    Value,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Collection => "collection",
            Self::Document => "document",
            Self::Entity => "entity",
            Self::Filter => "filter",
            Self::Identifier => "identifier",
            Self::Property => "property",
            Self::Query => "query",
            Self::Registry => "registry",
            Self::SecondPass => "second_pass",
            Self::Value => "value",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        let err = MappingError::entity("Unable to determine entity name");

        assert_eq!(err.to_string(), "Unable to determine entity name");
        assert_eq!(
            err.display_with_origin(),
            "entity: Unable to determine entity name"
        );
    }

    #[test]
    fn invalid_number_names_element_and_attribute() {
        let err = MappingError::invalid_number("column", "length", "ten");

        assert_eq!(err.origin, ErrorOrigin::Value);
        assert!(err.message.contains("'length'"));
        assert!(err.message.contains("<column>"));
    }
}
