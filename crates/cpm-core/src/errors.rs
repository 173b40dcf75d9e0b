//! Core error types
//!
//! Document operations either succeed or report one of these conditions.
//! Handlers treat them as "the visible effect did not happen", never as fatal.

use crate::dom::ElementId;

/// Errors raised by document operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The id does not refer to an element held by this document.
    #[error("element {0} does not exist")]
    UnknownElement(ElementId),

    /// Appending would make an element its own ancestor.
    #[error("cannot append {child} under {parent}: would create a cycle")]
    Cycle {
        /// Intended parent
        parent: ElementId,
        /// Element being appended
        child: ElementId,
    },

    /// The document root cannot be detached or re-parented.
    #[error("the document root cannot be moved")]
    RootImmutable,
}

impl CoreError {
    /// Whether the error refers to a missing element rather than a structural problem.
    #[must_use]
    pub fn is_missing_element(&self) -> bool {
        matches!(self, Self::UnknownElement(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_element() {
        let err = CoreError::UnknownElement(ElementId::from_raw(7));
        assert_eq!(err.to_string(), "element #7 does not exist");
        assert!(err.is_missing_element());
        assert!(!CoreError::RootImmutable.is_missing_element());
    }
}
