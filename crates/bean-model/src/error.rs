//! Error types for operation invocation
//!
//! Every failure raised while executing a [`Statement`](crate::Statement) or
//! evaluating an [`Expression`](crate::Expression) is an [`InvokeError`].

/// Failure raised while invoking an operation on a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    /// The statement has no target to invoke on
    #[error("missing target for operation '{operation}'")]
    MissingTarget {
        /// Operation that could not be dispatched
        operation: String,
    },

    /// The statement has an empty operation name
    #[error("missing operation name")]
    MissingOperation,

    /// No method with a compatible signature exists
    #[error("no method {type_name}.{method} accepting {arity} argument(s)")]
    NoSuchMethod {
        /// Type searched
        type_name: String,
        /// Method name
        method: String,
        /// Number of supplied arguments
        arity: usize,
    },

    /// No constructor with a compatible signature exists
    #[error("no constructor {type_name}({arity} argument(s))")]
    NoSuchConstructor {
        /// Type searched
        type_name: String,
        /// Number of supplied arguments
        arity: usize,
    },

    /// No field with the given name exists
    #[error("no field {type_name}.{field}")]
    NoSuchField {
        /// Type searched
        type_name: String,
        /// Field name
        field: String,
    },

    /// An argument does not match the declared parameter type
    #[error("argument mismatch: expected {expected}, found {found}")]
    ArgumentMismatch {
        /// Declared parameter type
        expected: String,
        /// Description of the supplied argument
        found: String,
    },

    /// Index outside the bounds of an array or list
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds {
        /// Requested index
        index: i64,
        /// Current length
        length: usize,
    },

    /// The operation exists but cannot be performed on this value
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A method body raised a failure
    #[error("{operation} failed: {message}")]
    Raised {
        /// Operation that raised
        operation: String,
        /// Failure message
        message: String,
    },
}

impl InvokeError {
    /// Failure raised by a user-supplied method body
    #[must_use]
    pub fn raised(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Raised {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Argument mismatch for a value of the given description
    #[must_use]
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ArgumentMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Whether this failure is structural (the statement itself is malformed)
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::MissingTarget { .. } | Self::MissingOperation)
    }
}

/// Result alias for invocation
pub type InvokeResult<T> = Result<T, InvokeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_classification() {
        assert!(InvokeError::MissingOperation.is_structural());
        assert!(InvokeError::MissingTarget {
            operation: "setX".into()
        }
        .is_structural());
        assert!(!InvokeError::raised("getX", "boom").is_structural());
    }

    #[test]
    fn display_messages() {
        let err = InvokeError::NoSuchMethod {
            type_name: "demo.Point".into(),
            method: "setZ".into(),
            arity: 1,
        };
        assert_eq!(
            err.to_string(),
            "no method demo.Point.setZ accepting 1 argument(s)"
        );
    }
}
