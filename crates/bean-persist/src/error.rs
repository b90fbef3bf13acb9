//! Encoding errors
//!
//! Every failure of an encoding session is an [`EncodeError`]. None of them
//! escape [`Encoder::write_object`](crate::Encoder::write_object): they are
//! handed to the session's [`FailureListener`](crate::FailureListener).

use bean_introspect::IntrospectionError;
use bean_model::InvokeError;

/// Failure observed while encoding
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    /// No strategy could be resolved for a type
    #[error("no persistence strategy for {type_name}")]
    NoStrategy {
        /// Type without a strategy
        type_name: String,
    },

    /// Evaluating an expression in the original environment failed
    #[error("evaluating {expression} failed: {source}")]
    Evaluation {
        /// Rendered expression
        expression: String,
        /// Underlying failure
        source: InvokeError,
    },

    /// A cloned statement failed to execute and was dropped
    #[error("discarding statement {statement}: {source}")]
    Discarded {
        /// Rendered replay statement
        statement: String,
        /// Underlying failure
        source: InvokeError,
    },

    /// Diffing one property of a bean failed
    #[error("property {type_name}.{property}: {source}")]
    Property {
        /// Bean type
        type_name: String,
        /// Property, field or element being diffed
        property: String,
        /// Underlying failure
        source: Box<EncodeError>,
    },

    /// A statement lacks its target or operation name
    #[error("malformed statement {statement}: {source}")]
    Malformed {
        /// Rendered statement
        statement: String,
        /// Structural failure
        source: InvokeError,
    },

    /// A creation expression depends on the value it creates
    #[error("cyclic construction of {value}")]
    CyclicConstruction {
        /// Value under construction
        value: String,
    },

    /// A value has no replay counterpart after its strategy ran
    #[error("no replay counterpart for {value}")]
    Unbound {
        /// Value that stayed unbound
        value: String,
    },

    /// A strategy keeps rejecting its own instantiation
    #[error("{type_name} cannot be reproduced: {reason}")]
    Unreproducible {
        /// Type of the value
        type_name: String,
        /// What went wrong
        reason: String,
    },

    /// Introspecting a type failed
    #[error("introspection failed: {0}")]
    Introspection(#[from] IntrospectionError),
}

impl EncodeError {
    /// Wrap a failure as belonging to one property of `type_name`
    #[must_use]
    pub fn in_property(self, type_name: &str, property: &str) -> Self {
        Self::Property {
            type_name: type_name.to_string(),
            property: property.to_string(),
            source: Box::new(self),
        }
    }

    /// Innermost failure, unwrapping property context
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Property { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result alias for encoding
pub type EncodeResult<T> = Result<T, EncodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_context_unwraps_to_root_cause() {
        let err = EncodeError::CyclicConstruction {
            value: "Node@1".into(),
        }
        .in_property("demo.Node", "next")
        .in_property("demo.List", "head");

        assert_eq!(
            err.root_cause(),
            &EncodeError::CyclicConstruction {
                value: "Node@1".into()
            }
        );
        assert!(err.to_string().starts_with("property demo.List.head"));
    }
}
