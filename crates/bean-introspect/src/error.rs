//! Introspection errors

/// Failure describing a type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntrospectionError {
    /// The declared default property does not exist
    #[error("{type_name}: unknown default property '{name}'")]
    UnknownDefaultProperty {
        /// Described type
        type_name: String,
        /// Declared name
        name: String,
    },

    /// The declared default event set does not exist
    #[error("{type_name}: unknown default event '{name}'")]
    UnknownDefaultEvent {
        /// Described type
        type_name: String,
        /// Declared name
        name: String,
    },

    /// No setter accepts the getter's type
    #[error("{type_name}.{property}: getter returns {getter} but setter takes {setter}")]
    ConflictingAccessors {
        /// Described type
        type_name: String,
        /// Property name
        property: String,
        /// Getter return type
        getter: String,
        /// First setter parameter type
        setter: String,
    },
}

/// Result alias for introspection
pub type IntrospectionResult<T> = Result<T, IntrospectionError>;
