//! Encoder configuration

use serde::{Deserialize, Serialize};

/// Knobs of an encoding session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Execute cloned statements against the replay environment
    ///
    /// With execution off, candidates never absorb earlier mutations, so
    /// later diffs compare against freshly constructed state.
    pub execute_statements: bool,
    /// Keep the statement log for a framing layer
    pub record_statements: bool,
    /// Supertypes whose instances get listener registrations diffed
    pub listener_roots: Vec<String>,
    /// Listener types never diffed (registered by the component itself)
    pub excluded_listener_types: Vec<String>,
    /// Nested instantiations of one value before it is declared unreproducible
    pub max_instantiations: usize,
}

impl EncoderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With statement execution toggled
    #[inline]
    #[must_use]
    pub fn with_execute_statements(mut self, execute: bool) -> Self {
        self.execute_statements = execute;
        self
    }

    /// With statement recording toggled
    #[inline]
    #[must_use]
    pub fn with_record_statements(mut self, record: bool) -> Self {
        self.record_statements = record;
        self
    }

    /// With listener-diffing supertypes
    #[must_use]
    pub fn with_listener_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.listener_roots = roots.into_iter().map(Into::into).collect();
        self
    }

    /// With excluded listener types
    #[must_use]
    pub fn with_excluded_listener_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_listener_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// With instantiation limit
    #[inline]
    #[must_use]
    pub fn with_max_instantiations(mut self, max: usize) -> Self {
        self.max_instantiations = max;
        self
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            execute_statements: true,
            record_statements: true,
            listener_roots: vec!["Component".to_string()],
            excluded_listener_types: vec!["ComponentListener".to_string()],
            max_instantiations: 2,
        }
    }
}
