//! Instance naming
//!
//! Session-scoped names for values that need cross references: unqualified
//! type name plus a per-type counter starting at zero.

use crate::types::TypeDescriptor;
use crate::value::{Identity, Value};
use std::collections::HashMap;

/// Per-session instance namer
///
/// Names are stable per identity until [`NameGenerator::clear`]. The
/// generator keeps named values alive so identities cannot be reused while
/// the session lasts.
#[derive(Debug, Default)]
pub struct NameGenerator {
    names: HashMap<Identity, (Value, String)>,
    counters: HashMap<String, usize>,
}

impl NameGenerator {
    /// Empty generator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every name and counter
    pub fn clear(&mut self) {
        self.names.clear();
        self.counters.clear();
    }

    /// Name for `value`
    ///
    /// `null` for null, the unqualified name for types and the quoted text
    /// for strings; everything else gets `<Type><n>`.
    pub fn instance_name(&mut self, value: &Value) -> String {
        let (identity, ty) = match (value, value.identity(), value.runtime_type()) {
            (Value::Type(ty), _, _) => return unqualified_type_name(ty),
            (Value::Str(s), _, _) => return format!("{s:?}"),
            (_, Some(identity), Some(ty)) => (identity, ty),
            _ => return "null".to_string(),
        };
        if let Some((_, name)) = self.names.get(&identity) {
            return name.clone();
        }
        let class_name = unqualified_type_name(&ty);
        let counter = self.counters.entry(class_name.clone()).or_insert(0);
        let name = format!("{class_name}{counter}");
        *counter += 1;
        self.names.insert(identity, (value.clone(), name.clone()));
        name
    }
}

/// Unqualified name; arrays become `<Component>Array`
#[must_use]
pub fn unqualified_type_name(ty: &TypeDescriptor) -> String {
    match ty.component_type() {
        Some(component) => format!("{}Array", unqualified_type_name(component)),
        None => ty.simple_name().to_string(),
    }
}

/// Upper-case the first character
#[must_use]
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
