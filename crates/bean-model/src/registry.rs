//! Type name resolution

use crate::builtins;
use crate::types::TypeRef;
use indexmap::IndexMap;

/// Resolves qualified type names
///
/// Lookup order: registered types, the built-in table, then `T[]` array
/// synthesis over a resolvable component.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeRef>,
}

impl TypeRegistry {
    /// Empty registry (built-ins still resolve)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, returning the one it replaced
    pub fn register(&mut self, ty: TypeRef) -> Option<TypeRef> {
        self.types.insert(ty.name().to_string(), ty)
    }

    /// Builder-style registration
    #[must_use]
    pub fn with(mut self, ty: TypeRef) -> Self {
        self.register(ty);
        self
    }

    /// Resolve a qualified name
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<TypeRef> {
        if let Some(ty) = self.types.get(name) {
            return Some(ty.clone());
        }
        if let Some(ty) = builtins::lookup(name) {
            return Some(ty);
        }
        name.strip_suffix("[]")
            .and_then(|component| self.resolve(component))
            .map(|component| builtins::array_of(&component))
    }

    /// Whether a user type with this name is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered user types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no user types are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered user types in registration order
    pub fn iter(&self) -> impl Iterator<Item = &TypeRef> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;

    #[test]
    fn resolution_order() {
        let point = TypeBuilder::class("demo.Point").build();
        let registry = TypeRegistry::new().with(point.clone());

        assert!(registry.resolve("demo.Point").unwrap().ptr_eq(&point));
        assert_eq!(registry.resolve("Integer").unwrap().name(), "Integer");
        let nested = registry.resolve("demo.Point[][]").unwrap();
        assert_eq!(nested.component_type().unwrap().name(), "demo.Point[]");
        assert!(registry.resolve("demo.Missing").is_none());
        assert!(registry.resolve("demo.Missing[]").is_none());
    }
}
