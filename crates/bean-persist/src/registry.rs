//! Strategy registry
//!
//! Resolves the strategy for a type. In order: explicit registrations, the
//! built-in categories (self-evident values, primitives, enumerations,
//! arrays, proxies, named library types), a strategy the type declares
//! through its bean attributes, declared constructor properties, and
//! finally the convention-driven default. Everything but explicit
//! registrations is cached per type name.

use crate::strategies::{
    ArrayStrategy, CollectionStrategy, DateStrategy, DefaultStrategy, EnumStrategy, ListStrategy,
    MapStrategy, NullStrategy, PrimitiveStrategy, ProxyStrategy, SelfEvidentStrategy,
    UnmodifiableStrategy,
};
use crate::strategy::{DeclaredStrategy, PersistenceStrategy, STRATEGY_ATTRIBUTE};
use bean_introspect::Introspector;
use bean_model::{Layout, PrimitiveKind, TypeRef};
use std::collections::HashMap;
use std::rc::Rc;

/// Shared strategy handle
pub type StrategyRef = Rc<dyn PersistenceStrategy>;

/// Per-session strategy table
#[derive(Debug)]
pub struct StrategyRegistry {
    explicit: HashMap<String, StrategyRef>,
    named: HashMap<String, StrategyRef>,
    cache: HashMap<String, StrategyRef>,
    null: StrategyRef,
    self_evident: StrategyRef,
    primitive: StrategyRef,
    enumeration: StrategyRef,
    array: StrategyRef,
    proxy: StrategyRef,
    default: StrategyRef,
}

impl StrategyRegistry {
    /// Registry with the built-in strategies
    #[must_use]
    pub fn new() -> Self {
        let mut named: HashMap<String, StrategyRef> = HashMap::new();
        named.insert("List".into(), Rc::new(ListStrategy));
        named.insert("Set".into(), Rc::new(CollectionStrategy));
        named.insert("Map".into(), Rc::new(MapStrategy));
        named.insert("Date".into(), Rc::new(DateStrategy));
        let unmodifiable: StrategyRef = Rc::new(UnmodifiableStrategy);
        for name in ["UnmodifiableList", "UnmodifiableSet", "UnmodifiableMap"] {
            named.insert(name.into(), unmodifiable.clone());
        }
        named.insert(
            "EventHandler".into(),
            Rc::new(DefaultStrategy::with_constructor_properties([
                "target",
                "action",
                "eventPropertyName",
                "listenerMethodName",
            ])),
        );

        Self {
            explicit: HashMap::new(),
            named,
            cache: HashMap::new(),
            null: Rc::new(NullStrategy),
            self_evident: Rc::new(SelfEvidentStrategy),
            primitive: Rc::new(PrimitiveStrategy),
            enumeration: Rc::new(EnumStrategy),
            array: Rc::new(ArrayStrategy),
            proxy: Rc::new(ProxyStrategy),
            default: Rc::new(DefaultStrategy::new()),
        }
    }

    /// Install a strategy for `type_name`, overriding everything else
    pub fn register(&mut self, type_name: &str, strategy: StrategyRef) -> Option<StrategyRef> {
        self.explicit.insert(type_name.to_string(), strategy)
    }

    /// Remove an explicit registration
    pub fn unregister(&mut self, type_name: &str) -> Option<StrategyRef> {
        self.explicit.remove(type_name)
    }

    /// Whether `type_name` has an explicit registration
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.explicit.contains_key(type_name)
    }

    /// Number of explicit registrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.explicit.len()
    }

    /// Whether there are no explicit registrations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.explicit.is_empty()
    }

    /// Forget resolved strategies
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Strategy for `ty`, or the null strategy for the absent type
    pub fn resolve(&mut self, ty: Option<&TypeRef>, introspector: &mut Introspector) -> StrategyRef {
        let Some(ty) = ty else {
            return self.null.clone();
        };
        if let Some(strategy) = self.explicit.get(ty.name()) {
            return strategy.clone();
        }
        if let Some(strategy) = self.cache.get(ty.name()) {
            return strategy.clone();
        }
        let strategy = self.lookup(ty, introspector);
        tracing::debug!(type_name = ty.name(), strategy = strategy.name(), "resolved strategy");
        self.cache.insert(ty.name().to_string(), strategy.clone());
        strategy
    }

    fn lookup(&self, ty: &TypeRef, introspector: &mut Introspector) -> StrategyRef {
        if matches!(ty.name(), "String" | "Class" | "Field") {
            return self.self_evident.clone();
        }
        if ty.primitive().is_some() || PrimitiveKind::from_wrapper_name(ty.name()).is_some() {
            return self.primitive.clone();
        }
        if ty.is_subtype_of("Enum") {
            return self.enumeration.clone();
        }
        if ty.component_type().is_some() {
            return self.array.clone();
        }
        if ty.layout() == Layout::Proxy {
            return self.proxy.clone();
        }
        if let Some(strategy) = self.named.get(ty.name()) {
            return strategy.clone();
        }
        match introspector.bean_info(ty) {
            Ok(info) => {
                let declared = info
                    .bean_descriptor()
                    .attribute(STRATEGY_ATTRIBUTE)
                    .and_then(|attr| attr.downcast_ref::<DeclaredStrategy>());
                if let Some(DeclaredStrategy(strategy)) = declared {
                    return strategy.clone();
                }
            }
            Err(error) => {
                tracing::debug!(type_name = ty.name(), %error, "introspection failed during strategy lookup");
            }
        }
        if let Some(names) = ty.constructor_properties() {
            return Rc::new(DefaultStrategy::with_constructor_properties(names.iter().cloned()));
        }
        self.default.clone()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
