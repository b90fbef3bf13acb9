//! Persistence strategy abstraction
//!
//! A strategy knows how to recreate values of one type from statements: an
//! instantiation expression plus the mutations that turn a fresh candidate
//! into an equivalent of the original.

use crate::encoder::Encoder;
use crate::error::EncodeResult;
use bean_model::{Expression, TypeRef, Value};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Bean attribute under which a type declares its own strategy
pub const STRATEGY_ATTRIBUTE: &str = "persistenceStrategy";

/// How values of a type are turned into statements
///
/// Every method receives the encoder and reports through it; nothing here
/// should panic on values it cannot handle.
pub trait PersistenceStrategy: fmt::Debug {
    /// Short name for diagnostics
    fn name(&self) -> &'static str;

    /// Whether `candidate` can be mutated into an equivalent of `old`
    ///
    /// The default accepts any non-null candidate of the same runtime type.
    fn mutates_to(&self, old: &Value, candidate: &Value) -> bool {
        match (old.runtime_type(), candidate.runtime_type()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Expression whose value is `old`, preset so that evaluating it in the
    /// original environment never runs it
    ///
    /// # Errors
    /// When the inputs to the expression cannot be obtained
    fn instantiate(&self, old: &Value, encoder: &mut Encoder) -> EncodeResult<Expression>;

    /// Emit statements turning `candidate` into an equivalent of `old`,
    /// for the part of the state declared by `ty`
    ///
    /// The default defers to the supertype's strategy.
    ///
    /// # Errors
    /// Failures that abort the whole value
    fn initialize(
        &self,
        ty: &TypeRef,
        old: &Value,
        candidate: &Value,
        encoder: &mut Encoder,
    ) -> EncodeResult<()> {
        initialize_supertype(ty, old, candidate, encoder)
    }

    /// Ensure `old` is bound to an equivalent replay value
    ///
    /// # Errors
    /// Failures that leave `old` without a usable counterpart
    fn write_object(&self, old: &Value, encoder: &mut Encoder) -> EncodeResult<()> {
        let candidate = encoder.try_get(old)?;
        if self.mutates_to(old, &candidate) {
            let Some(ty) = old.runtime_type() else {
                return Ok(());
            };
            self.initialize(&ty, old, &candidate, encoder)
        } else {
            encoder.guard_instantiation(old, |encoder| {
                encoder.remove(old);
                let expression = self.instantiate(old, encoder)?;
                encoder.write_expression(&expression)
            })
        }
    }
}

/// Run the supertype's strategy over the part of the state it declares
///
/// # Errors
/// Whatever the supertype's strategy raises
pub fn initialize_supertype(
    ty: &TypeRef,
    old: &Value,
    candidate: &Value,
    encoder: &mut Encoder,
) -> EncodeResult<()> {
    match ty.supertype() {
        Some(parent) => {
            let parent = parent.clone();
            let strategy = encoder.strategy_for_type(&parent);
            strategy.initialize(&parent, old, candidate, encoder)
        }
        None => Ok(()),
    }
}

/// Strategy a type declares for itself through [`STRATEGY_ATTRIBUTE`]
#[derive(Debug, Clone)]
pub struct DeclaredStrategy(pub Rc<dyn PersistenceStrategy>);

impl DeclaredStrategy {
    /// Attribute value declaring `strategy`
    #[must_use]
    pub fn attribute(strategy: impl PersistenceStrategy + 'static) -> Rc<dyn Any> {
        Rc::new(Self(Rc::new(strategy)))
    }
}
