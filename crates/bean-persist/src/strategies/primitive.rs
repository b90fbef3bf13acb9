use crate::encoder::Encoder;
use crate::error::{EncodeError, EncodeResult};
use crate::strategy::PersistenceStrategy;
use bean_model::{builtins, Expression, PrimitiveKind, TypeRef, Value};

/// Strategy for primitives and their wrappers
///
/// Recreated from their textual form through the wrapper's string
/// constructor; equal values need no statements at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitiveStrategy;

impl PersistenceStrategy for PrimitiveStrategy {
    fn name(&self) -> &'static str {
        "primitive"
    }

    fn mutates_to(&self, old: &Value, candidate: &Value) -> bool {
        old.equals(candidate)
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        let kind = PrimitiveKind::of(old).ok_or_else(|| EncodeError::Unreproducible {
            type_name: old.runtime_type().map(|t| t.name().to_string()).unwrap_or_default(),
            reason: "not a primitive".to_string(),
        })?;
        Ok(Expression::with_value(
            old.clone(),
            Value::Type(builtins::wrapper(kind)),
            "new",
            vec![Value::str(old.to_string())],
        ))
    }

    fn initialize(&self, _: &TypeRef, _: &Value, _: &Value, _: &mut Encoder) -> EncodeResult<()> {
        Ok(())
    }
}
