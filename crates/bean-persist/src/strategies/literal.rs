use crate::encoder::Encoder;
use crate::error::EncodeResult;
use crate::strategy::PersistenceStrategy;
use bean_model::{builtins, Expression, TypeRef, Value};

/// Strategy for the absent value: writes nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStrategy;

impl PersistenceStrategy for NullStrategy {
    fn name(&self) -> &'static str {
        "null"
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        Ok(Expression::with_value(old.clone(), Value::Null, "null", vec![]))
    }

    fn initialize(&self, _: &TypeRef, _: &Value, _: &Value, _: &mut Encoder) -> EncodeResult<()> {
        Ok(())
    }

    fn write_object(&self, _old: &Value, _encoder: &mut Encoder) -> EncodeResult<()> {
        Ok(())
    }
}

/// Strategy for strings, type and field references
///
/// These are their own replay counterparts, so nothing is ever written.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfEvidentStrategy;

impl PersistenceStrategy for SelfEvidentStrategy {
    fn name(&self) -> &'static str {
        "self-evident"
    }

    fn mutates_to(&self, old: &Value, candidate: &Value) -> bool {
        old.equals(candidate)
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        Ok(Expression::with_value(
            old.clone(),
            Value::Type(builtins::string()),
            "new",
            vec![old.clone()],
        ))
    }

    fn initialize(&self, _: &TypeRef, _: &Value, _: &Value, _: &mut Encoder) -> EncodeResult<()> {
        Ok(())
    }

    fn write_object(&self, _old: &Value, _encoder: &mut Encoder) -> EncodeResult<()> {
        Ok(())
    }
}
