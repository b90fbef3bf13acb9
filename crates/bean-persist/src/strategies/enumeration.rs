use crate::encoder::Encoder;
use crate::error::{EncodeError, EncodeResult};
use crate::strategy::PersistenceStrategy;
use bean_model::{builtins, Expression, TypeRef, Value};

/// Strategy for enumeration constants: looked up by name, never mutated
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumStrategy;

impl PersistenceStrategy for EnumStrategy {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn mutates_to(&self, old: &Value, candidate: &Value) -> bool {
        old.same(candidate)
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        let Value::Enum(constant) = old else {
            return Err(EncodeError::Unreproducible {
                type_name: old.runtime_type().map(|t| t.name().to_string()).unwrap_or_default(),
                reason: "not an enumeration constant".to_string(),
            });
        };
        Ok(Expression::with_value(
            old.clone(),
            Value::Type(builtins::enum_type()),
            "valueOf",
            vec![Value::Type(constant.class().clone()), Value::str(constant.name())],
        ))
    }

    fn initialize(&self, _: &TypeRef, _: &Value, _: &Value, _: &mut Encoder) -> EncodeResult<()> {
        Ok(())
    }
}
