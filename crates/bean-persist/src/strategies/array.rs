use super::{contain, diff_slot, elements_of};
use crate::encoder::Encoder;
use crate::error::{EncodeError, EncodeResult};
use crate::strategy::PersistenceStrategy;
use bean_model::{builtins, Expression, Statement, TypeRef, Value};

/// Strategy for fixed-length arrays
///
/// Instantiated with the component type and length, then only elements that
/// differ from the component default get a `set` statement.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayStrategy;

fn length(value: &Value) -> Option<usize> {
    value.as_object().and_then(bean_model::ObjectRef::len)
}

impl PersistenceStrategy for ArrayStrategy {
    fn name(&self) -> &'static str {
        "array"
    }

    fn mutates_to(&self, old: &Value, candidate: &Value) -> bool {
        match (old.runtime_type(), candidate.runtime_type()) {
            (Some(a), Some(b)) => a == b && length(old) == length(candidate),
            _ => false,
        }
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        let component = old
            .runtime_type()
            .and_then(|ty| ty.component_type().cloned())
            .ok_or_else(|| EncodeError::Unreproducible {
                type_name: old.to_string(),
                reason: "not an array".to_string(),
            })?;
        let len = length(old).unwrap_or_default();
        let len = i32::try_from(len).map_err(|_| EncodeError::Unreproducible {
            type_name: old.to_string(),
            reason: format!("length {len} out of range"),
        })?;
        let array = builtins::lookup("Array").ok_or_else(|| EncodeError::NoStrategy {
            type_name: "Array".to_string(),
        })?;
        Ok(Expression::with_value(
            old.clone(),
            Value::Type(array),
            "newInstance",
            vec![Value::Type(component), Value::Int(len)],
        ))
    }

    fn initialize(
        &self,
        ty: &TypeRef,
        old: &Value,
        candidate: &Value,
        encoder: &mut Encoder,
    ) -> EncodeResult<()> {
        let count = elements_of(old)?.len();
        for i in 0..count {
            let index = Value::Int(i32::try_from(i).unwrap_or(i32::MAX));
            let old_get = Expression::new(old.clone(), "get", vec![index.clone()]);
            let new_get = Expression::new(candidate.clone(), "get", vec![index.clone()]);
            let result = diff_slot(encoder, &old_get, &new_get, |value| {
                Statement::new(old.clone(), "set", vec![index, value])
            });
            contain(encoder, ty, &format!("[{i}]"), result.map(|_| ()));
        }
        Ok(())
    }
}
