use crate::encoder::Encoder;
use crate::error::{EncodeError, EncodeResult};
use crate::strategy::PersistenceStrategy;
use bean_model::{invoke, Expression, Value};

/// Strategy for instants: rebuilt from epoch milliseconds
#[derive(Debug, Default, Clone, Copy)]
pub struct DateStrategy;

fn millis(value: &Value) -> Option<i64> {
    invoke(value, "getTime", &[]).ok()?.as_i64()
}

impl PersistenceStrategy for DateStrategy {
    fn name(&self) -> &'static str {
        "date"
    }

    fn mutates_to(&self, old: &Value, candidate: &Value) -> bool {
        let same_type = matches!(
            (old.runtime_type(), candidate.runtime_type()),
            (Some(a), Some(b)) if a == b
        );
        same_type && millis(old).is_some() && millis(old) == millis(candidate)
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        let ty = old.runtime_type().ok_or_else(|| EncodeError::Unbound {
            value: old.to_string(),
        })?;
        let time = invoke(old, "getTime", &[]).map_err(|source| EncodeError::Evaluation {
            expression: format!("{old}.getTime()"),
            source,
        })?;
        Ok(Expression::with_value(old.clone(), Value::Type(ty), "new", vec![time]))
    }
}
