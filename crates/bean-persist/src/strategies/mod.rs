//! Built-in persistence strategies

mod array;
mod bean;
mod collections;
mod date;
mod enumeration;
mod literal;
mod primitive;
mod proxy;

pub use array::ArrayStrategy;
pub use bean::DefaultStrategy;
pub use collections::{CollectionStrategy, ListStrategy, MapStrategy, UnmodifiableStrategy};
pub use date::DateStrategy;
pub use enumeration::EnumStrategy;
pub use literal::{NullStrategy, SelfEvidentStrategy};
pub use primitive::PrimitiveStrategy;
pub use proxy::ProxyStrategy;

use crate::encoder::Encoder;
use crate::error::{EncodeError, EncodeResult};
use bean_model::{Expression, Statement, TypeRef, Value};

/// Compare one readable slot of `old` with the same slot of the candidate
/// and emit `write(old_value)` when the replay side differs
///
/// Returns whether a statement was emitted.
pub(crate) fn diff_slot(
    encoder: &mut Encoder,
    old_get: &Expression,
    new_get: &Expression,
    write: impl FnOnce(Value) -> Statement,
) -> EncodeResult<bool> {
    let old_value = encoder.evaluate(old_get)?;
    let new_value = encoder.evaluate(new_get)?;
    encoder.write_expression(old_get)?;
    if new_value.equals(&encoder.try_get(&old_value)?) {
        return Ok(false);
    }
    encoder.write_statement(&write(old_value))?;
    Ok(true)
}

/// Report a failure of one part of a value and carry on with the rest
pub(crate) fn contain(encoder: &mut Encoder, ty: &TypeRef, part: &str, result: EncodeResult<()>) {
    if let Err(err) = result {
        encoder.report(err.in_property(ty.name(), part));
    }
}

/// Elements of a collection-like original value
pub(crate) fn elements_of(value: &Value) -> EncodeResult<Vec<Value>> {
    value
        .as_object()
        .and_then(bean_model::ObjectRef::elements)
        .ok_or_else(|| EncodeError::Unreproducible {
            type_name: value.runtime_type().map(|t| t.name().to_string()).unwrap_or_default(),
            reason: "value has no elements".to_string(),
        })
}
