//! Strategies for the built-in collections
//!
//! Mutable collections are instantiated empty through their nullary
//! constructor and filled by statements. Unmodifiable views wrap a fresh
//! mutable copy and are never mutated in place.

use super::{contain, diff_slot, elements_of};
use crate::encoder::Encoder;
use crate::error::{EncodeError, EncodeResult};
use crate::strategy::PersistenceStrategy;
use bean_model::{builtins, invoke, Body, Expression, ObjectRef, Statement, TypeRef, Value};

fn construct_empty(old: &Value) -> EncodeResult<Expression> {
    let ty = old.runtime_type().ok_or_else(|| EncodeError::Unbound {
        value: old.to_string(),
    })?;
    Ok(Expression::with_value(old.clone(), Value::Type(ty), "new", vec![]))
}

fn candidate_len(candidate: &Value) -> usize {
    candidate.as_object().and_then(ObjectRef::len).unwrap_or(0)
}

fn position(i: usize) -> Value {
    Value::Int(i32::try_from(i).unwrap_or(i32::MAX))
}

/// Strategy for ordered lists
///
/// The common prefix is diffed position by position; extra original
/// elements are appended. A candidate longer than the original is cleared
/// first.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListStrategy;

impl PersistenceStrategy for ListStrategy {
    fn name(&self) -> &'static str {
        "list"
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        construct_empty(old)
    }

    fn initialize(
        &self,
        ty: &TypeRef,
        old: &Value,
        candidate: &Value,
        encoder: &mut Encoder,
    ) -> EncodeResult<()> {
        let items = elements_of(old)?;
        let mut shared = candidate_len(candidate);
        if items.len() < shared {
            encoder.write_statement(&Statement::new(old.clone(), "clear", vec![]))?;
            shared = 0;
        }
        for i in 0..shared {
            let old_get = Expression::new(old.clone(), "get", vec![position(i)]);
            let new_get = Expression::new(candidate.clone(), "get", vec![position(i)]);
            let result = diff_slot(encoder, &old_get, &new_get, |value| {
                Statement::new(old.clone(), "set", vec![position(i), value])
            });
            contain(encoder, ty, &format!("[{i}]"), result.map(|_| ()));
        }
        for (i, item) in items.into_iter().enumerate().skip(shared) {
            let result = encoder.write_statement(&Statement::new(old.clone(), "add", vec![item]));
            contain(encoder, ty, &format!("[{i}]"), result);
        }
        Ok(())
    }
}

/// Strategy for unordered collections: cleared if non-empty, then refilled
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectionStrategy;

impl PersistenceStrategy for CollectionStrategy {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        construct_empty(old)
    }

    fn initialize(
        &self,
        ty: &TypeRef,
        old: &Value,
        candidate: &Value,
        encoder: &mut Encoder,
    ) -> EncodeResult<()> {
        let items = elements_of(old)?;
        if candidate_len(candidate) != 0 {
            encoder.write_statement(&Statement::new(old.clone(), "clear", vec![]))?;
        }
        for item in items {
            let part = item.to_string();
            let result = encoder.write_statement(&Statement::new(old.clone(), "add", vec![item]));
            contain(encoder, ty, &part, result);
        }
        Ok(())
    }
}

/// Strategy for maps
///
/// Keys missing from the original are removed from the candidate first,
/// then every original entry whose replay value differs is put.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapStrategy;

impl PersistenceStrategy for MapStrategy {
    fn name(&self) -> &'static str {
        "map"
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        construct_empty(old)
    }

    fn initialize(
        &self,
        ty: &TypeRef,
        old: &Value,
        candidate: &Value,
        encoder: &mut Encoder,
    ) -> EncodeResult<()> {
        let entries = old
            .as_object()
            .and_then(ObjectRef::entries)
            .ok_or_else(|| EncodeError::Unreproducible {
                type_name: ty.name().to_string(),
                reason: "value has no entries".to_string(),
            })?;
        let stale = candidate
            .as_object()
            .and_then(ObjectRef::entries)
            .unwrap_or_default();
        for (key, _) in stale {
            if entries.iter().any(|(k, _)| k.equals(&key)) {
                continue;
            }
            let part = key.to_string();
            let result = encoder.write_statement(&Statement::new(old.clone(), "remove", vec![key]));
            contain(encoder, ty, &part, result);
        }
        for (key, _) in entries {
            let part = key.to_string();
            let result = self.diff_entry(old, candidate, key, encoder);
            contain(encoder, ty, &part, result);
        }
        Ok(())
    }
}

impl MapStrategy {
    fn diff_entry(
        &self,
        old: &Value,
        candidate: &Value,
        key: Value,
        encoder: &mut Encoder,
    ) -> EncodeResult<()> {
        let old_get = Expression::new(old.clone(), "get", vec![key.clone()]);
        let new_get = Expression::new(candidate.clone(), "get", vec![key.clone()]);
        let put_key = key.clone();
        let emitted = diff_slot(encoder, &old_get, &new_get, |value| {
            Statement::new(old.clone(), "put", vec![put_key, value])
        })?;
        let present = invoke(candidate, "containsKey", &[key.clone()])
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !emitted && !present {
            let value = encoder.evaluate(&old_get)?;
            encoder.write_statement(&Statement::new(old.clone(), "put", vec![key, value]))?;
        }
        Ok(())
    }
}

/// Strategy for unmodifiable views
///
/// Recreated by wrapping a fresh mutable copy. A candidate is accepted only
/// when it holds the replay counterparts of the original's members, so
/// views over beans are compared in replay terms rather than by identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnmodifiableStrategy;

impl UnmodifiableStrategy {
    /// The view with every member swapped for its replay counterpart
    ///
    /// Members not yet written map to null, which makes the image differ
    /// from any candidate until the view has been instantiated.
    fn replay_image(old: &Value, encoder: &mut Encoder) -> EncodeResult<Option<Value>> {
        let Some(obj) = old.as_object() else {
            return Ok(None);
        };
        let body = match obj.body() {
            Body::List(items) => Body::List(replay_all(&items, encoder)?),
            Body::Set(items) => Body::Set(replay_all(&items, encoder)?),
            Body::Map(entries) => {
                let mut mapped = Vec::with_capacity(entries.len());
                for (key, value) in &entries {
                    mapped.push((encoder.try_get(key)?, encoder.try_get(value)?));
                }
                Body::Map(mapped)
            }
            _ => return Ok(None),
        };
        Ok(Some(Value::Object(ObjectRef::new(&obj.class(), body))))
    }
}

fn replay_all(items: &[Value], encoder: &mut Encoder) -> EncodeResult<Vec<Value>> {
    items.iter().map(|item| encoder.try_get(item)).collect()
}

impl PersistenceStrategy for UnmodifiableStrategy {
    fn name(&self) -> &'static str {
        "unmodifiable"
    }

    fn write_object(&self, old: &Value, encoder: &mut Encoder) -> EncodeResult<()> {
        let candidate = encoder.try_get(old)?;
        if self.mutates_to(old, &candidate) {
            if let Some(image) = Self::replay_image(old, encoder)? {
                if image.equals(&candidate) {
                    return Ok(());
                }
            }
        }
        encoder.guard_instantiation(old, |encoder| {
            encoder.remove(old);
            let expression = self.instantiate(old, encoder)?;
            encoder.write_expression(&expression)
        })
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        let obj = old.as_object().ok_or_else(|| EncodeError::Unbound {
            value: old.to_string(),
        })?;
        let (factory, copy) = match obj.body() {
            Body::List(items) => ("unmodifiableList", ObjectRef::new(&builtins::list(), Body::List(items))),
            Body::Set(items) => ("unmodifiableSet", ObjectRef::new(&builtins::set(), Body::Set(items))),
            Body::Map(entries) => ("unmodifiableMap", ObjectRef::new(&builtins::map(), Body::Map(entries))),
            _ => {
                return Err(EncodeError::Unreproducible {
                    type_name: obj.class().name().to_string(),
                    reason: "not a collection view".to_string(),
                })
            }
        };
        let collections = builtins::lookup("Collections").ok_or_else(|| EncodeError::NoStrategy {
            type_name: "Collections".to_string(),
        })?;
        Ok(Expression::with_value(
            old.clone(),
            Value::Type(collections),
            factory,
            vec![Value::Object(copy)],
        ))
    }

    fn initialize(&self, _: &TypeRef, _: &Value, _: &Value, _: &mut Encoder) -> EncodeResult<()> {
        Ok(())
    }
}
