//! Convention-driven strategy for ordinary beans
//!
//! A bean is instantiated through its constructor (nullary, or fed from the
//! declared constructor properties) and then brought up to date by diffing
//! public fields, read-write properties and, for components, listener
//! registrations against the replay candidate.

use super::{contain, diff_slot};
use crate::encoder::Encoder;
use crate::error::{EncodeError, EncodeResult};
use crate::strategy::{initialize_supertype, PersistenceStrategy};
use bean_introspect::{BeanInfo, EventSetDescriptor, PropertyDescriptor};
use bean_model::{capitalize, invoke, Expression, FieldRef, Statement, TypeRef, Value};
use std::rc::Rc;

/// Default strategy for beans
#[derive(Debug, Default, Clone)]
pub struct DefaultStrategy {
    constructor: Vec<String>,
}

impl DefaultStrategy {
    /// Strategy instantiating through the nullary constructor
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy passing the named properties, in order, to the constructor
    #[must_use]
    pub fn with_constructor_properties<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            constructor: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Constructor property names
    #[inline]
    #[must_use]
    pub fn constructor_properties(&self) -> &[String] {
        &self.constructor
    }

    fn constructor_args(&self, old: &Value, ty: &TypeRef, encoder: &mut Encoder) -> Vec<Value> {
        let info = encoder.bean_info(ty).ok();
        let mut args = Vec::with_capacity(self.constructor.len());
        for name in &self.constructor {
            let getter = info
                .as_ref()
                .and_then(|info| info.property(name))
                .and_then(PropertyDescriptor::read_method)
                .map_or_else(|| format!("get{}", capitalize(name)), str::to_string);
            let read = Expression::new(old.clone(), getter, vec![]);
            match encoder.evaluate(&read) {
                Ok(value) => args.push(value),
                Err(err) => {
                    encoder.report(err.in_property(ty.name(), name));
                    args.push(Value::Null);
                }
            }
        }
        args
    }

    fn init_bean(&self, ty: &TypeRef, old: &Value, candidate: &Value, encoder: &mut Encoder) {
        let info = match encoder.bean_info(ty) {
            Ok(info) => Some(info),
            Err(err) => {
                encoder.report(err);
                None
            }
        };

        for field in ty.all_fields() {
            if !field.is_public || field.is_static || field.is_final || field.is_transient {
                continue;
            }
            let covered = info
                .as_ref()
                .and_then(|info| info.property(&field.name))
                .is_some_and(PropertyDescriptor::is_read_write);
            if covered {
                continue;
            }
            let result = diff_field(ty, &field.name, old, candidate, encoder);
            contain(encoder, ty, &field.name, result);
        }

        let Some(info) = info else {
            return;
        };
        for property in info.properties() {
            if property.is_transient() {
                continue;
            }
            let result = diff_property(ty, property, old, candidate, encoder);
            contain(encoder, ty, property.name(), result);
        }
        diff_listeners(ty, &info, old, candidate, encoder);
    }
}

impl PersistenceStrategy for DefaultStrategy {
    fn name(&self) -> &'static str {
        "default"
    }

    fn mutates_to(&self, old: &Value, candidate: &Value) -> bool {
        let same_type = matches!(
            (old.runtime_type(), candidate.runtime_type()),
            (Some(a), Some(b)) if a == b
        );
        let defines_equals = old
            .runtime_type()
            .is_some_and(|ty| ty.declared_equality().is_some());
        if self.constructor.is_empty() || !defines_equals {
            same_type
        } else {
            old.equals(candidate)
        }
    }

    fn instantiate(&self, old: &Value, encoder: &mut Encoder) -> EncodeResult<Expression> {
        let ty = old.runtime_type().ok_or_else(|| EncodeError::Unbound {
            value: old.to_string(),
        })?;
        let args = self.constructor_args(old, &ty, encoder);
        Ok(Expression::with_value(old.clone(), Value::Type(ty), "new", args))
    }

    fn initialize(
        &self,
        ty: &TypeRef,
        old: &Value,
        candidate: &Value,
        encoder: &mut Encoder,
    ) -> EncodeResult<()> {
        initialize_supertype(ty, old, candidate, encoder)?;
        if old.runtime_type().as_ref() == Some(ty) {
            self.init_bean(ty, old, candidate, encoder);
        }
        Ok(())
    }
}

fn diff_field(
    ty: &TypeRef,
    name: &str,
    old: &Value,
    candidate: &Value,
    encoder: &mut Encoder,
) -> EncodeResult<()> {
    let field = Value::Field(FieldRef::new(ty.clone(), name));
    let old_get = Expression::new(field.clone(), "get", vec![old.clone()]);
    let new_get = Expression::new(field.clone(), "get", vec![candidate.clone()]);
    diff_slot(encoder, &old_get, &new_get, |value| {
        Statement::new(field, "set", vec![old.clone(), value])
    })
    .map(|_| ())
}

fn diff_property(
    ty: &TypeRef,
    property: &PropertyDescriptor,
    old: &Value,
    candidate: &Value,
    encoder: &mut Encoder,
) -> EncodeResult<()> {
    let (Some(getter), Some(setter)) = (property.read_method(), property.write_method()) else {
        return Ok(());
    };
    let old_get = Expression::new(old.clone(), getter, vec![]);
    let new_get = Expression::new(candidate.clone(), getter, vec![]);
    let old_value = encoder.evaluate(&old_get)?;
    let new_value = encoder.evaluate(&new_get)?;
    // Equal immutable values are their own replay counterparts.
    if property.is_immutable_value() && new_value.equals(&old_value) {
        return Ok(());
    }
    encoder.write_expression(&old_get)?;
    if new_value.equals(&encoder.try_get(&old_value)?) {
        return Ok(());
    }

    let constant = property.constants().iter().find(|name| {
        ty.find_field(name).is_some_and(|field| {
            field.is_static && field.value.as_ref().is_some_and(|v| v.equals(&old_value))
        })
    });
    if let Some(name) = constant {
        encoder.remove(&old_value);
        let field = Value::Field(FieldRef::new(ty.clone(), name));
        let read = Expression::with_value(old_value.clone(), field, "get", vec![Value::Null]);
        encoder.write_expression(&read)?;
    }
    encoder.write_statement(&Statement::new(old.clone(), setter, vec![old_value]))
}

/// Register the listeners the candidate lacks and drop the ones it has
/// in excess
///
/// Registrations are compared by count only: the first `n` listeners of
/// both sides are taken to correspond. An original whose listener was
/// removed, while its replay counterpart registered one in its
/// constructor, gets a remove statement naming the candidate's listener.
/// That listener is then written as a new value, so the remove does not
/// reach the registration it was meant for.
fn diff_listeners(
    ty: &TypeRef,
    info: &Rc<BeanInfo>,
    old: &Value,
    candidate: &Value,
    encoder: &mut Encoder,
) {
    let config = encoder.config();
    if !config.listener_roots.iter().any(|root| ty.is_subtype_of(root)) {
        return;
    }
    let excluded = config.excluded_listener_types.clone();

    for set in info.event_sets() {
        if set.is_transient() {
            continue;
        }
        let simple = set.listener_type().rsplit('.').next().unwrap_or_default();
        if excluded.iter().any(|x| x == set.listener_type() || x == simple) {
            continue;
        }
        let Some((registered, present)) = listeners(set, old, candidate, encoder) else {
            continue;
        };
        for listener in registered.iter().skip(present.len()) {
            let stmt = Statement::new(old.clone(), set.add_method(), vec![listener.clone()]);
            let result = encoder.write_statement(&stmt);
            contain(encoder, ty, set.name(), result);
        }
        for listener in present.iter().skip(registered.len()) {
            let stmt = Statement::new(old.clone(), set.remove_method(), vec![listener.clone()]);
            let result = encoder.write_statement(&stmt);
            contain(encoder, ty, set.name(), result);
        }
    }
}

/// Listeners registered on the original and on the candidate, read through
/// the typed accessor or else through `getListeners(Class)`
fn listeners(
    set: &EventSetDescriptor,
    old: &Value,
    candidate: &Value,
    encoder: &Encoder,
) -> Option<(Vec<Value>, Vec<Value>)> {
    let read = |target: &Value, method: &str, args: &[Value]| {
        invoke(target, method, args)
            .ok()
            .and_then(|v| v.as_object().and_then(bean_model::ObjectRef::elements))
    };
    if let Some(getter) = set.get_method() {
        if let (Some(a), Some(b)) = (read(old, getter, &[]), read(candidate, getter, &[])) {
            return Some((a, b));
        }
    }
    let listener_type = Value::Type(encoder.resolve_type(set.listener_type())?);
    let args = [listener_type];
    Some((
        read(old, "getListeners", &args)?,
        read(candidate, "getListeners", &args)?,
    ))
}
