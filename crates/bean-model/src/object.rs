//! Objects with identity
//!
//! An [`Object`] carries named slots plus a layout-specific [`Body`]. Objects
//! are shared as [`ObjectRef`]; identity is the allocation.

use crate::error::{InvokeError, InvokeResult};
use crate::types::{Layout, TypeRef};
use crate::value::Value;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// State of a forwarding wrapper
#[derive(Debug, Clone)]
pub struct ProxyState {
    /// Interfaces the wrapper implements
    pub interfaces: Vec<TypeRef>,
    /// Handler receiving every call
    pub handler: Value,
}

/// State of an event handler
#[derive(Debug, Clone)]
pub struct HandlerState {
    /// Object the action is invoked on
    pub target: Value,
    /// Method or property name on the target, optionally a dotted path
    pub action: String,
    /// Property path read from the first call argument
    pub event_property_name: Option<String>,
    /// Only calls to this method are forwarded
    pub listener_method_name: Option<String>,
}

/// Layout-specific object state
#[derive(Debug, Clone)]
pub enum Body {
    /// No state beyond slots
    Plain,
    /// Fixed-length elements
    Array(Vec<Value>),
    /// Ordered elements
    List(Vec<Value>),
    /// Distinct elements in insertion order
    Set(Vec<Value>),
    /// Entries in insertion order
    Map(Vec<(Value, Value)>),
    /// Instant
    Date(DateTime<Utc>),
    /// Forwarding wrapper
    Proxy(ProxyState),
    /// Event handler
    EventHandler(HandlerState),
}

impl Body {
    /// Empty body for a layout
    #[must_use]
    pub fn empty(layout: Layout) -> Self {
        match layout {
            Layout::Plain | Layout::Proxy | Layout::EventHandler => Self::Plain,
            Layout::Array => Self::Array(Vec::new()),
            Layout::List => Self::List(Vec::new()),
            Layout::Set => Self::Set(Vec::new()),
            Layout::Map => Self::Map(Vec::new()),
            Layout::Date => Self::Date(Utc::now()),
        }
    }
}

/// Instance state
#[derive(Debug)]
pub struct Object {
    class: TypeRef,
    slots: IndexMap<String, Value>,
    body: Body,
}

/// Shared reference to an [`Object`]
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    /// Allocate an instance of `class` with default slots and the given body
    #[must_use]
    pub fn new(class: &TypeRef, body: Body) -> Self {
        let slots = class
            .all_slots()
            .into_iter()
            .map(|spec| {
                let default = Value::default_for(&spec.type_name);
                (spec.name, default)
            })
            .collect();
        Self(Rc::new(RefCell::new(Object {
            class: class.clone(),
            slots,
            body,
        })))
    }

    /// Allocate an instance of `class` with the empty body of its layout
    #[must_use]
    pub fn instantiate(class: &TypeRef) -> Self {
        Self::new(class, Body::empty(class.layout()))
    }

    /// Runtime type
    #[must_use]
    pub fn class(&self) -> TypeRef {
        self.0.borrow().class.clone()
    }

    /// Slot value
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<Value> {
        self.0.borrow().slots.get(name).cloned()
    }

    /// Assign a declared slot
    ///
    /// # Errors
    /// [`InvokeError::NoSuchField`] when the slot is not declared
    pub fn set_slot(&self, name: &str, value: Value) -> InvokeResult<()> {
        let mut object = self.0.borrow_mut();
        match object.slots.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(InvokeError::NoSuchField {
                type_name: object.class.name().to_string(),
                field: name.to_string(),
            }),
        }
    }

    /// Read the body
    pub fn with_body<R>(&self, f: impl FnOnce(&Body) -> R) -> R {
        f(&self.0.borrow().body)
    }

    /// Mutate the body
    pub fn with_body_mut<R>(&self, f: impl FnOnce(&mut Body) -> R) -> R {
        f(&mut self.0.borrow_mut().body)
    }

    /// Copy of the body
    #[must_use]
    pub fn body(&self) -> Body {
        self.0.borrow().body.clone()
    }

    /// Elements of an array, list or set
    #[must_use]
    pub fn elements(&self) -> Option<Vec<Value>> {
        self.with_body(|body| match body {
            Body::Array(items) | Body::List(items) | Body::Set(items) => Some(items.clone()),
            _ => None,
        })
    }

    /// Entries of a map
    #[must_use]
    pub fn entries(&self) -> Option<Vec<(Value, Value)>> {
        self.with_body(|body| match body {
            Body::Map(entries) => Some(entries.clone()),
            _ => None,
        })
    }

    /// Element count of an array, list, set or map
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        self.with_body(|body| match body {
            Body::Array(items) | Body::List(items) | Body::Set(items) => Some(items.len()),
            Body::Map(entries) => Some(entries.len()),
            _ => None,
        })
    }

    /// Whether both references share the same allocation
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Allocation address, the identity key
    #[inline]
    #[must_use]
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<u8>() as usize
    }

    /// Equality: identity, then declared equality, then content for built-in shapes
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if let Some(equality) = self.class().equality() {
            return equality(self, other);
        }
        match (self.body(), other.body()) {
            (Body::List(a), Body::List(b)) => {
                a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.equals(y))
            }
            (Body::Set(a), Body::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.equals(y)))
            }
            (Body::Map(a), Body::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter()
                            .find(|(k2, _)| k.equals(k2))
                            .is_some_and(|(_, v2)| v.equals(v2))
                    })
            }
            (Body::Date(a), Body::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.class().simple_name(), self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn lists_compare_element_wise() {
        let a = ObjectRef::new(&builtins::list(), Body::List(vec![Value::Int(1), Value::str("x")]));
        let b = ObjectRef::new(&builtins::list(), Body::List(vec![Value::Int(1), Value::str("x")]));
        let c = ObjectRef::new(&builtins::list(), Body::List(vec![Value::str("x"), Value::Int(1)]));
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
    }

    #[test]
    fn sets_and_maps_compare_by_membership() {
        let a = ObjectRef::new(&builtins::set(), Body::Set(vec![Value::Int(1), Value::Int(2)]));
        let b = ObjectRef::new(&builtins::set(), Body::Set(vec![Value::Int(2), Value::Int(1)]));
        assert!(a.equals(&b));

        let m = ObjectRef::new(
            &builtins::map(),
            Body::Map(vec![(Value::str("k"), Value::Int(1))]),
        );
        let n = ObjectRef::new(
            &builtins::map(),
            Body::Map(vec![(Value::str("k"), Value::Int(2))]),
        );
        assert!(!m.equals(&n));
    }

    #[test]
    fn arrays_compare_by_identity() {
        let ty = builtins::array_of(&builtins::object());
        let a = ObjectRef::new(&ty, Body::Array(vec![Value::Null]));
        let b = ObjectRef::new(&ty, Body::Array(vec![Value::Null]));
        assert!(!a.equals(&b));
        assert!(a.equals(&a.clone()));
    }

    #[test]
    fn undeclared_slot_is_rejected() {
        let obj = ObjectRef::instantiate(&builtins::object());
        assert!(obj.set_slot("missing", Value::Int(1)).is_err());
        assert!(obj.slot("missing").is_none());
    }
}
