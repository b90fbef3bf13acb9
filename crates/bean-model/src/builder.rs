//! Fluent construction of type descriptors

use crate::builtins;
use crate::error::{InvokeError, InvokeResult};
use crate::naming::capitalize;
use crate::object::{Body, ObjectRef};
use crate::types::{
    BeanHints, Constructor, EqualityFn, FieldDescriptor, Layout, Method, MethodBody, SlotSpec,
    StaticBody, TypeDescriptor, TypeKind, TypeRef,
};
use crate::value::Value;
use std::any::Any;
use std::rc::Rc;

/// Builder for [`TypeDescriptor`]
///
/// Classes get a nullary constructor unless they declare their own or call
/// [`TypeBuilder::no_default_constructor`].
///
/// ```rust,ignore
/// let point = TypeBuilder::class("demo.Point")
///     .property("x", "int")
///     .property("y", "int")
///     .build();
/// ```
pub struct TypeBuilder {
    descriptor: TypeDescriptor,
    default_constructor: bool,
}

impl TypeBuilder {
    pub(crate) fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            descriptor: TypeDescriptor {
                name: name.to_string(),
                kind,
                supertype: None,
                interfaces: Vec::new(),
                layout: Layout::Plain,
                slots: Vec::new(),
                constructors: Vec::new(),
                methods: Vec::new(),
                fields: Vec::new(),
                equality: None,
                constructor_properties: None,
                enum_constants: Vec::new(),
                hints: BeanHints::default(),
            },
            default_constructor: true,
        }
    }

    /// Class extending `Object`
    #[must_use]
    pub fn class(name: &str) -> Self {
        Self::new(name, TypeKind::Class).extends(&builtins::object())
    }

    /// Interface
    #[must_use]
    pub fn interface(name: &str) -> Self {
        let mut builder = Self::new(name, TypeKind::Interface);
        builder.default_constructor = false;
        builder
    }

    /// Enumeration with constants in ordinal order
    #[must_use]
    pub fn enumeration(name: &str, constants: &[&str]) -> Self {
        let mut builder = Self::new(name, TypeKind::Enumeration).extends(&builtins::enum_type());
        builder.descriptor.enum_constants = constants.iter().map(ToString::to_string).collect();
        builder.default_constructor = false;
        builder
    }

    /// Set the supertype; a plain layout inherits the supertype's layout
    #[must_use]
    pub fn extends(mut self, parent: &TypeRef) -> Self {
        if self.descriptor.layout == Layout::Plain {
            self.descriptor.layout = parent.layout();
        }
        self.descriptor.supertype = Some(parent.clone());
        self
    }

    /// Add an implemented interface
    #[must_use]
    pub fn implements(mut self, interface: &TypeRef) -> Self {
        self.descriptor.interfaces.push(interface.clone());
        self
    }

    /// Override the instance layout
    #[must_use]
    pub fn layout(mut self, layout: Layout) -> Self {
        self.descriptor.layout = layout;
        self
    }

    /// Private slot with no accessors
    #[must_use]
    pub fn slot(mut self, name: &str, type_name: &str) -> Self {
        self.descriptor.slots.push(SlotSpec {
            name: name.to_string(),
            type_name: type_name.to_string(),
        });
        self
    }

    /// Slot with a getter and a setter
    #[must_use]
    pub fn property(self, name: &str, type_name: &str) -> Self {
        let setter = format!("set{}", capitalize(name));
        let slot = name.to_string();
        self.read_only_property(name, type_name).method(
            &setter.clone(),
            &[type_name],
            None,
            move |this, args| {
                expect_object(this, &setter)?.set_slot(&slot, args[0].clone())?;
                Ok(Value::Null)
            },
        )
    }

    /// Slot with a getter only
    #[must_use]
    pub fn read_only_property(self, name: &str, type_name: &str) -> Self {
        let getter = getter_name(name, type_name);
        let slot = name.to_string();
        self.slot(name, type_name).method(
            &getter.clone(),
            &[],
            Some(type_name),
            move |this, _| read_slot(this, &getter, &slot),
        )
    }

    /// Public instance field backed by a slot
    #[must_use]
    pub fn field(mut self, name: &str, type_name: &str) -> Self {
        self.descriptor.fields.push(FieldDescriptor {
            name: name.to_string(),
            type_name: type_name.to_string(),
            is_public: true,
            is_static: false,
            is_final: false,
            is_transient: false,
            value: None,
        });
        self.slot(name, type_name)
    }

    /// Public static final field
    #[must_use]
    pub fn constant(mut self, name: &str, value: Value) -> Self {
        let type_name = value
            .runtime_type()
            .map_or_else(|| "Object".to_string(), |t| t.name().to_string());
        self.descriptor.fields.push(FieldDescriptor {
            name: name.to_string(),
            type_name,
            is_public: true,
            is_static: true,
            is_final: true,
            is_transient: false,
            value: Some(value),
        });
        self
    }

    /// Constructor with a parameter signature
    #[must_use]
    pub fn constructor(
        mut self,
        params: &[&str],
        body: impl Fn(&TypeRef, &[Value]) -> InvokeResult<Value> + 'static,
    ) -> Self {
        self.descriptor
            .constructors
            .push(Constructor::new(owned(params), Rc::new(body) as StaticBody));
        self
    }

    /// Suppress the implicit nullary constructor
    #[must_use]
    pub fn no_default_constructor(mut self) -> Self {
        self.default_constructor = false;
        self
    }

    /// Instance method
    #[must_use]
    pub fn method(
        mut self,
        name: &str,
        params: &[&str],
        returns: Option<&str>,
        body: impl Fn(&Value, &[Value]) -> InvokeResult<Value> + 'static,
    ) -> Self {
        self.descriptor.methods.push(Method::instance(
            name,
            owned(params),
            returns.map(ToString::to_string),
            Rc::new(body) as MethodBody,
        ));
        self
    }

    /// Static method
    #[must_use]
    pub fn static_method(
        mut self,
        name: &str,
        params: &[&str],
        returns: Option<&str>,
        body: impl Fn(&TypeRef, &[Value]) -> InvokeResult<Value> + 'static,
    ) -> Self {
        self.descriptor.methods.push(Method::associated(
            name,
            owned(params),
            returns.map(ToString::to_string),
            Rc::new(body) as StaticBody,
        ));
        self
    }

    /// Listener registration for `listener`: `addXListener`, `removeXListener`
    /// and `getXListeners` where `X` is the listener name without its
    /// `Listener` suffix
    #[must_use]
    pub fn listener_set(self, listener: &TypeRef) -> Self {
        let simple = listener.simple_name().to_string();
        let slot = format!("{}s", decap(&simple));
        let listener_name = listener.name().to_string();
        let array_type = builtins::array_of(listener);

        let add = format!("add{simple}");
        let remove = format!("remove{simple}");
        let get = format!("get{simple}s");
        let (add_slot, remove_slot, get_slot) = (slot.clone(), slot.clone(), slot.clone());
        let add_name = add.clone();
        let remove_name = remove.clone();
        let get_name = get.clone();

        self.slot(&slot, "List")
            .method(&add, &[&listener_name], None, move |this, args| {
                if !args[0].is_null() {
                    listener_store(this, &add_name, &add_slot)?
                        .with_body_mut(|body| push_listener(body, args[0].clone()));
                }
                Ok(Value::Null)
            })
            .method(&remove, &[&listener_name], None, move |this, args| {
                listener_store(this, &remove_name, &remove_slot)?.with_body_mut(|body| {
                    if let Body::List(items) = body {
                        if let Some(index) = items.iter().position(|l| l.same(&args[0])) {
                            items.remove(index);
                        }
                    }
                });
                Ok(Value::Null)
            })
            .method(
                &get,
                &[],
                Some(&format!("{listener_name}[]")),
                move |this, _| {
                    let items = listener_store(this, &get_name, &get_slot)?
                        .elements()
                        .unwrap_or_default();
                    Ok(Value::Object(ObjectRef::new(&array_type, Body::Array(items))))
                },
            )
    }

    /// Declared equality operation
    #[must_use]
    pub fn equality(mut self, equality: impl Fn(&ObjectRef, &ObjectRef) -> bool + 'static) -> Self {
        self.descriptor.equality = Some(Rc::new(equality) as EqualityFn);
        self
    }

    /// Properties whose values are passed to the constructor, in order
    #[must_use]
    pub fn constructor_properties(mut self, names: &[&str]) -> Self {
        self.descriptor.constructor_properties = Some(owned(names));
        self
    }

    /// Exclude a property or field from persistence
    #[must_use]
    pub fn transient(mut self, name: &str) -> Self {
        for field in self.descriptor.fields.iter_mut().filter(|f| f.name == name) {
            field.is_transient = true;
        }
        self.descriptor.hints.transient.push(name.to_string());
        self
    }

    /// Static constants whose values a property commonly takes
    #[must_use]
    pub fn property_constants(mut self, property: &str, constants: &[&str]) -> Self {
        self.descriptor
            .hints
            .property_constants
            .insert(property.to_string(), owned(constants));
        self
    }

    /// Arbitrary attribute
    #[must_use]
    pub fn attribute(mut self, key: &str, value: Rc<dyn Any>) -> Self {
        self.descriptor.hints.attributes.insert(key.to_string(), value);
        self
    }

    /// Human readable name
    #[must_use]
    pub fn display_name(mut self, name: &str) -> Self {
        self.descriptor.hints.display_name = Some(name.to_string());
        self
    }

    /// Customizer type name
    #[must_use]
    pub fn customizer(mut self, name: &str) -> Self {
        self.descriptor.hints.customizer = Some(name.to_string());
        self
    }

    /// Default property name
    #[must_use]
    pub fn default_property(mut self, name: &str) -> Self {
        self.descriptor.hints.default_property = Some(name.to_string());
        self
    }

    /// Default event set name
    #[must_use]
    pub fn default_event(mut self, name: &str) -> Self {
        self.descriptor.hints.default_event = Some(name.to_string());
        self
    }

    /// Finish the descriptor
    #[must_use]
    pub fn build(mut self) -> TypeRef {
        if self.default_constructor
            && self.descriptor.constructors.is_empty()
            && matches!(self.descriptor.kind, TypeKind::Class)
        {
            self.descriptor.constructors.push(Constructor::new(
                Vec::new(),
                Rc::new(|ty: &TypeRef, _: &[Value]| Ok(Value::Object(ObjectRef::instantiate(ty))))
                    as StaticBody,
            ));
        }
        TypeRef::new(self.descriptor)
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

fn getter_name(property: &str, type_name: &str) -> String {
    let prefix = if type_name == "boolean" { "is" } else { "get" };
    format!("{prefix}{}", capitalize(property))
}

fn decap(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Object behind `this`, or an argument mismatch naming `operation`
pub(crate) fn expect_object<'a>(this: &'a Value, operation: &str) -> InvokeResult<&'a ObjectRef> {
    this.as_object()
        .ok_or_else(|| InvokeError::mismatch(format!("object for {operation}"), this.to_string()))
}

fn read_slot(this: &Value, operation: &str, slot: &str) -> InvokeResult<Value> {
    let obj = expect_object(this, operation)?;
    obj.slot(slot).ok_or_else(|| InvokeError::NoSuchField {
        type_name: obj.class().name().to_string(),
        field: slot.to_string(),
    })
}

fn listener_store(this: &Value, operation: &str, slot: &str) -> InvokeResult<ObjectRef> {
    let obj = expect_object(this, operation)?;
    if let Some(Value::Object(store)) = obj.slot(slot) {
        return Ok(store);
    }
    let store = ObjectRef::new(&builtins::list(), Body::List(Vec::new()));
    obj.set_slot(slot, Value::Object(store.clone()))?;
    Ok(store)
}

fn push_listener(body: &mut Body, listener: Value) {
    if let Body::List(items) = body {
        items.push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Statement;

    #[test]
    fn properties_generate_accessors() {
        let ty = TypeBuilder::class("demo.Bean")
            .property("count", "int")
            .property("visible", "boolean")
            .build();
        let obj = ty.construct(&[]).unwrap();

        Statement::new(obj.clone(), "setCount", vec![Value::Int(5)])
            .execute()
            .unwrap();
        let count = crate::Expression::new(obj.clone(), "getCount", vec![]);
        assert!(count.value().unwrap().equals(&Value::Int(5)));

        let visible = crate::Expression::new(obj, "isVisible", vec![]);
        assert!(visible.value().unwrap().equals(&Value::Bool(false)));
    }

    #[test]
    fn setter_rejects_wrong_type() {
        let ty = TypeBuilder::class("demo.Bean").property("count", "int").build();
        let obj = ty.construct(&[]).unwrap();
        let err = Statement::new(obj, "setCount", vec![Value::str("five")])
            .execute()
            .unwrap_err();
        assert!(matches!(err, InvokeError::NoSuchMethod { .. }));
    }

    #[test]
    fn explicit_constructor_replaces_default() {
        let ty = TypeBuilder::class("demo.Pair")
            .property("a", "int")
            .constructor(&["int"], |ty, args| {
                let obj = ObjectRef::instantiate(ty);
                obj.set_slot("a", args[0].clone())?;
                Ok(Value::Object(obj))
            })
            .build();
        assert!(!ty.has_nullary_constructor());
        assert!(ty.construct(&[Value::Int(1)]).is_ok());
        assert!(ty.construct(&[]).is_err());
    }

    #[test]
    fn listener_sets_track_registration_order() {
        let listener = TypeBuilder::interface("ui.ActionListener").build();
        let impl_ty = TypeBuilder::class("demo.Handler").implements(&listener).build();
        let button = TypeBuilder::class("ui.Button").listener_set(&listener).build();

        let b = button.construct(&[]).unwrap();
        let first = impl_ty.construct(&[]).unwrap();
        let second = impl_ty.construct(&[]).unwrap();
        for l in [&first, &second] {
            Statement::new(b.clone(), "addActionListener", vec![l.clone()])
                .execute()
                .unwrap();
        }
        Statement::new(b.clone(), "removeActionListener", vec![first.clone()])
            .execute()
            .unwrap();

        let listeners = crate::Expression::new(b, "getActionListeners", vec![])
            .value()
            .unwrap();
        let items = listeners.as_object().unwrap().elements().unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].same(&second));
        assert_eq!(
            listeners.runtime_type().unwrap().name(),
            "ui.ActionListener[]"
        );
    }
}
