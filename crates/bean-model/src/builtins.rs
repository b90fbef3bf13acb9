//! Built-in type table
//!
//! Well-known types every object graph relies on: `Object`, primitives and
//! their wrappers, strings, meta-references, enumerations, arrays, the
//! collection family, dates, proxies and event handlers. The table is built
//! lazily once per thread; array and proxy types are synthesized on demand.

use crate::builder::{expect_object, TypeBuilder};
use crate::error::{InvokeError, InvokeResult};
use crate::naming::capitalize;
use crate::object::{Body, HandlerState, ObjectRef, ProxyState};
use crate::statement::invoke;
use crate::types::{Layout, PrimitiveKind, TypeKind, TypeRef};
use crate::value::Value;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;

struct Builtins {
    object: TypeRef,
    class: TypeRef,
    field: TypeRef,
    string: TypeRef,
    enum_type: TypeRef,
    list: TypeRef,
    set: TypeRef,
    map: TypeRef,
    date: TypeRef,
    proxy: TypeRef,
    event_handler: TypeRef,
    primitives: [TypeRef; 8],
    wrappers: [TypeRef; 8],
    by_name: IndexMap<String, TypeRef>,
}

thread_local! {
    static BUILTINS: Builtins = Builtins::build();
    static SYNTHESIZED: RefCell<HashMap<String, TypeRef>> = RefCell::new(HashMap::new());
}

fn with<R>(f: impl FnOnce(&Builtins) -> R) -> R {
    BUILTINS.with(f)
}

/// `Object`, root of every class
#[must_use]
pub fn object() -> TypeRef {
    with(|b| b.object.clone())
}

/// `Class`, runtime type of type meta-references
#[must_use]
pub fn class() -> TypeRef {
    with(|b| b.class.clone())
}

/// `Field`, runtime type of field meta-references
#[must_use]
pub fn field() -> TypeRef {
    with(|b| b.field.clone())
}

/// `String`
#[must_use]
pub fn string() -> TypeRef {
    with(|b| b.string.clone())
}

/// `Enum`, supertype of every enumeration
#[must_use]
pub fn enum_type() -> TypeRef {
    with(|b| b.enum_type.clone())
}

/// `List`
#[must_use]
pub fn list() -> TypeRef {
    with(|b| b.list.clone())
}

/// `Set`
#[must_use]
pub fn set() -> TypeRef {
    with(|b| b.set.clone())
}

/// `Map`
#[must_use]
pub fn map() -> TypeRef {
    with(|b| b.map.clone())
}

/// `Date`
#[must_use]
pub fn date() -> TypeRef {
    with(|b| b.date.clone())
}

/// `Proxy`, supertype of every synthesized proxy type
#[must_use]
pub fn proxy() -> TypeRef {
    with(|b| b.proxy.clone())
}

/// `EventHandler`
#[must_use]
pub fn event_handler() -> TypeRef {
    with(|b| b.event_handler.clone())
}

/// Primitive type such as `int`
#[must_use]
pub fn primitive(kind: PrimitiveKind) -> TypeRef {
    with(|b| b.primitives[kind as usize].clone())
}

/// Wrapper type such as `Integer`
#[must_use]
pub fn wrapper(kind: PrimitiveKind) -> TypeRef {
    with(|b| b.wrappers[kind as usize].clone())
}

/// Built-in or already synthesized type by name
#[must_use]
pub fn lookup(name: &str) -> Option<TypeRef> {
    with(|b| b.by_name.get(name).cloned())
        .or_else(|| SYNTHESIZED.with(|s| s.borrow().get(name).cloned()))
}

/// Names of the built-in types
#[must_use]
pub fn names() -> Vec<String> {
    with(|b| b.by_name.keys().cloned().collect())
}

/// Array type `component[]`
#[must_use]
pub fn array_of(component: &TypeRef) -> TypeRef {
    let name = format!("{}[]", component.name());
    synthesize(&name, || {
        let element_type = component.name().to_string();
        let set_type = element_type.clone();
        TypeBuilder::new(&name, TypeKind::Array(component.clone()))
            .extends(&object())
            .layout(Layout::Array)
            .no_default_constructor()
            .method("get", &["int"], Some(&element_type), |this, args| {
                read_items(this, "get", |items| {
                    let i = checked_index(&args[0], items.len())?;
                    Ok(items[i].clone())
                })
            })
            .method("set", &["int", "Object"], None, move |this, args| {
                if !args[1].is_assignable_to(&set_type) {
                    return Err(InvokeError::mismatch(set_type.clone(), args[1].to_string()));
                }
                with_items(this, "set", |items| {
                    let i = checked_index(&args[0], items.len())?;
                    items[i] = args[1].clone();
                    Ok(Value::Null)
                })
            })
            .method("getLength", &[], Some("int"), |this, _| {
                read_items(this, "getLength", |items| Ok(length(items.len())))
            })
            .build()
    })
}

/// Proxy type implementing `interfaces`
#[must_use]
pub fn proxy_type(interfaces: &[TypeRef]) -> TypeRef {
    let suffix: Vec<String> = interfaces.iter().map(|i| i.name().replace('.', "_")).collect();
    let name = format!("Proxy${}", suffix.join("$"));
    synthesize(&name, || {
        interfaces
            .iter()
            .fold(
                TypeBuilder::new(&name, TypeKind::Class).extends(&proxy()),
                TypeBuilder::implements,
            )
            .no_default_constructor()
            .build()
    })
}

fn synthesize(name: &str, build: impl FnOnce() -> TypeRef) -> TypeRef {
    if let Some(existing) = SYNTHESIZED.with(|s| s.borrow().get(name).cloned()) {
        return existing;
    }
    let ty = build();
    SYNTHESIZED.with(|s| s.borrow_mut().insert(name.to_string(), ty.clone()));
    ty
}

/// Array object of `component` with the given elements
#[must_use]
pub fn new_array(component: &TypeRef, items: Vec<Value>) -> Value {
    Value::Object(ObjectRef::new(&array_of(component), Body::Array(items)))
}

/// Forward a proxied call through an event handler
///
/// # Errors
/// Failures raised while reading the event property or invoking the action
pub fn forward_event(state: &HandlerState, method: &str, args: &[Value]) -> InvokeResult<Value> {
    if let Some(only) = &state.listener_method_name {
        if only != method {
            return Ok(Value::Null);
        }
    }
    let action_args = match &state.event_property_name {
        Some(path) => vec![apply_getters(args.first().cloned().unwrap_or_default(), path)?],
        None => Vec::new(),
    };
    let (target, action) = match state.action.rsplit_once('.') {
        Some((path, action)) => (apply_getters(state.target.clone(), path)?, action),
        None => (state.target.clone(), state.action.as_str()),
    };
    match invoke(&target, action, &action_args) {
        Err(InvokeError::NoSuchMethod { .. }) => {
            invoke(&target, &format!("set{}", capitalize(action)), &action_args)
        }
        other => other,
    }
}

fn apply_getters(value: Value, path: &str) -> InvokeResult<Value> {
    path.split('.').try_fold(value, |current, property| {
        match invoke(&current, &format!("get{}", capitalize(property)), &[]) {
            Err(InvokeError::NoSuchMethod { .. }) => {
                invoke(&current, &format!("is{}", capitalize(property)), &[])
            }
            other => other,
        }
    })
}

impl Builtins {
    fn build() -> Self {
        let object = object_type();
        let primitives = PrimitiveKind::ALL
            .map(|kind| TypeBuilder::new(kind.type_name(), TypeKind::Primitive(kind)).build());
        let number = TypeBuilder::new("Number", TypeKind::Class)
            .extends(&object)
            .no_default_constructor()
            .build();
        let wrappers = PrimitiveKind::ALL.map(|kind| {
            let parent = match kind {
                PrimitiveKind::Boolean | PrimitiveKind::Char => &object,
                _ => &number,
            };
            wrapper_type(kind, parent)
        });
        let class = class_type(&object);
        let field = TypeBuilder::new("Field", TypeKind::Class)
            .extends(&object)
            .no_default_constructor()
            .build();
        let string = string_type(&object);
        let enum_type = enum_base(&object);
        let array = array_utility(&object);
        let list = list_methods(list_reads(base("List", &object, Layout::List)))
            .constructor(&[], |ty, _| Ok(Value::Object(ObjectRef::instantiate(ty))))
            .build();
        let set = set_methods(set_reads(base("Set", &object, Layout::Set)))
            .constructor(&[], |ty, _| Ok(Value::Object(ObjectRef::instantiate(ty))))
            .build();
        let map = map_methods(map_reads(base("Map", &object, Layout::Map)))
            .constructor(&[], |ty, _| Ok(Value::Object(ObjectRef::instantiate(ty))))
            .build();
        let unmodifiable_list =
            list_reads(base("UnmodifiableList", &object, Layout::List).no_default_constructor())
                .build();
        let unmodifiable_set =
            set_reads(base("UnmodifiableSet", &object, Layout::Set).no_default_constructor()).build();
        let unmodifiable_map =
            map_reads(base("UnmodifiableMap", &object, Layout::Map).no_default_constructor()).build();
        let collections =
            collections_type(&object, &unmodifiable_list, &unmodifiable_set, &unmodifiable_map);
        let date = date_type(&object);
        let proxy = proxy_base(&object);
        let event_handler = event_handler_type(&object);

        let mut by_name = IndexMap::new();
        let all = [
            &object,
            &number,
            &class,
            &field,
            &string,
            &enum_type,
            &array,
            &list,
            &set,
            &map,
            &unmodifiable_list,
            &unmodifiable_set,
            &unmodifiable_map,
            &collections,
            &date,
            &proxy,
            &event_handler,
        ];
        for ty in all.into_iter().chain(&primitives).chain(&wrappers) {
            by_name.insert(ty.name().to_string(), ty.clone());
        }

        Self {
            object,
            class,
            field,
            string,
            enum_type,
            list,
            set,
            map,
            date,
            proxy,
            event_handler,
            primitives,
            wrappers,
            by_name,
        }
    }
}

fn base(name: &str, object: &TypeRef, layout: Layout) -> TypeBuilder {
    TypeBuilder::new(name, TypeKind::Class)
        .extends(object)
        .layout(layout)
}

fn object_type() -> TypeRef {
    TypeBuilder::new("Object", TypeKind::Class)
        .method("equals", &["Object"], Some("boolean"), |this, args| {
            Ok(Value::Bool(this.equals(&args[0])))
        })
        .method("toString", &[], Some("String"), |this, _| {
            Ok(Value::str(this.to_string()))
        })
        .method("getClass", &[], Some("Class"), |this, _| {
            Ok(this.runtime_type().map_or(Value::Null, Value::Type))
        })
        .build()
}

fn wrapper_type(kind: PrimitiveKind, parent: &TypeRef) -> TypeRef {
    let primitive = kind.type_name();
    TypeBuilder::new(kind.wrapper_name(), TypeKind::Class)
        .extends(parent)
        .constructor(&["String"], move |_, args| match &args[0] {
            Value::Str(text) => kind.parse(text),
            other => Err(InvokeError::mismatch("String", other.to_string())),
        })
        .constructor(&[primitive], |_, args| Ok(args[0].clone()))
        .method(&format!("{primitive}Value"), &[], Some(primitive), |this, _| {
            Ok(this.clone())
        })
        .static_method("valueOf", &["String"], Some(kind.wrapper_name()), move |_, args| {
            match &args[0] {
                Value::Str(text) => kind.parse(text),
                other => Err(InvokeError::mismatch("String", other.to_string())),
            }
        })
        .build()
}

fn class_type(object: &TypeRef) -> TypeRef {
    TypeBuilder::new("Class", TypeKind::Class)
        .extends(object)
        .no_default_constructor()
        .method("getName", &[], Some("String"), |this, _| match this {
            Value::Type(ty) => Ok(Value::str(ty.name())),
            other => Err(InvokeError::mismatch("Class", other.to_string())),
        })
        .method("isInstance", &["Object"], Some("boolean"), |this, args| match this {
            Value::Type(ty) => Ok(Value::Bool(args[0].is_assignable_to(ty.name()) && !args[0].is_null())),
            other => Err(InvokeError::mismatch("Class", other.to_string())),
        })
        .build()
}

fn string_type(object: &TypeRef) -> TypeRef {
    TypeBuilder::new("String", TypeKind::Class)
        .extends(object)
        .constructor(&[], |_, _| Ok(Value::str("")))
        .constructor(&["String"], |_, args| Ok(args[0].clone()))
        .method("length", &[], Some("int"), |this, _| {
            let text = this.as_str().unwrap_or_default();
            Ok(length(text.chars().count()))
        })
        .method("isEmpty", &[], Some("boolean"), |this, _| {
            Ok(Value::Bool(this.as_str().unwrap_or_default().is_empty()))
        })
        .method("toString", &[], Some("String"), |this, _| Ok(this.clone()))
        .build()
}

fn enum_base(object: &TypeRef) -> TypeRef {
    TypeBuilder::new("Enum", TypeKind::Class)
        .extends(object)
        .no_default_constructor()
        .static_method("valueOf", &["Class", "String"], Some("Enum"), |_, args| {
            let (Value::Type(ty), Value::Str(name)) = (&args[0], &args[1]) else {
                return Err(InvokeError::mismatch("Class, String", format!("{args:?}")));
            };
            ty.enum_constant(name).ok_or_else(|| {
                InvokeError::raised("Enum.valueOf", format!("no constant {}.{name}", ty.name()))
            })
        })
        .method("name", &[], Some("String"), |this, _| match this {
            Value::Enum(c) => Ok(Value::str(c.name())),
            other => Err(InvokeError::mismatch("Enum", other.to_string())),
        })
        .method("ordinal", &[], Some("int"), |this, _| match this {
            Value::Enum(c) => Ok(length(c.ordinal())),
            other => Err(InvokeError::mismatch("Enum", other.to_string())),
        })
        .method("toString", &[], Some("String"), |this, _| match this {
            Value::Enum(c) => Ok(Value::str(c.name())),
            other => Ok(Value::str(other.to_string())),
        })
        .build()
}

fn array_utility(object: &TypeRef) -> TypeRef {
    TypeBuilder::new("Array", TypeKind::Class)
        .extends(object)
        .no_default_constructor()
        .static_method("newInstance", &["Class", "int"], Some("Object"), |_, args| {
            let (Value::Type(component), Value::Int(len)) = (&args[0], &args[1]) else {
                return Err(InvokeError::mismatch("Class, int", format!("{args:?}")));
            };
            let len = usize::try_from(*len).map_err(|_| InvokeError::IndexOutOfBounds {
                index: i64::from(*len),
                length: 0,
            })?;
            let default = component
                .primitive()
                .map_or(Value::Null, PrimitiveKind::default_value);
            Ok(new_array(component, vec![default; len]))
        })
        .static_method("getLength", &["Object"], Some("int"), |_, args| {
            read_items(&args[0], "Array.getLength", |items| Ok(length(items.len())))
        })
        .build()
}

fn list_reads(builder: TypeBuilder) -> TypeBuilder {
    builder
        .method("get", &["int"], Some("Object"), |this, args| {
            read_items(this, "get", |items| {
                let i = checked_index(&args[0], items.len())?;
                Ok(items[i].clone())
            })
        })
        .method("size", &[], Some("int"), |this, _| {
            read_items(this, "size", |items| Ok(length(items.len())))
        })
        .method("isEmpty", &[], Some("boolean"), |this, _| {
            read_items(this, "isEmpty", |items| Ok(Value::Bool(items.is_empty())))
        })
        .method("contains", &["Object"], Some("boolean"), |this, args| {
            read_items(this, "contains", |items| {
                Ok(Value::Bool(items.iter().any(|v| v.equals(&args[0]))))
            })
        })
        .method("indexOf", &["Object"], Some("int"), |this, args| {
            read_items(this, "indexOf", |items| {
                Ok(items
                    .iter()
                    .position(|v| v.equals(&args[0]))
                    .map_or(Value::Int(-1), length))
            })
        })
}

fn list_methods(builder: TypeBuilder) -> TypeBuilder {
    builder
        .method("add", &["Object"], Some("boolean"), |this, args| {
            with_items(this, "add", |items| {
                items.push(args[0].clone());
                Ok(Value::Bool(true))
            })
        })
        .method("add", &["int", "Object"], None, |this, args| {
            with_items(this, "add", |items| {
                let i = checked_index(&args[0], items.len() + 1)?;
                items.insert(i, args[1].clone());
                Ok(Value::Null)
            })
        })
        .method("set", &["int", "Object"], Some("Object"), |this, args| {
            with_items(this, "set", |items| {
                let i = checked_index(&args[0], items.len())?;
                Ok(std::mem::replace(&mut items[i], args[1].clone()))
            })
        })
        .method("remove", &["int"], Some("Object"), |this, args| {
            with_items(this, "remove", |items| {
                let i = checked_index(&args[0], items.len())?;
                Ok(items.remove(i))
            })
        })
        .method("clear", &[], None, |this, _| {
            with_items(this, "clear", |items| {
                items.clear();
                Ok(Value::Null)
            })
        })
}

fn set_reads(builder: TypeBuilder) -> TypeBuilder {
    builder
        .method("size", &[], Some("int"), |this, _| {
            read_items(this, "size", |items| Ok(length(items.len())))
        })
        .method("isEmpty", &[], Some("boolean"), |this, _| {
            read_items(this, "isEmpty", |items| Ok(Value::Bool(items.is_empty())))
        })
        .method("contains", &["Object"], Some("boolean"), |this, args| {
            read_items(this, "contains", |items| {
                Ok(Value::Bool(items.iter().any(|v| v.equals(&args[0]))))
            })
        })
}

fn set_methods(builder: TypeBuilder) -> TypeBuilder {
    builder
        .method("add", &["Object"], Some("boolean"), |this, args| {
            if read_position(this, "add", &args[0])?.is_some() {
                return Ok(Value::Bool(false));
            }
            with_items(this, "add", |items| {
                items.push(args[0].clone());
                Ok(Value::Bool(true))
            })
        })
        .method("remove", &["Object"], Some("boolean"), |this, args| {
            let Some(i) = read_position(this, "remove", &args[0])? else {
                return Ok(Value::Bool(false));
            };
            with_items(this, "remove", |items| {
                items.remove(i);
                Ok(Value::Bool(true))
            })
        })
        .method("clear", &[], None, |this, _| {
            with_items(this, "clear", |items| {
                items.clear();
                Ok(Value::Null)
            })
        })
}

fn map_reads(builder: TypeBuilder) -> TypeBuilder {
    builder
        .method("get", &["Object"], Some("Object"), |this, args| {
            read_entries(this, "get", |entries| {
                Ok(entries
                    .iter()
                    .find(|(k, _)| k.equals(&args[0]))
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default())
            })
        })
        .method("containsKey", &["Object"], Some("boolean"), |this, args| {
            read_entries(this, "containsKey", |entries| {
                Ok(Value::Bool(entries.iter().any(|(k, _)| k.equals(&args[0]))))
            })
        })
        .method("size", &[], Some("int"), |this, _| {
            read_entries(this, "size", |entries| Ok(length(entries.len())))
        })
        .method("isEmpty", &[], Some("boolean"), |this, _| {
            read_entries(this, "isEmpty", |entries| Ok(Value::Bool(entries.is_empty())))
        })
}

fn map_methods(builder: TypeBuilder) -> TypeBuilder {
    builder
        .method("put", &["Object", "Object"], Some("Object"), |this, args| {
            let position = key_position(this, "put", &args[0])?;
            with_entries(this, "put", |entries| match position {
                Some(i) => Ok(std::mem::replace(&mut entries[i].1, args[1].clone())),
                None => {
                    entries.push((args[0].clone(), args[1].clone()));
                    Ok(Value::Null)
                }
            })
        })
        .method("remove", &["Object"], Some("Object"), |this, args| {
            let Some(i) = key_position(this, "remove", &args[0])? else {
                return Ok(Value::Null);
            };
            with_entries(this, "remove", |entries| Ok(entries.remove(i).1))
        })
        .method("clear", &[], None, |this, _| {
            with_entries(this, "clear", |entries| {
                entries.clear();
                Ok(Value::Null)
            })
        })
}

fn collections_type(
    object: &TypeRef,
    list: &TypeRef,
    set: &TypeRef,
    map: &TypeRef,
) -> TypeRef {
    let (list, set, map) = (list.clone(), set.clone(), map.clone());
    TypeBuilder::new("Collections", TypeKind::Class)
        .extends(object)
        .no_default_constructor()
        .static_method("unmodifiableList", &["Object"], Some("List"), move |_, args| {
            let items = expect_items(&args[0], "unmodifiableList", |b| matches!(b, Body::List(_)))?;
            Ok(Value::Object(ObjectRef::new(&list, Body::List(items))))
        })
        .static_method("unmodifiableSet", &["Object"], Some("Set"), move |_, args| {
            let items = expect_items(&args[0], "unmodifiableSet", |b| matches!(b, Body::Set(_)))?;
            Ok(Value::Object(ObjectRef::new(&set, Body::Set(items))))
        })
        .static_method("unmodifiableMap", &["Object"], Some("Map"), move |_, args| {
            let entries = expect_object(&args[0], "unmodifiableMap")?
                .entries()
                .ok_or_else(|| InvokeError::mismatch("Map", args[0].to_string()))?;
            Ok(Value::Object(ObjectRef::new(&map, Body::Map(entries))))
        })
        .build()
}

fn date_type(object: &TypeRef) -> TypeRef {
    base("Date", object, Layout::Date)
        .constructor(&[], |ty, _| Ok(Value::Object(ObjectRef::new(ty, Body::Date(Utc::now())))))
        .constructor(&["long"], |ty, args| {
            let instant = instant_from(&args[0])?;
            Ok(Value::Object(ObjectRef::new(ty, Body::Date(instant))))
        })
        .method("getTime", &[], Some("long"), |this, _| {
            expect_object(this, "getTime")?.with_body(|body| match body {
                Body::Date(instant) => Ok(Value::Long(instant.timestamp_millis())),
                _ => Err(InvokeError::mismatch("Date", this.to_string())),
            })
        })
        .method("setTime", &["long"], None, |this, args| {
            let instant = instant_from(&args[0])?;
            expect_object(this, "setTime")?.with_body_mut(|body| match body {
                Body::Date(current) => {
                    *current = instant;
                    Ok(Value::Null)
                }
                _ => Err(InvokeError::mismatch("Date", this.to_string())),
            })
        })
        .build()
}

fn instant_from(millis: &Value) -> InvokeResult<DateTime<Utc>> {
    let millis = millis
        .as_i64()
        .ok_or_else(|| InvokeError::mismatch("long", millis.to_string()))?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| InvokeError::raised("Date.new", format!("instant {millis} out of range")))
}

fn proxy_base(object: &TypeRef) -> TypeRef {
    base("Proxy", object, Layout::Proxy)
        .no_default_constructor()
        .static_method("newProxyInstance", &["Class[]", "Object"], Some("Object"), |_, args| {
            let interfaces = expect_object(&args[0], "newProxyInstance")?
                .elements()
                .unwrap_or_default()
                .into_iter()
                .map(|v| match v {
                    Value::Type(ty) if ty.is_interface() => Ok(ty),
                    other => Err(InvokeError::mismatch("interface", other.to_string())),
                })
                .collect::<InvokeResult<Vec<_>>>()?;
            Ok(new_proxy(interfaces, args[1].clone()))
        })
        .static_method("getInvocationHandler", &["Object"], Some("Object"), |_, args| {
            expect_object(&args[0], "getInvocationHandler")?.with_body(|body| match body {
                Body::Proxy(state) => Ok(state.handler.clone()),
                _ => Err(InvokeError::mismatch("proxy", args[0].to_string())),
            })
        })
        .build()
}

fn new_proxy(interfaces: Vec<TypeRef>, handler: Value) -> Value {
    let ty = proxy_type(&interfaces);
    Value::Object(ObjectRef::new(&ty, Body::Proxy(ProxyState { interfaces, handler })))
}

fn event_handler_type(object: &TypeRef) -> TypeRef {
    let create = |_: &TypeRef, args: &[Value]| -> InvokeResult<Value> {
        let Value::Type(interface) = &args[0] else {
            return Err(InvokeError::mismatch("Class", args[0].to_string()));
        };
        let state = handler_state(&args[1..])?;
        let handler = ObjectRef::new(&event_handler(), Body::EventHandler(state));
        Ok(new_proxy(vec![interface.clone()], Value::Object(handler)))
    };
    base("EventHandler", object, Layout::EventHandler)
        .constructor(&["Object", "String", "String", "String"], |ty, args| {
            let state = handler_state(args)?;
            Ok(Value::Object(ObjectRef::new(ty, Body::EventHandler(state))))
        })
        .static_method("create", &["Class", "Object", "String"], Some("Object"), create)
        .static_method("create", &["Class", "Object", "String", "String"], Some("Object"), create)
        .static_method(
            "create",
            &["Class", "Object", "String", "String", "String"],
            Some("Object"),
            create,
        )
        .method("getTarget", &[], Some("Object"), |this, _| {
            with_handler(this, |s| s.target.clone())
        })
        .method("getAction", &[], Some("String"), |this, _| {
            with_handler(this, |s| Value::str(&s.action))
        })
        .method("getEventPropertyName", &[], Some("String"), |this, _| {
            with_handler(this, |s| s.event_property_name.as_ref().map_or(Value::Null, Value::str))
        })
        .method("getListenerMethodName", &[], Some("String"), |this, _| {
            with_handler(this, |s| s.listener_method_name.as_ref().map_or(Value::Null, Value::str))
        })
        .method("invoke", &["Object", "String", "Object[]"], Some("Object"), |this, args| {
            let state = expect_object(this, "invoke")?.with_body(|body| match body {
                Body::EventHandler(state) => Ok(state.clone()),
                _ => Err(InvokeError::mismatch("EventHandler", this.to_string())),
            })?;
            let method = args[1].as_str().unwrap_or_default();
            let call_args = args[2]
                .as_object()
                .and_then(ObjectRef::elements)
                .unwrap_or_default();
            forward_event(&state, method, &call_args)
        })
        .build()
}

fn handler_state(args: &[Value]) -> InvokeResult<HandlerState> {
    let text = |i: usize| args.get(i).and_then(Value::as_str).map(ToString::to_string);
    let action = text(1).ok_or_else(|| {
        InvokeError::mismatch("String", args.get(1).map(ToString::to_string).unwrap_or_default())
    })?;
    Ok(HandlerState {
        target: args[0].clone(),
        action,
        event_property_name: text(2),
        listener_method_name: text(3),
    })
}

fn with_handler(this: &Value, f: impl FnOnce(&HandlerState) -> Value) -> InvokeResult<Value> {
    expect_object(this, "EventHandler")?.with_body(|body| match body {
        Body::EventHandler(state) => Ok(f(state)),
        _ => Err(InvokeError::mismatch("EventHandler", this.to_string())),
    })
}

fn with_items(
    this: &Value,
    operation: &str,
    f: impl FnOnce(&mut Vec<Value>) -> InvokeResult<Value>,
) -> InvokeResult<Value> {
    expect_object(this, operation)?.with_body_mut(|body| match body {
        Body::Array(items) | Body::List(items) | Body::Set(items) => f(items),
        _ => Err(InvokeError::Unsupported(format!("{operation} on {this}"))),
    })
}

fn read_items(
    this: &Value,
    operation: &str,
    f: impl FnOnce(&[Value]) -> InvokeResult<Value>,
) -> InvokeResult<Value> {
    expect_object(this, operation)?.with_body(|body| match body {
        Body::Array(items) | Body::List(items) | Body::Set(items) => f(items),
        _ => Err(InvokeError::Unsupported(format!("{operation} on {this}"))),
    })
}

fn read_position(this: &Value, operation: &str, element: &Value) -> InvokeResult<Option<usize>> {
    let items = expect_object(this, operation)?
        .elements()
        .ok_or_else(|| InvokeError::Unsupported(format!("{operation} on {this}")))?;
    Ok(items.iter().position(|v| v.equals(element)))
}

fn read_entries(
    this: &Value,
    operation: &str,
    f: impl FnOnce(&[(Value, Value)]) -> InvokeResult<Value>,
) -> InvokeResult<Value> {
    expect_object(this, operation)?.with_body(|body| match body {
        Body::Map(entries) => f(entries),
        _ => Err(InvokeError::Unsupported(format!("{operation} on {this}"))),
    })
}

fn key_position(this: &Value, operation: &str, key: &Value) -> InvokeResult<Option<usize>> {
    let entries = expect_object(this, operation)?
        .entries()
        .ok_or_else(|| InvokeError::Unsupported(format!("{operation} on {this}")))?;
    Ok(entries.iter().position(|(k, _)| k.equals(key)))
}

fn with_entries(
    this: &Value,
    operation: &str,
    f: impl FnOnce(&mut Vec<(Value, Value)>) -> InvokeResult<Value>,
) -> InvokeResult<Value> {
    expect_object(this, operation)?.with_body_mut(|body| match body {
        Body::Map(entries) => f(entries),
        _ => Err(InvokeError::Unsupported(format!("{operation} on {this}"))),
    })
}

fn expect_items(
    value: &Value,
    operation: &str,
    shape: impl Fn(&Body) -> bool,
) -> InvokeResult<Vec<Value>> {
    let obj = expect_object(value, operation)?;
    if !obj.with_body(shape) {
        return Err(InvokeError::mismatch(operation.to_string(), value.to_string()));
    }
    Ok(obj.elements().unwrap_or_default())
}

fn checked_index(index: &Value, len: usize) -> InvokeResult<usize> {
    let raw = index
        .as_i64()
        .ok_or_else(|| InvokeError::mismatch("int", index.to_string()))?;
    usize::try_from(raw)
        .ok()
        .filter(|i| *i < len)
        .ok_or(InvokeError::IndexOutOfBounds { index: raw, length: len })
}

fn length(len: usize) -> Value {
    Value::Int(i32::try_from(len).unwrap_or(i32::MAX))
}
