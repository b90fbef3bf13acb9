//! Test fixtures
//!
//! Small bean types exercising every encoding path, plus a tracing
//! initialiser for tests that want to see encoder logs
//! (`RUST_LOG=bean_persist=trace`).

#![warn(missing_docs)]

use bean_model::{
    builtins, InvokeError, ObjectRef, TypeBuilder, TypeRef, TypeRegistry, Value,
};
use once_cell::sync::Lazy;

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

/// Install a test subscriber once per process
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

fn object(value: &Value) -> &ObjectRef {
    value.as_object().expect("fixture value is an object")
}

/// Set a slot on a fixture instance
pub fn set(value: &Value, slot: &str, to: impl Into<Value>) {
    object(value)
        .set_slot(slot, to.into())
        .expect("fixture slot exists");
}

/// Read a slot of a fixture instance
#[must_use]
pub fn slot(value: &Value, slot: &str) -> Value {
    object(value).slot(slot).expect("fixture slot exists")
}

/// `demo.Point`: read-write `x` and `y`
#[must_use]
pub fn point_type() -> TypeRef {
    TypeBuilder::class("demo.Point")
        .property("x", "int")
        .property("y", "int")
        .build()
}

/// New point
#[must_use]
pub fn point(ty: &TypeRef, x: i32, y: i32) -> Value {
    let p = ty.construct(&[]).expect("point constructs");
    set(&p, "x", x);
    set(&p, "y", y);
    p
}

/// `demo.Rect`: `a` and `b` are constructor properties, `c` is settable
///
/// Equality only looks at `a` and `b`.
#[must_use]
pub fn rect_type() -> TypeRef {
    TypeBuilder::class("demo.Rect")
        .read_only_property("a", "int")
        .read_only_property("b", "int")
        .property("c", "int")
        .constructor(&["int", "int"], |ty, args| {
            let rect = ObjectRef::instantiate(ty);
            rect.set_slot("a", args[0].clone())?;
            rect.set_slot("b", args[1].clone())?;
            Ok(Value::Object(rect))
        })
        .constructor_properties(&["a", "b"])
        .equality(|x, y| x.slot("a").is_some_and(|a| y.slot("a").is_some_and(|b| a.equals(&b)))
            && x.slot("b").is_some_and(|a| y.slot("b").is_some_and(|b| a.equals(&b))))
        .build()
}

/// New rectangle
#[must_use]
pub fn rect(ty: &TypeRef, a: i32, b: i32, c: i32) -> Value {
    let r = ty.construct(&[Value::Int(a), Value::Int(b)]).expect("rect constructs");
    set(&r, "c", c);
    r
}

/// `demo.Node`: `name` and a `next` link, for cycles and sharing
#[must_use]
pub fn node_type() -> TypeRef {
    TypeBuilder::class("demo.Node")
        .property("name", "String")
        .property("next", "demo.Node")
        .build()
}

/// New node
#[must_use]
pub fn node(ty: &TypeRef, name: &str) -> Value {
    let n = ty.construct(&[]).expect("node constructs");
    set(&n, "name", name);
    n
}

/// `demo.Flaky`: `alpha`, `beta` and `gamma`, where reading `beta` fails
#[must_use]
pub fn flaky_type() -> TypeRef {
    TypeBuilder::class("demo.Flaky")
        .property("alpha", "int")
        .slot("beta", "int")
        .method("getBeta", &[], Some("int"), |_, _| {
            Err(InvokeError::raised("getBeta", "sensor offline"))
        })
        .method("setBeta", &["int"], None, |this, args| {
            this.as_object()
                .ok_or_else(|| InvokeError::mismatch("demo.Flaky", this.to_string()))?
                .set_slot("beta", args[0].clone())?;
            Ok(Value::Null)
        })
        .property("gamma", "int")
        .build()
}

/// `demo.Color`: `RED`, `GREEN`, `BLUE`
#[must_use]
pub fn color_type() -> TypeRef {
    TypeBuilder::enumeration("demo.Color", &["RED", "GREEN", "BLUE"]).build()
}

/// `demo.Shape`: a `color` and a `name`
#[must_use]
pub fn shape_type(color: &TypeRef) -> TypeRef {
    TypeBuilder::class("demo.Shape")
        .property("color", color.name())
        .property("name", "String")
        .build()
}

/// `demo.Label`: `alignment` takes one of the `LEFT`, `CENTER`, `RIGHT` constants
#[must_use]
pub fn label_type() -> TypeRef {
    TypeBuilder::class("demo.Label")
        .constant("LEFT", Value::Int(2))
        .constant("CENTER", Value::Int(0))
        .constant("RIGHT", Value::Int(4))
        .property("alignment", "int")
        .property("text", "String")
        .property_constants("alignment", &["LEFT", "CENTER", "RIGHT"])
        .build()
}

/// `ui.ActionListener`
#[must_use]
pub fn action_listener_type() -> TypeRef {
    TypeBuilder::interface("ui.ActionListener")
        .method("actionPerformed", &["Object"], None, |_, _| Ok(Value::Null))
        .build()
}

/// `ComponentListener`, registered by components on themselves
#[must_use]
pub fn component_listener_type() -> TypeRef {
    TypeBuilder::interface("ComponentListener")
        .method("componentResized", &["Object"], None, |_, _| Ok(Value::Null))
        .build()
}

/// `Component`: a `name` and component listeners
#[must_use]
pub fn component_type(component_listener: &TypeRef) -> TypeRef {
    TypeBuilder::class("Component")
        .property("name", "String")
        .listener_set(component_listener)
        .build()
}

/// `ui.Button`: a component with `text` and action listeners
#[must_use]
pub fn button_type(component: &TypeRef, action_listener: &TypeRef) -> TypeRef {
    TypeBuilder::class("ui.Button")
        .extends(component)
        .property("text", "String")
        .listener_set(action_listener)
        .build()
}

/// `demo.Counter`: `count` plus an `increment` action
#[must_use]
pub fn counter_type() -> TypeRef {
    TypeBuilder::class("demo.Counter")
        .property("count", "int")
        .method("increment", &[], None, |this, _| {
            let obj = this
                .as_object()
                .ok_or_else(|| InvokeError::mismatch("demo.Counter", this.to_string()))?;
            let next = obj.slot("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
            obj.set_slot("count", Value::Int(i32::try_from(next).unwrap_or(i32::MAX)))?;
            Ok(Value::Null)
        })
        .build()
}

/// Event handler proxy calling `action` on `target` for `listener` events
#[must_use]
pub fn event_listener(listener: &TypeRef, target: &Value, action: &str) -> Value {
    builtins::event_handler()
        .invoke_static(
            "create",
            &[Value::Type(listener.clone()), target.clone(), Value::str(action)],
        )
        .expect("event handler proxy")
}

/// `demo.Team`: collection-valued properties
#[must_use]
pub fn team_type() -> TypeRef {
    TypeBuilder::class("demo.Team")
        .property("members", "List")
        .property("tags", "Set")
        .property("scores", "Map")
        .property("founded", "Date")
        .build()
}

/// `demo.Record`: an `id` property and public `note` and `count` fields
#[must_use]
pub fn record_type() -> TypeRef {
    TypeBuilder::class("demo.Record")
        .property("id", "int")
        .field("note", "String")
        .field("count", "int")
        .build()
}

/// New list holding `items`
#[must_use]
pub fn list_of(items: Vec<Value>) -> Value {
    let list = builtins::list().construct(&[]).expect("list constructs");
    for item in items {
        bean_model::invoke(&list, "add", &[item]).expect("list add");
    }
    list
}

/// New set holding `items`
#[must_use]
pub fn set_of(items: Vec<Value>) -> Value {
    let set = builtins::set().construct(&[]).expect("set constructs");
    for item in items {
        bean_model::invoke(&set, "add", &[item]).expect("set add");
    }
    set
}

/// New map holding `entries`
#[must_use]
pub fn map_of(entries: Vec<(Value, Value)>) -> Value {
    let map = builtins::map().construct(&[]).expect("map constructs");
    for (key, value) in entries {
        bean_model::invoke(&map, "put", &[key, value]).expect("map put");
    }
    map
}

/// Every fixture type, registered by name
#[must_use]
pub fn fixture_types() -> TypeRegistry {
    let color = color_type();
    let action = action_listener_type();
    let component_listener = component_listener_type();
    let component = component_type(&component_listener);
    TypeRegistry::new()
        .with(point_type())
        .with(rect_type())
        .with(node_type())
        .with(flaky_type())
        .with(shape_type(&color))
        .with(color)
        .with(label_type())
        .with(button_type(&component, &action))
        .with(component)
        .with(action)
        .with(component_listener)
        .with(counter_type())
        .with(team_type())
        .with(record_type())
}
