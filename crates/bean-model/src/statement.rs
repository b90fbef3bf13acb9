//! Statements and expressions
//!
//! A [`Statement`] records "invoke `operation` on `target` with `arguments`".
//! An [`Expression`] adds a memoized result: once evaluated (or preset) the
//! operation is never invoked again.

use crate::builtins;
use crate::error::{InvokeError, InvokeResult};
use crate::naming::unqualified_type_name;
use crate::object::Body;
use crate::value::Value;
use std::cell::RefCell;
use std::fmt;

/// Dispatch `operation` on `target`
///
/// Type targets run constructors (`new`) and static methods, field targets
/// answer `get(obj)` and `set(obj, value)`, proxies forward every call to
/// their handler's `invoke`, and everything else runs an instance method
/// found along the runtime type's supertype chain.
///
/// # Errors
/// Structural failures for a null target or empty operation, lookup failures,
/// and whatever the invoked body raises
pub fn invoke(target: &Value, operation: &str, args: &[Value]) -> InvokeResult<Value> {
    if operation.is_empty() {
        return Err(InvokeError::MissingOperation);
    }
    match target {
        Value::Null => Err(InvokeError::MissingTarget {
            operation: operation.to_string(),
        }),
        Value::Type(ty) if operation == "new" => ty.construct(args),
        Value::Type(ty) => match ty.find_static(operation, args) {
            Some(method) => method.call_static(ty, args),
            None => invoke_instance(target, operation, args),
        },
        Value::Field(field) => match (operation, args) {
            ("get", [obj]) => field.get(obj),
            ("set", [obj, value]) => field.set(obj, value.clone()).map(|()| Value::Null),
            _ => Err(InvokeError::NoSuchMethod {
                type_name: "Field".to_string(),
                method: operation.to_string(),
                arity: args.len(),
            }),
        },
        Value::Object(obj) => {
            let handler = obj.with_body(|body| match body {
                Body::Proxy(state) => Some(state.handler.clone()),
                _ => None,
            });
            match handler {
                Some(handler) => {
                    let forwarded = builtins::new_array(&builtins::object(), args.to_vec());
                    invoke(
                        &handler,
                        "invoke",
                        &[target.clone(), Value::str(operation), forwarded],
                    )
                }
                None => invoke_instance(target, operation, args),
            }
        }
        _ => invoke_instance(target, operation, args),
    }
}

fn invoke_instance(target: &Value, operation: &str, args: &[Value]) -> InvokeResult<Value> {
    let ty = target.runtime_type().ok_or_else(|| InvokeError::MissingTarget {
        operation: operation.to_string(),
    })?;
    let method = ty
        .find_method(operation, args)
        .ok_or_else(|| InvokeError::NoSuchMethod {
            type_name: ty.name().to_string(),
            method: operation.to_string(),
            arity: args.len(),
        })?;
    method.call(target, args)
}

/// Immutable record of an invocation
#[derive(Clone)]
pub struct Statement {
    target: Value,
    operation: String,
    arguments: Vec<Value>,
}

impl Statement {
    /// Create a statement
    pub fn new(target: impl Into<Value>, operation: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            target: target.into(),
            operation: operation.into(),
            arguments,
        }
    }

    /// Target value
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Value {
        &self.target
    }

    /// Operation name
    #[inline]
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Arguments in order
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Check that target and operation are present
    ///
    /// # Errors
    /// [`InvokeError::MissingTarget`] or [`InvokeError::MissingOperation`]
    pub fn validate(&self) -> InvokeResult<()> {
        if self.operation.is_empty() {
            return Err(InvokeError::MissingOperation);
        }
        if self.target.is_null() {
            return Err(InvokeError::MissingTarget {
                operation: self.operation.clone(),
            });
        }
        Ok(())
    }

    /// Execute, discarding any result
    ///
    /// # Errors
    /// Whatever [`invoke`] raises
    pub fn execute(&self) -> InvokeResult<()> {
        self.invoke().map(|_| ())
    }

    pub(crate) fn invoke(&self) -> InvokeResult<Value> {
        self.validate()?;
        invoke(&self.target, &self.operation, &self.arguments)
    }

    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", render_value(&self.target), self.operation)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&render_value(arg))?;
        }
        f.write_str(");")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f)
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Statement({self})")
    }
}

/// Statement with a memoized result
#[derive(Clone)]
pub struct Expression {
    statement: Statement,
    value: RefCell<Option<Value>>,
}

impl Expression {
    /// Expression whose value is computed on demand
    pub fn new(target: impl Into<Value>, operation: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            statement: Statement::new(target, operation, arguments),
            value: RefCell::new(None),
        }
    }

    /// Expression whose value is already known
    pub fn with_value(
        value: Value,
        target: impl Into<Value>,
        operation: impl Into<String>,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            statement: Statement::new(target, operation, arguments),
            value: RefCell::new(Some(value)),
        }
    }

    /// Underlying statement
    #[inline]
    #[must_use]
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Target value
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Value {
        self.statement.target()
    }

    /// Operation name
    #[inline]
    #[must_use]
    pub fn operation(&self) -> &str {
        self.statement.operation()
    }

    /// Arguments in order
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        self.statement.arguments()
    }

    /// Result, invoking the operation on first use only
    ///
    /// Failed evaluations are not memoized.
    ///
    /// # Errors
    /// Whatever the operation raises
    pub fn value(&self) -> InvokeResult<Value> {
        let cached = self.value.borrow().clone();
        if let Some(value) = cached {
            return Ok(value);
        }
        let value = self.statement.invoke()?;
        *self.value.borrow_mut() = Some(value.clone());
        Ok(value)
    }

    /// Preset the result
    pub fn set_value(&self, value: Value) {
        *self.value.borrow_mut() = Some(value);
    }

    /// Result if already known
    #[must_use]
    pub fn cached_value(&self) -> Option<Value> {
        self.value.borrow().clone()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cached_value() {
            Some(value) => write!(f, "{}=", render_value(&value))?,
            None => f.write_str("<unbound>=")?,
        }
        self.statement.render(f)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression({self})")
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Char(c) => format!("{c:?}"),
        Value::Type(ty) => unqualified_type_name(ty),
        Value::Object(obj) => unqualified_type_name(&obj.class()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_type(calls: Rc<Cell<usize>>) -> crate::TypeRef {
        TypeBuilder::class("demo.Counter")
            .method("next", &[], Some("int"), move |_, _| {
                calls.set(calls.get() + 1);
                Ok(Value::Int(i32::try_from(calls.get()).unwrap_or(0)))
            })
            .build()
    }

    #[test]
    fn expression_evaluates_once() {
        let calls = Rc::new(Cell::new(0));
        let ty = counting_type(calls.clone());
        let target = ty.construct(&[]).unwrap();
        let expr = Expression::new(target, "next", vec![]);

        let first = expr.value().unwrap();
        let second = expr.value().unwrap();
        assert_eq!(calls.get(), 1);
        assert!(first.same(&second));
    }

    #[test]
    fn preset_value_is_never_invoked() {
        let calls = Rc::new(Cell::new(0));
        let ty = counting_type(calls.clone());
        let target = ty.construct(&[]).unwrap();
        let expr = Expression::with_value(Value::Int(99), target, "next", vec![]);
        assert!(expr.value().unwrap().equals(&Value::Int(99)));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn failures_are_not_memoized() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let ty = TypeBuilder::class("demo.Flaky")
            .method("get", &[], Some("int"), move |_, _| {
                counter.set(counter.get() + 1);
                if counter.get() == 1 {
                    Err(InvokeError::raised("get", "first call fails"))
                } else {
                    Ok(Value::Int(1))
                }
            })
            .build();
        let expr = Expression::new(ty.construct(&[]).unwrap(), "get", vec![]);
        assert!(expr.value().is_err());
        assert!(expr.value().is_ok());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn structural_failures() {
        assert_eq!(
            Statement::new(Value::Null, "setX", vec![]).execute(),
            Err(InvokeError::MissingTarget {
                operation: "setX".into()
            })
        );
        let ty = TypeBuilder::class("demo.Any").build();
        assert_eq!(
            Statement::new(ty, "", vec![]).execute(),
            Err(InvokeError::MissingOperation)
        );
    }

    #[test]
    fn display_uses_unqualified_names() {
        let ty = TypeBuilder::class("demo.Point").property("x", "int").build();
        let p = ty.construct(&[]).unwrap();
        let stmt = Statement::new(p.clone(), "setX", vec![Value::Int(3)]);
        assert_eq!(stmt.to_string(), "Point.setX(3);");

        let expr = Expression::with_value(p, ty, "new", vec![]);
        assert_eq!(expr.to_string(), "Point=Point.new();");
        let pending = Expression::new(builtins::list(), "new", vec![]);
        assert_eq!(pending.to_string(), "<unbound>=List.new();");
    }

    #[test]
    fn static_and_constructor_dispatch() {
        let color = TypeBuilder::enumeration("demo.Color", &["RED"]).build();
        let red = invoke(
            &Value::Type(builtins::enum_type()),
            "valueOf",
            &[Value::Type(color), Value::str("RED")],
        )
        .unwrap();
        assert!(matches!(red, Value::Enum(_)));

        let name = invoke(&Value::Type(builtins::list()), "getName", &[]).unwrap();
        assert!(name.equals(&Value::str("List")));
    }
}
