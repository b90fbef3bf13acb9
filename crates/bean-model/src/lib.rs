//! Bean Object Model
//!
//! Dynamic object model for accessor-style components ("beans").
//!
//! # Core Concepts
//!
//! - [`Value`]: primitives, strings, type and field meta-references, enum
//!   constants and object references with identity
//! - [`TypeDescriptor`] / [`TypeRef`]: everything the encoder asks of a type
//! - [`TypeBuilder`]: fluent construction of descriptors
//! - [`Statement`] / [`Expression`]: recorded invocations, the latter memoized
//! - [`NameGenerator`]: session-scoped instance naming
//! - [`builtins`]: the per-thread table of well-known types
//!
//! # Example
//!
//! ```rust,ignore
//! use bean_model::{Expression, Statement, TypeBuilder, Value};
//!
//! let point = TypeBuilder::class("demo.Point").property("x", "int").build();
//! let p = Expression::new(point, "new", vec![]).value()?;
//! Statement::new(p.clone(), "setX", vec![Value::Int(3)]).execute()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod builder;
mod error;
mod naming;
mod object;
mod registry;
mod statement;
mod types;
mod value;

/// Built-in type table
pub mod builtins;

// Re-exports
pub use builder::TypeBuilder;
pub use error::{InvokeError, InvokeResult};
pub use naming::{capitalize, unqualified_type_name, NameGenerator};
pub use object::{Body, HandlerState, Object, ObjectRef, ProxyState};
pub use registry::TypeRegistry;
pub use statement::{invoke, Expression, Statement};
pub use types::{
    BeanHints, Constructor, EqualityFn, FieldDescriptor, Layout, Method, MethodBody,
    PrimitiveKind, SlotSpec, StaticBody, TypeDescriptor, TypeKind, TypeRef,
};
pub use value::{EnumConstant, FieldRef, Identity, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
