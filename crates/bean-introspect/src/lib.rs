//! Bean Introspection
//!
//! Derives properties, event sets and bean metadata from a type's accessor
//! conventions.
//!
//! # Core Concepts
//!
//! - [`Introspector`]: caching service, one per encoding session
//! - [`BeanInfo`]: bean descriptor, properties, event sets, defaults
//! - [`PropertyDescriptor`]: getter/setter pair with persistence flags
//! - [`EventSetDescriptor`]: listener registration pair
//!
//! # Example
//!
//! ```rust,ignore
//! use bean_introspect::Introspector;
//!
//! let mut introspector = Introspector::new();
//! let info = introspector.bean_info(&point_type)?;
//! for property in info.properties().iter().filter(|p| p.is_read_write()) {
//!     println!("{} via {:?}", property.name(), property.write_method());
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod descriptor;
mod error;
mod introspector;

// Re-exports
pub use descriptor::{BeanDescriptor, BeanInfo, EventSetDescriptor, PropertyDescriptor};
pub use error::{IntrospectionError, IntrospectionResult};
pub use introspector::{decapitalize, Introspector};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
