//! Bean Persistence
//!
//! Reduces an object graph to the statements that rebuild it. Each value is
//! handled by a [`PersistenceStrategy`] that knows how to instantiate it and
//! how to mutate a fresh instance into an equivalent one; the [`Encoder`]
//! keeps a replay copy of the graph in step, so only statements that change
//! something are kept.
//!
//! # Core Concepts
//!
//! - [`Encoder`]: one encoding session, with identity tracking and logging
//! - [`PersistenceStrategy`]: per-type instantiation and diffing
//! - [`StrategyRegistry`]: resolves the strategy for a type
//! - [`StatementLog`]: kept statements, grouped by the value they mutate
//! - [`FailureListener`]: receives every failure; encoding never aborts
//!
//! # Example
//!
//! ```rust,ignore
//! use bean_persist::prelude::*;
//!
//! let failures = FailureLog::new();
//! let mut encoder = Encoder::new().with_listener(failures.clone());
//! encoder.write_object(&graph);
//! for stmt in encoder.log().statements(&graph) {
//!     println!("{stmt}");
//! }
//! assert!(failures.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod encoder;
mod error;
mod listener;
mod record;
mod registry;
mod strategy;
mod tracker;

pub mod strategies;

// Re-exports
pub use config::EncoderConfig;
pub use encoder::Encoder;
pub use error::{EncodeError, EncodeResult};
pub use listener::{FailureListener, FailureLog, LogFailures};
pub use record::{Recorded, StatementLog};
pub use registry::{StrategyRef, StrategyRegistry};
pub use strategy::{initialize_supertype, DeclaredStrategy, PersistenceStrategy, STRATEGY_ATTRIBUTE};
pub use tracker::{BindingId, BindingState, IdentityTracker};

pub mod prelude {
    //! Common imports for encoding object graphs
    pub use crate::{
        DeclaredStrategy, EncodeError, Encoder, EncoderConfig, FailureListener, FailureLog,
        PersistenceStrategy, StatementLog,
    };
    pub use bean_model::{Expression, Statement, TypeBuilder, TypeRef, TypeRegistry, Value};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
