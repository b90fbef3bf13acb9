//! Bean Programs
//!
//! Linear, serializable form of an encoding session.
//!
//! An [`Encoder`](bean_persist::Encoder) leaves behind a
//! [`StatementLog`](bean_persist::StatementLog) in the original environment.
//! [`Program::from_log`] orders it into bind and exec instructions over
//! numbered slots, [`Program::to_json`] stores it, and [`Program::replay`]
//! rebuilds the graph against a [`TypeRegistry`](bean_model::TypeRegistry).
//!
//! # Example
//!
//! ```rust,ignore
//! use bean_persist::Encoder;
//! use bean_program::Program;
//!
//! let mut encoder = Encoder::new().with_types(types.clone());
//! let program = Program::encode(&mut encoder, &[root])?;
//! let json = program.to_json()?;
//! let copy = Program::from_json(&json)?.replay(&types)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod linearize;
mod program;
mod replay;

// Re-exports
pub use error::{ProgramError, ProgramResult};
pub use program::{Instruction, Operand, Program};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
