//! Program errors

use bean_model::InvokeError;
use thiserror::Error;

/// Failures while building, decoding or replaying a program
#[derive(Debug, Error)]
pub enum ProgramError {
    /// A referenced value has no creation expression in the log
    #[error("no creation recorded for {value}")]
    Unrecorded {
        /// Rendered value
        value: String,
    },

    /// A creation expression needs the value it creates
    #[error("creation of {value} depends on itself")]
    CyclicCreation {
        /// Rendered value
        value: String,
    },

    /// Type name the registry cannot resolve
    #[error("unknown type: {name}")]
    UnknownType {
        /// Qualified name
        name: String,
    },

    /// Reference to a slot that is not bound yet
    #[error("reference to unbound slot {slot}")]
    DanglingRef {
        /// Slot index
        slot: usize,
    },

    /// Bind instruction out of sequence
    #[error("binding out of order: expected slot {expected}, found {found}")]
    SlotOrder {
        /// Next free slot
        expected: usize,
        /// Slot named by the instruction
        found: usize,
    },

    /// Instruction failed during replay
    #[error("instruction {index} failed: {instruction}")]
    Replay {
        /// Position in the program
        index: usize,
        /// Rendered instruction
        instruction: String,
        /// Invocation failure
        #[source]
        source: InvokeError,
    },

    /// Static constant that cannot be read
    #[error("cannot read constant {owner}.{name}")]
    Constant {
        /// Declaring type
        owner: String,
        /// Constant name
        name: String,
        /// Lookup failure
        #[source]
        source: InvokeError,
    },

    /// Malformed or unencodable JSON
    #[error("program JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for program operations
pub type ProgramResult<T> = Result<T, ProgramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_failures_keep_their_source() {
        let err = ProgramError::Replay {
            index: 3,
            instruction: "Point0.setZ(1);".into(),
            source: InvokeError::MissingOperation,
        };
        assert_eq!(err.to_string(), "instruction 3 failed: Point0.setZ(1);");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn json_errors_convert() {
        let parse = serde_json::from_str::<u8>("nope").unwrap_err();
        let err: ProgramError = parse.into();
        assert!(matches!(err, ProgramError::Json(_)));
    }
}
