//! Program model
//!
//! A [`Program`] is the linear form of an encoding session: a sequence of
//! bind and exec instructions over numbered slots, plus the operands that
//! denote the session roots. It refers to types by name only, so it can be
//! stored as JSON and replayed against any registry that knows those names.

use crate::error::ProgramResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Argument or target of an instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Operand {
    /// Absent reference
    Null,
    /// Boolean literal
    Bool(bool),
    /// Character literal
    Char(char),
    /// 8-bit literal
    Byte(i8),
    /// 16-bit literal
    Short(i16),
    /// 32-bit literal
    Int(i32),
    /// 64-bit literal
    Long(i64),
    /// Single precision literal
    Float(#[serde(with = "float_literal")] f32),
    /// Double precision literal
    Double(#[serde(with = "float_literal")] f64),
    /// String literal
    Str(String),
    /// Type meta-reference by qualified name
    Type(String),
    /// Field meta-reference
    Field {
        /// Declaring type
        owner: String,
        /// Field name
        name: String,
    },
    /// Value of a static constant
    Constant {
        /// Declaring type
        owner: String,
        /// Constant name
        name: String,
    },
    /// Value bound to a slot by an earlier instruction
    Ref(usize),
}

impl Operand {
    /// Slot this operand refers to
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        match *self {
            Self::Ref(slot) => Some(slot),
            _ => None,
        }
    }

    fn render(&self, ids: &[&str], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v:?}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v}f"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Type(name) => f.write_str(simple_name(name)),
            Self::Field { owner, name } | Self::Constant { owner, name } => {
                write!(f, "{}.{name}", simple_name(owner))
            }
            Self::Ref(slot) => match ids.get(*slot) {
                Some(id) => f.write_str(id),
                None => write!(f, "${slot}"),
            },
        }
    }
}

/// One step of a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Evaluate an expression and store its result in the next slot
    Bind {
        /// Slot receiving the result
        slot: usize,
        /// Session-unique instance name
        id: String,
        /// Whether more than one instruction refers to the value
        #[serde(default)]
        shared: bool,
        /// Invocation target
        target: Operand,
        /// Operation name
        operation: String,
        /// Arguments in order
        #[serde(default)]
        args: Vec<Operand>,
    },
    /// Invoke for effect
    Exec {
        /// Invocation target
        target: Operand,
        /// Operation name
        operation: String,
        /// Arguments in order
        #[serde(default)]
        args: Vec<Operand>,
    },
}

impl Instruction {
    /// Invocation target
    #[must_use]
    pub fn target(&self) -> &Operand {
        match self {
            Self::Bind { target, .. } | Self::Exec { target, .. } => target,
        }
    }

    /// Operation name
    #[must_use]
    pub fn operation(&self) -> &str {
        match self {
            Self::Bind { operation, .. } | Self::Exec { operation, .. } => operation,
        }
    }

    /// Arguments in order
    #[must_use]
    pub fn args(&self) -> &[Operand] {
        match self {
            Self::Bind { args, .. } | Self::Exec { args, .. } => args,
        }
    }

    fn render(&self, ids: &[&str], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Self::Bind { id, .. } = self {
            write!(f, "{id} = ")?;
        }
        self.target().render(ids, f)?;
        write!(f, ".{}(", self.operation())?;
        for (i, arg) in self.args().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            arg.render(ids, f)?;
        }
        f.write_str(");")
    }
}

/// Replayable construction program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub(crate) instructions: Vec<Instruction>,
    pub(crate) roots: Vec<Operand>,
}

impl Program {
    /// Program from parts
    #[must_use]
    pub fn new(instructions: Vec<Instruction>, roots: Vec<Operand>) -> Self {
        Self { instructions, roots }
    }

    /// Instructions in execution order
    #[inline]
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Operands denoting the session roots, in write order
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[Operand] {
        &self.roots
    }

    /// Number of slots the program binds
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| matches!(i, Instruction::Bind { .. }))
            .count()
    }

    /// Number of instructions
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program does nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty() && self.roots.is_empty()
    }

    /// Instance name bound to `slot`
    #[must_use]
    pub fn id(&self, slot: usize) -> Option<&str> {
        self.instructions.iter().find_map(|i| match i {
            Instruction::Bind { slot: s, id, .. } if *s == slot => Some(id.as_str()),
            _ => None,
        })
    }

    /// Compact JSON
    ///
    /// # Errors
    /// When serialization itself fails
    pub fn to_json(&self) -> ProgramResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON
    ///
    /// # Errors
    /// When serialization itself fails
    pub fn to_json_pretty(&self) -> ProgramResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a program
    ///
    /// # Errors
    /// Malformed JSON or an unknown instruction shape
    pub fn from_json(json: &str) -> ProgramResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn slot_ids(&self) -> Vec<&str> {
        let mut ids = Vec::with_capacity(self.slot_count());
        for instruction in &self.instructions {
            if let Instruction::Bind { slot, id, .. } = instruction {
                if *slot == ids.len() {
                    ids.push(id.as_str());
                }
            }
        }
        ids
    }
}

/// Script-like listing, one instruction per line
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = self.slot_ids();
        for instruction in &self.instructions {
            instruction.render(&ids, f)?;
            f.write_str("\n")?;
        }
        Ok(())
    }
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Float literals as JSON numbers, with `"NaN"`, `"Infinity"` and
/// `"-Infinity"` standing in for the values JSON has no number for
mod float_literal {
    use serde::de::{self, DeserializeOwned, Unexpected};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) trait Literal: Copy + Into<f64> + Serialize + DeserializeOwned {
        fn from_wide(wide: f64) -> Self;
    }

    impl Literal for f32 {
        #[allow(clippy::cast_possible_truncation)]
        fn from_wide(wide: f64) -> Self {
            wide as f32
        }
    }

    impl Literal for f64 {
        fn from_wide(wide: f64) -> Self {
            wide
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
        Number(T),
        Label(String),
    }

    pub(super) fn serialize<T: Literal, S: Serializer>(
        value: &T,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let wide: f64 = (*value).into();
        if wide.is_finite() {
            value.serialize(serializer)
        } else if wide.is_nan() {
            serializer.serialize_str("NaN")
        } else if wide.is_sign_positive() {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }

    pub(super) fn deserialize<'de, T: Literal, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<T, D::Error> {
        match Repr::<T>::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Label(label) => match label.as_str() {
                "NaN" => Ok(T::from_wide(f64::NAN)),
                "Infinity" => Ok(T::from_wide(f64::INFINITY)),
                "-Infinity" => Ok(T::from_wide(f64::NEG_INFINITY)),
                other => Err(de::Error::invalid_value(
                    Unexpected::Str(other),
                    &"a number, NaN, Infinity or -Infinity",
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Program {
        Program::new(
            vec![
                Instruction::Bind {
                    slot: 0,
                    id: "Point0".into(),
                    shared: false,
                    target: Operand::Type("demo.Point".into()),
                    operation: "new".into(),
                    args: vec![],
                },
                Instruction::Exec {
                    target: Operand::Ref(0),
                    operation: "setX".into(),
                    args: vec![Operand::Int(3)],
                },
                Instruction::Exec {
                    target: Operand::Field {
                        owner: "demo.Record".into(),
                        name: "note".into(),
                    },
                    operation: "set".into(),
                    args: vec![Operand::Ref(0), Operand::Str("hi".into())],
                },
            ],
            vec![Operand::Ref(0)],
        )
    }

    #[test]
    fn listing_names_slots() {
        assert_eq!(
            sample().to_string(),
            "Point0 = Point.new();\nPoint0.setX(3);\nRecord.note.set(Point0, \"hi\");\n"
        );
    }

    #[test]
    fn json_round_trip() {
        let program = sample();
        let json = program.to_json().unwrap();
        assert!(json.contains(r#""op":"bind""#));
        assert!(json.contains(r#""kind":"ref""#));
        assert_eq!(Program::from_json(&json).unwrap(), program);
    }

    #[test]
    fn non_finite_floats_travel_as_labels() {
        let program = Program::new(
            vec![Instruction::Exec {
                target: Operand::Ref(0),
                operation: "scale".into(),
                args: vec![
                    Operand::Double(f64::NAN),
                    Operand::Float(f32::INFINITY),
                    Operand::Double(f64::NEG_INFINITY),
                    Operand::Float(1.5),
                ],
            }],
            vec![],
        );
        let json = program.to_json().unwrap();
        assert!(json.contains(r#"{"kind":"double","value":"NaN"}"#));
        assert!(json.contains(r#"{"kind":"float","value":"Infinity"}"#));
        assert!(json.contains(r#"{"kind":"double","value":"-Infinity"}"#));
        assert!(json.contains(r#"{"kind":"float","value":1.5}"#));

        let decoded = Program::from_json(&json).unwrap();
        let args = decoded.instructions()[0].args();
        assert!(matches!(args[0], Operand::Double(v) if v.is_nan()));
        assert_eq!(args[1], Operand::Float(f32::INFINITY));
        assert_eq!(args[2], Operand::Double(f64::NEG_INFINITY));
        assert_eq!(args[3], Operand::Float(1.5));
    }

    #[test]
    fn unknown_float_labels_are_rejected() {
        let json = r#"{"instructions":[],"roots":[{"kind":"double","value":"huge"}]}"#;
        assert!(Program::from_json(json).is_err());
    }

    #[test]
    fn args_default_when_missing() {
        let json = r#"{"instructions":[{"op":"exec","target":{"kind":"null"},"operation":"run"}],"roots":[]}"#;
        let program = Program::from_json(json).unwrap();
        assert_eq!(program.instructions()[0].args(), &[] as &[Operand]);
        assert_eq!(program.slot_count(), 0);
    }

    #[test]
    fn slot_lookup() {
        let program = sample();
        assert_eq!(program.id(0), Some("Point0"));
        assert_eq!(program.id(1), None);
        assert_eq!(program.roots()[0].slot(), Some(0));
        assert_eq!(program.len(), 3);
    }
}
