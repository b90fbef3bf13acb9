//! Linearization
//!
//! Turns a [`StatementLog`] into a [`Program`]. Values are bound depth-first:
//! the target and arguments of a creation come before the value, and the
//! statements filed under a value follow its binding directly, so nested
//! mutations appear in the order the encoder wrote them.

use crate::error::{ProgramError, ProgramResult};
use crate::program::{Instruction, Operand, Program};
use bean_model::{Expression, Identity, NameGenerator, Statement, Value};
use bean_persist::{Encoder, Recorded, StatementLog};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

impl Program {
    /// Linearize a finished session
    ///
    /// # Errors
    /// [`ProgramError::Unrecorded`] for a referenced value without a
    /// creation, [`ProgramError::CyclicCreation`] for a creation chain that
    /// loops back on itself
    pub fn from_log(log: &StatementLog) -> ProgramResult<Self> {
        let mut linearizer = Linearizer::new(log);
        let mut roots = Vec::with_capacity(log.roots().len());
        for root in log.roots() {
            roots.push(linearizer.operand(root)?);
        }
        let program = Program::new(linearizer.instructions, roots);
        tracing::debug!(
            slots = program.slot_count(),
            instructions = program.len(),
            roots = program.roots().len(),
            "linearized session"
        );
        Ok(program)
    }

    /// Write every root through `encoder` and linearize the result
    ///
    /// # Errors
    /// Same as [`Program::from_log`]
    pub fn encode(encoder: &mut Encoder, roots: &[Value]) -> ProgramResult<Self> {
        for root in roots {
            encoder.write_object(root);
        }
        Self::from_log(encoder.log())
    }
}

struct Linearizer<'a> {
    log: &'a StatementLog,
    names: NameGenerator,
    slots: HashMap<Identity, usize>,
    creating: HashSet<Identity>,
    instructions: Vec<Instruction>,
}

impl<'a> Linearizer<'a> {
    fn new(log: &'a StatementLog) -> Self {
        Self {
            log,
            names: NameGenerator::new(),
            slots: HashMap::new(),
            creating: HashSet::new(),
            instructions: Vec::new(),
        }
    }

    fn operand(&mut self, value: &Value) -> ProgramResult<Operand> {
        Ok(match value {
            Value::Null => Operand::Null,
            Value::Str(s) => Operand::Str(s.to_string()),
            Value::Type(ty) => Operand::Type(ty.name().to_string()),
            Value::Field(field) => Operand::Field {
                owner: field.owner().name().to_string(),
                name: field.name().to_string(),
            },
            Value::Enum(_) | Value::Object(_) => self.bind(value)?,
            primitive => self.primitive(primitive),
        })
    }

    /// Literal, or the constant it was substituted by
    fn primitive(&self, value: &Value) -> Operand {
        if let Some(creation) = self.log.creation(value) {
            if let (Value::Field(field), "get") = (creation.target(), creation.operation()) {
                return Operand::Constant {
                    owner: field.owner().name().to_string(),
                    name: field.name().to_string(),
                };
            }
        }
        match *value {
            Value::Bool(v) => Operand::Bool(v),
            Value::Char(v) => Operand::Char(v),
            Value::Byte(v) => Operand::Byte(v),
            Value::Short(v) => Operand::Short(v),
            Value::Int(v) => Operand::Int(v),
            Value::Long(v) => Operand::Long(v),
            Value::Float(v) => Operand::Float(v),
            Value::Double(v) => Operand::Double(v),
            _ => Operand::Null,
        }
    }

    fn bind(&mut self, value: &Value) -> ProgramResult<Operand> {
        let Some(key) = value.identity() else {
            return Ok(Operand::Null);
        };
        if let Some(&slot) = self.slots.get(&key) {
            return Ok(Operand::Ref(slot));
        }
        let creation = self.log.creation(value).ok_or_else(|| ProgramError::Unrecorded {
            value: value.to_string(),
        })?;
        if !self.creating.insert(key.clone()) {
            return Err(ProgramError::CyclicCreation {
                value: value.to_string(),
            });
        }
        let parts = self.parts(creation.statement());
        self.creating.remove(&key);
        let (target, args) = parts?;

        // Resolving the creation may have bound the value through an owner.
        if let Some(&slot) = self.slots.get(&key) {
            return Ok(Operand::Ref(slot));
        }
        let slot = self.slots.len();
        self.slots.insert(key, slot);
        self.instructions.push(Instruction::Bind {
            slot,
            id: self.names.instance_name(value),
            shared: self.log.is_multiply_referenced(value),
            target,
            operation: creation.operation().to_string(),
            args,
        });
        self.drain(value)?;
        Ok(Operand::Ref(slot))
    }

    /// Emit everything filed under a freshly bound value
    fn drain(&mut self, value: &Value) -> ProgramResult<()> {
        let log = self.log;
        for recorded in log.recorded(value) {
            match recorded {
                Recorded::Statement(statement) => self.exec(statement)?,
                Recorded::Expression(expression) => self.derived(expression)?,
            }
        }
        Ok(())
    }

    fn exec(&mut self, statement: &Statement) -> ProgramResult<()> {
        let (target, args) = self.parts(statement)?;
        self.instructions.push(Instruction::Exec {
            target,
            operation: statement.operation().to_string(),
            args,
        });
        Ok(())
    }

    /// Bind a value obtained from its owner, unless it was bound already or
    /// was later recreated some other way
    fn derived(&mut self, expression: &Rc<Expression>) -> ProgramResult<()> {
        let Some(value) = expression.cached_value() else {
            return Ok(());
        };
        if !matches!(value, Value::Enum(_) | Value::Object(_)) {
            return Ok(());
        }
        let is_latest = self
            .log
            .creation(&value)
            .is_some_and(|latest| Rc::ptr_eq(&latest, expression));
        if is_latest {
            self.bind(&value)?;
        }
        Ok(())
    }

    fn parts(&mut self, statement: &Statement) -> ProgramResult<(Operand, Vec<Operand>)> {
        let target = self.operand(statement.target())?;
        let mut args = Vec::with_capacity(statement.arguments().len());
        for arg in statement.arguments() {
            args.push(self.operand(arg)?);
        }
        Ok((target, args))
    }
}
