//! Replay
//!
//! Executes a [`Program`] in a fresh environment. Types are looked up by
//! name in a [`TypeRegistry`], so the reconstructed graph shares nothing
//! with the session that produced the program.

use crate::error::{ProgramError, ProgramResult};
use crate::program::{Instruction, Operand, Program};
use bean_model::{invoke, FieldRef, TypeRef, TypeRegistry, Value};

impl Program {
    /// Run every instruction and return the reconstructed roots
    ///
    /// # Errors
    /// Unknown type names, references to unbound slots, out of order
    /// bindings, and the first instruction whose invocation fails
    pub fn replay(&self, types: &TypeRegistry) -> ProgramResult<Vec<Value>> {
        let mut replayer = Replayer {
            types,
            slots: Vec::with_capacity(self.slot_count()),
        };
        for (index, instruction) in self.instructions.iter().enumerate() {
            replayer.step(index, instruction)?;
        }
        let roots = self
            .roots
            .iter()
            .map(|root| replayer.value(root))
            .collect::<ProgramResult<Vec<_>>>()?;
        tracing::debug!(
            slots = replayer.slots.len(),
            roots = roots.len(),
            "replayed program"
        );
        Ok(roots)
    }
}

struct Replayer<'a> {
    types: &'a TypeRegistry,
    slots: Vec<Value>,
}

impl Replayer<'_> {
    fn step(&mut self, index: usize, instruction: &Instruction) -> ProgramResult<()> {
        if let Instruction::Bind { slot, .. } = instruction {
            if *slot != self.slots.len() {
                return Err(ProgramError::SlotOrder {
                    expected: self.slots.len(),
                    found: *slot,
                });
            }
        }
        let target = self.value(instruction.target())?;
        let args = instruction
            .args()
            .iter()
            .map(|arg| self.value(arg))
            .collect::<ProgramResult<Vec<_>>>()?;
        let result = invoke(&target, instruction.operation(), &args).map_err(|source| {
            ProgramError::Replay {
                index,
                instruction: format!("{}.{}", target, instruction.operation()),
                source,
            }
        })?;
        tracing::trace!(index, operation = instruction.operation(), "replayed");
        if matches!(instruction, Instruction::Bind { .. }) {
            self.slots.push(result);
        }
        Ok(())
    }

    fn value(&self, operand: &Operand) -> ProgramResult<Value> {
        Ok(match operand {
            Operand::Null => Value::Null,
            Operand::Bool(v) => Value::Bool(*v),
            Operand::Char(v) => Value::Char(*v),
            Operand::Byte(v) => Value::Byte(*v),
            Operand::Short(v) => Value::Short(*v),
            Operand::Int(v) => Value::Int(*v),
            Operand::Long(v) => Value::Long(*v),
            Operand::Float(v) => Value::Float(*v),
            Operand::Double(v) => Value::Double(*v),
            Operand::Str(v) => Value::str(v),
            Operand::Type(name) => Value::Type(self.resolve(name)?),
            Operand::Field { owner, name } => Value::Field(FieldRef::new(self.resolve(owner)?, name)),
            Operand::Constant { owner, name } => {
                let field = FieldRef::new(self.resolve(owner)?, name);
                field.get(&Value::Null).map_err(|source| ProgramError::Constant {
                    owner: owner.clone(),
                    name: name.clone(),
                    source,
                })?
            }
            Operand::Ref(slot) => self
                .slots
                .get(*slot)
                .cloned()
                .ok_or(ProgramError::DanglingRef { slot: *slot })?,
        })
    }

    fn resolve(&self, name: &str) -> ProgramResult<TypeRef> {
        self.types.resolve(name).ok_or_else(|| ProgramError::UnknownType {
            name: name.to_string(),
        })
    }
}
