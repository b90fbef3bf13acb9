//! Statement log
//!
//! The encoder files every kept statement under the original value it
//! mutates and remembers the latest creation expression of every value.
//! Marking walks from recorded statements back through creation expressions
//! so that a framing layer only ever sees values something actually refers
//! to, together with how often each one is referenced.

use bean_model::{Expression, Identity, Statement, Value};
use indexmap::IndexMap;
use std::rc::Rc;

/// Entry filed under a value
#[derive(Debug, Clone)]
pub enum Recorded {
    /// Mutation of the value
    Statement(Statement),
    /// Creation of another value obtained from this one
    Expression(Rc<Expression>),
}

impl Recorded {
    /// Underlying statement
    #[must_use]
    pub fn statement(&self) -> &Statement {
        match self {
            Self::Statement(stmt) => stmt,
            Self::Expression(expr) => expr.statement(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    creation: Option<Rc<Expression>>,
    recorded: Vec<Recorded>,
    refs: usize,
    marked: bool,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            creation: None,
            recorded: Vec::new(),
            refs: 0,
            marked: false,
        }
    }
}

/// Original-side record of an encoding session
#[derive(Debug, Default)]
pub struct StatementLog {
    roots: Vec<Value>,
    entries: IndexMap<Identity, Entry>,
}

impl StatementLog {
    /// Empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct values passed to top-level `write_object`, in first call order
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[Value] {
        &self.roots
    }

    /// Latest creation expression of `value`
    #[must_use]
    pub fn creation(&self, value: &Value) -> Option<Rc<Expression>> {
        self.entry(value).and_then(|e| e.creation.clone())
    }

    /// Entries filed under `value`, in recording order
    #[must_use]
    pub fn recorded(&self, value: &Value) -> &[Recorded] {
        self.entry(value).map_or(&[], |e| e.recorded.as_slice())
    }

    /// Statements filed under `value`, skipping creations of other values
    pub fn statements<'a>(&'a self, value: &Value) -> impl Iterator<Item = &'a Statement> + 'a {
        self.recorded(value).iter().filter_map(|r| match r {
            Recorded::Statement(stmt) => Some(stmt),
            Recorded::Expression(_) => None,
        })
    }

    /// How often `value` is referenced by recorded statements
    #[must_use]
    pub fn refs(&self, value: &Value) -> usize {
        self.entry(value).map_or(0, |e| e.refs)
    }

    /// Whether `value` is reachable from a recorded statement
    #[must_use]
    pub fn is_marked(&self, value: &Value) -> bool {
        self.entry(value).is_some_and(|e| e.marked)
    }

    /// Whether `value` needs a name to be referred to more than once
    #[must_use]
    pub fn is_multiply_referenced(&self, value: &Value) -> bool {
        self.refs(value) > 1
    }

    /// Every marked value, in first-seen order
    pub fn marked_values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values().filter(|e| e.marked).map(|e| &e.value)
    }

    /// Number of values the log knows about
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.entries.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.roots.clear();
        self.entries.clear();
    }

    pub(crate) fn add_root(&mut self, value: &Value) {
        if self.roots.iter().any(|root| root.same(value)) {
            return;
        }
        self.roots.push(value.clone());
        self.mark_value(value, true);
    }

    pub(crate) fn record_creation(&mut self, value: &Value, expression: Rc<Expression>) {
        if let Some(entry) = self.entry_mut(value) {
            entry.creation = Some(expression);
        }
    }

    pub(crate) fn record_statement(&mut self, statement: Statement) {
        self.mark_statement(&statement, false);
        let owner = match (statement.target(), statement.operation(), statement.arguments()) {
            (Value::Field(_), "get", [obj]) | (Value::Field(_), "set", [obj, _]) => obj.clone(),
            (target, _, _) => target.clone(),
        };
        if let Some(entry) = self.entry_mut(&owner) {
            entry.recorded.push(Recorded::Statement(statement));
        }
    }

    fn mark_statement(&mut self, statement: &Statement, is_expression: bool) {
        for arg in statement.arguments() {
            self.mark_value(arg, true);
        }
        self.mark_value(statement.target(), is_expression);
    }

    fn mark_value(&mut self, value: &Value, is_argument: bool) {
        if value.is_self_evident() {
            return;
        }
        let Some(entry) = self.entry_mut(value) else {
            return;
        };
        if is_argument {
            entry.refs += 1;
        }
        if entry.marked {
            return;
        }
        entry.marked = true;
        let Some(creation) = entry.creation.clone() else {
            return;
        };
        self.mark_statement(creation.statement(), true);
        let owner = creation.target().clone();
        if matches!(owner, Value::Type(_) | Value::Field(_)) {
            return;
        }
        if let Some(owner_entry) = self.entry_mut(&owner) {
            owner_entry.recorded.push(Recorded::Expression(creation));
        }
        if let Some(entry) = self.entry_mut(value) {
            entry.refs += 1;
        }
    }

    fn entry(&self, value: &Value) -> Option<&Entry> {
        value.identity().and_then(|key| self.entries.get(&key))
    }

    fn entry_mut(&mut self, value: &Value) -> Option<&mut Entry> {
        let key = value.identity()?;
        Some(
            self.entries
                .entry(key)
                .or_insert_with(|| Entry::new(value.clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bean_model::builtins;
    use pretty_assertions::assert_eq;

    fn list() -> Value {
        builtins::list().construct(&[]).unwrap()
    }

    fn created(log: &mut StatementLog, value: &Value) {
        let expr = Expression::with_value(value.clone(), builtins::list(), "new", vec![]);
        log.record_creation(value, Rc::new(expr));
    }

    #[test]
    fn statements_file_under_their_target() {
        let mut log = StatementLog::new();
        let outer = list();
        let inner = list();
        created(&mut log, &outer);
        created(&mut log, &inner);
        log.record_statement(Statement::new(outer.clone(), "add", vec![inner.clone()]));
        log.add_root(&outer);

        assert_eq!(log.statements(&outer).count(), 1);
        assert_eq!(log.refs(&inner), 1);
        assert!(log.is_marked(&inner));
        assert!(log.is_marked(&outer));
        assert_eq!(log.roots().len(), 1);
    }

    #[test]
    fn values_created_from_owners_are_filed_under_them() {
        let mut log = StatementLog::new();
        let owner = list();
        let part = list();
        created(&mut log, &owner);
        let getter = Expression::with_value(part.clone(), owner.clone(), "get", vec![Value::Int(0)]);
        log.record_creation(&part, Rc::new(getter));
        log.record_statement(Statement::new(part.clone(), "clear", vec![]));
        log.add_root(&owner);

        let filed = log.recorded(&owner);
        assert_eq!(filed.len(), 1);
        assert_eq!(filed[0].statement().operation(), "get");
        assert!(!log.is_multiply_referenced(&part));
    }

    #[test]
    fn unreferenced_values_stay_unmarked() {
        let mut log = StatementLog::new();
        let orphan = list();
        created(&mut log, &orphan);
        assert!(!log.is_marked(&orphan));
        assert_eq!(log.marked_values().count(), 0);
    }

    #[test]
    fn shared_arguments_count_every_reference() {
        let mut log = StatementLog::new();
        let a = list();
        let b = list();
        let shared = list();
        for v in [&a, &b, &shared] {
            created(&mut log, v);
        }
        log.record_statement(Statement::new(a.clone(), "add", vec![shared.clone()]));
        log.record_statement(Statement::new(b.clone(), "add", vec![shared.clone()]));
        assert!(log.is_multiply_referenced(&shared));
    }
}
