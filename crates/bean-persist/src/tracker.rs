//! Identity tracking
//!
//! Maps every original value the session has seen to the expression that
//! yields its replay counterpart. Each identity gets a [`BindingId`] once and
//! keeps it across rebinding, so a removed value that is bound again is
//! still recognisably the same node.

use bean_model::{Expression, Identity, Value};
use std::collections::HashMap;
use std::rc::Rc;

/// Stable handle of a tracked identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(usize);

impl BindingId {
    /// Position in allocation order
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Binding state of a tracked value
#[derive(Debug, Clone)]
pub enum BindingState {
    /// Creation expression is being cloned; any use is a construction cycle
    Pending,
    /// Expression yielding the replay counterpart
    Bound(Rc<Expression>),
}

#[derive(Debug)]
struct Slot {
    value: Value,
    state: Option<BindingState>,
}

/// Arena of bindings keyed by value identity
///
/// Slots hold the original value so objects stay alive for the session and
/// their addresses cannot be reused by unrelated allocations.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    index: HashMap<Identity, BindingId>,
    slots: Vec<Slot>,
}

impl IdentityTracker {
    /// Empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of `value`, if it was ever seen
    #[must_use]
    pub fn id(&self, value: &Value) -> Option<BindingId> {
        value.identity().and_then(|key| self.index.get(&key).copied())
    }

    /// Current state of `value`
    #[must_use]
    pub fn state(&self, value: &Value) -> Option<&BindingState> {
        self.id(value).and_then(|id| self.slots[id.0].state.as_ref())
    }

    /// Whether `value` is pending or bound
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.state(value).is_some()
    }

    /// Whether `value` is in the middle of its own construction
    #[must_use]
    pub fn is_pending(&self, value: &Value) -> bool {
        matches!(self.state(value), Some(BindingState::Pending))
    }

    /// Bound expression of `value`
    #[must_use]
    pub fn expression(&self, value: &Value) -> Option<Rc<Expression>> {
        match self.state(value)? {
            BindingState::Bound(expr) => Some(expr.clone()),
            BindingState::Pending => None,
        }
    }

    /// Mark `value` as under construction
    pub fn begin(&mut self, value: &Value) -> Option<BindingId> {
        self.install(value, BindingState::Pending)
    }

    /// Bind `value` to the expression yielding its counterpart
    pub fn bind(&mut self, value: &Value, expression: Rc<Expression>) -> Option<BindingId> {
        self.install(value, BindingState::Bound(expression))
    }

    /// Forget the binding of `value`, keeping its handle
    pub fn remove(&mut self, value: &Value) -> Option<Rc<Expression>> {
        let id = self.id(value)?;
        match self.slots[id.0].state.take()? {
            BindingState::Bound(expr) => Some(expr),
            BindingState::Pending => None,
        }
    }

    /// Number of live bindings
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.state.is_some()).count()
    }

    /// Whether nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live bindings in allocation order
    pub fn iter(&self) -> impl Iterator<Item = (BindingId, &Value, &BindingState)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.state
                .as_ref()
                .map(|state| (BindingId(i), &slot.value, state))
        })
    }

    /// Drop every binding and handle
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
    }

    fn install(&mut self, value: &Value, state: BindingState) -> Option<BindingId> {
        let key = value.identity()?;
        let id = match self.index.get(&key) {
            Some(id) => *id,
            None => {
                let id = BindingId(self.slots.len());
                self.slots.push(Slot {
                    value: value.clone(),
                    state: None,
                });
                self.index.insert(key, id);
                id
            }
        };
        self.slots[id.0].state = Some(state);
        Some(id)
    }
}
