//! Failure listeners
//!
//! The encoder never aborts a session; it reports each failure once to a
//! [`FailureListener`] and keeps going.

use crate::error::EncodeError;
use std::cell::RefCell;
use std::rc::Rc;

/// Receives failures observed during encoding
pub trait FailureListener {
    /// Called once per failure
    fn on_failure(&mut self, error: &EncodeError);
}

impl<F> FailureListener for F
where
    F: FnMut(&EncodeError),
{
    fn on_failure(&mut self, error: &EncodeError) {
        self(error);
    }
}

/// Default listener: logs each failure at `warn` level and continues
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFailures;

impl FailureListener for LogFailures {
    fn on_failure(&mut self, error: &EncodeError) {
        tracing::warn!(%error, "encoding failure; continuing");
    }
}

/// Shared collector of failures
///
/// Clones share storage, so one handle can be given to the encoder while
/// another inspects what was reported.
#[derive(Debug, Default, Clone)]
pub struct FailureLog(Rc<RefCell<Vec<EncodeError>>>);

impl FailureLog {
    /// Empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every reported failure in order
    #[must_use]
    pub fn failures(&self) -> Vec<EncodeError> {
        self.0.borrow().clone()
    }

    /// Number of reported failures
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether nothing was reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Forget reported failures
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl FailureListener for FailureLog {
    fn on_failure(&mut self, error: &EncodeError) {
        self.0.borrow_mut().push(error.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_log_handles_share_storage() {
        let log = FailureLog::new();
        let mut handle = log.clone();
        handle.on_failure(&EncodeError::NoStrategy {
            type_name: "demo.X".into(),
        });
        assert_eq!(log.len(), 1);
        log.clear();
        assert!(handle.is_empty());
    }

    #[test]
    fn closures_are_listeners() {
        let mut seen = 0;
        {
            let mut listener = |_: &EncodeError| seen += 1;
            listener.on_failure(&EncodeError::Unbound { value: "x".into() });
            listener.on_failure(&EncodeError::Unbound { value: "y".into() });
        }
        assert_eq!(seen, 2);
    }
}
