//! Encoder
//!
//! Walks an object graph and reduces it to the statements that rebuild it.
//! Every original value is bound to an expression in a parallel replay
//! environment; strategies compare the original with its replay candidate
//! and emit only the statements needed to make them equivalent. Kept
//! statements are executed against the replay environment as they are
//! written, so later diffs see their effect.

use crate::config::EncoderConfig;
use crate::error::{EncodeError, EncodeResult};
use crate::listener::{FailureListener, LogFailures};
use crate::record::StatementLog;
use crate::registry::{StrategyRef, StrategyRegistry};
use crate::tracker::{BindingState, IdentityTracker};
use bean_introspect::{BeanInfo, Introspector};
use bean_model::{Expression, Identity, Statement, TypeRef, TypeRegistry, Value};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Graph encoder session
pub struct Encoder {
    config: EncoderConfig,
    types: TypeRegistry,
    tracker: IdentityTracker,
    strategies: StrategyRegistry,
    introspector: Introspector,
    listener: Box<dyn FailureListener>,
    log: StatementLog,
    instantiating: HashMap<Identity, usize>,
}

impl Encoder {
    /// Encoder with default configuration, logging failures
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EncoderConfig::default())
    }

    /// Encoder with `config`
    #[must_use]
    pub fn with_config(config: EncoderConfig) -> Self {
        Self {
            config,
            types: TypeRegistry::new(),
            tracker: IdentityTracker::new(),
            strategies: StrategyRegistry::new(),
            introspector: Introspector::new(),
            listener: Box::new(LogFailures),
            log: StatementLog::new(),
            instantiating: HashMap::new(),
        }
    }

    /// Replace the failure listener
    #[must_use]
    pub fn with_listener(mut self, listener: impl FailureListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    /// Use `types` to resolve type names met during encoding
    #[must_use]
    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.introspector = Introspector::new().with_registry(types.clone());
        self.types = types;
        self
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Statements recorded so far
    #[inline]
    #[must_use]
    pub fn log(&self) -> &StatementLog {
        &self.log
    }

    /// Take the recorded statements, leaving an empty log
    pub fn take_log(&mut self) -> StatementLog {
        std::mem::take(&mut self.log)
    }

    /// Identity bindings of the session
    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &IdentityTracker {
        &self.tracker
    }

    /// Type by name, from the session's types or the built-ins
    #[must_use]
    pub fn resolve_type(&self, name: &str) -> Option<TypeRef> {
        self.types.resolve(name)
    }

    /// Hand a failure to the listener
    pub fn report(&mut self, error: EncodeError) {
        tracing::debug!(%error, "reporting encoding failure");
        self.listener.on_failure(&error);
    }

    /// Encode `value` as a root of the output
    ///
    /// Values that are already tracked are not written again, but still
    /// become roots. Failures are reported, never returned.
    pub fn write_object(&mut self, value: &Value) {
        if !self.tracker.contains(value) {
            if let Err(err) = self.dispatch(value) {
                self.report(err);
                return;
            }
        }
        if self.config.record_statements {
            self.log.add_root(value);
        }
    }

    /// Record `statement` and execute its replay clone
    ///
    /// A statement without target or operation is reported and dropped, as
    /// is one whose clone fails to execute.
    ///
    /// # Errors
    /// When a target or argument has no replay counterpart
    pub fn write_statement(&mut self, statement: &Statement) -> EncodeResult<()> {
        if let Err(source) = statement.validate() {
            self.report(EncodeError::Malformed {
                statement: statement.to_string(),
                source,
            });
            return Ok(());
        }
        let cloned = self.clone_statement(statement)?;
        if self.config.execute_statements {
            if let Err(source) = cloned.execute() {
                self.report(EncodeError::Discarded {
                    statement: cloned.to_string(),
                    source,
                });
                return Ok(());
            }
            tracing::trace!(statement = %cloned, "executed");
        }
        if self.config.record_statements {
            self.log.record_statement(statement.clone());
        }
        Ok(())
    }

    /// Bind the value of `expression` to the replay clone of `expression`
    ///
    /// Does nothing when the value is self-evident or already tracked.
    ///
    /// # Errors
    /// When the expression cannot be evaluated, its inputs have no replay
    /// counterpart, or it depends on the value it creates
    pub fn write_expression(&mut self, expression: &Expression) -> EncodeResult<()> {
        let value = self.evaluate(expression)?;
        if value.is_self_evident() || self.tracker.contains(&value) {
            return Ok(());
        }
        // Only objects can depend on themselves; a primitive index equal to
        // the element it reads is bound by the nested resolution instead.
        let has_identity = value.as_object().is_some();
        if has_identity {
            self.tracker.begin(&value);
        }
        let cloned = match self.clone_expression(expression) {
            Ok(cloned) => cloned,
            Err(err) => {
                if has_identity {
                    self.tracker.remove(&value);
                }
                return Err(err);
            }
        };
        if !has_identity && self.tracker.contains(&value) {
            return Ok(());
        }
        tracing::trace!(value = %value, expression = %expression, "bound");
        self.tracker.bind(&value, Rc::new(cloned));
        if self.config.record_statements {
            self.log.record_creation(&value, Rc::new(expression.clone()));
        }
        self.dispatch(&value)
    }

    /// Replay counterpart of `value`, or `Null` when it is unknown
    ///
    /// Evaluation failures are reported and yield `Null`.
    pub fn get(&mut self, value: &Value) -> Value {
        match self.try_get(value) {
            Ok(found) => found,
            Err(err) => {
                self.report(err);
                Value::Null
            }
        }
    }

    /// Replay counterpart of `value`, or `Null` when it is unknown
    ///
    /// # Errors
    /// Evaluation failures, and [`EncodeError::CyclicConstruction`] for a
    /// value whose creation is still being cloned
    pub fn try_get(&mut self, value: &Value) -> EncodeResult<Value> {
        if value.is_self_evident() {
            return Ok(value.clone());
        }
        let expression = match self.tracker.state(value) {
            None => return Ok(Value::Null),
            Some(BindingState::Pending) => {
                return Err(EncodeError::CyclicConstruction {
                    value: value.to_string(),
                })
            }
            Some(BindingState::Bound(expression)) => expression.clone(),
        };
        expression.value().map_err(|source| EncodeError::Evaluation {
            expression: expression.to_string(),
            source,
        })
    }

    /// Forget the binding of `value`
    pub fn remove(&mut self, value: &Value) -> Option<Rc<Expression>> {
        let removed = self.tracker.remove(value);
        if removed.is_some() {
            tracing::trace!(value = %value, "unbound");
        }
        removed
    }

    /// Evaluate an original-side expression
    ///
    /// # Errors
    /// [`EncodeError::Evaluation`] with the underlying failure
    pub fn evaluate(&mut self, expression: &Expression) -> EncodeResult<Value> {
        expression.value().map_err(|source| EncodeError::Evaluation {
            expression: expression.to_string(),
            source,
        })
    }

    /// Strategy for values of `ty`
    pub fn strategy_for_type(&mut self, ty: &TypeRef) -> StrategyRef {
        self.strategies.resolve(Some(ty), &mut self.introspector)
    }

    /// Strategy for `value`, the null strategy for `Null`
    pub fn persistence_strategy(&mut self, value: &Value) -> StrategyRef {
        let ty = value.runtime_type();
        self.strategies.resolve(ty.as_ref(), &mut self.introspector)
    }

    /// Install `strategy` for `type_name`, overriding every other rule
    pub fn set_persistence_strategy(&mut self, type_name: &str, strategy: StrategyRef) {
        self.strategies.register(type_name, strategy);
    }

    /// Introspection results for `ty`
    ///
    /// # Errors
    /// When the type's accessors or hints are inconsistent
    pub fn bean_info(&mut self, ty: &TypeRef) -> EncodeResult<Rc<BeanInfo>> {
        Ok(self.introspector.bean_info(ty)?)
    }

    /// Run an instantiation of `old`, refusing once its nesting exceeds
    /// the configured limit
    ///
    /// # Errors
    /// [`EncodeError::Unreproducible`], or whatever `instantiate` raises
    pub fn guard_instantiation(
        &mut self,
        old: &Value,
        instantiate: impl FnOnce(&mut Self) -> EncodeResult<()>,
    ) -> EncodeResult<()> {
        let Some(key) = old.identity() else {
            return instantiate(self);
        };
        let depth = self.instantiating.entry(key.clone()).or_insert(0);
        if *depth >= self.config.max_instantiations {
            return Err(EncodeError::Unreproducible {
                type_name: old.runtime_type().map(|t| t.name().to_string()).unwrap_or_default(),
                reason: format!(
                    "strategy rejected its own instantiation {} times",
                    self.config.max_instantiations
                ),
            });
        }
        *depth += 1;
        let result = instantiate(self);
        if let Some(depth) = self.instantiating.get_mut(&key) {
            *depth -= 1;
            if *depth == 0 {
                self.instantiating.remove(&key);
            }
        }
        result
    }

    /// Reset the session: bindings, log and resolved strategies
    ///
    /// Explicit strategy registrations and configuration are kept.
    pub fn clear(&mut self) {
        self.tracker.clear();
        self.log.clear();
        self.strategies.clear_cache();
        self.introspector.flush();
        self.instantiating.clear();
    }

    fn dispatch(&mut self, value: &Value) -> EncodeResult<()> {
        let strategy = self.persistence_strategy(value);
        strategy.write_object(value, self)
    }

    /// Replay counterpart of `value`, encoding it first if it is unknown
    fn resolve(&mut self, value: &Value) -> EncodeResult<Value> {
        if value.is_self_evident() {
            return Ok(value.clone());
        }
        if !self.tracker.contains(value) {
            self.dispatch(value)?;
            if !self.tracker.contains(value) {
                return Err(EncodeError::Unbound {
                    value: value.to_string(),
                });
            }
        }
        self.try_get(value)
    }

    fn clone_parts(&mut self, statement: &Statement) -> EncodeResult<(Value, Vec<Value>)> {
        let target = self.resolve(statement.target())?;
        let mut args = Vec::with_capacity(statement.arguments().len());
        for arg in statement.arguments() {
            args.push(self.resolve(arg)?);
        }
        Ok((target, args))
    }

    fn clone_statement(&mut self, statement: &Statement) -> EncodeResult<Statement> {
        let (target, args) = self.clone_parts(statement)?;
        Ok(Statement::new(target, statement.operation(), args))
    }

    fn clone_expression(&mut self, expression: &Expression) -> EncodeResult<Expression> {
        let (target, args) = self.clone_parts(expression.statement())?;
        Ok(Expression::new(target, expression.operation(), args))
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("config", &self.config)
            .field("bindings", &self.tracker.len())
            .field("roots", &self.log.roots().len())
            .finish_non_exhaustive()
    }
}
