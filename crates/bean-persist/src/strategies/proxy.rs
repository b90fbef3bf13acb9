use crate::encoder::Encoder;
use crate::error::{EncodeError, EncodeResult};
use crate::strategy::PersistenceStrategy;
use bean_model::{builtins, Body, Expression, Value};

/// Strategy for forwarding wrappers
///
/// Wrappers around an event handler are recreated through the handler
/// factory, which keeps the handler's inputs visible; every other wrapper
/// is rebuilt from its interfaces and handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProxyStrategy;

impl PersistenceStrategy for ProxyStrategy {
    fn name(&self) -> &'static str {
        "proxy"
    }

    fn instantiate(&self, old: &Value, _encoder: &mut Encoder) -> EncodeResult<Expression> {
        let state = old
            .as_object()
            .and_then(|obj| {
                obj.with_body(|body| match body {
                    Body::Proxy(state) => Some(state.clone()),
                    _ => None,
                })
            })
            .ok_or_else(|| EncodeError::Unreproducible {
                type_name: old.to_string(),
                reason: "not a proxy".to_string(),
            })?;

        let handler = state.handler.as_object().and_then(|obj| {
            obj.with_body(|body| match body {
                Body::EventHandler(handler) => Some(handler.clone()),
                _ => None,
            })
        });

        if let (Some(handler), Some(listener)) = (handler, state.interfaces.first()) {
            let mut args = vec![
                Value::Type(listener.clone()),
                handler.target.clone(),
                Value::str(&handler.action),
            ];
            if let Some(property) = &handler.event_property_name {
                args.push(Value::str(property));
            }
            if let Some(method) = &handler.listener_method_name {
                args.resize(4, Value::Null);
                args.push(Value::str(method));
            }
            return Ok(Expression::with_value(
                old.clone(),
                Value::Type(builtins::event_handler()),
                "create",
                args,
            ));
        }

        let interfaces = builtins::new_array(
            &builtins::class(),
            state.interfaces.iter().cloned().map(Value::Type).collect(),
        );
        Ok(Expression::with_value(
            old.clone(),
            Value::Type(builtins::proxy()),
            "newProxyInstance",
            vec![interfaces, state.handler],
        ))
    }
}
