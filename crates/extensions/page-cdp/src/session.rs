//! A CDP session attached to one page target.

use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

use crate::client::Transport;
use crate::error::CdpError;
use crate::protocol::{ExceptionDetails, Incoming, RemoteObject};

/// Remote objects handed out by this crate live in one group.
pub(crate) const OBJECT_GROUP: &str = "flowpilot";

pub struct PageSession {
    target_id: String,
    session_id: String,
    transport: Transport,
    events: Mutex<Option<mpsc::UnboundedReceiver<Incoming>>>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        transport: Transport,
        events: mpsc::UnboundedReceiver<Incoming>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            transport,
            events: Mutex::new(Some(events)),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// The event stream of this session. Only the first caller gets it.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<Incoming>> {
        self.events.lock().take()
    }

    /// Evaluate an expression and copy its (awaited) result out by value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;
        by_value(result)
    }

    /// Evaluate an expression and keep its result as a remote object.
    pub async fn evaluate_handle(&self, expression: &str) -> Result<RemoteObject, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": false,
                    "objectGroup": OBJECT_GROUP,
                })),
            )
            .await?;
        by_handle(result)
    }

    /// Call `function` with `this` bound to the remote object, by value.
    pub async fn call_function_on(
        &self,
        object_id: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.callFunctionOn",
                Some(json!({
                    "objectId": object_id,
                    "functionDeclaration": function,
                    "arguments": call_arguments(args),
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;
        by_value(result)
    }

    /// Call `function` on the remote object and keep the result as a handle.
    pub async fn call_function_on_handle(
        &self,
        object_id: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<RemoteObject, CdpError> {
        let result = self
            .call(
                "Runtime.callFunctionOn",
                Some(json!({
                    "objectId": object_id,
                    "functionDeclaration": function,
                    "arguments": call_arguments(args),
                    "returnByValue": false,
                    "objectGroup": OBJECT_GROUP,
                })),
            )
            .await?;
        by_handle(result)
    }

    /// Expose `window[name](payload)` to the page; calls arrive as
    /// `Runtime.bindingCalled` events.
    pub async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        self.call("Runtime.addBinding", Some(json!({ "name": name })))
            .await?;
        Ok(())
    }

    /// Drop every remote object handed out so far.
    pub async fn release_object_group(&self) -> Result<(), CdpError> {
        self.call(
            "Runtime.releaseObjectGroup",
            Some(json!({ "objectGroup": OBJECT_GROUP })),
        )
        .await?;
        Ok(())
    }
}

fn call_arguments(args: Vec<Value>) -> Vec<Value> {
    args.into_iter().map(|v| json!({ "value": v })).collect()
}

fn raise_exception(result: &Value) -> Result<(), CdpError> {
    match result.get("exceptionDetails") {
        Some(details) => {
            let message = serde_json::from_value::<ExceptionDetails>(details.clone())
                .map(|d| d.message())
                .unwrap_or_else(|_| "script exception".to_string());
            Err(CdpError::Script(message))
        }
        None => Ok(()),
    }
}

fn by_value(result: Value) -> Result<Value, CdpError> {
    raise_exception(&result)?;
    Ok(result["result"]["value"].clone())
}

fn by_handle(mut result: Value) -> Result<RemoteObject, CdpError> {
    raise_exception(&result)?;
    Ok(serde_json::from_value(result["result"].take())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_value_unwraps_result() {
        let result = json!({"result": {"type": "string", "value": "n8n - Editor"}});
        assert_eq!(by_value(result).unwrap(), json!("n8n - Editor"));
    }

    #[test]
    fn test_undefined_comes_back_null() {
        let result = json!({"result": {"type": "undefined"}});
        assert_eq!(by_value(result).unwrap(), Value::Null);
    }

    #[test]
    fn test_exception_is_a_script_error() {
        let result = json!({
            "result": {"type": "object", "subtype": "error"},
            "exceptionDetails": {
                "text": "Uncaught (in promise)",
                "exception": {"type": "object", "description": "Error: 500 Internal Server Error"}
            }
        });
        let err = by_value(result).unwrap_err();
        assert!(matches!(err, CdpError::Script(m) if m.contains("500")));
    }

    #[test]
    fn test_handle_result() {
        let result = json!({"result": {"type": "object", "className": "Object", "objectId": "7.1.4"}});
        assert_eq!(by_handle(result).unwrap().handle(), Some("7.1.4"));
    }

    #[test]
    fn test_arguments_are_wrapped() {
        assert_eq!(
            call_arguments(vec![json!("getWorkflow"), json!(12)]),
            vec![json!({"value": "getWorkflow"}), json!({"value": 12})]
        );
    }
}
