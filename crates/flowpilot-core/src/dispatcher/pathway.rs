//! Mutation pathways: each pairs a capability probe with the action it enables.

use std::fmt;

use flowpilot_protocols::{ObjectRef, PageError, PageWorld};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::mutation::Mutation;
use crate::locator::{HostHandle, Locator, first_component_store};

/// A way of reaching the host's mutation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pathway {
    /// A method on the instance's own API namespace.
    HostApi,
    /// `dispatch` on the instance's `$store`.
    HandleStore,
    /// `dispatch` on the store of the first component in the document.
    ComponentStore,
    /// A method on the global helper object.
    HelperApi,
    /// Methods on the canvas component.
    Canvas,
    /// Direct property assignment on a node's component.
    NodeComponent,
}

impl Pathway {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HostApi => "host-api",
            Self::HandleStore => "handle-store",
            Self::ComponentStore => "component-store",
            Self::HelperApi => "helper-api",
            Self::Canvas => "canvas",
            Self::NodeComponent => "node-component",
        }
    }

    /// The action this pathway would take, if the page supports it.
    pub(crate) async fn probe(
        &self,
        page: &dyn PageWorld,
        handle: &HostHandle,
        locator: &Locator,
        mutation: &Mutation,
    ) -> Result<Option<Plan>, PageError> {
        match self {
            Self::HostApi => {
                let Some(api) = handle.member(page, &[mutation.api_namespace()]).await? else {
                    return Ok(None);
                };
                invoke_if_callable(page, api, mutation.method(), mutation.api_args()).await
            }
            Self::HandleStore => {
                let Some(store) = handle.member(page, &["$store"]).await? else {
                    return Ok(None);
                };
                invoke_if_callable(page, store, "dispatch", mutation.store_dispatch()).await
            }
            Self::ComponentStore => Ok(first_component_store(page)
                .await?
                .map(|store| Plan::invoke(store, "dispatch", mutation.store_dispatch()))),
            Self::HelperApi => {
                let Some(helper) = page.global(&locator.profile().helper_global).await? else {
                    return Ok(None);
                };
                invoke_if_callable(page, helper, mutation.method(), mutation.api_args()).await
            }
            Self::Canvas => {
                let Some(canvas) = locator.canvas_component(page).await? else {
                    return Ok(None);
                };
                match mutation {
                    Mutation::Import(workflow) => Ok(Some(Plan::RebuildCanvas {
                        canvas,
                        workflow: workflow.clone(),
                    })),
                    other => match other.canvas_method() {
                        Some(method) => {
                            invoke_if_callable(page, canvas, method, other.api_args()).await
                        }
                        None => Ok(None),
                    },
                }
            }
            Self::NodeComponent => {
                let Mutation::UpdateNode { node_id, data } = mutation else {
                    return Ok(None);
                };
                let selector = format!("[data-node-id=\"{}\"]", id_text(node_id));
                Ok(page.element_component(&selector).await?.map(|component| {
                    Plan::AssignProps {
                        component,
                        data: data.as_object().cloned().unwrap_or_default(),
                    }
                }))
            }
        }
    }
}

impl fmt::Display for Pathway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete action against the page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Plan {
    Invoke {
        target: ObjectRef,
        method: String,
        args: Vec<Value>,
    },
    /// Clear the visible nodes, then re-add every node and connection.
    RebuildCanvas { canvas: ObjectRef, workflow: Value },
    AssignProps {
        component: ObjectRef,
        data: Map<String, Value>,
    },
}

impl Plan {
    fn invoke(target: ObjectRef, method: &str, args: Vec<Value>) -> Self {
        Self::Invoke {
            target,
            method: method.to_string(),
            args,
        }
    }

    pub async fn execute(self, page: &dyn PageWorld) -> Result<(), PageError> {
        match self {
            Self::Invoke {
                target,
                method,
                args,
            } => {
                page.invoke(&target, &method, args).await?;
                Ok(())
            }
            Self::RebuildCanvas { canvas, workflow } => rebuild_canvas(page, &canvas, &workflow).await,
            Self::AssignProps { component, data } => {
                for (key, value) in data {
                    page.assign(&component, &key, value).await?;
                }
                Ok(())
            }
        }
    }
}

async fn invoke_if_callable(
    page: &dyn PageWorld,
    target: ObjectRef,
    method: &str,
    args: Vec<Value>,
) -> Result<Option<Plan>, PageError> {
    if page.is_callable(&target, method).await? {
        Ok(Some(Plan::invoke(target, method, args)))
    } else {
        Ok(None)
    }
}

async fn rebuild_canvas(
    page: &dyn PageWorld,
    canvas: &ObjectRef,
    workflow: &Value,
) -> Result<(), PageError> {
    if page.is_callable(canvas, "removeNode").await? {
        for element in page.query_all(".node-item").await? {
            let id = element
                .attr("data-node-id")
                .or_else(|| element.attr("id"))
                .unwrap_or_default()
                .to_string();
            page.invoke(canvas, "removeNode", vec![json!(id)]).await?;
        }
    }

    if page.is_callable(canvas, "addNodeToCanvas").await? {
        let nodes = workflow.get("nodes").and_then(Value::as_array);
        for node in nodes.into_iter().flatten() {
            let args = vec![
                node.get("type").cloned().unwrap_or(Value::Null),
                node.get("position").cloned().unwrap_or(Value::Null),
                node.clone(),
            ];
            page.invoke(canvas, "addNodeToCanvas", args).await?;
        }
    }

    let connections = workflow.get("connections").and_then(Value::as_object);
    if let Some(connections) = connections {
        if page.is_callable(canvas, "addConnection").await? {
            for (source, group) in connections {
                let slots = group.get("main").and_then(Value::as_array);
                for (output_index, targets) in slots.into_iter().flatten().enumerate() {
                    for target in targets.as_array().into_iter().flatten() {
                        let link = json!({
                            "source": source,
                            "sourceIndex": output_index,
                            "target": target.get("node").cloned().unwrap_or(Value::Null),
                            "targetIndex": target.get("index").and_then(Value::as_u64).unwrap_or(0),
                        });
                        page.invoke(canvas, "addConnection", vec![link]).await?;
                    }
                }
            }
        }
    }

    debug!("Canvas rebuilt");
    Ok(())
}

fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
