//! Run coordinator
//!
//! Owns a single run end to end: allocates the execution context, orders the
//! graph once, dispatches each node strictly in sequence and turns the last
//! step's output into the answer text.

use crate::runtime::{
    context::{ExecutionContext, StepRecord},
    error::EngineError,
    executor::NodeExecutor,
    orderer::execution_order,
};
use crate::workflow::types::{WorkflowDefinition, WorkflowNode};
use serde::Serialize;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tokio_util::task::AbortOnDropHandle;

/// Returned when neither an Output nor an LLMEngine step produced text
pub const COMPLETION_FALLBACK: &str = "Workflow completed successfully";

/// Workflow execution engine
///
/// A stateless service value: construct it once at startup and share it.
/// All per-run state lives in the `ExecutionContext` each run allocates.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    /// Node executor for handling individual node execution
    executor: Arc<NodeExecutor>,
}

/// Final answer plus the trace of the run that produced it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub response: String,
    pub trace: Vec<StepRecord>,
}

impl ExecutionEngine {
    /// Create new execution engine with node executor
    pub fn new(executor: Arc<NodeExecutor>) -> Self {
        Self { executor }
    }

    /// Execute a workflow and return only the answer text
    pub async fn execute_workflow(
        &self,
        definition: &WorkflowDefinition,
        workflow_id: &str,
        session_id: &str,
        query: &str,
    ) -> Result<String, EngineError> {
        self.run(definition, workflow_id, session_id, query)
            .await
            .map(|outcome| outcome.response)
    }

    /// Execute a workflow and return the answer together with its trace
    ///
    /// The run is driven on its own task so a panic in a handler or a
    /// collaborator aborts only this run and surfaces as
    /// `EngineError::ExecutionFailed`. Step-level failures never do.
    /// If the returned future is dropped before completion the task is
    /// aborted at its next await point and no further steps run.
    pub async fn run(
        &self,
        definition: &WorkflowDefinition,
        workflow_id: &str,
        session_id: &str,
        query: &str,
    ) -> Result<RunOutcome, EngineError> {
        let run_start_time = std::time::Instant::now();
        tracing::info!(
            "🚀 Starting workflow execution: {} (session {})",
            workflow_id,
            session_id
        );

        let engine = self.clone();
        let definition = definition.clone();
        let context = ExecutionContext::new(workflow_id, session_id, query);

        // Dropping this future (caller timeout, client disconnect) aborts the run task
        let handle = AbortOnDropHandle::new(tokio::spawn(async move {
            engine.run_steps(&definition, context).await
        }));

        match handle.await {
            Ok(outcome) => {
                tracing::info!(
                    "🎉 Workflow '{}' completed {} steps in {:?}",
                    workflow_id,
                    outcome.trace.len(),
                    run_start_time.elapsed()
                );
                Ok(outcome)
            }
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    "run was cancelled".to_string()
                };
                tracing::error!(
                    "❌ Workflow '{}' execution failed after {:?}: {}",
                    workflow_id,
                    run_start_time.elapsed(),
                    message
                );
                Err(EngineError::execution_failed(message))
            }
        }
    }

    /// Order the graph and dispatch every resolvable node in sequence
    async fn run_steps(&self, definition: &WorkflowDefinition, mut context: ExecutionContext) -> RunOutcome {
        tracing::debug!(
            "📊 Ordering workflow with {} nodes and {} edges",
            definition.nodes.len(),
            definition.edges.len()
        );
        let order = execution_order(definition);
        tracing::info!("📋 Executing workflow with {} components: {:?}", order.len(), order);

        let mut nodes: HashMap<&str, &WorkflowNode> = HashMap::with_capacity(definition.nodes.len());
        for node in &definition.nodes {
            nodes.entry(node.id.as_str()).or_insert(node);
        }

        for (step_num, node_id) in order.iter().enumerate() {
            let Some(node) = nodes.get(node_id.as_str()) else {
                tracing::debug!("⏭️ Step {}: no node with id '{}', skipping", step_num + 1, node_id);
                continue;
            };
            self.executor.dispatch(node, &mut context).await;
        }

        RunOutcome {
            response: final_response(context.current_data.as_ref()),
            trace: context.into_trace(),
        }
    }
}

/// finalResponse, else response, else the generic completion text
fn final_response(current: Option<&Value>) -> String {
    let field = |key: &str| {
        current
            .and_then(|data| data.get(key))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    };

    field("finalResponse")
        .or_else(|| field("response"))
        .unwrap_or(COMPLETION_FALLBACK)
        .to_string()
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn final_response_prefers_formatted_output() {
        let data = json!({"finalResponse": "formatted", "response": "raw"});
        assert_eq!(final_response(Some(&data)), "formatted");
    }

    #[test]
    fn final_response_falls_back_to_model_response() {
        let data = json!({"response": "raw", "model": "gpt-4"});
        assert_eq!(final_response(Some(&data)), "raw");
    }

    #[test]
    fn final_response_always_yields_text() {
        assert_eq!(final_response(None), COMPLETION_FALLBACK);
        assert_eq!(final_response(Some(&json!({"context": ""}))), COMPLETION_FALLBACK);
        assert_eq!(final_response(Some(&json!({"finalResponse": ""}))), COMPLETION_FALLBACK);
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("owned".to_string())), "owned");
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic");
    }
}
