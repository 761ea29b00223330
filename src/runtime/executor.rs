//! Step dispatch and the four component handlers
//!
//! This module contains the execution logic for each catalog kind:
//! - UserQuery: pass-through annotation of the raw question
//! - KnowledgeBase: substring retrieval over the workflow's documents
//! - LLMEngine: prompt synthesis and a model call
//! - Output: final formatting and run summary
//!
//! Handler failures never leave this module as errors. They become degraded
//! outputs recorded with `StepStatus::Error`, and the run moves on.

use crate::{
    llm::{ModelClient, ModelRequest},
    runtime::{
        collaborators::{DocumentStore, ExecutionLogEntry, ExecutionLogSink, RelevanceMatcher, SubstringMatcher},
        context::{ExecutionContext, StepRecord, StepStatus},
    },
    workflow::types::{NodeKind, WorkflowNode},
};
use serde_json::{json, Value};
use std::{sync::Arc, time::Instant};

/// Maximum number of documents stitched into the retrieval context
pub const MAX_CONTEXT_DOCUMENTS: usize = 3;
/// Characters kept from each selected document
pub const MAX_DOCUMENT_CHARS: usize = 1000;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_OUTPUT_FORMAT: &str = "chat";

/// Response text used when the model call fails
pub const LLM_APOLOGY: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";
const NO_DOCUMENTS_MESSAGE: &str = "No documents found in knowledge base";
const NO_RESPONSE_TEXT: &str = "No response generated";

/// What a handler produced, before timing and logging are attached
#[derive(Debug)]
struct StepOutcome {
    input: Value,
    output: Value,
    status: StepStatus,
    error_message: Option<String>,
}

impl StepOutcome {
    fn success(input: Value, output: Value) -> Self {
        Self {
            input,
            output,
            status: StepStatus::Success,
            error_message: None,
        }
    }

    fn failure(input: Value, output: Value, message: String) -> Self {
        Self {
            input,
            output,
            status: StepStatus::Error,
            error_message: Some(message),
        }
    }
}

/// Dispatches workflow nodes to their handlers
///
/// Holds the collaborators the handlers need. It keeps no per-run state, so
/// one executor serves any number of concurrent runs.
pub struct NodeExecutor {
    documents: Arc<dyn DocumentStore>,
    model: Arc<dyn ModelClient>,
    log_sink: Arc<dyn ExecutionLogSink>,
    matcher: Arc<dyn RelevanceMatcher>,
}

impl std::fmt::Debug for NodeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeExecutor").finish_non_exhaustive()
    }
}

impl NodeExecutor {
    /// Create an executor using substring relevance matching
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        model: Arc<dyn ModelClient>,
        log_sink: Arc<dyn ExecutionLogSink>,
    ) -> Self {
        Self {
            documents,
            model,
            log_sink,
            matcher: Arc::new(SubstringMatcher),
        }
    }

    /// Swap the document relevance strategy
    pub fn with_matcher(mut self, matcher: Arc<dyn RelevanceMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Execute one node against the run's context
    ///
    /// Appends exactly one trace entry and issues one log write for every
    /// catalog kind, then replaces `current_data` with the handler output.
    /// Unknown kinds are skipped without a trace entry and return `None`.
    pub async fn dispatch(&self, node: &WorkflowNode, context: &mut ExecutionContext) -> Option<Value> {
        tracing::info!("🚀 Executing component: {} ({})", node.kind, node.id);

        let start_time = Instant::now();
        let outcome = match node.kind {
            NodeKind::UserQuery => self.execute_user_query(node, context),
            NodeKind::KnowledgeBase => self.execute_knowledge_base(context).await,
            NodeKind::LlmEngine => self.execute_llm_engine(node, context).await,
            NodeKind::Output => self.execute_output(node, context),
            NodeKind::Unknown => {
                tracing::debug!("⏭️ Skipping node '{}' with unsupported kind", node.id);
                return None;
            }
        };
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        match outcome.status {
            StepStatus::Success => {
                tracing::info!("✅ Component '{}' completed in {}ms", node.id, elapsed_ms);
            }
            StepStatus::Error => {
                tracing::warn!(
                    "⚠️ Component '{}' degraded after {}ms: {}",
                    node.id,
                    elapsed_ms,
                    outcome.error_message.as_deref().unwrap_or("unknown error")
                );
            }
        }
        tracing::debug!("📤 Output data: {}", outcome.output);

        let record = StepRecord {
            node_id: node.id.clone(),
            kind: node.kind,
            input: outcome.input,
            output: outcome.output,
            elapsed_ms,
            status: outcome.status,
            error_message: outcome.error_message,
        };

        self.write_log(context, &record).await;

        let output = record.output.clone();
        context.record(record);
        context.current_data = Some(output.clone());
        Some(output)
    }

    /// Persist the step; failures are reported and swallowed
    async fn write_log(&self, context: &ExecutionContext, record: &StepRecord) {
        let entry = ExecutionLogEntry {
            workflow_id: context.workflow_id.clone(),
            session_id: context.session_id.clone(),
            component_type: record.kind.as_str().to_string(),
            input: record.input.clone(),
            output: record.output.clone(),
            elapsed_ms: record.elapsed_ms,
            status: record.status,
            error_message: record.error_message.clone(),
        };

        if let Err(e) = self.log_sink.log_execution_step(&entry).await {
            tracing::warn!("📝 Failed to write execution log for '{}': {}", record.node_id, e);
        }
    }

    /// UserQuery: annotate the raw question with a timestamp and the node config
    fn execute_user_query(&self, node: &WorkflowNode, context: &ExecutionContext) -> StepOutcome {
        let query = context.user_query();
        StepOutcome::success(
            json!({ "query": query }),
            json!({
                "query": query,
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "config": node.config,
            }),
        )
    }

    /// KnowledgeBase: collect up to three matching documents as context text
    async fn execute_knowledge_base(&self, context: &ExecutionContext) -> StepOutcome {
        let input = context.current_snapshot();
        let query = context
            .current_str("query")
            .unwrap_or_else(|| context.user_query())
            .to_string();

        let documents = match self.documents.get_documents(&context.workflow_id).await {
            Ok(documents) => documents,
            Err(e) => {
                let message = e.to_string();
                tracing::error!("❌ KnowledgeBase retrieval failed: {}", message);
                let output = json!({
                    "context": "",
                    "error": "Failed to retrieve knowledge base context",
                    "message": message,
                });
                return StepOutcome::failure(input, output, message);
            }
        };

        if documents.is_empty() {
            tracing::debug!("📭 No documents attached to workflow {}", context.workflow_id);
            return StepOutcome::success(
                input,
                json!({
                    "context": "",
                    "message": NO_DOCUMENTS_MESSAGE,
                    "documentsCount": 0,
                }),
            );
        }

        let relevant = self.matcher.select(&query, &documents);
        tracing::debug!(
            "🔍 {} of {} documents match query '{}'",
            relevant.len(),
            documents.len(),
            query
        );

        let context_text = relevant
            .iter()
            .take(MAX_CONTEXT_DOCUMENTS)
            .map(|doc| {
                format!(
                    "Document: {}\n{}",
                    doc.filename,
                    truncate_chars(&doc.content, MAX_DOCUMENT_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        StepOutcome::success(
            input,
            json!({
                "context": context_text,
                "relevantDocuments": relevant.len(),
                "totalDocuments": documents.len(),
                "query": query,
            }),
        )
    }

    /// LLMEngine: build the prompt and ask the configured provider
    async fn execute_llm_engine(&self, node: &WorkflowNode, context: &ExecutionContext) -> StepOutcome {
        let input = context.current_snapshot();
        let query = context.current_str("query").unwrap_or_else(|| context.user_query());
        let knowledge = context.current_str("context").unwrap_or("");

        let request = ModelRequest {
            provider: node.config_str("provider").unwrap_or(DEFAULT_PROVIDER).to_string(),
            model: node.config_str("model").unwrap_or(DEFAULT_MODEL).to_string(),
            system_prompt: node
                .config_str("systemPrompt")
                .unwrap_or(DEFAULT_SYSTEM_PROMPT)
                .to_string(),
            prompt: build_prompt(query, knowledge),
            // Any numeric value counts, 0 included; missing or non-numeric takes the default
            temperature: node
                .config_f64("temperature")
                .map(|t| t as f32)
                .unwrap_or(DEFAULT_TEMPERATURE),
        };

        tracing::debug!("🧠 Calling {} / {}", request.provider, request.model);

        match self.model.call_model(&request).await {
            Ok(response) => StepOutcome::success(
                input,
                json!({
                    "response": response,
                    "model": request.model,
                    "provider": request.provider,
                    "prompt": request.prompt,
                    "hasContext": !knowledge.is_empty(),
                    "contextLength": knowledge.chars().count(),
                }),
            ),
            Err(e) => {
                let message = e.to_string();
                tracing::error!("❌ LLMEngine call failed: {}", message);
                let output = json!({
                    "response": LLM_APOLOGY,
                    "error": "LLM execution failed",
                    "message": message,
                });
                StepOutcome::failure(input, output, message)
            }
        }
    }

    /// Output: format the final answer and summarise the steps recorded so far
    fn execute_output(&self, node: &WorkflowNode, context: &ExecutionContext) -> StepOutcome {
        let show_timestamp = node.config_bool("showTimestamp") != Some(false);
        let format = node.config_str("format").unwrap_or(DEFAULT_OUTPUT_FORMAT);

        let mut final_response = context
            .current_str("response")
            .unwrap_or(NO_RESPONSE_TEXT)
            .to_string();
        if show_timestamp {
            final_response.push_str(&format!(
                "\n\n_Generated at {}_",
                chrono::Local::now().format("%-I:%M:%S %p")
            ));
        }

        StepOutcome::success(
            context.current_snapshot(),
            json!({
                "finalResponse": final_response,
                "format": format,
                "executionSummary": {
                    "totalSteps": context.trace().len(),
                    "totalExecutionTime": context.total_elapsed_ms(),
                    "componentsUsed": context.components_used(),
                },
            }),
        )
    }
}

/// Prepend retrieved context to the question when there is any
pub fn build_prompt(query: &str, knowledge: &str) -> String {
    if knowledge.is_empty() {
        return query.to_string();
    }
    format!(
        "Context from knowledge base:\n{}\n\nUser question: {}\n\nPlease answer the question based on the provided context.",
        knowledge, query
    )
}

/// Keep at most `max` characters, respecting char boundaries
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelError;
    use crate::workflow::types::{Document, Position};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedDocuments(Result<Vec<Document>, String>);

    #[async_trait]
    impl DocumentStore for FixedDocuments {
        async fn get_documents(&self, _workflow_id: &str) -> Result<Vec<Document>> {
            self.0.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    /// Echoes the prompt back, or fails when built with `failing`
    struct EchoModel {
        fail: bool,
        seen: Mutex<Vec<ModelRequest>>,
    }

    impl EchoModel {
        fn ok() -> Self {
            Self { fail: false, seen: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { fail: true, seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ModelClient for EchoModel {
        async fn call_model(&self, request: &ModelRequest) -> Result<String, ModelError> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                Err(ModelError::ApiKeyMissing("OpenAI".to_string()))
            } else {
                Ok(format!("echo: {}", request.prompt))
            }
        }
    }

    #[derive(Default)]
    struct MemorySink(Mutex<Vec<ExecutionLogEntry>>);

    #[async_trait]
    impl ExecutionLogSink for MemorySink {
        async fn log_execution_step(&self, entry: &ExecutionLogEntry) -> Result<()> {
            self.0.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    struct BrokenSink;

    #[async_trait]
    impl ExecutionLogSink for BrokenSink {
        async fn log_execution_step(&self, _entry: &ExecutionLogEntry) -> Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }
    }

    fn doc(filename: &str, content: &str) -> Document {
        Document {
            id: filename.to_string(),
            filename: filename.to_string(),
            content: content.to_string(),
            file_type: "text/plain".to_string(),
            file_size: content.len() as i64,
            workflow_id: "wf".to_string(),
            upload_date: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn node(id: &str, kind: NodeKind, config: Value) -> WorkflowNode {
        WorkflowNode {
            id: id.to_string(),
            kind,
            config,
            position: Position::default(),
        }
    }

    fn executor(docs: Result<Vec<Document>, String>, model: Arc<EchoModel>, sink: Arc<MemorySink>) -> NodeExecutor {
        NodeExecutor::new(Arc::new(FixedDocuments(docs)), model, sink)
    }

    #[tokio::test]
    async fn user_query_passes_the_question_through() {
        let sink = Arc::new(MemorySink::default());
        let exec = executor(Ok(vec![]), Arc::new(EchoModel::ok()), sink.clone());
        let mut ctx = ExecutionContext::new("wf", "s1", "what is a borrow?");

        let output = exec
            .dispatch(&node("q", NodeKind::UserQuery, json!({"placeholder": "Ask"})), &mut ctx)
            .await
            .unwrap();

        assert_eq!(output["query"], "what is a borrow?");
        assert_eq!(output["config"]["placeholder"], "Ask");
        assert!(output["timestamp"].is_string());
        assert_eq!(ctx.trace()[0].input, json!({"query": "what is a borrow?"}));
        assert_eq!(sink.0.lock().unwrap()[0].component_type, "UserQuery");
    }

    #[tokio::test]
    async fn knowledge_base_caps_and_truncates_documents() {
        let long = format!("rust {}", "a".repeat(2000));
        let docs = vec![
            doc("1.txt", &long),
            doc("skip.txt", "python only"),
            doc("2.txt", "RUST two"),
            doc("3.txt", "rust three"),
            doc("4.txt", "rust four"),
        ];
        let exec = executor(Ok(docs), Arc::new(EchoModel::ok()), Arc::new(MemorySink::default()));
        let mut ctx = ExecutionContext::new("wf", "s1", "Rust");

        let output = exec
            .dispatch(&node("kb", NodeKind::KnowledgeBase, Value::Null), &mut ctx)
            .await
            .unwrap();

        let context = output["context"].as_str().unwrap();
        let expected_first = format!("Document: 1.txt\n{}", &long[..1000]);
        assert!(context.starts_with(&expected_first));
        assert!(context.contains("\n\nDocument: 2.txt\nRUST two"));
        assert!(context.ends_with("Document: 3.txt\nrust three"));
        assert!(!context.contains("4.txt"));
        assert_eq!(output["relevantDocuments"], 4);
        assert_eq!(output["totalDocuments"], 5);
        assert_eq!(output["query"], "Rust");
        assert_eq!(ctx.trace()[0].status, StepStatus::Success);
    }

    #[tokio::test]
    async fn knowledge_base_prefers_query_from_previous_step() {
        let exec = executor(
            Ok(vec![doc("a.txt", "about lifetimes")]),
            Arc::new(EchoModel::ok()),
            Arc::new(MemorySink::default()),
        );
        let mut ctx = ExecutionContext::new("wf", "s1", "raw question");
        ctx.current_data = Some(json!({"query": "lifetimes"}));

        let output = exec
            .dispatch(&node("kb", NodeKind::KnowledgeBase, Value::Null), &mut ctx)
            .await
            .unwrap();

        assert_eq!(output["query"], "lifetimes");
        assert_eq!(output["relevantDocuments"], 1);
        assert_eq!(ctx.trace()[0].input, json!({"query": "lifetimes"}));
    }

    #[tokio::test]
    async fn knowledge_base_without_documents_is_not_an_error() {
        let sink = Arc::new(MemorySink::default());
        let exec = executor(Ok(vec![]), Arc::new(EchoModel::ok()), sink.clone());
        let mut ctx = ExecutionContext::new("wf", "s1", "q");

        let output = exec
            .dispatch(&node("kb", NodeKind::KnowledgeBase, Value::Null), &mut ctx)
            .await
            .unwrap();

        assert_eq!(output["documentsCount"], 0);
        assert_eq!(output["context"], "");
        assert_eq!(ctx.trace().len(), 1);
        assert_eq!(ctx.trace()[0].status, StepStatus::Success);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn knowledge_base_retrieval_failure_degrades() {
        let sink = Arc::new(MemorySink::default());
        let exec = executor(Err("connection refused".to_string()), Arc::new(EchoModel::ok()), sink.clone());
        let mut ctx = ExecutionContext::new("wf", "s1", "q");

        let output = exec
            .dispatch(&node("kb", NodeKind::KnowledgeBase, Value::Null), &mut ctx)
            .await
            .unwrap();

        assert_eq!(output["context"], "");
        assert_eq!(output["error"], "Failed to retrieve knowledge base context");
        assert_eq!(output["message"], "connection refused");
        assert_eq!(ctx.trace()[0].status, StepStatus::Error);
        let logs = sink.0.lock().unwrap();
        assert_eq!(logs[0].status, StepStatus::Error);
        assert_eq!(logs[0].error_message.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn llm_engine_uses_defaults_and_context() {
        let model = Arc::new(EchoModel::ok());
        let exec = executor(Ok(vec![]), model.clone(), Arc::new(MemorySink::default()));
        let mut ctx = ExecutionContext::new("wf", "s1", "raw");
        ctx.current_data = Some(json!({"query": "what is Send?", "context": "Document: a.txt\nSend is a marker"}));

        let output = exec
            .dispatch(&node("llm", NodeKind::LlmEngine, Value::Null), &mut ctx)
            .await
            .unwrap();

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].provider, "openai");
        assert_eq!(seen[0].model, "gpt-4");
        assert_eq!(seen[0].system_prompt, "You are a helpful assistant.");
        assert!((seen[0].temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(
            seen[0].prompt,
            "Context from knowledge base:\nDocument: a.txt\nSend is a marker\n\nUser question: what is Send?\n\nPlease answer the question based on the provided context."
        );
        assert_eq!(output["hasContext"], true);
        assert_eq!(output["contextLength"], 32);
        assert_eq!(output["response"], format!("echo: {}", seen[0].prompt));
    }

    #[tokio::test]
    async fn llm_engine_honours_node_config() {
        let model = Arc::new(EchoModel::ok());
        let exec = executor(Ok(vec![]), model.clone(), Arc::new(MemorySink::default()));
        let mut ctx = ExecutionContext::new("wf", "s1", "hello");
        let config = json!({"provider": "claude", "model": "claude-3-haiku", "temperature": 0.2, "systemPrompt": "Be brief."});

        let output = exec
            .dispatch(&node("llm", NodeKind::LlmEngine, config), &mut ctx)
            .await
            .unwrap();

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].provider, "claude");
        assert_eq!(seen[0].model, "claude-3-haiku");
        assert_eq!(seen[0].system_prompt, "Be brief.");
        assert!((seen[0].temperature - 0.2).abs() < 1e-6);
        assert_eq!(seen[0].prompt, "hello");
        assert_eq!(output["hasContext"], false);
        assert_eq!(output["contextLength"], 0);
    }

    #[tokio::test]
    async fn llm_engine_failure_returns_apology() {
        let sink = Arc::new(MemorySink::default());
        let exec = executor(Ok(vec![]), Arc::new(EchoModel::failing()), sink.clone());
        let mut ctx = ExecutionContext::new("wf", "s1", "q");

        let output = exec
            .dispatch(&node("llm", NodeKind::LlmEngine, Value::Null), &mut ctx)
            .await
            .unwrap();

        assert_eq!(output["response"], LLM_APOLOGY);
        assert_eq!(output["error"], "LLM execution failed");
        assert_eq!(output["message"], "OpenAI API key not configured");
        assert_eq!(ctx.trace()[0].status, StepStatus::Error);
        assert_eq!(sink.0.lock().unwrap()[0].status, StepStatus::Error);
    }

    #[tokio::test]
    async fn output_summarises_previous_steps() {
        let exec = executor(Ok(vec![]), Arc::new(EchoModel::ok()), Arc::new(MemorySink::default()));
        let mut ctx = ExecutionContext::new("wf", "s1", "q");
        exec.dispatch(&node("q", NodeKind::UserQuery, Value::Null), &mut ctx).await;
        exec.dispatch(&node("llm", NodeKind::LlmEngine, Value::Null), &mut ctx).await;
        let elapsed_before = ctx.total_elapsed_ms();

        let output = exec
            .dispatch(
                &node("out", NodeKind::Output, json!({"showTimestamp": false, "format": "markdown"})),
                &mut ctx,
            )
            .await
            .unwrap();

        assert_eq!(output["finalResponse"], "echo: q");
        assert_eq!(output["format"], "markdown");
        assert_eq!(output["executionSummary"]["totalSteps"], 2);
        assert_eq!(output["executionSummary"]["totalExecutionTime"], elapsed_before);
        assert_eq!(output["executionSummary"]["componentsUsed"], json!(["UserQuery", "LLMEngine"]));
        assert_eq!(ctx.trace().len(), 3);
    }

    #[tokio::test]
    async fn output_appends_timestamp_by_default() {
        let exec = executor(Ok(vec![]), Arc::new(EchoModel::ok()), Arc::new(MemorySink::default()));
        let mut ctx = ExecutionContext::new("wf", "s1", "q");

        let output = exec
            .dispatch(&node("out", NodeKind::Output, Value::Null), &mut ctx)
            .await
            .unwrap();

        let text = output["finalResponse"].as_str().unwrap();
        assert!(text.starts_with("No response generated\n\n_Generated at "));
        assert!(text.ends_with('_'));
        assert_eq!(output["format"], "chat");
    }

    #[tokio::test]
    async fn unknown_kind_is_skipped_silently() {
        let sink = Arc::new(MemorySink::default());
        let exec = executor(Ok(vec![]), Arc::new(EchoModel::ok()), sink.clone());
        let mut ctx = ExecutionContext::new("wf", "s1", "q");
        ctx.current_data = Some(json!({"response": "kept"}));

        let result = exec
            .dispatch(&node("web", NodeKind::Unknown, Value::Null), &mut ctx)
            .await;

        assert!(result.is_none());
        assert!(ctx.trace().is_empty());
        assert!(sink.0.lock().unwrap().is_empty());
        assert_eq!(ctx.current_data, Some(json!({"response": "kept"})));
    }

    #[tokio::test]
    async fn failing_log_sink_does_not_stop_the_step() {
        let exec = NodeExecutor::new(
            Arc::new(FixedDocuments(Ok(vec![]))),
            Arc::new(EchoModel::ok()),
            Arc::new(BrokenSink),
        );
        let mut ctx = ExecutionContext::new("wf", "s1", "q");

        let output = exec.dispatch(&node("q", NodeKind::UserQuery, Value::Null), &mut ctx).await;

        assert!(output.is_some());
        assert_eq!(ctx.trace().len(), 1);
    }

    #[tokio::test]
    async fn zero_temperature_is_passed_through() {
        let model = Arc::new(EchoModel::ok());
        let exec = executor(Ok(vec![]), model.clone(), Arc::new(MemorySink::default()));
        let mut ctx = ExecutionContext::new("wf", "s1", "hello");

        exec.dispatch(&node("llm", NodeKind::LlmEngine, json!({"temperature": 0})), &mut ctx)
            .await;
        exec.dispatch(&node("llm", NodeKind::LlmEngine, json!({"temperature": "hot"})), &mut ctx)
            .await;

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, 0.0);
        assert!((seen[1].temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }

    /// Picks documents by filename instead of content
    struct FilenameMatcher;

    impl RelevanceMatcher for FilenameMatcher {
        fn select<'a>(&self, query: &str, documents: &'a [Document]) -> Vec<&'a Document> {
            documents.iter().filter(|d| d.filename.starts_with(query)).collect()
        }
    }

    #[tokio::test]
    async fn custom_matcher_replaces_substring_matching() {
        let docs = vec![
            doc("billing.txt", "invoices are due monthly"),
            doc("shipping.txt", "billing questions go elsewhere"),
        ];
        let exec = executor(Ok(docs), Arc::new(EchoModel::ok()), Arc::new(MemorySink::default()))
            .with_matcher(Arc::new(FilenameMatcher));
        let mut ctx = ExecutionContext::new("wf", "s1", "billing");

        let output = exec
            .dispatch(&node("kb", NodeKind::KnowledgeBase, Value::Null), &mut ctx)
            .await
            .unwrap();

        assert_eq!(output["relevantDocuments"], 1);
        assert_eq!(output["totalDocuments"], 2);
        assert_eq!(output["context"], "Document: billing.txt\ninvoices are due monthly");
    }

    #[test]
    fn truncation_respects_multibyte_text() {
        let text = "é".repeat(5);
        assert_eq!(truncate_chars(&text, 3), "ééé");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
