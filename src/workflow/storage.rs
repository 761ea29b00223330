//! SQLite persistence layer
//!
//! Stores workflows, knowledge-base documents, chat sessions and messages,
//! and the per-step execution log. Workflow graphs and step snapshots are kept
//! as JSON columns. The store also serves as the engine's document source and
//! execution log sink.

use crate::runtime::collaborators::{DocumentStore, ExecutionLogEntry, ExecutionLogSink};
use crate::workflow::types::{
    ChatMessage, ChatSession, Document, MessageType, StoredWorkflow, WorkflowDefinition,
};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::str::FromStr;

/// SQLite-backed store for everything around a workflow run
#[derive(Debug, Clone)]
pub struct Store {
    /// SQLite connection pool
    pool: SqlitePool,
}

/// New document payload
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub filename: String,
    pub content: String,
    pub file_type: String,
    pub workflow_id: String,
}

/// A persisted execution log row
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogRecord {
    pub id: String,
    pub workflow_id: String,
    pub session_id: String,
    pub component_type: String,
    pub input_data: serde_json::Value,
    pub output_data: serde_json::Value,
    pub execution_time_ms: i64,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: String,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl Store {
    /// Create new store instance with an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `url` and initialise the schema
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| anyhow::anyhow!("Invalid database URL '{}': {}", url, e))?
            .create_if_missing(true);

        // An in-memory database lives and dies with its connection
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    /// Initialize the schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS workflows (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                definition JSON NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                filename TEXT NOT NULL,
                content TEXT NOT NULL,
                file_type TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                workflow_id TEXT NOT NULL,
                upload_date TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS chat_sessions (
                id TEXT PRIMARY KEY,
                workflow_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                session_id TEXT NOT NULL,
                message TEXT NOT NULL,
                response TEXT,
                message_type TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS execution_logs (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                workflow_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                component_type TEXT NOT NULL,
                input_data JSON NOT NULL,
                output_data JSON NOT NULL,
                execution_time_ms INTEGER NOT NULL,
                status TEXT NOT NULL,
                error_message TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_documents_workflow ON documents(workflow_id)",
            "CREATE INDEX IF NOT EXISTS idx_messages_session ON chat_messages(session_id)",
            "CREATE INDEX IF NOT EXISTS idx_logs_session ON execution_logs(session_id)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    // ---------------------------------------------------------------------
    // Workflows
    // ---------------------------------------------------------------------

    /// Store a new workflow and return it
    pub async fn create_workflow(
        &self,
        name: &str,
        description: &str,
        definition: &WorkflowDefinition,
    ) -> Result<StoredWorkflow> {
        let id = new_id();
        let timestamp = now();
        let definition_json = serde_json::to_string(definition)?;

        sqlx::query(
            r#"
            INSERT INTO workflows (id, name, description, definition, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(description)
        .bind(&definition_json)
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&self.pool)
        .await?;

        tracing::info!("💾 Stored workflow {} ({})", id, name);

        Ok(StoredWorkflow {
            id,
            name: name.to_string(),
            description: description.to_string(),
            definition: definition.clone(),
            is_active: true,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        })
    }

    /// Retrieve a workflow by ID
    pub async fn get_workflow(&self, id: &str) -> Result<Option<StoredWorkflow>> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| workflow_from_row(&r)).transpose()
    }

    /// List all workflows, newest first
    pub async fn list_workflows(&self) -> Result<Vec<StoredWorkflow>> {
        let rows = sqlx::query("SELECT * FROM workflows ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(workflow_from_row).collect()
    }

    /// Update an existing workflow; fields left as `None` keep their value
    ///
    /// Returns `None` when no workflow has that id.
    pub async fn update_workflow(
        &self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
        definition: Option<&WorkflowDefinition>,
        is_active: Option<bool>,
    ) -> Result<Option<StoredWorkflow>> {
        let Some(mut workflow) = self.get_workflow(id).await? else {
            return Ok(None);
        };

        if let Some(name) = name {
            workflow.name = name.to_string();
        }
        if let Some(description) = description {
            workflow.description = description.to_string();
        }
        if let Some(definition) = definition {
            workflow.definition = definition.clone();
        }
        if let Some(is_active) = is_active {
            workflow.is_active = is_active;
        }
        workflow.updated_at = now();

        sqlx::query(
            r#"
            UPDATE workflows
            SET name = ?, description = ?, definition = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(serde_json::to_string(&workflow.definition)?)
        .bind(workflow.is_active)
        .bind(&workflow.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(workflow))
    }

    /// Delete a workflow by ID
    pub async fn delete_workflow(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ---------------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------------

    /// Attach a document to a workflow's knowledge base
    pub async fn create_document(&self, doc: NewDocument) -> Result<Document> {
        let document = Document {
            id: new_id(),
            file_size: doc.content.len() as i64,
            filename: doc.filename,
            content: doc.content,
            file_type: doc.file_type,
            workflow_id: doc.workflow_id,
            upload_date: now(),
        };

        sqlx::query(
            r#"
            INSERT INTO documents (id, filename, content, file_type, file_size, workflow_id, upload_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&document.id)
        .bind(&document.filename)
        .bind(&document.content)
        .bind(&document.file_type)
        .bind(document.file_size)
        .bind(&document.workflow_id)
        .bind(&document.upload_date)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            "📄 Document uploaded: {} ({} bytes) for workflow {}",
            document.filename,
            document.file_size,
            document.workflow_id
        );

        Ok(document)
    }

    /// Documents attached to a workflow, in upload order
    pub async fn documents_by_workflow(&self, workflow_id: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query("SELECT * FROM documents WHERE workflow_id = ? ORDER BY seq")
            .bind(workflow_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Document {
                id: row.get("id"),
                filename: row.get("filename"),
                content: row.get("content"),
                file_type: row.get("file_type"),
                file_size: row.get("file_size"),
                workflow_id: row.get("workflow_id"),
                upload_date: row.get("upload_date"),
            })
            .collect())
    }

    // ---------------------------------------------------------------------
    // Chat sessions and messages
    // ---------------------------------------------------------------------

    /// Open a new chat session against a workflow
    pub async fn create_chat_session(&self, workflow_id: &str) -> Result<ChatSession> {
        let session = ChatSession {
            id: new_id(),
            workflow_id: workflow_id.to_string(),
            created_at: now(),
        };

        sqlx::query("INSERT INTO chat_sessions (id, workflow_id, created_at) VALUES (?, ?, ?)")
            .bind(&session.id)
            .bind(&session.workflow_id)
            .bind(&session.created_at)
            .execute(&self.pool)
            .await?;

        Ok(session)
    }

    /// Append a message to a session
    pub async fn add_chat_message(
        &self,
        session_id: &str,
        message: &str,
        response: Option<&str>,
        message_type: MessageType,
    ) -> Result<ChatMessage> {
        let chat_message = ChatMessage {
            id: new_id(),
            session_id: session_id.to_string(),
            message: message.to_string(),
            response: response.map(str::to_string),
            message_type,
            created_at: now(),
        };

        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, session_id, message, response, message_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&chat_message.id)
        .bind(&chat_message.session_id)
        .bind(&chat_message.message)
        .bind(&chat_message.response)
        .bind(message_type.as_str())
        .bind(&chat_message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(chat_message)
    }

    /// Messages of a session, oldest first
    pub async fn chat_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query("SELECT * FROM chat_messages WHERE session_id = ? ORDER BY seq")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let message_type: String = row.get("message_type");
                Ok(ChatMessage {
                    id: row.get("id"),
                    session_id: row.get("session_id"),
                    message: row.get("message"),
                    response: row.get("response"),
                    message_type: match message_type.as_str() {
                        "assistant" => MessageType::Assistant,
                        _ => MessageType::User,
                    },
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Execution logs
    // ---------------------------------------------------------------------

    /// Execution log rows of a session, in write order
    pub async fn execution_logs(&self, session_id: &str) -> Result<Vec<ExecutionLogRecord>> {
        let rows = sqlx::query("SELECT * FROM execution_logs WHERE session_id = ? ORDER BY seq")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let input: String = row.get("input_data");
                let output: String = row.get("output_data");
                Ok(ExecutionLogRecord {
                    id: row.get("id"),
                    workflow_id: row.get("workflow_id"),
                    session_id: row.get("session_id"),
                    component_type: row.get("component_type"),
                    input_data: serde_json::from_str(&input)?,
                    output_data: serde_json::from_str(&output)?,
                    execution_time_ms: row.get("execution_time_ms"),
                    status: row.get("status"),
                    error_message: row.get("error_message"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}

fn workflow_from_row(row: &SqliteRow) -> Result<StoredWorkflow> {
    let definition_json: String = row.get("definition");
    Ok(StoredWorkflow {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        definition: serde_json::from_str(&definition_json)?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl DocumentStore for Store {
    async fn get_documents(&self, workflow_id: &str) -> Result<Vec<Document>> {
        self.documents_by_workflow(workflow_id).await
    }
}

#[async_trait]
impl ExecutionLogSink for Store {
    async fn log_execution_step(&self, entry: &ExecutionLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO execution_logs (
                id, workflow_id, session_id, component_type, input_data, output_data,
                execution_time_ms, status, error_message, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new_id())
        .bind(&entry.workflow_id)
        .bind(&entry.session_id)
        .bind(&entry.component_type)
        .bind(serde_json::to_string(&entry.input)?)
        .bind(serde_json::to_string(&entry.output)?)
        .bind(entry.elapsed_ms as i64)
        .bind(entry.status.as_str())
        .bind(&entry.error_message)
        .bind(now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
