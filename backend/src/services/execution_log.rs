// Workflow execution history. One record per matched rule, best-effort:
// the engine swallows recording failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use triage_shared::{EntityType, TriggerType};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ExecutionLogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One attempted action inside an execution-log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionAttempt {
    pub action_type: String,
    pub success: bool,
}

/// One persisted record per matched rule describing what ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub tenant_id: Uuid,
    pub rule_id: Uuid,
    pub rule_name: String,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub trigger_type: TriggerType,
    pub conditions_matched: bool,
    pub actions: Vec<ActionAttempt>,
    pub duration_ms: i64,
    /// First action error, if any action failed.
    pub error: Option<String>,
}

/// Structured execution history sink.
#[async_trait]
pub trait ExecutionLogger: Send + Sync {
    async fn record_execution(&self, entry: &ExecutionLogEntry) -> Result<(), ExecutionLogError>;
}

pub struct PgExecutionLogger {
    pool: PgPool,
}

impl PgExecutionLogger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionLogger for PgExecutionLogger {
    async fn record_execution(&self, entry: &ExecutionLogEntry) -> Result<(), ExecutionLogError> {
        let actions = serde_json::to_value(&entry.actions)?;

        sqlx::query(
            r#"
            INSERT INTO workflow_execution_logs
            (id, tenant_id, rule_id, rule_name, entity_type, entity_id, trigger_type,
             conditions_matched, actions, duration_ms, error, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.tenant_id)
        .bind(entry.rule_id)
        .bind(&entry.rule_name)
        .bind(entry.entity_type.as_str())
        .bind(entry.entity_id)
        .bind(entry.trigger_type.as_str())
        .bind(entry.conditions_matched)
        .bind(actions)
        .bind(entry.duration_ms)
        .bind(&entry.error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
