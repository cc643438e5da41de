// Notification queue collaborator. The engine only enqueues; delivery is
// owned by the external queue worker.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use triage_shared::EntityType;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Job type for per-recipient workflow notifications.
pub const SEND_NOTIFICATION_JOB: &str = "send_notification";

/// Payload of one notification job. Fan-out produces one job per recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationJob {
    pub tenant_id: Uuid,
    pub recipient_id: String,
    pub message: String,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
}

/// Outbound notification queue.
///
/// `enqueue` submits a job and returns once the submission is acknowledged.
/// It never waits for delivery; callers must treat an `Ok` as "queued", not
/// "sent".
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn enqueue(&self, job_type: &str, payload: serde_json::Value) -> Result<(), NotifyError>;
}

/// Postgres-backed job queue consumed by the notification worker.
pub struct PgNotificationQueue {
    pool: PgPool,
}

impl PgNotificationQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationQueue {
    async fn enqueue(&self, job_type: &str, payload: serde_json::Value) -> Result<(), NotifyError> {
        sqlx::query(
            "INSERT INTO notification_jobs (id, job_type, payload, status, created_at)
             VALUES ($1, $2, $3, 'queued', NOW())",
        )
        .bind(Uuid::new_v4())
        .bind(job_type)
        .bind(payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
