// Workflow Executor - dispatches and executes workflow actions

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::warn;
use triage_shared::{EntitySnapshot, EntityType, FieldValue};
use uuid::Uuid;

use super::{ActionResult, ActionType, WorkflowAction};
use crate::services::{
    EntityStore, FieldUpdate, NotificationJob, NotificationSink, SEND_NOTIFICATION_JOB,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Executes single actions against the storage and notification
/// collaborators. Every failure is caught here and reported as an
/// [`ActionResult`]; nothing propagates to the rule loop.
pub struct WorkflowExecutor {
    storage: Arc<dyn EntityStore>,
    notifier: Arc<dyn NotificationSink>,
}

impl WorkflowExecutor {
    pub fn new(storage: Arc<dyn EntityStore>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self { storage, notifier }
    }

    pub async fn execute_action(
        &self,
        tenant_id: Uuid,
        action: &WorkflowAction,
        entity_type: EntityType,
        entity_id: Uuid,
        snapshot: &EntitySnapshot,
    ) -> ActionResult {
        let params = &action.parameters;

        let outcome = match &action.action_type {
            ActionType::SetField => {
                self.execute_set_field(tenant_id, params, entity_type, entity_id)
                    .await
            }
            ActionType::AssignToUser => {
                self.execute_assign_to_user(tenant_id, params, entity_type, entity_id, snapshot)
                    .await
            }
            ActionType::AssignToGroup => {
                self.execute_assign_to_group(tenant_id, params, entity_type, entity_id)
                    .await
            }
            ActionType::ChangeStatus => {
                self.execute_change_status(tenant_id, params, entity_type, entity_id)
                    .await
            }
            ActionType::ChangePriority => {
                self.execute_change_priority(tenant_id, params, entity_type, entity_id)
                    .await
            }
            ActionType::AddComment => {
                self.execute_add_comment(tenant_id, params, entity_type, entity_id)
                    .await
            }
            ActionType::SendNotification => {
                self.execute_send_notification(tenant_id, params, entity_type, entity_id)
                    .await
            }
            ActionType::Escalate => self.execute_escalate(params, entity_type, entity_id),
            ActionType::Other(kind) => {
                warn!("Unknown action type: {}", kind);
                return ActionResult::failure(format!("Unknown action type: {}", kind));
            }
        };

        match outcome {
            Ok(()) => ActionResult::success(),
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }

    async fn execute_set_field(
        &self,
        tenant_id: Uuid,
        params: &JsonValue,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<(), BoxError> {
        let field = params["field"].as_str().ok_or("Missing field")?;
        let value: FieldValue = serde_json::from_value(params["value"].clone())?;

        self.storage
            .update_fields(
                tenant_id,
                entity_type,
                entity_id,
                &[FieldUpdate::new(field, value)],
            )
            .await?;

        Ok(())
    }

    async fn execute_assign_to_user(
        &self,
        tenant_id: Uuid,
        params: &JsonValue,
        entity_type: EntityType,
        entity_id: Uuid,
        snapshot: &EntitySnapshot,
    ) -> Result<(), BoxError> {
        let user_id = params["userId"].as_str().ok_or("Missing userId")?;

        let mut updates = vec![FieldUpdate::new("assigned_to", user_id)];
        // First assignment also moves a fresh entity out of "new", in the
        // same statement.
        if snapshot.get("status").and_then(FieldValue::as_str) == Some("new") {
            updates.push(FieldUpdate::new("status", "assigned"));
        }

        self.storage
            .update_fields(tenant_id, entity_type, entity_id, &updates)
            .await?;

        Ok(())
    }

    async fn execute_assign_to_group(
        &self,
        tenant_id: Uuid,
        params: &JsonValue,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<(), BoxError> {
        let group_id = params["groupId"].as_str().ok_or("Missing groupId")?;

        self.storage
            .update_fields(
                tenant_id,
                entity_type,
                entity_id,
                &[FieldUpdate::new("assigned_group_id", group_id)],
            )
            .await?;

        Ok(())
    }

    async fn execute_change_status(
        &self,
        tenant_id: Uuid,
        params: &JsonValue,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<(), BoxError> {
        let status = params["status"].as_str().ok_or("Missing status")?;

        self.storage
            .update_fields(
                tenant_id,
                entity_type,
                entity_id,
                &[FieldUpdate::new("status", status)],
            )
            .await?;

        Ok(())
    }

    async fn execute_change_priority(
        &self,
        tenant_id: Uuid,
        params: &JsonValue,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<(), BoxError> {
        let priority = params["priority"].as_str().ok_or("Missing priority")?;

        self.storage
            .update_fields(
                tenant_id,
                entity_type,
                entity_id,
                &[FieldUpdate::new("priority", priority)],
            )
            .await?;

        Ok(())
    }

    async fn execute_add_comment(
        &self,
        tenant_id: Uuid,
        params: &JsonValue,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<(), BoxError> {
        let comment = params["comment"].as_str().ok_or("Missing comment")?;
        let is_internal = params["isInternal"].as_bool().unwrap_or(true);

        self.storage
            .insert_comment(tenant_id, entity_type, entity_id, comment, is_internal)
            .await?;

        Ok(())
    }

    async fn execute_send_notification(
        &self,
        tenant_id: Uuid,
        params: &JsonValue,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<(), BoxError> {
        let message = params["message"].as_str().ok_or("Missing message")?;
        let recipients = params["recipientIds"]
            .as_array()
            .ok_or("Missing recipientIds")?;

        // One independent job per recipient; a failed enqueue is logged and
        // must not affect the remaining recipients.
        for recipient in recipients {
            let Some(recipient_id) = recipient.as_str() else {
                warn!("Skipping non-string recipient id in send_notification");
                continue;
            };

            let job = NotificationJob {
                tenant_id,
                recipient_id: recipient_id.to_string(),
                message: message.to_string(),
                entity_type,
                entity_id,
            };

            if let Err(e) = self
                .notifier
                .enqueue(SEND_NOTIFICATION_JOB, serde_json::to_value(&job)?)
                .await
            {
                warn!(
                    "Failed to enqueue notification for recipient {}: {}",
                    recipient_id, e
                );
            }
        }

        Ok(())
    }

    fn execute_escalate(
        &self,
        params: &JsonValue,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<(), BoxError> {
        let escalation_level = params["escalationLevel"].as_i64().unwrap_or(1);

        warn!(
            entity_type = %entity_type,
            entity_id = %entity_id,
            escalation_level,
            "Entity escalated by workflow"
        );

        Ok(())
    }
}
