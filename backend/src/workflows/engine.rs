// Workflow Engine - orchestrates rule evaluation and action execution for
// one entity lifecycle event.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};
use triage_shared::{EntityEvent, EntitySnapshot, EntityType, TriggerType};
use uuid::Uuid;

use super::{evaluate_conditions, RuleStore, StoreError, WorkflowExecutor};
use crate::services::{ActionAttempt, ExecutionLogEntry, ExecutionLogger};

/// Aggregate outcome of one engine invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionResult {
    /// Rules whose conditions matched.
    pub rules_executed: i32,
    /// Actions that succeeded, across all matched rules.
    pub actions_executed: i32,
    /// One human-readable entry per failed action, in execution order.
    pub errors: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    RuleStore(#[from] StoreError),
}

/// Evaluates tenant-configured rules against an entity snapshot and runs
/// the actions of every matching rule.
///
/// The engine holds no state across invocations; concurrent invocations for
/// different entities share nothing mutable. Invocations for the same
/// entity are not deduplicated here - the calling mutation pipeline issues
/// one invocation per logical event.
pub struct WorkflowEngine {
    rules: Arc<dyn RuleStore>,
    executor: WorkflowExecutor,
    execution_log: Arc<dyn ExecutionLogger>,
}

impl WorkflowEngine {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        executor: WorkflowExecutor,
        execution_log: Arc<dyn ExecutionLogger>,
    ) -> Self {
        Self {
            rules,
            executor,
            execution_log,
        }
    }

    /// Convenience wrapper for callers holding an [`EntityEvent`].
    pub async fn execute_for_event(
        &self,
        event: &EntityEvent,
    ) -> Result<ExecutionResult, WorkflowError> {
        self.execute_workflows_for_entity(
            event.tenant_id,
            event.entity_type,
            event.entity_id,
            event.trigger_type,
            &event.snapshot,
        )
        .await
    }

    /// Run workflow automation for one committed entity mutation.
    ///
    /// Rules are processed strictly in execution order, one at a time.
    /// Within a matched rule every action is attempted exactly once in
    /// ascending action order; a failed action is recorded and never blocks
    /// its siblings. A matched rule with `stop_on_match` ends the run after
    /// its own actions complete.
    ///
    /// The only fallible step is fetching the rule list. By the time this
    /// runs the triggering mutation has already committed, so callers must
    /// log such a failure and continue - never roll back the mutation.
    pub async fn execute_workflows_for_entity(
        &self,
        tenant_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        trigger_type: TriggerType,
        snapshot: &EntitySnapshot,
    ) -> Result<ExecutionResult, WorkflowError> {
        let rules = self
            .rules
            .list_active_rules(tenant_id, entity_type, trigger_type)
            .await?;

        let mut result = ExecutionResult::default();

        for rule in &rules {
            if !evaluate_conditions(&rule.conditions, snapshot) {
                continue;
            }

            result.rules_executed += 1;
            let started = Instant::now();
            let mut attempts = Vec::with_capacity(rule.actions.len());
            let mut first_error = None;

            for action in rule.ordered_actions() {
                let outcome = self
                    .executor
                    .execute_action(tenant_id, action, entity_type, entity_id, snapshot)
                    .await;

                if outcome.success {
                    result.actions_executed += 1;
                } else {
                    let error = outcome
                        .error
                        .unwrap_or_else(|| "unknown error".to_string());
                    result.errors.push(format!(
                        "{}: {} failed: {}",
                        rule.name,
                        action.action_type.as_str(),
                        error
                    ));
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }

                attempts.push(ActionAttempt {
                    action_type: action.action_type.as_str().to_string(),
                    success: outcome.success,
                });
            }

            let entry = ExecutionLogEntry {
                tenant_id,
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                entity_type,
                entity_id,
                trigger_type,
                conditions_matched: true,
                actions: attempts,
                duration_ms: started.elapsed().as_millis() as i64,
                error: first_error,
            };
            // History is best-effort; a failed write must not disturb the run.
            if let Err(e) = self.execution_log.record_execution(&entry).await {
                warn!(
                    "Failed to record workflow execution for rule '{}': {}",
                    rule.name, e
                );
            }

            if rule.stop_on_match {
                debug!(
                    "Rule '{}' matched with stop_on_match; skipping remaining rules",
                    rule.name
                );
                break;
            }
        }

        Ok(result)
    }
}
