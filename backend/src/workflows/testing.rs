// In-memory test doubles for the workflow collaborators. Recording fakes
// keep ordered call lists so tests can assert sequencing.

use std::sync::Mutex;

use async_trait::async_trait;
use triage_shared::{EntityType, FieldValue, TriggerType};
use uuid::Uuid;

use super::{RuleStore, StoreError, WorkflowRule};
use crate::services::{
    EntityStore, ExecutionLogEntry, ExecutionLogError, ExecutionLogger, FieldUpdate,
    NotificationSink, NotifyError, StorageError, StorageResult,
};

#[derive(Debug, Clone, PartialEq)]
pub enum StorageCall {
    Update {
        entity_id: Uuid,
        updates: Vec<(String, FieldValue)>,
    },
    Comment {
        entity_id: Uuid,
        content: String,
        is_internal: bool,
    },
}

/// Entity store that records calls in order. Optionally fails any update
/// touching a chosen field, to simulate a storage error mid-rule.
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<StorageCall>>,
    fail_field: Option<String>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_field(field: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_field: Some(field.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityStore for RecordingStore {
    async fn update_fields(
        &self,
        _tenant_id: Uuid,
        _entity_type: EntityType,
        entity_id: Uuid,
        updates: &[FieldUpdate],
    ) -> StorageResult<()> {
        if let Some(fail_field) = &self.fail_field {
            if updates.iter().any(|update| &update.field == fail_field) {
                return Err(StorageError::InvalidField(fail_field.clone()));
            }
        }

        self.calls.lock().unwrap().push(StorageCall::Update {
            entity_id,
            updates: updates
                .iter()
                .map(|update| (update.field.clone(), update.value.clone()))
                .collect(),
        });
        Ok(())
    }

    async fn insert_comment(
        &self,
        _tenant_id: Uuid,
        _entity_type: EntityType,
        entity_id: Uuid,
        content: &str,
        is_internal: bool,
    ) -> StorageResult<()> {
        self.calls.lock().unwrap().push(StorageCall::Comment {
            entity_id,
            content: content.to_string(),
            is_internal,
        });
        Ok(())
    }
}

/// Notification sink recording enqueued jobs; can reject every enqueue.
#[derive(Default)]
pub struct RecordingSink {
    jobs: Mutex<Vec<(String, serde_json::Value)>>,
    attempts: Mutex<usize>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn jobs(&self) -> Vec<(String, serde_json::Value)> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn enqueue(&self, job_type: &str, payload: serde_json::Value) -> Result<(), NotifyError> {
        *self.attempts.lock().unwrap() += 1;
        if self.fail {
            return Err(NotifyError::Serialization(
                serde_json::from_str::<i32>("queue down").unwrap_err(),
            ));
        }
        self.jobs
            .lock()
            .unwrap()
            .push((job_type.to_string(), payload));
        Ok(())
    }
}

/// Execution logger recording entries; can fail every write.
#[derive(Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<ExecutionLogEntry>>,
    attempts: Mutex<usize>,
    fail: bool,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<ExecutionLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl ExecutionLogger for RecordingLogger {
    async fn record_execution(&self, entry: &ExecutionLogEntry) -> Result<(), ExecutionLogError> {
        *self.attempts.lock().unwrap() += 1;
        if self.fail {
            return Err(ExecutionLogError::Serialization(
                serde_json::from_str::<i32>("log store down").unwrap_err(),
            ));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Rule store serving a fixed rule list, scoped and ordered like the real
/// store contract promises.
pub struct MemoryRuleStore {
    rules: Vec<WorkflowRule>,
}

impl MemoryRuleStore {
    pub fn new(rules: Vec<WorkflowRule>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn list_active_rules(
        &self,
        _tenant_id: Uuid,
        entity_type: EntityType,
        trigger_type: TriggerType,
    ) -> Result<Vec<WorkflowRule>, StoreError> {
        let mut rules: Vec<WorkflowRule> = self
            .rules
            .iter()
            .filter(|rule| {
                rule.is_active
                    && rule.entity_type == entity_type
                    && rule.trigger_type == trigger_type
            })
            .cloned()
            .collect();
        rules.sort_by_key(|rule| rule.execution_order);
        Ok(rules)
    }
}
