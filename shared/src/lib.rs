//! Shared contract types between the Triage entity services and the
//! workflow automation engine.
//!
//! An entity-mutation handler commits its own write first, then builds an
//! [`EntityEvent`] carrying a read-only snapshot of the entity and hands it
//! to the automation engine. The engine never mutates a snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Entity kinds covered by workflow automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Issue,
    Problem,
    Change,
    Request,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Problem => "problem",
            Self::Change => "change",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle events that can trigger workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    OnCreate,
    OnUpdate,
    OnStatusChange,
    OnAssignment,
    /// Fired by an external scheduler; the engine itself never schedules.
    Scheduled,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnCreate => "on_create",
            Self::OnUpdate => "on_update",
            Self::OnStatusChange => "on_status_change",
            Self::OnAssignment => "on_assignment",
            Self::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value inside an entity snapshot.
///
/// Snapshots carry a closed set of value shapes; condition and action logic
/// pattern-matches on the variant instead of coercing implicitly. The one
/// documented coercion is [`FieldValue::as_number`], which accepts numeric
/// strings for ordering comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    StringList(Vec<String>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value. Numeric strings are accepted; anything
    /// else is not a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::StringList(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Empty means null or the empty string. Absent fields are handled by
    /// the snapshot lookup, not here.
    pub fn is_empty_value(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Null
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::StringList(value)
    }
}

/// Read-only field-name → value view of an entity at the moment a trigger
/// fired. Captured by the caller after committing its primary write; the
/// keys must match the `field` names referenced by configured conditions
/// for the entity type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitySnapshot {
    #[serde(flatten)]
    fields: HashMap<String, FieldValue>,
}

impl EntitySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used by callers assembling a snapshot.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A lifecycle event delivered to the workflow automation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEvent {
    pub tenant_id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub trigger_type: TriggerType,
    pub snapshot: EntitySnapshot,
    pub occurred_at: DateTime<Utc>,
}

impl EntityEvent {
    pub fn new(
        tenant_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        trigger_type: TriggerType,
        snapshot: EntitySnapshot,
    ) -> Self {
        Self {
            tenant_id,
            entity_type,
            entity_id,
            trigger_type,
            snapshot,
            occurred_at: Utc::now(),
        }
    }

    /// Event for a freshly created entity.
    pub fn created(
        tenant_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        snapshot: EntitySnapshot,
    ) -> Self {
        Self::new(tenant_id, entity_type, entity_id, TriggerType::OnCreate, snapshot)
    }

    /// Event for a general field update.
    pub fn updated(
        tenant_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        snapshot: EntitySnapshot,
    ) -> Self {
        Self::new(tenant_id, entity_type, entity_id, TriggerType::OnUpdate, snapshot)
    }

    /// Event for a status transition. The snapshot carries the new status.
    pub fn status_changed(
        tenant_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        snapshot: EntitySnapshot,
    ) -> Self {
        Self::new(tenant_id, entity_type, entity_id, TriggerType::OnStatusChange, snapshot)
    }

    /// Event for an assignment change.
    pub fn assigned(
        tenant_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        snapshot: EntitySnapshot,
    ) -> Self {
        Self::new(tenant_id, entity_type, entity_id, TriggerType::OnAssignment, snapshot)
    }
}
