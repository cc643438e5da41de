// Entity storage collaborator - generic field updates and comment inserts
// used by workflow actions. Entity business logic beyond these primitives
// lives with the owning entity services.

use async_trait::async_trait;
use sqlx::PgPool;
use triage_shared::{EntityType, FieldValue};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid field name: {0}")]
    InvalidField(String),
    #[error("{0} {1} not found")]
    EntityNotFound(EntityType, Uuid),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// One column write applied by [`EntityStore::update_fields`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: String,
    pub value: FieldValue,
}

impl FieldUpdate {
    pub fn new(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Per-entity-type storage primitives available to workflow actions.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Apply every update in a single statement, so multi-field writes such
    /// as assignment-with-status-promotion are one atomic update.
    async fn update_fields(
        &self,
        tenant_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        updates: &[FieldUpdate],
    ) -> StorageResult<()>;

    async fn insert_comment(
        &self,
        tenant_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        content: &str,
        is_internal: bool,
    ) -> StorageResult<()>;
}

/// Postgres-backed store keyed by entity type.
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn entity_table(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Issue => "issues",
        EntityType::Problem => "problems",
        EntityType::Change => "changes",
        EntityType::Request => "requests",
    }
}

fn comment_table(entity_type: EntityType) -> (&'static str, &'static str) {
    match entity_type {
        EntityType::Issue => ("issue_comments", "issue_id"),
        EntityType::Problem => ("problem_comments", "problem_id"),
        EntityType::Change => ("change_comments", "change_id"),
        EntityType::Request => ("request_comments", "request_id"),
    }
}

// Field names come from tenant-configured rules and are interpolated into
// the statement, so they must look like plain column identifiers.
fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// Writable columns are text; values are bound in their string form.
fn as_sql_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Null => None,
        FieldValue::Bool(b) => Some(b.to_string()),
        FieldValue::Number(n) => Some(n.to_string()),
        FieldValue::String(s) => Some(s.clone()),
        FieldValue::StringList(items) => Some(items.join(",")),
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn update_fields(
        &self,
        tenant_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        updates: &[FieldUpdate],
    ) -> StorageResult<()> {
        if updates.is_empty() {
            return Ok(());
        }

        for update in updates {
            if !is_safe_identifier(&update.field) {
                return Err(StorageError::InvalidField(update.field.clone()));
            }
        }

        let assignments: Vec<String> = updates
            .iter()
            .enumerate()
            .map(|(i, update)| format!("{} = ${}", update.field, i + 3))
            .collect();
        let query = format!(
            "UPDATE {} SET {}, updated_at = NOW() WHERE id = $1 AND tenant_id = $2",
            entity_table(entity_type),
            assignments.join(", ")
        );

        let mut db_query = sqlx::query(&query).bind(entity_id).bind(tenant_id);
        for update in updates {
            db_query = db_query.bind(as_sql_text(&update.value));
        }

        let result = db_query.execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::EntityNotFound(entity_type, entity_id));
        }

        Ok(())
    }

    async fn insert_comment(
        &self,
        tenant_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        content: &str,
        is_internal: bool,
    ) -> StorageResult<()> {
        let (table, entity_column) = comment_table(entity_type);
        let query = format!(
            "INSERT INTO {} (id, tenant_id, {}, content, is_internal, created_by_system, created_at)
             VALUES ($1, $2, $3, $4, $5, true, NOW())",
            table, entity_column
        );

        sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(entity_id)
            .bind(content)
            .bind(is_internal)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_validation() {
        assert!(is_safe_identifier("status"));
        assert!(is_safe_identifier("assigned_group_id"));
        assert!(is_safe_identifier("_private"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("1abc"));
        assert!(!is_safe_identifier("status; DROP TABLE issues"));
        assert!(!is_safe_identifier("Status"));
    }

    #[test]
    fn values_bind_as_text() {
        assert_eq!(as_sql_text(&FieldValue::from("assigned")), Some("assigned".to_string()));
        assert_eq!(as_sql_text(&FieldValue::from(true)), Some("true".to_string()));
        assert_eq!(as_sql_text(&FieldValue::from(2i64)), Some("2".to_string()));
        assert_eq!(as_sql_text(&FieldValue::Null), None);
        assert_eq!(
            as_sql_text(&FieldValue::from(vec!["a".to_string(), "b".to_string()])),
            Some("a,b".to_string())
        );
    }

    #[test]
    fn table_mapping_covers_all_entity_types() {
        assert_eq!(entity_table(EntityType::Issue), "issues");
        assert_eq!(comment_table(EntityType::Request), ("request_comments", "request_id"));
    }
}
