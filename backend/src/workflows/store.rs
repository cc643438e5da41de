// Rule store - tenant-scoped rule fetching with an explicit cache layer.
// Rule CRUD lives in the external rule management service; it calls the
// cache invalidation hook after every change.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::warn;
use triage_shared::{EntityType, TriggerType};
use uuid::Uuid;

use super::WorkflowRule;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Read side of the rule configuration. The store owns persistence,
/// filtering, and ordering; the engine treats the returned list as already
/// scoped to the tenant/entity/trigger and sorted by execution order.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn list_active_rules(
        &self,
        tenant_id: Uuid,
        entity_type: EntityType,
        trigger_type: TriggerType,
    ) -> Result<Vec<WorkflowRule>, StoreError>;
}

pub struct PgRuleStore {
    pool: PgPool,
}

impl PgRuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleStore for PgRuleStore {
    async fn list_active_rules(
        &self,
        tenant_id: Uuid,
        entity_type: EntityType,
        trigger_type: TriggerType,
    ) -> Result<Vec<WorkflowRule>, StoreError> {
        let rows: Vec<(Uuid, String, serde_json::Value, serde_json::Value, i32, bool)> =
            sqlx::query_as(
                r#"
                SELECT id, name, conditions, actions, execution_order, stop_on_match
                FROM workflow_rules
                WHERE tenant_id = $1 AND entity_type = $2 AND trigger_type = $3 AND is_active = true
                ORDER BY execution_order ASC
                "#,
            )
            .bind(tenant_id)
            .bind(entity_type.as_str())
            .bind(trigger_type.as_str())
            .fetch_all(&self.pool)
            .await?;

        let rules = rows
            .into_iter()
            .filter_map(|(id, name, conditions, actions, execution_order, stop_on_match)| {
                // A rule with undecodable JSON is skipped rather than
                // failing the whole fetch.
                let conditions = match serde_json::from_value(conditions) {
                    Ok(conditions) => conditions,
                    Err(e) => {
                        warn!("Skipping rule '{}': invalid conditions: {}", name, e);
                        return None;
                    }
                };
                let actions = match serde_json::from_value(actions) {
                    Ok(actions) => actions,
                    Err(e) => {
                        warn!("Skipping rule '{}': invalid actions: {}", name, e);
                        return None;
                    }
                };

                Some(WorkflowRule {
                    id,
                    name,
                    entity_type,
                    trigger_type,
                    is_active: true,
                    conditions,
                    actions,
                    execution_order,
                    stop_on_match,
                })
            })
            .collect();

        Ok(rules)
    }
}

type CacheKey = (Uuid, EntityType, TriggerType);

/// In-memory rule-list cache keyed per tenant, entity type, and trigger.
///
/// Entries never expire on their own; they are dropped only through
/// [`RuleCache::invalidate_tenant`], which the rule management service
/// calls after every rule create, update, or delete.
#[derive(Clone, Default)]
pub struct RuleCache {
    entries: Arc<RwLock<HashMap<CacheKey, Arc<Vec<WorkflowRule>>>>>,
}

impl RuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Arc<Vec<WorkflowRule>>> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: CacheKey, rules: Arc<Vec<WorkflowRule>>) {
        self.entries.write().await.insert(key, rules);
    }

    /// Drop every cached list for a tenant. Returns how many entries were
    /// removed.
    pub async fn invalidate_tenant(&self, tenant_id: Uuid) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|(cached_tenant, _, _), _| *cached_tenant != tenant_id);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Caches rule lists from an inner store.
pub struct CachedRuleStore {
    inner: Arc<dyn RuleStore>,
    cache: RuleCache,
}

impl CachedRuleStore {
    pub fn new(inner: Arc<dyn RuleStore>, cache: RuleCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl RuleStore for CachedRuleStore {
    async fn list_active_rules(
        &self,
        tenant_id: Uuid,
        entity_type: EntityType,
        trigger_type: TriggerType,
    ) -> Result<Vec<WorkflowRule>, StoreError> {
        let key = (tenant_id, entity_type, trigger_type);

        if let Some(rules) = self.cache.get(&key).await {
            return Ok(rules.as_ref().clone());
        }

        let rules = self.inner.list_active_rules(tenant_id, entity_type, trigger_type).await?;
        self.cache.insert(key, Arc::new(rules.clone())).await;
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        fetches: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RuleStore for CountingStore {
        async fn list_active_rules(
            &self,
            _tenant_id: Uuid,
            entity_type: EntityType,
            trigger_type: TriggerType,
        ) -> Result<Vec<WorkflowRule>, StoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![WorkflowRule::new("cached rule", entity_type, trigger_type)])
        }
    }

    #[tokio::test]
    async fn cached_store_fetches_once_per_key() {
        let inner = Arc::new(CountingStore::new());
        let store = CachedRuleStore::new(inner.clone(), RuleCache::new());
        let tenant = Uuid::new_v4();

        for _ in 0..3 {
            let rules = store
                .list_active_rules(tenant, EntityType::Issue, TriggerType::OnCreate)
                .await
                .unwrap();
            assert_eq!(rules.len(), 1);
        }
        assert_eq!(inner.fetches.load(Ordering::SeqCst), 1);

        // A different trigger is a different key.
        store
            .list_active_rules(tenant, EntityType::Issue, TriggerType::OnUpdate)
            .await
            .unwrap();
        assert_eq!(inner.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_is_per_tenant() {
        let inner = Arc::new(CountingStore::new());
        let cache = RuleCache::new();
        let store = CachedRuleStore::new(inner.clone(), cache.clone());

        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        store
            .list_active_rules(tenant_a, EntityType::Issue, TriggerType::OnCreate)
            .await
            .unwrap();
        store
            .list_active_rules(tenant_b, EntityType::Issue, TriggerType::OnCreate)
            .await
            .unwrap();
        assert_eq!(cache.len().await, 2);

        let removed = cache.invalidate_tenant(tenant_a).await;
        assert_eq!(removed, 1);
        assert_eq!(cache.len().await, 1);

        // Tenant A refetches; tenant B is still served from cache.
        store
            .list_active_rules(tenant_a, EntityType::Issue, TriggerType::OnCreate)
            .await
            .unwrap();
        store
            .list_active_rules(tenant_b, EntityType::Issue, TriggerType::OnCreate)
            .await
            .unwrap();
        assert_eq!(inner.fetches.load(Ordering::SeqCst), 3);
    }
}
