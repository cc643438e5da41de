// HTTP intake for entity lifecycle events plus the rule-cache invalidation
// hook. The product's CRUD API lives in the entity services; this surface
// only receives already-committed events.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};
use triage_shared::EntityEvent;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

pub async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({"status": "healthy", "service": "triage-automation"})),
    )
}

pub async fn detailed_health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = crate::database::health_check(&state.db_pool).await;
    let status = if database { "healthy" } else { "degraded" };
    let code = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(json!({
            "status": status,
            "database": database,
            "pool": crate::database::get_pool_stats(&state.db_pool),
        })),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct IngestQuery {
    /// Run the engine inline and return its result instead of detaching.
    #[serde(default)]
    pub wait: bool,
}

/// Receives one committed entity lifecycle event and runs workflow
/// automation for it.
///
/// By default the engine runs detached and the response carries no
/// execution result: the caller's mutation is already committed, so
/// automation failures must never surface as request failures. Callers
/// that need the aggregate result (internal tooling, tests) pass `?wait=true`.
pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IngestQuery>,
    Json(event): Json<EntityEvent>,
) -> ApiResult<Response> {
    if query.wait {
        let result = state.engine.execute_for_event(&event).await?;
        return Ok((StatusCode::OK, Json(result)).into_response());
    }

    let engine = state.engine.clone();
    tokio::spawn(async move {
        match engine.execute_for_event(&event).await {
            Ok(result) if result.errors.is_empty() => {}
            Ok(result) => {
                warn!(
                    "Workflow run for {} {} finished with {} action error(s)",
                    event.entity_type,
                    event.entity_id,
                    result.errors.len()
                );
            }
            Err(e) => {
                // The triggering mutation is already committed; log and move on.
                error!(
                    "Failed to fetch workflow rules for {} {}: {}",
                    event.entity_type, event.entity_id, e
                );
            }
        }
    });

    Ok((StatusCode::ACCEPTED, Json(json!({"message": "Event accepted"}))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct InvalidateCacheRequest {
    pub tenant_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct InvalidateCacheResponse {
    pub invalidated_entries: usize,
}

/// Invalidation hook called by the rule management service after any rule
/// create, update, or delete.
pub async fn invalidate_rule_cache(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InvalidateCacheRequest>,
) -> Json<InvalidateCacheResponse> {
    let invalidated_entries = state.rule_cache.invalidate_tenant(request.tenant_id).await;
    Json(InvalidateCacheResponse {
        invalidated_entries,
    })
}
