use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod database;
mod error;
mod handlers;
mod services;
mod workflows;

pub use error::{ApiError, ApiResult, AppError};

use services::{PgEntityStore, PgExecutionLogger, PgNotificationQueue};
use workflows::{
    CachedRuleStore, PgRuleStore, RuleCache, WorkflowEngine, WorkflowExecutor,
};

pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub engine: Arc<WorkflowEngine>,
    pub rule_cache: RuleCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    let db_pool = database::create_pool(&config.database_url).await?;

    database::migrate(&db_pool).await?;

    let rule_cache = RuleCache::new();
    let rule_store = Arc::new(CachedRuleStore::new(
        Arc::new(PgRuleStore::new(db_pool.clone())),
        rule_cache.clone(),
    ));
    let executor = WorkflowExecutor::new(
        Arc::new(PgEntityStore::new(db_pool.clone())),
        Arc::new(PgNotificationQueue::new(db_pool.clone())),
    );
    let engine = Arc::new(WorkflowEngine::new(
        rule_store,
        executor,
        Arc::new(PgExecutionLogger::new(db_pool.clone())),
    ));

    let app_state = Arc::new(AppState {
        db_pool,
        engine,
        rule_cache,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { "Triage Workflow Automation API v1.0.0" }))
        .route("/health", get(handlers::health_check))
        .route("/health/detailed", get(handlers::detailed_health_check))
        .route("/api/v1/automation/events", post(handlers::ingest_event))
        .route(
            "/api/v1/automation/cache/invalidate",
            post(handlers::invalidate_rule_cache),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    tracing::info!("Server running on {}", config.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
