//! HTTP route handlers.
//!
//! Each request moves through `Received → Authenticated → Validated →
//! Dispatched → Responded`. A failure at any stage answers immediately with
//! the translated [`ApiError`]; later stages never run. The auth gate wraps
//! the whole router, fallback included, so an unauthenticated caller learns
//! nothing about which routes or tasks exist.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::ApiError;
use crate::query::{LifecycleQuery, TaskFilter};
use crate::registry::TaskRegistry;
use crate::store::{self, SharedStore};

use super::auth::{self, AuthGate};
use super::types::*;

/// Shared application state.
pub struct AppState {
    pub auth: AuthGate,
    pub registry: TaskRegistry,
    pub query: LifecycleQuery,
}

impl AppState {
    pub fn new(config: &Config, store: SharedStore) -> Arc<Self> {
        let timeout = config.store.timeout;
        Arc::new(Self {
            auth: AuthGate::new(&config.auth),
            registry: TaskRegistry::new(Arc::clone(&store), timeout),
            query: LifecycleQuery::new(store, timeout),
        })
    }
}

/// Build the full router for the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:task_guid", get(get_task))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_auth,
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = store::create_store(config.store.backend, config.store.path.clone()).await?;
    tracing::info!(
        "Store backend: {} ({}ms timeout)",
        config.store.backend,
        config.store.timeout.as_millis()
    );

    if config.auth.is_enabled() {
        tracing::info!("Basic auth enabled for user '{}'", config.auth.username);
    } else {
        tracing::warn!("Basic auth disabled: RECEPTOR_USERNAME and RECEPTOR_PASSWORD are both empty");
    }

    let addr = config.listen_addr();
    let state = AppState::new(&config, store);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests...");
}

/// A panicking handler fails only its own request.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!("Request handler panicked: {}", detail);
    ApiError::unknown("internal error").into_response()
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Register a new task. 202 with an empty body on success.
async fn create_task(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    state.registry.create_task(req.into_task()).await?;
    Ok(StatusCode::ACCEPTED)
}

/// List tasks, optionally filtered by `domain` and/or `state`.
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let Query(params) = query.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let filter = TaskFilter {
        domain: params.domain,
        state: params.state,
    };
    let tasks = state.query.list_tasks(&filter).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// Get a single task by guid.
async fn get_task(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let Path(task_guid) = path.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let task = state.registry.get_task(&task_guid).await?;
    Ok(Json(task.into()))
}
