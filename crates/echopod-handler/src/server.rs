//! Job HTTP surface for the worker
//!
//! The queue delivers one job per request as `{"id": ..., "input": ...}` and
//! expects a completed result object back. Generation is CPU/GPU bound and
//! synchronous, so each job runs on the blocking pool while the async side
//! only shuffles bytes.

use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::handler::{HandlerConfig, handle};
use crate::model::ModelHandle;
use crate::request::{WorkerRequest, WorkerResponse};

/// Default port when `PORT` is unset
const DEFAULT_PORT: u16 = 8000;

/// Shared worker state
///
/// The model handle sits behind a `std::sync::Mutex`: jobs are serialized
/// anyway, and the lock is only ever taken from the blocking pool.
#[derive(Clone)]
pub struct WorkerState {
    model: Arc<Mutex<ModelHandle>>,
    config: HandlerConfig,
}

impl WorkerState {
    /// Build worker state around a model handle
    pub fn new(model: ModelHandle, config: HandlerConfig) -> Self {
        Self {
            model: Arc::new(Mutex::new(model)),
            config,
        }
    }
}

/// One job as delivered by the queue
#[derive(Debug, Deserialize)]
pub struct JobEnvelope {
    /// Queue-assigned job id
    #[serde(default)]
    pub id: Option<String>,
    /// Raw job input
    #[serde(default)]
    pub input: serde_json::Value,
}

/// Assemble the worker router
pub fn router(state: WorkerState) -> Router {
    Router::new()
        .route("/", post(job_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Run one job to completion
///
/// Always answers 200 with a result object; failures are carried inside
/// `output.error` so the queue records a normal completion.
pub async fn job_handler(State(state): State<WorkerState>, Json(job): Json<JobEnvelope>) -> Json<serde_json::Value> {
    let job_id = job.id.unwrap_or_else(|| "local".to_owned());
    tracing::info!(job_id = %job_id, "job received");

    let output = run_job(&state, job.input).await;

    if let WorkerResponse::Error { error } = &output {
        tracing::warn!(job_id = %job_id, error = %error, "job failed");
    } else {
        tracing::info!(job_id = %job_id, "job completed");
    }

    Json(json!({
        "id": job_id,
        "status": "COMPLETED",
        "output": output,
    }))
}

async fn run_job(state: &WorkerState, input: serde_json::Value) -> WorkerResponse {
    let request: WorkerRequest = match serde_json::from_value(input) {
        Ok(request) => request,
        Err(e) => return WorkerResponse::error(format!("Invalid job input: {e}")),
    };

    let model = Arc::clone(&state.model);
    let config = state.config;

    let joined = tokio::task::spawn_blocking(move || {
        let mut model = model.lock().unwrap_or_else(PoisonError::into_inner);
        handle(request, &mut model, &config)
    })
    .await;

    match joined {
        Ok(response) => response,
        Err(e) => WorkerResponse::error(format!("Error generating speech: {e}")),
    }
}

/// Bind the worker and serve until the cancellation token fires
///
/// Listens on `PORT` (default 8000) on all interfaces.
///
/// # Errors
///
/// Returns an error if binding the TCP listener or serving fails
pub async fn serve(state: WorkerState, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, "worker listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("graceful shutdown initiated");
        })
        .await?;

    Ok(())
}
