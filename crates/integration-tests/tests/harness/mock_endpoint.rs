//! Mock serverless endpoint for integration tests
//!
//! Implements the `/run` + `/status/{id}` job protocol with scripted
//! responses: one canned submit response and a sequence of status bodies
//! served in order, the last one repeating.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Mock endpoint that returns predictable job responses
pub struct MockEndpoint {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    submit_response: Value,
    statuses: Vec<Value>,
    run_count: AtomicU32,
    poll_count: AtomicU32,
}

impl MockEndpoint {
    /// Start the mock server with a scripted submit response and status
    /// sequence, returning immediately
    pub async fn start(submit_response: Value, statuses: Vec<Value>) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            submit_response,
            statuses,
            run_count: AtomicU32::new(0),
            poll_count: AtomicU32::new(0),
        });

        let app = Router::new()
            .route("/run", post(handle_run))
            .route("/status/{id}", get(handle_status))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL to pass to `TtsClient::with_base_url`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of submit requests received
    pub fn run_count(&self) -> u32 {
        self.state.run_count.load(Ordering::SeqCst)
    }

    /// Number of status polls received
    pub fn poll_count(&self) -> u32 {
        self.state.poll_count.load(Ordering::SeqCst)
    }
}

impl Drop for MockEndpoint {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_run(State(state): State<Arc<MockState>>, Json(_body): Json<Value>) -> Json<Value> {
    state.run_count.fetch_add(1, Ordering::SeqCst);
    Json(state.submit_response.clone())
}

async fn handle_status(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Json<Value> {
    let index = state.poll_count.fetch_add(1, Ordering::SeqCst) as usize;

    let Some(last) = state.statuses.last() else {
        return Json(json!({"id": id, "status": "FAILED", "error": "no scripted statuses"}));
    };

    Json(state.statuses.get(index).unwrap_or(last).clone())
}
