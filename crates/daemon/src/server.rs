use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use eeg_types::BandSnapshot;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any as CorsAny, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostics, SourceState};
use crate::error::DaemonError;
use crate::subscribers::SubscriberRegistry;

pub const STREAM_ROUTE: &str = "/ws/eeg";

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub subscribers: Arc<SubscriberRegistry>,
    pub diagnostics: Arc<Diagnostics>,
    /// Nominal rate and window length the engine was built with
    pub sample_rate: f64,
    pub window_samples: usize,
}

#[derive(Serialize)]
struct StatsResponse {
    messages_sent: u64,
    channels: Vec<String>,
    last_sample: Option<Vec<f64>>,
    subscribers: usize,
    source_state: SourceState,
    connect_attempts: u64,
}

#[derive(Serialize)]
struct BandsResponse {
    fs: f64,
    window: usize,
    bands: BandSnapshot,
}

async fn root_handler() -> Json<Value> {
    Json(json!({ "message": format!("EEG stream available at {STREAM_ROUTE}") }))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.diagnostics.snapshot();
    Json(StatsResponse {
        messages_sent: stats.messages_sent,
        channels: stats.channels,
        last_sample: stats.last_sample,
        subscribers: state.subscribers.len(),
        source_state: stats.source_state,
        connect_attempts: stats.connect_attempts,
    })
}

async fn bands_handler(State(state): State<AppState>) -> Json<BandsResponse> {
    Json(BandsResponse {
        fs: state.sample_rate,
        window: state.window_samples,
        bands: state.diagnostics.bands(),
    })
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_to_client(socket, state.subscribers))
}

/// Forward every payload to one client until either side goes away.
async fn stream_to_client(socket: WebSocket, subscribers: Arc<SubscriberRegistry>) {
    let (id, mut payloads) = subscribers.register();
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = payloads.recv().await {
            let text = match std::str::from_utf8(&payload) {
                Ok(text) => text.to_owned(),
                Err(e) => {
                    warn!("Dropping non-UTF-8 payload: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        // Queue closed: the registry dropped this subscriber.
        let _ = sender.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    debug!(subscriber_id = %id, "WebSocket connection finished");
    subscribers.unregister(id);
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/bands", get(bands_handler))
        .route(STREAM_ROUTE, get(websocket_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(CorsAny)
                .allow_methods(CorsAny)
                .allow_headers(CorsAny),
        )
}

/// Serve the HTTP and WebSocket routes until `shutdown` is cancelled.
pub async fn run(listener: TcpListener, state: AppState, shutdown: CancellationToken) -> Result<(), DaemonError> {
    let app = create_router(state);
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await?;

    Ok(())
}
