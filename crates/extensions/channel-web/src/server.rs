//! HTTP server and routing.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use dashmap::mapref::entry::Entry;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use wsdom_protocols::Transport;

use crate::connection::{run_connection, WebSocketConnection};
use crate::error::ServerError;
use crate::{DomServerState, DomSession};

/// Longest session id a client may ask for.
const MAX_SESSION_ID_LEN: usize = 64;

/// Query parameters of the WebSocket endpoint.
#[derive(Debug, Default, Deserialize)]
struct ConnectParams {
    /// Session to resume, or to create under this id.
    session: Option<String>,
}

/// Create the Axum router.
pub fn create_router(state: Arc<DomServerState>) -> Router {
    Router::new()
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        // API info
        .route("/api/info", get(api_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<DomServerState>>,
) -> Response {
    let session_id = match params.session {
        Some(id) if is_valid_session_id(&id) => id,
        Some(id) => {
            warn!("Rejecting connection with invalid session id {:?}", id);
            return (StatusCode::BAD_REQUEST, "invalid session id").into_response();
        }
        None => uuid::Uuid::new_v4().to_string(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Attach a client to its session, starting one if needed.
async fn handle_socket(socket: WebSocket, state: Arc<DomServerState>, session_id: String) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    debug!("New WebSocket connection {} for session {}", conn_id, session_id);

    let (conn, outbound_rx) = WebSocketConnection::new(conn_id.clone());
    let transport: Arc<dyn Transport> = Arc::new(conn.clone());

    let session = match open_session(&state, &session_id, transport) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to open session {}: {}", session_id, e);
            return;
        }
    };

    run_connection(socket, conn, outbound_rx, session, state).await;
}

/// Resume the live session `id` on `transport`, or start a new one.
///
/// The last client to connect wins: resuming a session that is still
/// attached elsewhere moves its output to `transport`.
pub(crate) fn open_session(
    state: &DomServerState,
    id: &str,
    transport: Arc<dyn Transport>,
) -> Result<Arc<DomSession>, ServerError> {
    match state.sessions.entry(id.to_string()) {
        Entry::Occupied(mut entry) if entry.get().is_closed() => {
            debug!("Replacing closed session {}", id);
            let session = DomSession::start(id, state, Some(transport))?;
            entry.insert(Arc::clone(&session));
            Ok(session)
        }
        Entry::Occupied(entry) => {
            let session = Arc::clone(entry.get());
            session.attach(transport)?;
            info!("Session {} resumed", id);
            Ok(session)
        }
        Entry::Vacant(entry) => {
            let session = DomSession::start(id, state, Some(transport))?;
            entry.insert(Arc::clone(&session));
            Ok(session)
        }
    }
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<DomServerState>>) -> impl IntoResponse {
    let status = if state.started.load(std::sync::atomic::Ordering::SeqCst) {
        "ok"
    } else {
        "starting"
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::json!({
            "status": status,
            "sessions": state.sessions.len(),
            "uptime_secs": (chrono::Utc::now() - state.started_at).num_seconds(),
        })
        .to_string(),
    )
}

/// API info endpoint.
async fn api_info(State(state): State<Arc<DomServerState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::json!({
            "name": "wsdom",
            "version": env!("CARGO_PKG_VERSION"),
            "document_url": state.config.document_url,
            "modules": state.modules.urls(),
            "preload": state.config.preload,
            "endpoints": {
                "websocket": "/ws",
                "health": "/health",
                "info": "/api/info"
            }
        })
        .to_string(),
    )
}
