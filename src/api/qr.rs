//! Pairing code endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use super::ApiState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QrResponse {
    success: bool,
    qr_code: String,
}

#[derive(Serialize)]
struct QrUnavailable {
    success: bool,
    message: &'static str,
    ready: bool,
}

/// Return the pending pairing code, or 404 when none is pending
async fn qr(State(state): State<Arc<ApiState>>) -> Response {
    match state.session_state.pending_qr() {
        Some(qr_code) => Json(QrResponse {
            success: true,
            qr_code,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(QrUnavailable {
                success: false,
                message: "QR code not available. Either already authenticated or not yet generated.",
                ready: state.dispatcher.is_ready(),
            }),
        )
            .into_response(),
    }
}

/// Build pairing router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/qr", get(qr)).with_state(state)
}
