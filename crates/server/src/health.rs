use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::server::ServerState;

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
    database: &'static str,
}

/// Liveness plus a database ping. Unauthenticated.
pub async fn check(State(state): State<ServerState>) -> (StatusCode, Json<Health>) {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(Health {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(err) => {
            tracing::error!("health check: database unreachable: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Health {
                    status: "degraded",
                    database: "unreachable",
                }),
            )
        }
    }
}
