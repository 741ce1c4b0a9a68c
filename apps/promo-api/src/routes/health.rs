//! Liveness endpoint, reachable without a token.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
    /// Embedded migrations not yet applied. `None` when the database is down.
    pub pending_migrations: Option<usize>,
}

/// 200 when the database answers and the schema is current, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let pending_migrations = if database {
        match state.db.migration_status().await {
            Ok((embedded, applied)) => Some(embedded.saturating_sub(applied)),
            Err(e) => {
                warn!(error = %e, "Could not read migration status");
                None
            }
        }
    } else {
        None
    };

    let healthy = database && pending_migrations == Some(0);
    let (status, label) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            database,
            pending_migrations,
        }),
    )
}
