//! Health check for load balancers (production mode only)

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("GET /health");

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
    })
}
