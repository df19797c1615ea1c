//! Health check endpoint.

use actix_web::{HttpResponse, web};
use blogicum_shared::dto::HealthResponse;

use crate::state::AppState;

/// GET /health - server status and storage backend.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.backend.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
