use axum::Json;

use super::types::{HealthStatus, ServiceInfo};

/// GET /
pub async fn home() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Gatehouse API".to_string(),
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/health
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
    })
}
