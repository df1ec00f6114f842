/**
 * Health Routes
 * Liveness and readiness of the API and its contract store
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::AppState;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Detailed health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    pub checks: HealthChecks,
}

/// Health checks for all collaborators
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database: ServiceCheck,
    pub analyzer: ServiceCheck,
    pub mailer: ServiceCheck,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

async fn check_store(state: &AppState) -> ServiceCheck {
    match state.store.ping().await {
        Ok(duration) => ServiceCheck {
            status: "healthy".to_string(),
            backend: Some(state.store.backend().to_string()),
            response_time: Some(duration.as_millis() as u64),
            error: None,
        },
        Err(e) => ServiceCheck {
            status: "unhealthy".to_string(),
            backend: Some(state.store.backend().to_string()),
            response_time: None,
            error: Some(e.to_string()),
        },
    }
}

fn configured(backend: &str) -> ServiceCheck {
    ServiceCheck {
        status: "configured".to_string(),
        backend: Some(backend.to_string()),
        response_time: None,
        error: None,
    }
}

/// GET /api/ - API banner
pub async fn api_root() -> impl IntoResponse {
    Json(RootResponse {
        message: "Contract Management API is running".to_string(),
    })
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/detailed - Detailed health with all checks
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = SERVER_START.elapsed().as_secs();
    let database = check_store(&state).await;

    // The API stays "ok" while the store is degraded so clients can tell it is up
    let response = DetailedHealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        uptime: Some(uptime),
        checks: HealthChecks {
            database,
            analyzer: configured(state.analyzer.name()),
            mailer: configured(state.notifier.name()),
        },
    };

    (StatusCode::OK, Json(response))
}

/// GET /health/database - Contract store health check
pub async fn health_database(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(check_store(&state).await))
}

/// GET /health/ready - Readiness check; not ready while the store is unreachable
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = SERVER_START.elapsed().as_secs();

    let (status, response) = match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            ReadyResponse {
                status: "ready".to_string(),
                timestamp: Utc::now(),
                uptime: Some(uptime),
                reason: None,
            },
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ReadyResponse {
                status: "not ready".to_string(),
                timestamp: Utc::now(),
                uptime: Some(uptime),
                reason: Some(format!("Contract store unavailable: {}", e)),
            },
        ),
    };

    (status, Json(response))
}
