//! Contract Tracker - contract records, expiry reminders and document date extraction

pub mod analyzer;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod reminders;
pub mod routes;
pub mod store;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::analyzer::{AnalyzerConfig, DocumentAnalyzer, RuleAnalyzer};
use crate::config::ServerConfig;
use crate::db::DbConfig;
use crate::domain::{Clock, EXPIRING_SOON_DAYS};
use crate::reminders::{LogNotifier, MailerConfig, Notifier};
use crate::store::{ContractStore, MemoryContractStore, PgContractStore};

/// Shared handles cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContractStore>,
    pub analyzer: Arc<dyn DocumentAnalyzer>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Clock,
    pub reminder_window_days: i64,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContractStore>,
        analyzer: Arc<dyn DocumentAnalyzer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            analyzer,
            notifier,
            clock: Clock::System,
            reminder_window_days: EXPIRING_SOON_DAYS,
        }
    }

    /// Memory store, rule-based analyzer, log-only reminders
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryContractStore::new()),
            Arc::new(RuleAnalyzer),
            Arc::new(LogNotifier),
        )
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reminder_window(mut self, days: i64) -> Self {
        self.reminder_window_days = days.max(0);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN,
/// falling back to the local development front end.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();

    Router::new()
        .route("/api/", get(routes::health::api_root))
        .route(
            "/api/contracts",
            get(routes::contracts::list_contracts).post(routes::contracts::create_contract),
        )
        .route("/api/contracts/stats", get(routes::contracts::contract_stats))
        .route(
            "/api/contracts/{id}",
            get(routes::contracts::get_contract)
                .put(routes::contracts::update_contract)
                .delete(routes::contracts::delete_contract),
        )
        .route(
            "/api/contracts/{id}/renew",
            post(routes::contracts::renew_contract),
        )
        .route("/api/reminders/send", post(routes::reminders::send_reminders))
        .route("/api/analyze-document", post(routes::analyze::analyze_document))
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

/// PostgreSQL when DATABASE_URL is set and reachable, memory otherwise.
async fn build_store(server: &ServerConfig) -> Arc<dyn ContractStore> {
    if std::env::var("DATABASE_URL").is_ok() {
        match db::init_pool(&DbConfig::default()).await {
            Ok(pool) => {
                if let Err(e) = db::run_migrations(&pool).await {
                    tracing::error!("Failed to run database migrations: {}", e);
                }
                return Arc::new(PgContractStore::new(pool));
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize database pool: {}. Continuing with in-memory store.",
                    e
                );
            }
        }
    } else {
        tracing::info!("DATABASE_URL not set. Contracts are kept in memory.");
    }

    if server.is_production() {
        tracing::warn!("Running in production without a database: contracts will not survive a restart.");
    }
    Arc::new(MemoryContractStore::new())
}

/// Run the server (used by main).
pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let _log_guards = logging::init();

    routes::health::init_start_time();

    let server = ServerConfig::default();
    let store = build_store(&server).await;
    let analyzer = analyzer::build_analyzer(&AnalyzerConfig::default());
    let notifier = reminders::build_notifier(&MailerConfig::default());

    let state = AppState::new(store, analyzer, notifier)
        .with_reminder_window(server.reminder_window_days);
    let app = create_app(state);
    tracing::info!("CORS configured");

    let addr: SocketAddr = server.bind_addr().parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid HOST/PORT configuration: {}", e),
        )
    })?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_app_returns_router() {
        let _app = create_app(AppState::in_memory());
    }

    #[test]
    fn test_state_builders() {
        let day = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        let state = AppState::in_memory()
            .with_clock(Clock::Fixed(day))
            .with_reminder_window(-3);
        assert_eq!(state.today(), day);
        assert_eq!(state.reminder_window_days, 0);
    }
}
