/*!
 * Logging Module
 * Subscriber setup (console + rolling files) and request logging middleware
 */
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::env_opt;

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(log_level: &str) -> String {
    format!(
        "contract_tracker={},tower_http=debug,axum=debug,sqlx=warn",
        log_level
    )
}

/// Initialize the logging system.
///
/// The returned guards flush the background writers when dropped; hold
/// them for the lifetime of the process.
pub fn init() -> Vec<WorkerGuard> {
    let environment = env_opt("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
    let is_production = environment == "production";
    let log_dir = env_opt("LOG_DIR").unwrap_or_else(|| "logs".to_string());

    std::fs::create_dir_all(&log_dir).ok();

    let (file_writer, file_guard) = non_blocking(rolling::daily(&log_dir, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(&log_dir, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let log_level = env_opt("LOG_LEVEL").unwrap_or_else(|| {
        if is_production {
            "info".to_string()
        } else {
            "debug".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&log_level)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if is_production {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_ansi(false)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    }

    tracing::info!(
        environment = %environment,
        log_dir = %log_dir,
        "Logging initialized"
    );

    vec![file_guard, error_guard, console_guard]
}
