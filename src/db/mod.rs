pub mod models;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::env_or;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/contracts".to_string()),
            max_connections: env_or("DB_POOL_MAX", 10),
            min_connections: env_or("DB_POOL_MIN", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT", 300),
        }
    }
}

/// Strip credentials before a connection string reaches the logs.
pub fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!(url = %redact_url(&config.url), "database target");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(std::time::Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contracts (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            client TEXT NOT NULL,
            contact_email TEXT,
            start_date DATE NOT NULL,
            expiry_date DATE NOT NULL,
            status TEXT NOT NULL DEFAULT 'Active',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            CONSTRAINT contracts_expiry_after_start CHECK (expiry_date > start_date)
        )
    "#,
    )
    .execute(pool)
    .await?;

    // Older deployments predate reminder emails
    sqlx::query("ALTER TABLE contracts ADD COLUMN IF NOT EXISTS contact_email TEXT")
        .execute(pool)
        .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_contracts_expiry_date ON contracts(expiry_date)",
        "CREATE INDEX IF NOT EXISTS idx_contracts_status ON contracts(status)",
        "CREATE INDEX IF NOT EXISTS idx_contracts_created_at ON contracts(created_at)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database migrations completed successfully");

    Ok(())
}
