//! Contract persistence behind the `ContractStore` trait.
//!
//! PostgreSQL is used when a pool is available; otherwise contracts live in
//! process memory and are lost on restart.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::Contract;

pub use memory::MemoryContractStore;
pub use postgres::PgContractStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// The backend could not be reached at all, as opposed to rejecting a query.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_)
                | StoreError::Database(
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
                )
        )
    }

    /// A schema constraint (e.g. expiry after start) rejected the write.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db)) => db.is_check_violation(),
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ContractStore: Send + Sync {
    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;

    async fn list(&self) -> StoreResult<Vec<Contract>>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Contract>>;

    async fn insert(&self, contract: &Contract) -> StoreResult<()>;

    /// Replace the stored record with the same id. Returns false if it no longer exists.
    async fn update(&self, contract: &Contract) -> StoreResult<bool>;

    /// Returns false if nothing was deleted.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Persist `Expired` on every `Active` contract whose expiry date is before `today`.
    /// Returns the number of contracts changed.
    async fn expire_lapsed(&self, today: NaiveDate) -> StoreResult<u64>;

    /// Round-trip latency to the backend
    async fn ping(&self) -> StoreResult<Duration>;
}
