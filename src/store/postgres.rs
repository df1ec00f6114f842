use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ContractStore, StoreResult};
use crate::db::models::Contract;

const CONTRACT_COLUMNS: &str =
    "id, name, client, contact_email, start_date, expiry_date, status, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ContractRow {
    id: Uuid,
    name: String,
    client: String,
    contact_email: Option<String>,
    start_date: NaiveDate,
    expiry_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContractRow> for Contract {
    fn from(row: ContractRow) -> Self {
        Contract {
            id: row.id,
            name: row.name,
            client: row.client,
            contact_email: row.contact_email,
            start_date: row.start_date,
            expiry_date: row.expiry_date,
            status: row.status.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `contracts` table in PostgreSQL
#[derive(Debug, Clone)]
pub struct PgContractStore {
    pool: PgPool,
}

impl PgContractStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContractStore for PgContractStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self) -> StoreResult<Vec<Contract>> {
        let rows = sqlx::query_as::<_, ContractRow>(&format!(
            "SELECT {} FROM contracts ORDER BY created_at",
            CONTRACT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Contract::from).collect())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Contract>> {
        let row = sqlx::query_as::<_, ContractRow>(&format!(
            "SELECT {} FROM contracts WHERE id = $1",
            CONTRACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Contract::from))
    }

    async fn insert(&self, contract: &Contract) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO contracts
                (id, name, client, contact_email, start_date, expiry_date, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(contract.id)
        .bind(&contract.name)
        .bind(&contract.client)
        .bind(&contract.contact_email)
        .bind(contract.start_date)
        .bind(contract.expiry_date)
        .bind(contract.status.as_str())
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, contract: &Contract) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE contracts
            SET name = $2, client = $3, contact_email = $4, start_date = $5,
                expiry_date = $6, status = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(contract.id)
        .bind(&contract.name)
        .bind(&contract.client)
        .bind(&contract.contact_email)
        .bind(contract.start_date)
        .bind(contract.expiry_date)
        .bind(contract.status.as_str())
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM contracts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn expire_lapsed(&self, today: NaiveDate) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE contracts
            SET status = 'Expired', updated_at = now()
            WHERE status = 'Active' AND expiry_date < $1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }
}
