use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContractStore, StoreResult};
use crate::db::models::{Contract, ContractStatus};

/// In-process store used when no database is configured
#[derive(Debug, Default)]
pub struct MemoryContractStore {
    contracts: RwLock<HashMap<Uuid, Contract>>,
}

impl MemoryContractStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContractStore for MemoryContractStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> StoreResult<Vec<Contract>> {
        Ok(self.contracts.read().await.values().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Contract>> {
        Ok(self.contracts.read().await.get(&id).cloned())
    }

    async fn insert(&self, contract: &Contract) -> StoreResult<()> {
        self.contracts
            .write()
            .await
            .insert(contract.id, contract.clone());
        Ok(())
    }

    async fn update(&self, contract: &Contract) -> StoreResult<bool> {
        let mut contracts = self.contracts.write().await;
        match contracts.get_mut(&contract.id) {
            Some(slot) => {
                *slot = contract.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.contracts.write().await.remove(&id).is_some())
    }

    async fn expire_lapsed(&self, today: NaiveDate) -> StoreResult<u64> {
        let now = Utc::now();
        let mut changed = 0;
        for contract in self.contracts.write().await.values_mut() {
            if contract.status == ContractStatus::Active && contract.expiry_date < today {
                contract.status = ContractStatus::Expired;
                contract.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn ping(&self) -> StoreResult<Duration> {
        Ok(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(name: &str, expiry: &str, status: ContractStatus) -> Contract {
        let now = Utc::now();
        Contract {
            id: Uuid::new_v4(),
            name: name.to_string(),
            client: "Client".to_string(),
            contact_email: None,
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            expiry_date: NaiveDate::parse_from_str(expiry, "%Y-%m-%d").unwrap(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let store = MemoryContractStore::new();
        let mut c = contract("A", "2030-01-01", ContractStatus::Active);
        store.insert(&c).await.unwrap();
        assert_eq!(store.get(c.id).await.unwrap().unwrap().name, "A");

        c.name = "B".to_string();
        assert!(store.update(&c).await.unwrap());
        assert_eq!(store.list().await.unwrap()[0].name, "B");

        assert!(store.delete(c.id).await.unwrap());
        assert!(!store.delete(c.id).await.unwrap());
        assert!(store.get(c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_returns_false() {
        let store = MemoryContractStore::new();
        let c = contract("A", "2030-01-01", ContractStatus::Active);
        assert!(!store.update(&c).await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_lapsed_only_active_past_expiry() {
        let store = MemoryContractStore::new();
        let lapsed = contract("lapsed", "2024-12-31", ContractStatus::Active);
        let current = contract("current", "2025-01-01", ContractStatus::Active);
        let renewed = contract("renewed", "2024-06-01", ContractStatus::Other("Renewed".into()));
        for c in [&lapsed, &current, &renewed] {
            store.insert(c).await.unwrap();
        }

        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(store.expire_lapsed(today).await.unwrap(), 1);
        assert_eq!(
            store.get(lapsed.id).await.unwrap().unwrap().status,
            ContractStatus::Expired
        );
        assert_eq!(
            store.get(current.id).await.unwrap().unwrap().status,
            ContractStatus::Active
        );
        assert_eq!(store.get(renewed.id).await.unwrap().unwrap().status.as_str(), "Renewed");
        assert_eq!(store.expire_lapsed(today).await.unwrap(), 0);
    }
}
