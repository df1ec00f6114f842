//! Contract models - the stored record plus the request bodies that create and change it.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{lifecycle, Tenure};
use crate::error::ApiError;

lazy_static::lazy_static! {
    /// Loose address check: something@domain.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Contract status. `Active` and `Expired` drive the lifecycle rules;
/// any other caller-supplied value is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContractStatus {
    #[default]
    Active,
    Expired,
    Other(String),
}

impl ContractStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ContractStatus::Active => "Active",
            ContractStatus::Expired => "Expired",
            ContractStatus::Other(s) => s,
        }
    }
}

impl From<String> for ContractStatus {
    fn from(s: String) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("active") {
            ContractStatus::Active
        } else if trimmed.eq_ignore_ascii_case("expired") {
            ContractStatus::Expired
        } else {
            ContractStatus::Other(s)
        }
    }
}

impl From<ContractStatus> for String {
    fn from(status: ContractStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract record as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub name: String,
    pub client: String,
    pub contact_email: Option<String>,
    pub start_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Check the record-level invariants shared by create, update and renew.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("Name is required"));
        }
        if self.client.trim().is_empty() {
            return Err(ApiError::validation("Client is required"));
        }
        if self.status.as_str().trim().is_empty() {
            return Err(ApiError::validation("Status must not be blank"));
        }
        if let Some(email) = &self.contact_email {
            if !is_valid_email(email) {
                return Err(ApiError::validation("Invalid email format"));
            }
        }
        if self.expiry_date <= self.start_date {
            return Err(ApiError::validation(
                "Expiry date must be later than start date",
            ));
        }
        Ok(())
    }

    pub fn lifecycle(&self, today: NaiveDate) -> lifecycle::Lifecycle {
        lifecycle::Lifecycle::derive(today, self.expiry_date, &self.status)
    }

    /// Case-insensitive match against name, client and contact email.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.client.to_lowercase().contains(&needle)
            || self
                .contact_email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&needle))
    }
}

fn normalize_email(email: Option<String>) -> Option<String> {
    email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}

/// Body of POST /api/contracts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContract {
    pub name: String,
    pub client: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    pub start_date: NaiveDate,
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub status: Option<ContractStatus>,
}

impl NewContract {
    /// Build a validated record with a fresh id and timestamps.
    pub fn into_contract(self, now: DateTime<Utc>) -> Result<Contract, ApiError> {
        let contract = Contract {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            client: self.client.trim().to_string(),
            contact_email: normalize_email(self.contact_email),
            start_date: self.start_date,
            expiry_date: self.expiry_date,
            status: self.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        contract.validate()?;
        Ok(contract)
    }
}

/// Body of PUT /api/contracts/{id}; absent fields are left unchanged.
/// An empty `contact_email` clears the address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractUpdate {
    pub name: Option<String>,
    pub client: Option<String>,
    pub contact_email: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub status: Option<ContractStatus>,
}

impl ContractUpdate {
    pub fn apply(self, mut contract: Contract, now: DateTime<Utc>) -> Result<Contract, ApiError> {
        if let Some(name) = self.name {
            contract.name = name.trim().to_string();
        }
        if let Some(client) = self.client {
            contract.client = client.trim().to_string();
        }
        if self.contact_email.is_some() {
            contract.contact_email = normalize_email(self.contact_email);
        }
        if let Some(start) = self.start_date {
            contract.start_date = start;
        }
        if let Some(expiry) = self.expiry_date {
            contract.expiry_date = expiry;
        }
        if let Some(status) = self.status {
            contract.status = status;
        }
        contract.updated_at = now;
        contract.validate()?;
        Ok(contract)
    }
}

/// Body of POST /api/contracts/{id}/renew
///
/// Exactly one of `new_expiry_date` or `tenure` must be given; a tenure
/// extends the contract from its current expiry date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenewContract {
    pub new_expiry_date: Option<NaiveDate>,
    pub tenure: Option<String>,
    pub contact_email: Option<String>,
}

impl RenewContract {
    pub fn apply(self, mut contract: Contract, now: DateTime<Utc>) -> Result<Contract, ApiError> {
        let new_expiry = match (self.new_expiry_date, self.tenure.as_deref()) {
            (Some(date), None) => date,
            (None, Some(text)) => Tenure::parse(text)
                .and_then(|t| t.expiry_from(contract.expiry_date))
                .ok_or_else(|| ApiError::validation(format!("Unrecognized tenure: {}", text)))?,
            (Some(_), Some(_)) => {
                return Err(ApiError::validation(
                    "Provide either new_expiry_date or tenure, not both",
                ))
            }
            (None, None) => {
                return Err(ApiError::validation(
                    "new_expiry_date or tenure is required",
                ))
            }
        };

        if new_expiry <= contract.expiry_date {
            return Err(ApiError::validation(
                "New expiry date must be later than the current expiry date",
            ));
        }

        contract.expiry_date = new_expiry;
        if self.contact_email.is_some() {
            contract.contact_email = normalize_email(self.contact_email);
        }
        contract.status = ContractStatus::Active;
        contract.updated_at = now;
        contract.validate()?;
        Ok(contract)
    }
}
