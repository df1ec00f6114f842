/**
 * Contract Routes
 * CRUD, search, stats and renewal endpoints for contracts
 */
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Contract, ContractStatus, ContractUpdate, NewContract, RenewContract};
use crate::domain::{lifecycle, Lifecycle};
use crate::error::ApiError;
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/contracts
#[derive(Debug, Default, Deserialize)]
pub struct ContractListQuery {
    /// Case-insensitive search over name, client and contact email
    pub q: Option<String>,
    pub status: Option<String>,
    pub expiring_soon: Option<bool>,
    pub expired: Option<bool>,
}

/// A contract plus the fields derived from its dates
#[derive(Debug, Serialize)]
pub struct ContractView {
    #[serde(flatten)]
    pub contract: Contract,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}

impl ContractView {
    pub fn new(mut contract: Contract, today: NaiveDate) -> Self {
        contract.status = lifecycle::effective_status(today, contract.expiry_date, &contract.status);
        let lifecycle = contract.lifecycle(today);
        Self {
            contract,
            lifecycle,
        }
    }
}

/// Response for GET /api/contracts/stats
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub expiring_soon: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// Malformed ids cannot name a stored contract, so they are reported as not found.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

async fn load(state: &AppState, id: Uuid) -> Result<Contract, ApiError> {
    state.store.get(id).await?.ok_or(ApiError::NotFound)
}

fn keep(view: &ContractView, query: &ContractListQuery) -> bool {
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        if !view.contract.matches(q) {
            return false;
        }
    }
    if let Some(status) = query.status.as_deref() {
        if !view.contract.status.as_str().eq_ignore_ascii_case(status) {
            return false;
        }
    }
    if let Some(soon) = query.expiring_soon {
        if view.lifecycle.expiring_soon != soon {
            return false;
        }
    }
    if let Some(expired) = query.expired {
        if view.lifecycle.expired != expired {
            return false;
        }
    }
    true
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/contracts - List contracts, soonest expiry first
pub async fn list_contracts(
    State(state): State<AppState>,
    query: Result<Query<ContractListQuery>, QueryRejection>,
) -> Result<Json<Vec<ContractView>>, ApiError> {
    let Query(query) = query?;
    let today = state.today();

    let expired = state.store.expire_lapsed(today).await?;
    if expired > 0 {
        tracing::info!(count = expired, "marked lapsed contracts as expired");
    }

    let mut views: Vec<ContractView> = state
        .store
        .list()
        .await?
        .into_iter()
        .map(|c| ContractView::new(c, today))
        .filter(|v| keep(v, &query))
        .collect();

    views.sort_by(|a, b| {
        a.contract
            .expiry_date
            .cmp(&b.contract.expiry_date)
            .then_with(|| a.contract.name.cmp(&b.contract.name))
    });

    Ok(Json(views))
}

/// GET /api/contracts/stats - Dashboard counters
pub async fn contract_stats(State(state): State<AppState>) -> Result<Json<ContractStats>, ApiError> {
    let today = state.today();
    let mut stats = ContractStats::default();

    for contract in state.store.list().await? {
        let view = ContractView::new(contract, today);
        stats.total += 1;
        if view.lifecycle.expired {
            stats.expired += 1;
        } else if view.contract.status == ContractStatus::Active {
            stats.active += 1;
        }
        if view.lifecycle.expiring_soon {
            stats.expiring_soon += 1;
        }
    }

    Ok(Json(stats))
}

/// POST /api/contracts - Create a contract
pub async fn create_contract(
    State(state): State<AppState>,
    payload: Result<Json<NewContract>, JsonRejection>,
) -> Result<Json<ContractView>, ApiError> {
    let Json(input) = payload?;
    let today = state.today();

    let mut contract = input.into_contract(Utc::now())?;
    contract.status = lifecycle::effective_status(today, contract.expiry_date, &contract.status);

    state.store.insert(&contract).await?;
    tracing::info!(contract_id = %contract.id, name = %contract.name, "contract created");

    Ok(Json(ContractView::new(contract, today)))
}

/// GET /api/contracts/{id}
pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContractView>, ApiError> {
    let contract = load(&state, parse_id(&id)?).await?;
    Ok(Json(ContractView::new(contract, state.today())))
}

/// PUT /api/contracts/{id} - Partial update
pub async fn update_contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ContractUpdate>, JsonRejection>,
) -> Result<Json<ContractView>, ApiError> {
    let id = parse_id(&id)?;
    let Json(update) = payload?;

    let existing = load(&state, id).await?;
    let contract = update.apply(existing, Utc::now())?;

    if !state.store.update(&contract).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(contract_id = %contract.id, "contract updated");

    Ok(Json(ContractView::new(contract, state.today())))
}

/// DELETE /api/contracts/{id}
pub async fn delete_contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(contract_id = %id, "contract deleted");

    Ok(Json(MessageResponse {
        message: "Contract deleted successfully".to_string(),
    }))
}

/// POST /api/contracts/{id}/renew - Extend expiry and reactivate
pub async fn renew_contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RenewContract>, JsonRejection>,
) -> Result<Json<ContractView>, ApiError> {
    let id = parse_id(&id)?;
    let Json(renewal) = payload?;

    let existing = load(&state, id).await?;
    let previous_expiry = existing.expiry_date;
    let contract = renewal.apply(existing, Utc::now())?;

    if !state.store.update(&contract).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(
        contract_id = %contract.id,
        previous_expiry = %previous_expiry,
        new_expiry = %contract.expiry_date,
        "contract renewed"
    );

    Ok(Json(ContractView::new(contract, state.today())))
}
