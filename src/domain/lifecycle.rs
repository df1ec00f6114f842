/**
 * Contract Lifecycle
 * Status derived purely from dates: days left, expiring-soon window, labels
 */
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::db::models::ContractStatus;

/// Default width of the "expiring soon" window, in days.
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// Source of "today" for every date derivation.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    /// Current UTC calendar date
    #[default]
    System,
    /// Pinned date, used by tests
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Utc::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Whole days from `today` until `expiry`. Negative once the date has passed.
pub fn days_until_expiry(today: NaiveDate, expiry: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

/// `0 <= days <= window`
pub fn is_expiring_soon(days_left: i64, window_days: i64) -> bool {
    (0..=window_days).contains(&days_left)
}

pub fn is_expired(status: &ContractStatus, days_left: i64) -> bool {
    *status == ContractStatus::Expired || days_left < 0
}

/// Human label shown next to a contract.
pub fn expiry_label(status: &ContractStatus, days_left: i64) -> String {
    if is_expired(status, days_left) {
        return "Expired".to_string();
    }
    match days_left {
        0 => "Expires Today".to_string(),
        1 => "1 day left".to_string(),
        n => format!("{} days left", n),
    }
}

/// Derived lifecycle fields, serialized alongside every contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lifecycle {
    pub days_until_expiry: i64,
    pub expiring_soon: bool,
    pub expired: bool,
    pub expiry_label: String,
}

impl Lifecycle {
    pub fn derive(today: NaiveDate, expiry: NaiveDate, status: &ContractStatus) -> Self {
        let days = days_until_expiry(today, expiry);
        let expired = is_expired(status, days);
        Self {
            days_until_expiry: days,
            expiring_soon: is_expiring_soon(days, EXPIRING_SOON_DAYS),
            expired,
            expiry_label: expiry_label(status, days),
        }
    }
}

/// Status after applying automatic expiry: `Active` contracts past their
/// expiry date become `Expired`; every other status is left to the caller.
pub fn effective_status(
    today: NaiveDate,
    expiry: NaiveDate,
    status: &ContractStatus,
) -> ContractStatus {
    if *status == ContractStatus::Active && days_until_expiry(today, expiry) < 0 {
        ContractStatus::Expired
    } else {
        status.clone()
    }
}
