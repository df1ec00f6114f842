/*!
 * Expiry Reminders
 * Finds contracts nearing expiry and notifies their contacts
 */
pub mod notifier;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Contract;
use crate::domain::lifecycle;
use crate::store::{ContractStore, StoreError};

pub use notifier::{build_notifier, LogNotifier, MailerConfig, Notifier, Reminder, WebhookNotifier};

/// Body of POST /api/reminders/send. Both fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderRequest {
    /// Override the configured window
    pub days_ahead: Option<i64>,
    /// Restrict the run to these contracts
    pub contract_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Sent,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderOutcome {
    pub contract_id: Uuid,
    pub contract_name: Option<String>,
    pub email: Option<String>,
    pub status: ReminderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_expiry: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderSummary {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<ReminderOutcome>,
}

impl ReminderSummary {
    fn record(&mut self, outcome: ReminderOutcome) {
        match outcome.status {
            ReminderStatus::Sent => self.sent += 1,
            ReminderStatus::Failed => self.failed += 1,
            ReminderStatus::Skipped => self.skipped += 1,
        }
        self.results.push(outcome);
    }
}

pub fn compose_reminder(contract: &Contract, email: &str, days_left: i64) -> Reminder {
    let when = match days_left {
        0 => "expires today".to_string(),
        1 => "expires in 1 day".to_string(),
        n => format!("expires in {} days", n),
    };
    Reminder {
        contract_id: contract.id,
        to: email.to_string(),
        subject: format!("Contract \"{}\" {}", contract.name, when),
        body: format!(
            "Hello,\n\nThis is a reminder that the contract \"{}\" with {} {} (expiry date {}).\n\n\
             Please review it and arrange a renewal if needed.\n",
            contract.name,
            contract.client,
            when,
            contract.expiry_date.format("%Y-%m-%d"),
        ),
    }
}

fn skipped(contract: &Contract, days_left: Option<i64>, reason: &str) -> ReminderOutcome {
    ReminderOutcome {
        contract_id: contract.id,
        contract_name: Some(contract.name.clone()),
        email: contract.contact_email.clone(),
        status: ReminderStatus::Skipped,
        days_until_expiry: days_left,
        reason: Some(reason.to_string()),
    }
}

/// Expire lapsed contracts, then send one reminder per due contract.
///
/// A contract is due when it is not expired, expires within the window
/// (inclusive) and has a contact email. Contracts named explicitly in the
/// request are always reported, with a reason when skipped. Delivery failures
/// are recorded per contract and do not stop the run.
pub async fn send_reminders(
    store: &dyn ContractStore,
    notifier: &dyn Notifier,
    today: NaiveDate,
    default_window_days: i64,
    request: ReminderRequest,
) -> Result<ReminderSummary, StoreError> {
    let window = request.days_ahead.unwrap_or(default_window_days).max(0);
    let expired_now = store.expire_lapsed(today).await?;
    if expired_now > 0 {
        tracing::info!(count = expired_now, "marked lapsed contracts as expired");
    }

    let mut contracts = store.list().await?;
    contracts.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date).then(a.name.cmp(&b.name)));

    let mut summary = ReminderSummary::default();
    let explicit = request.contract_ids.is_some();

    if let Some(ids) = &request.contract_ids {
        for id in ids {
            if !contracts.iter().any(|c| c.id == *id) {
                summary.record(ReminderOutcome {
                    contract_id: *id,
                    contract_name: None,
                    email: None,
                    status: ReminderStatus::Skipped,
                    days_until_expiry: None,
                    reason: Some("contract not found".to_string()),
                });
            }
        }
        contracts.retain(|c| ids.contains(&c.id));
    }

    for contract in &contracts {
        let days_left = lifecycle::days_until_expiry(today, contract.expiry_date);

        if lifecycle::is_expired(&contract.status, days_left) {
            if explicit {
                summary.record(skipped(contract, Some(days_left), "contract already expired"));
            }
            continue;
        }
        if !lifecycle::is_expiring_soon(days_left, window) {
            if explicit {
                summary.record(skipped(contract, Some(days_left), "not expiring within window"));
            }
            continue;
        }
        let Some(email) = contract.contact_email.as_deref() else {
            summary.record(skipped(contract, Some(days_left), "no contact email"));
            continue;
        };

        let reminder = compose_reminder(contract, email, days_left);
        let outcome = match notifier.send(&reminder).await {
            Ok(()) => {
                tracing::info!(contract_id = %contract.id, to = %email, days_left, "reminder sent");
                ReminderOutcome {
                    contract_id: contract.id,
                    contract_name: Some(contract.name.clone()),
                    email: Some(email.to_string()),
                    status: ReminderStatus::Sent,
                    days_until_expiry: Some(days_left),
                    reason: None,
                }
            }
            Err(e) => {
                tracing::warn!(contract_id = %contract.id, error = %e, "reminder delivery failed");
                ReminderOutcome {
                    contract_id: contract.id,
                    contract_name: Some(contract.name.clone()),
                    email: Some(email.to_string()),
                    status: ReminderStatus::Failed,
                    days_until_expiry: Some(days_left),
                    reason: Some(e.to_string()),
                }
            }
        };
        summary.record(outcome);
    }

    tracing::info!(
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        window_days = window,
        notifier = notifier.name(),
        "reminder run finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::notifier::NotifyError;
    use super::*;
    use crate::db::models::ContractStatus;
    use crate::store::MemoryContractStore;
    use async_trait::async_trait;
    use chrono::{Days, Utc};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<Reminder>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl Notifier for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, reminder: &Reminder) -> Result<(), NotifyError> {
            if self.fail_for.as_deref() == Some(reminder.to.as_str()) {
                return Err(NotifyError::Status(502));
            }
            self.sent.lock().await.push(reminder.clone());
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn contract(name: &str, days_left: i64, email: Option<&str>) -> Contract {
        let expiry = if days_left >= 0 {
            today().checked_add_days(Days::new(days_left as u64)).unwrap()
        } else {
            today().checked_sub_days(Days::new((-days_left) as u64)).unwrap()
        };
        Contract {
            id: Uuid::new_v4(),
            name: name.to_string(),
            client: "Client".to_string(),
            contact_email: email.map(str::to_string),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            expiry_date: expiry,
            status: ContractStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn seeded(contracts: &[&Contract]) -> MemoryContractStore {
        let store = MemoryContractStore::new();
        for c in contracts {
            store.insert(c).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_only_due_contracts_with_email_are_sent() {
        let due = contract("due", 30, Some("due@example.com"));
        let today_c = contract("today", 0, Some("today@example.com"));
        let later = contract("later", 31, Some("later@example.com"));
        let lapsed = contract("lapsed", -1, Some("lapsed@example.com"));
        let no_email = contract("no-email", 5, None);
        let store = seeded(&[&due, &today_c, &later, &lapsed, &no_email]).await;
        let notifier = Recording::default();

        let summary = send_reminders(&store, &notifier, today(), 30, ReminderRequest::default())
            .await
            .unwrap();

        assert_eq!(summary.sent, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        let sent = notifier.sent.lock().await;
        let recipients: Vec<&str> = sent.iter().map(|r| r.to.as_str()).collect();
        assert_eq!(recipients, vec!["today@example.com", "due@example.com"]);
        assert!(sent[0].subject.ends_with("expires today"));

        // Lapsed Active contract was persisted as Expired along the way
        let stored = store.get(lapsed.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContractStatus::Expired);
    }

    #[tokio::test]
    async fn test_failures_are_recorded_not_fatal() {
        let a = contract("a", 3, Some("bounce@example.com"));
        let b = contract("b", 4, Some("ok@example.com"));
        let store = seeded(&[&a, &b]).await;
        let notifier = Recording {
            fail_for: Some("bounce@example.com".to_string()),
            ..Default::default()
        };

        let summary = send_reminders(&store, &notifier, today(), 30, ReminderRequest::default())
            .await
            .unwrap();
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 1);
        let failed = summary
            .results
            .iter()
            .find(|r| r.status == ReminderStatus::Failed)
            .unwrap();
        assert_eq!(failed.contract_id, a.id);
        assert!(failed.reason.as_deref().unwrap().contains("502"));
    }

    #[tokio::test]
    async fn test_explicit_ids_report_reasons() {
        let far = contract("far", 120, Some("far@example.com"));
        let due = contract("due", 10, Some("due@example.com"));
        let store = seeded(&[&far, &due]).await;
        let notifier = Recording::default();
        let missing = Uuid::new_v4();

        let request = ReminderRequest {
            days_ahead: None,
            contract_ids: Some(vec![far.id, missing]),
        };
        let summary = send_reminders(&store, &notifier, today(), 30, request)
            .await
            .unwrap();

        assert_eq!(summary.sent, 0);
        assert_eq!(summary.skipped, 2);
        assert!(summary
            .results
            .iter()
            .any(|r| r.contract_id == missing && r.reason.as_deref() == Some("contract not found")));
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_days_ahead_overrides_window() {
        let far = contract("far", 60, Some("far@example.com"));
        let store = seeded(&[&far]).await;
        let notifier = Recording::default();

        let request = ReminderRequest {
            days_ahead: Some(90),
            contract_ids: None,
        };
        let summary = send_reminders(&store, &notifier, today(), 30, request)
            .await
            .unwrap();
        assert_eq!(summary.sent, 1);
    }

    #[test]
    fn test_compose_reminder_text() {
        let c = contract("Hosting", 1, Some("ops@example.com"));
        let r = compose_reminder(&c, "ops@example.com", 1);
        assert_eq!(r.subject, "Contract \"Hosting\" expires in 1 day");
        assert!(r.body.contains("2025-06-02"));
        assert_eq!(r.to, "ops@example.com");
    }
}
