/**
 * Reminder Routes
 * Triggers expiry-reminder emails for contracts nearing expiry
 */
use axum::{body::Bytes, extract::State, Json};

use crate::error::ApiError;
use crate::reminders::{self, ReminderRequest, ReminderSummary};
use crate::AppState;

/// POST /api/reminders/send
///
/// Body is optional: `{ "days_ahead": 14, "contract_ids": ["..."] }`.
pub async fn send_reminders(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ReminderSummary>, ApiError> {
    let request: ReminderRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ReminderRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::validation(format!("Invalid reminder request: {}", e)))?
    };

    if request.days_ahead.is_some_and(|d| d < 0) {
        return Err(ApiError::validation("days_ahead must not be negative"));
    }

    let summary = reminders::send_reminders(
        state.store.as_ref(),
        state.notifier.as_ref(),
        state.today(),
        state.reminder_window_days,
        request,
    )
    .await?;

    Ok(Json(summary))
}
