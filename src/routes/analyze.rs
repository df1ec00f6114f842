/**
 * Document Analysis Route
 * Infers start date, tenure and expiry from pasted contract text
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::analyzer::{self, DocumentAnalysisRequest, DocumentAnalysisResponse};
use crate::error::ApiError;
use crate::AppState;

/// POST /api/analyze-document
///
/// Extraction failures are reported in the `error` field with a 200 status;
/// only an empty document is rejected outright.
#[tracing::instrument(skip_all, fields(text_len = tracing::field::Empty))]
pub async fn analyze_document(
    State(state): State<AppState>,
    payload: Result<Json<DocumentAnalysisRequest>, JsonRejection>,
) -> Result<Json<DocumentAnalysisResponse>, ApiError> {
    let Json(request) = payload?;
    let text = request.document_text.trim();
    tracing::Span::current().record("text_len", text.len());

    if text.is_empty() {
        return Err(ApiError::validation("Document text is required"));
    }

    let response = analyzer::analyze_document(state.analyzer.as_ref(), text).await;
    tracing::info!(
        analyzer = state.analyzer.name(),
        found_date = response.contract_date.is_some(),
        found_tenure = response.contract_tenure.is_some(),
        "document analyzed"
    );

    Ok(Json(response))
}
