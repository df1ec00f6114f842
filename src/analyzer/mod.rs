/*!
 * Document Analyzer
 * Infers a contract start date and tenure from free text and computes the expiry
 */
pub mod llm;
pub mod rules;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{env_opt, env_or};
use crate::domain::tenure::calculate_expiry_date;

pub use llm::LlmAnalyzer;
pub use rules::RuleAnalyzer;

pub const PARSE_FAILURE_MESSAGE: &str =
    "Could not parse AI response. Please try again or enter dates manually.";
pub const ANALYSIS_FAILURE_MESSAGE: &str =
    "Analysis failed. Please try again or enter dates manually.";
pub const NOTHING_FOUND_MESSAGE: &str =
    "Could not find a contract date or tenure in the document. Please enter dates manually.";

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: env_opt("ANALYZER_API_KEY").or_else(|| env_opt("GEMINI_API_KEY")),
            model: env_opt("ANALYZER_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            base_url: env_opt("ANALYZER_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            timeout_secs: env_or("ANALYZER_TIMEOUT_SECS", 30),
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analyzer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("analyzer returned HTTP {0}")]
    Status(u16),

    #[error("unparseable analyzer reply: {0}")]
    UnparseableReply(String),

    #[error("no contract date or tenure found")]
    NothingFound,
}

impl AnalysisError {
    /// Message shown to the user in place of extracted dates.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::UnparseableReply(_) => PARSE_FAILURE_MESSAGE,
            AnalysisError::NothingFound => NOTHING_FOUND_MESSAGE,
            AnalysisError::Request(_) | AnalysisError::Status(_) => ANALYSIS_FAILURE_MESSAGE,
        }
    }
}

/// Raw terms as recovered from a document, before any date arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTerms {
    pub contract_date: Option<String>,
    pub contract_tenure: Option<String>,
}

impl ExtractedTerms {
    pub fn is_empty(&self) -> bool {
        self.contract_date.is_none() && self.contract_tenure.is_none()
    }
}

#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(&self, document_text: &str) -> Result<ExtractedTerms, AnalysisError>;
}

/// Tries `primary` first and falls back to the rule-based extractor when it
/// fails or comes back empty.
pub struct FallbackAnalyzer {
    primary: Arc<dyn DocumentAnalyzer>,
    fallback: RuleAnalyzer,
}

impl FallbackAnalyzer {
    pub fn new(primary: Arc<dyn DocumentAnalyzer>) -> Self {
        Self {
            primary,
            fallback: RuleAnalyzer,
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for FallbackAnalyzer {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn analyze(&self, document_text: &str) -> Result<ExtractedTerms, AnalysisError> {
        let primary_err = match self.primary.analyze(document_text).await {
            Ok(terms) if !terms.is_empty() => return Ok(terms),
            Ok(_) => AnalysisError::NothingFound,
            Err(e) => {
                tracing::warn!(
                    analyzer = self.primary.name(),
                    error = %e,
                    "primary analyzer failed, falling back to rules"
                );
                e
            }
        };
        match self.fallback.analyze(document_text).await {
            Ok(terms) => Ok(terms),
            Err(_) => Err(primary_err),
        }
    }
}

/// Pick the analyzer for this deployment: LLM-backed with rule fallback when
/// an API key is configured, rules only otherwise.
pub fn build_analyzer(config: &AnalyzerConfig) -> Arc<dyn DocumentAnalyzer> {
    let Some(api_key) = config.api_key.clone() else {
        tracing::info!("No analyzer API key set. Using rule-based document analysis.");
        return Arc::new(RuleAnalyzer);
    };
    match LlmAnalyzer::new(config, api_key) {
        Ok(llm) => {
            tracing::info!(model = %config.model, "LLM document analysis enabled");
            Arc::new(FallbackAnalyzer::new(Arc::new(llm)))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build LLM analyzer. Using rules only.");
            Arc::new(RuleAnalyzer)
        }
    }
}

/// Body of POST /api/analyze-document
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentAnalysisRequest {
    pub document_text: String,
}

/// Response of POST /api/analyze-document. Fields are null when unknown.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentAnalysisResponse {
    pub contract_date: Option<String>,
    pub contract_tenure: Option<String>,
    pub expiry_date: Option<String>,
    pub error: Option<String>,
}

/// Run `analyzer` over `document_text` and compute the expiry date when both
/// a start date and a tenure were found.
pub async fn analyze_document(
    analyzer: &dyn DocumentAnalyzer,
    document_text: &str,
) -> DocumentAnalysisResponse {
    match analyzer.analyze(document_text).await {
        Ok(terms) => {
            let expiry_date = match (&terms.contract_date, &terms.contract_tenure) {
                (Some(date), Some(tenure)) => calculate_expiry_date(date, tenure),
                _ => None,
            };
            DocumentAnalysisResponse {
                contract_date: terms.contract_date,
                contract_tenure: terms.contract_tenure,
                expiry_date,
                error: None,
            }
        }
        Err(e) => {
            tracing::error!(analyzer = analyzer.name(), error = %e, "Document analysis error");
            DocumentAnalysisResponse {
                error: Some(e.user_message().to_string()),
                ..Default::default()
            }
        }
    }
}
