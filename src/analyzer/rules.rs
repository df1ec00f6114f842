use async_trait::async_trait;

use super::{AnalysisError, DocumentAnalyzer, ExtractedTerms};
use crate::domain::extract;

/// Regex-driven extraction; needs no network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleAnalyzer;

#[async_trait]
impl DocumentAnalyzer for RuleAnalyzer {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn analyze(&self, document_text: &str) -> Result<ExtractedTerms, AnalysisError> {
        let found = extract::extract(document_text);
        tracing::debug!(
            contract_date = ?found.contract_date,
            tenure = ?found.tenure,
            "rule-based extraction"
        );
        if found.is_empty() {
            return Err(AnalysisError::NothingFound);
        }
        Ok(ExtractedTerms {
            contract_date: found
                .contract_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
            contract_tenure: found.tenure.map(|t| t.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rules_on_sample_agreement() {
        let text = "Service Agreement - This agreement is made on February 10, 2024, between \
            Global Corp and Tech Innovations LLC. The contract term is 12 months from the effective date.";
        let terms = RuleAnalyzer.analyze(text).await.unwrap();
        assert_eq!(terms.contract_date.as_deref(), Some("2024-02-10"));
        assert_eq!(terms.contract_tenure.as_deref(), Some("12 months"));
    }

    #[tokio::test]
    async fn test_rules_nothing_found() {
        let err = RuleAnalyzer.analyze("no dates at all").await.unwrap_err();
        assert!(matches!(err, AnalysisError::NothingFound));
    }
}
