//! LLM-backed analyzer speaking the Gemini `generateContent` REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{AnalysisError, AnalyzerConfig, DocumentAnalyzer, ExtractedTerms};

const SYSTEM_PROMPT: &str = "You are an AI assistant that extracts contract information \
from documents. Return only valid JSON responses.";

fn build_prompt(document_text: &str) -> String {
    format!(
        r#"Analyze the following contract text and extract the contract start date and tenure information.

Contract Text:
{}

Please respond with ONLY a JSON object containing:
- "contractDate": the contract start date in YYYY-MM-DD format
- "contractTenure": the contract duration (e.g., "1 year", "6 months", "24 months")

If you cannot find this information, set the values to null."#,
        document_text
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelReply {
    #[serde(rename = "contractDate")]
    contract_date: Option<String>,
    #[serde(rename = "contractTenure")]
    contract_tenure: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

/// Parse the model's text reply. Tolerates Markdown code fences and prose
/// around the JSON object.
pub fn parse_model_reply(reply: &str) -> Result<ExtractedTerms, AnalysisError> {
    let json_text = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if end > start => &reply[start..=end],
        _ => return Err(AnalysisError::UnparseableReply(reply.to_string())),
    };
    let parsed: ModelReply = serde_json::from_str(json_text)
        .map_err(|e| AnalysisError::UnparseableReply(e.to_string()))?;
    Ok(ExtractedTerms {
        contract_date: non_blank(parsed.contract_date),
        contract_tenure: non_blank(parsed.contract_tenure),
    })
}

pub struct LlmAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl LlmAnalyzer {
    pub fn new(config: &AnalyzerConfig, api_key: String) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl DocumentAnalyzer for LlmAnalyzer {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn analyze(&self, document_text: &str) -> Result<ExtractedTerms, AnalysisError> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
            "contents": [{ "role": "user", "parts": [{ "text": build_prompt(document_text) }] }],
            "generationConfig": { "temperature": 0.0, "responseMimeType": "application/json" }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "analyzer upstream returned error");
            return Err(AnalysisError::Status(status.as_u16()));
        }

        let payload: GenerateContentResponse = response.json().await?;
        let reply: String = payload
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        tracing::debug!(reply_len = reply.len(), "analyzer reply received");
        parse_model_reply(&reply)
    }
}
