//! Google Gemini `generateContent` client.
//!
//! Requests JSON output via `responseMimeType`; the reply text is the
//! concatenation of the first candidate's text parts.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{DecisionOracle, OracleError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiOracle {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiOracle {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OracleError::Config("Gemini API key is empty".into()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(prompt: &str) -> GenerateRequest<'_> {
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        }
    }

    /// Join the text parts of the first candidate.
    fn extract_text(body: &str) -> Result<String, OracleError> {
        let resp: GenerateResponse = serde_json::from_str(body)
            .map_err(|e| OracleError::Http(format!("unreadable Gemini response: {e}")))?;
        let text: String = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(OracleError::EmptyResponse);
        }
        Ok(text)
    }
}

impl DecisionOracle for GeminiOracle {
    fn name(&self) -> &str {
        &self.model
    }

    fn ask(&self, prompt: &str) -> Result<String, OracleError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "asking Gemini");
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt))
            .send()
            .map_err(|e| OracleError::Http(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().map_err(|e| OracleError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Self::extract_text(&body)
    }
}
