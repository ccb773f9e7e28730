use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::http::{self, RetryPolicy};

use super::{Candidate, Generation, SafetyRating, TextGenerator, Usage};

const SERVICE: &str = "generative model";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    retry: RetryPolicy,
}

// generateContent request/response, only the fields we read
#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    index: u32,
    content: Option<WireContent>,
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<WireSafetyRating>,
    #[serde(default)]
    token_count: u32,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
struct WirePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSafetyRating {
    category: String,
    probability: String,
    #[serde(default)]
    blocked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

impl From<WireCandidate> for Candidate {
    fn from(wire: WireCandidate) -> Self {
        Candidate {
            index: wire.index,
            // non-text parts (function calls, inline data) carry nothing to select
            parts: wire
                .content
                .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
                .unwrap_or_default(),
            finish_reason: wire.finish_reason,
            safety_ratings: wire
                .safety_ratings
                .into_iter()
                .map(|r| SafetyRating {
                    category: r.category,
                    probability: r.probability,
                    blocked: r.blocked,
                })
                .collect(),
            token_count: wire.token_count,
        }
    }
}

impl GeminiClient {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = http::build_client(timeout)
            .map_err(|e| Error::ConfigInvalid(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
            retry,
        })
    }

    /// Same connection pool and credentials, different model.
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        http::transport_error(err, SERVICE, self.timeout, Error::ModelUnavailable)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        if prompt.trim().is_empty() {
            return Err(Error::InvalidInput("prompt must not be empty".into()));
        }

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let builder = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request);

        let response = http::send_with_retry(builder, &self.retry, SERVICE)
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ModelUnavailable(format!("bad status {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        let api_response: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| Error::ModelUnavailable(format!("parsing response: {e}")))?;

        if let Some(reason) = api_response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(Error::ModelEmptyResponse(format!("prompt blocked: {reason}")));
        }

        let returned = api_response.candidates.len();
        let candidates: Vec<Candidate> = api_response
            .candidates
            .into_iter()
            .map(Candidate::from)
            .filter(|c| !c.is_blocked())
            .collect();

        if candidates.is_empty() {
            return Err(Error::ModelEmptyResponse(if returned == 0 {
                "no candidates returned".into()
            } else {
                format!("all {returned} candidates blocked by safety policy")
            }));
        }

        let usage = api_response
            .usage_metadata
            .map(|u| Usage {
                prompt_tokens: u.prompt_token_count,
                candidates_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();

        tracing::debug!(
            model = %self.model,
            candidates = candidates.len(),
            blocked = returned - candidates.len(),
            total_tokens = usage.total_tokens,
            "generation complete"
        );

        Ok(Generation { candidates, usage })
    }
}
