use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Stage;
use crate::llm::Usage;
use crate::search::SearchResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageLog {
    pub stage: String,
    pub latency_ms: u64,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl StageLog {
    pub fn new(stage: Stage, elapsed: Duration, usage: Option<Usage>) -> Self {
        let usage = usage.unwrap_or_default();
        Self {
            stage: stage.to_string(),
            latency_ms: elapsed.as_millis() as u64,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.candidates_tokens,
        }
    }
}

/// A search hit as recorded for the run, provider metadata included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceLog {
    pub title: String,
    pub url: String,
    pub id: Option<String>,
    pub display_url: Option<String>,
    pub date_last_crawled: Option<DateTime<Utc>>,
    pub is_family_friendly: Option<bool>,
}

impl From<&SearchResult> for SourceLog {
    fn from(result: &SearchResult) -> Self {
        Self {
            title: result.title.clone(),
            url: result.url.clone(),
            id: result.id.clone(),
            display_url: result.display_url.clone(),
            date_last_crawled: result.date_last_crawled,
            is_family_friendly: result.is_family_friendly,
        }
    }
}

/// In-memory record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub id: String,
    pub timestamp: String,
    pub statement: String,
    pub query: String,
    pub num_results: u32,
    pub total_estimated_matches: Option<u64>,
    pub web_search_url: Option<String>,
    pub sources: Vec<SourceLog>,
    pub stages: Vec<StageLog>,
    pub total_latency_ms: u64,
    pub final_summary: String,
}

impl RunLog {
    pub fn total_tokens(&self) -> u32 {
        self.stages
            .iter()
            .map(|s| s.input_tokens + s.output_tokens)
            .sum()
    }

    pub fn summary(&self) -> String {
        let latency = |name: Stage| {
            self.stages
                .iter()
                .find(|s| s.stage == name.to_string())
                .map(|s| s.latency_ms)
                .unwrap_or(0)
        };

        format!(
            "Results: {} | Query: {}ms | Search: {}ms | Summary: {}ms | \
             Total latency: {:.1}s | Tokens used by LLM: {}",
            self.num_results,
            latency(Stage::SynthesizeQuery),
            latency(Stage::Search),
            latency(Stage::Summarize),
            self.total_latency_ms as f64 / 1000.0,
            self.total_tokens(),
        )
    }
}
