pub mod gemini;
pub mod selector;

use async_trait::async_trait;

use crate::error::Result;

pub use gemini::GeminiClient;
pub use selector::{PartSelector, SelectionStrategy};

/// One alternative response from a generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub index: u32,
    /// Text parts in the order the model emitted them.
    pub parts: Vec<String>,
    pub finish_reason: Option<String>,
    pub safety_ratings: Vec<SafetyRating>,
    pub token_count: u32,
}

impl Candidate {
    pub fn is_blocked(&self) -> bool {
        self.finish_reason.as_deref() == Some("SAFETY")
            || self.safety_ratings.iter().any(|r| r.blocked)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
    pub blocked: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub candidates_tokens: u32,
    pub total_tokens: u32,
}

/// Unblocked candidates from a single model call, never empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub candidates: Vec<Candidate>,
    pub usage: Usage,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation>;
}
