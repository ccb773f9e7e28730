pub mod bing;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

pub use bing::BingClient;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub id: Option<String>,
    pub display_url: Option<String>,
    pub date_last_crawled: Option<DateTime<Utc>>,
    pub is_family_friendly: Option<bool>,
}

/// Hits for one query in the provider's relevance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub results: Vec<SearchResult>,
    pub total_estimated_matches: Option<u64>,
    pub web_search_url: Option<String>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<ResultSet>;
}
