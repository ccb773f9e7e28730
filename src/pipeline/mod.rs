pub mod aggregator;
pub mod planner;
pub mod prompt;
pub mod synthesizer;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::{Error, Result, Stage};
use crate::instrumentation::{RunLog, SourceLog, StageLog};
use crate::llm::{GeminiClient, PartSelector};
use crate::search::{BingClient, ResultSet, SearchProvider};

use aggregator::Aggregator;
use planner::QueryPlanner;
use synthesizer::Synthesizer;

/// Progress of a single run. Strictly linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    QuerySynthesized,
    ResultsFetched,
    Summarized,
    Done,
}

impl PipelineState {
    pub fn next(self) -> Self {
        match self {
            PipelineState::Idle => PipelineState::QuerySynthesized,
            PipelineState::QuerySynthesized => PipelineState::ResultsFetched,
            PipelineState::ResultsFetched => PipelineState::Summarized,
            PipelineState::Summarized | PipelineState::Done => PipelineState::Done,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Where a run reports what it produced, as it produces it.
pub trait RunSink {
    fn query_synthesized(&mut self, query: &str) -> std::io::Result<()>;
    fn results_fetched(&mut self, results: &ResultSet) -> std::io::Result<()>;
    fn summarized(&mut self, summary: &str) -> std::io::Result<()>;
}

pub struct Pipeline {
    planner: QueryPlanner,
    searcher: Arc<dyn SearchProvider>,
    aggregator: Aggregator,
    synthesizer: Synthesizer,
}

impl Pipeline {
    pub fn new(
        planner: QueryPlanner,
        searcher: Arc<dyn SearchProvider>,
        aggregator: Aggregator,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            planner,
            searcher,
            aggregator,
            synthesizer,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let query_llm = GeminiClient::new(
            &config.gemini_api_key,
            &config.gemini_base_url,
            &config.query_model,
            config.request_timeout,
            config.retry.clone(),
        )?;
        let summary_llm = query_llm.with_model(&config.summary_model);
        let searcher = BingClient::new(
            &config.search_endpoint,
            &config.search_api_key,
            config.request_timeout,
            config.retry.clone(),
        )?;
        let selector: Arc<dyn PartSelector> = Arc::new(config.part_selector);

        tracing::info!(
            query_model = query_llm.model(),
            summary_model = summary_llm.model(),
            selector = %config.part_selector,
            examples = config.few_shot_examples.len(),
            "pipeline configured"
        );

        Ok(Self::new(
            QueryPlanner::new(
                Arc::new(query_llm),
                selector.clone(),
                config.few_shot_examples.clone(),
            ),
            Arc::new(searcher),
            Aggregator::new(config.max_summary_results),
            Synthesizer::new(Arc::new(summary_llm), selector),
        ))
    }

    /// Runs statement → query → search → summary. The first failing stage aborts the run.
    pub async fn run(&self, statement: &str, sink: &mut dyn RunSink) -> Result<RunLog> {
        let statement = statement.trim();
        if statement.is_empty() {
            return Err(Error::InvalidInput("statement must not be empty".into()));
        }

        let run_start = Instant::now();
        let mut stages: Vec<StageLog> = Vec::new();
        let mut state = PipelineState::Idle;

        // Idle -> QuerySynthesized
        let stage_start = Instant::now();
        let (query, plan_response) = self
            .planner
            .plan(statement)
            .await
            .map_err(|e| e.at(Stage::SynthesizeQuery))?;
        stages.push(StageLog::new(
            Stage::SynthesizeQuery,
            stage_start.elapsed(),
            Some(plan_response.usage),
        ));
        sink.query_synthesized(&query)
            .map_err(|e| Error::from(e).at(Stage::SynthesizeQuery))?;
        state = advance(state);
        tracing::info!(%query, "query synthesized");

        // QuerySynthesized -> ResultsFetched
        let stage_start = Instant::now();
        let results = self
            .searcher
            .search(&query)
            .await
            .map_err(|e| e.at(Stage::Search))?;
        stages.push(StageLog::new(Stage::Search, stage_start.elapsed(), None));
        sink.results_fetched(&results)
            .map_err(|e| Error::from(e).at(Stage::Search))?;
        state = advance(state);
        if results.is_empty() {
            tracing::warn!(%query, "search returned no results");
        } else {
            tracing::info!(results = results.len(), "results fetched");
        }

        // ResultsFetched -> Summarized
        let summary_prompt = self.aggregator.summary_prompt(&results);
        state = advance(state);

        // Summarized -> Done
        let stage_start = Instant::now();
        let (summary, summary_response) = self
            .synthesizer
            .synthesize(&summary_prompt)
            .await
            .map_err(|e| e.at(Stage::Summarize))?;
        stages.push(StageLog::new(
            Stage::Summarize,
            stage_start.elapsed(),
            Some(summary_response.usage),
        ));
        sink.summarized(&summary)
            .map_err(|e| Error::from(e).at(Stage::Summarize))?;
        state = advance(state);
        debug_assert_eq!(state, PipelineState::Done);

        Ok(RunLog {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            statement: statement.to_string(),
            query,
            num_results: results.len() as u32,
            total_estimated_matches: results.total_estimated_matches,
            web_search_url: results.web_search_url.clone(),
            sources: results.results.iter().map(SourceLog::from).collect(),
            stages,
            total_latency_ms: run_start.elapsed().as_millis() as u64,
            final_summary: summary,
        })
    }
}

fn advance(state: PipelineState) -> PipelineState {
    let next = state.next();
    tracing::debug!(from = %state, to = %next, "pipeline transition");
    next
}
