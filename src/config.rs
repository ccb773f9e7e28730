use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::http::RetryPolicy;
use crate::llm::SelectionStrategy;
use crate::pipeline::prompt::FewShotExample;
use crate::secrets::{EnvSecrets, SecretProvider};

const BUNDLED_EXAMPLES: &str = include_str!("../prompts/few_shot.json");

#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub query_model: String,
    pub summary_model: String,
    pub search_api_key: String,
    pub search_endpoint: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub part_selector: SelectionStrategy,
    /// `None` feeds every search result into the summary prompt.
    pub max_summary_results: Option<usize>,
    pub few_shot_examples: Vec<FewShotExample>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::load(|name| std::env::var(name).ok(), &EnvSecrets)
    }

    /// Builds the configuration from a settings lookup and a secret provider.
    pub fn load<F>(var: F, secrets: &dyn SecretProvider) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let few_shot_examples = match var("FEW_SHOT_PATH") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    Error::ConfigInvalid(format!("cannot read FEW_SHOT_PATH {path}: {e}"))
                })?;
                parse_examples(&raw, &path)?
            }
            None => parse_examples(BUNDLED_EXAMPLES, "bundled examples")?,
        };

        let max_summary_results = match var("MAX_SUMMARY_RESULTS") {
            Some(raw) => Some(parse_positive::<usize>("MAX_SUMMARY_RESULTS", &raw)?),
            None => None,
        };

        Ok(Self {
            gemini_api_key: secrets.require(&["GEMINI_API_KEY", "API_KEY"])?,
            gemini_base_url: var("GEMINI_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".into()),
            query_model: var("QUERY_MODEL").unwrap_or_else(|| "gemini-1.5-pro".into()),
            summary_model: var("SUMMARY_MODEL").unwrap_or_else(|| "gemini-1.5-pro".into()),
            search_api_key: secrets.require(&["BING_SEARCH_KEY"])?,
            search_endpoint: var("SEARCH_ENDPOINT")
                .unwrap_or_else(|| "https://api.bing.microsoft.com/v7.0/search".into()),
            request_timeout: Duration::from_secs(parse_positive(
                "REQUEST_TIMEOUT_SECS",
                &var("REQUEST_TIMEOUT_SECS").unwrap_or_else(|| "30".into()),
            )?),
            retry: RetryPolicy {
                max_retries: parse_setting(
                    "MAX_RETRIES",
                    &var("MAX_RETRIES").unwrap_or_else(|| "2".into()),
                )?,
                initial_delay: Duration::from_millis(parse_setting(
                    "RETRY_BACKOFF_MS",
                    &var("RETRY_BACKOFF_MS").unwrap_or_else(|| "500".into()),
                )?),
                ..RetryPolicy::default()
            },
            part_selector: parse_setting(
                "PART_SELECTOR",
                &var("PART_SELECTOR").unwrap_or_else(|| "last-of-last".into()),
            )?,
            max_summary_results,
            few_shot_examples,
        })
    }
}

fn parse_setting<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::ConfigInvalid(format!("{name} has unusable value {raw:?}")))
}

fn parse_positive<T: FromStr + Default + PartialEq>(name: &str, raw: &str) -> Result<T> {
    let value: T = parse_setting(name, raw)?;
    if value == T::default() {
        return Err(Error::ConfigInvalid(format!("{name} must be greater than zero")));
    }
    Ok(value)
}

fn parse_examples(raw: &str, origin: &str) -> Result<Vec<FewShotExample>> {
    let examples: Vec<FewShotExample> = serde_json::from_str(raw)
        .map_err(|e| Error::ConfigInvalid(format!("few-shot examples in {origin}: {e}")))?;
    if examples.is_empty() {
        return Err(Error::ConfigInvalid(format!(
            "few-shot examples in {origin} are empty"
        )));
    }
    Ok(examples)
}
