use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SynthesizeQuery,
    Search,
    Summarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SynthesizeQuery => "query synthesis",
            Stage::Search => "search",
            Stage::Summarize => "summarization",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A required secret or setting is absent
    #[error("missing configuration: {0} must be set")]
    ConfigMissing(String),

    /// A setting is present but cannot be used
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network, auth or HTTP failure talking to the generative service
    #[error("generative model unavailable: {0}")]
    ModelUnavailable(String),

    /// No usable candidate came back (none returned, or all blocked)
    #[error("generative model returned no usable response: {0}")]
    ModelEmptyResponse(String),

    #[error("search service unavailable: {0}")]
    SearchUnavailable(String),

    #[error("search response malformed: {0}")]
    SearchMalformed(String),

    #[error("{service} request timed out after {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },

    #[error("writing output: {0}")]
    Output(#[from] std::io::Error),

    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn at(self, stage: Stage) -> Self {
        Error::StageFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// The underlying failure with any stage wrapper peeled off.
    pub fn root(&self) -> &Error {
        match self {
            Error::StageFailed { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
