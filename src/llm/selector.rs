use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

use super::{Candidate, Generation};

/// Picks the answer text out of a model response.
///
/// Multi-part responses happen when the model interleaves preamble with the
/// answer. Which part is "the answer" is a convention, not something the
/// service guarantees, so the choice is left to an implementation of this trait.
pub trait PartSelector: Send + Sync {
    fn select(&self, candidates: &[Candidate]) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Last part of the last candidate.
    #[default]
    LastOfLast,
    /// Last part of the first candidate.
    LastOfFirst,
    /// Every part of the last candidate, concatenated.
    JoinLast,
}

impl PartSelector for SelectionStrategy {
    fn select(&self, candidates: &[Candidate]) -> Option<String> {
        match self {
            SelectionStrategy::LastOfLast => candidates.last()?.parts.last().cloned(),
            SelectionStrategy::LastOfFirst => candidates.first()?.parts.last().cloned(),
            SelectionStrategy::JoinLast => {
                let candidate = candidates.last()?;
                (!candidate.parts.is_empty()).then(|| candidate.parts.concat())
            }
        }
    }
}

impl FromStr for SelectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "last-of-last" => Ok(SelectionStrategy::LastOfLast),
            "last-of-first" => Ok(SelectionStrategy::LastOfFirst),
            "join-last" => Ok(SelectionStrategy::JoinLast),
            other => Err(format!("unknown part selector: {other}")),
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectionStrategy::LastOfLast => "last-of-last",
            SelectionStrategy::LastOfFirst => "last-of-first",
            SelectionStrategy::JoinLast => "join-last",
        };
        f.write_str(name)
    }
}

/// Selected text, trimmed. Nothing selectable, or only whitespace, is an empty response.
pub fn answer_text(selector: &dyn PartSelector, generation: &Generation) -> Result<String> {
    let text = selector
        .select(&generation.candidates)
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(Error::ModelEmptyResponse(
            "selected response part has no text".into(),
        ));
    }
    Ok(text)
}
