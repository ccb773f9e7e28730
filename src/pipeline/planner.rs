use std::sync::Arc;

use crate::error::Result;
use crate::llm::selector::answer_text;
use crate::llm::{Generation, PartSelector, TextGenerator};

use super::prompt::{build_synthesis_prompt, FewShotExample};

/// Turns a statement into a single search query using few-shot prompting.
pub struct QueryPlanner {
    llm: Arc<dyn TextGenerator>,
    selector: Arc<dyn PartSelector>,
    examples: Vec<FewShotExample>,
}

impl QueryPlanner {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        selector: Arc<dyn PartSelector>,
        examples: Vec<FewShotExample>,
    ) -> Self {
        Self {
            llm,
            selector,
            examples,
        }
    }

    pub async fn plan(&self, statement: &str) -> Result<(String, Generation)> {
        let prompt = build_synthesis_prompt(&self.examples, statement);
        tracing::debug!(%prompt, "query synthesis prompt");

        let response = self.llm.generate(&prompt).await?;
        let query = answer_text(self.selector.as_ref(), &response)?;

        Ok((query, response))
    }
}
