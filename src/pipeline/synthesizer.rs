use std::sync::Arc;

use crate::error::Result;
use crate::llm::selector::answer_text;
use crate::llm::{Generation, PartSelector, TextGenerator};

pub struct Synthesizer {
    llm: Arc<dyn TextGenerator>,
    selector: Arc<dyn PartSelector>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn TextGenerator>, selector: Arc<dyn PartSelector>) -> Self {
        Self { llm, selector }
    }

    pub async fn synthesize(&self, summary_prompt: &str) -> Result<(String, Generation)> {
        tracing::debug!(prompt = %summary_prompt, "summary prompt");

        let response = self.llm.generate(summary_prompt).await?;
        let summary = answer_text(self.selector.as_ref(), &response)?;

        Ok((summary, response))
    }
}
