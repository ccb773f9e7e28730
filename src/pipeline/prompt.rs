use serde::{Deserialize, Serialize};

use crate::search::SearchResult;

const SYNTHESIS_PREAMBLE: &str =
    "Given a statement, write the web search query that finds material answering it. Examples:\n";

const SYNTHESIS_REQUEST: &str = "Give the query for the statement = ";

/// Keeps the model from echoing the exemplar label in its answer.
pub const LABEL_SUPPRESSION: &str = " 'dont use 'query ='";

pub const SUMMARY_INSTRUCTION: &str = "Choose the most relevant 3 to 4 among these following \
     name description pairs and give me a long summary using the final selected";

/// A worked statement → query pair shown to the model before the real statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub statement: String,
    pub query: String,
}

impl FewShotExample {
    pub fn render(&self) -> String {
        format!("Statement: '{}', query = '{}'\n", self.statement, self.query)
    }
}

/// Exemplars in the given order, then `statement` verbatim, then the label suppression clause.
pub fn build_synthesis_prompt(examples: &[FewShotExample], statement: &str) -> String {
    let mut prompt = String::from(SYNTHESIS_PREAMBLE);
    for example in examples {
        prompt.push_str(&example.render());
    }
    prompt.push_str(SYNTHESIS_REQUEST);
    prompt.push_str(statement);
    prompt.push_str(LABEL_SUPPRESSION);
    prompt
}

/// One Name/Description block per result, in order, then the selection instruction.
/// The model does the picking.
pub fn build_summary_prompt(results: &[SearchResult]) -> String {
    let mut prompt = results
        .iter()
        .map(|r| format!("Name: {}\nDescription: {}\n", r.title, r.snippet))
        .collect::<String>();
    prompt.push_str(SUMMARY_INSTRUCTION);
    prompt
}
