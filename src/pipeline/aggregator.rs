use crate::search::{ResultSet, SearchResult};

use super::prompt::build_summary_prompt;

/// Bounds the result set handed to the summary prompt. Provider order is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    max_results: Option<usize>,
}

impl Aggregator {
    pub fn new(max_results: Option<usize>) -> Self {
        Self { max_results }
    }

    pub fn candidates<'a>(&self, results: &'a ResultSet) -> &'a [SearchResult] {
        match self.max_results {
            Some(limit) if limit < results.len() => &results.results[..limit],
            _ => &results.results,
        }
    }

    pub fn summary_prompt(&self, results: &ResultSet) -> String {
        build_summary_prompt(self.candidates(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_set(n: usize) -> ResultSet {
        ResultSet {
            results: (0..n)
                .map(|i| SearchResult {
                    title: format!("title {i}"),
                    snippet: format!("snippet {i}"),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn unbounded_keeps_every_result() {
        let results = result_set(7);
        assert_eq!(Aggregator::default().candidates(&results).len(), 7);
    }

    #[test]
    fn limit_keeps_the_leading_results() {
        let results = result_set(7);
        let kept = Aggregator::new(Some(3)).candidates(&results);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[2].title, "title 2");

        let prompt = Aggregator::new(Some(3)).summary_prompt(&results);
        assert!(prompt.contains("Name: title 2"));
        assert!(!prompt.contains("Name: title 3"));
    }

    #[test]
    fn limit_above_result_count_is_harmless() {
        let results = result_set(2);
        assert_eq!(Aggregator::new(Some(10)).candidates(&results).len(), 2);
    }
}
