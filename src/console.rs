use std::io::{self, BufRead, Write};

use crate::pipeline::RunSink;
use crate::search::ResultSet;

/// Line-oriented front end over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prompts for and reads one line. `None` when the input is exhausted or blank.
    pub fn read_statement(&mut self) -> io::Result<Option<String>> {
        writeln!(self.output, "Enter a sentence:")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let statement = line.trim();
        Ok((!statement.is_empty()).then(|| statement.to_string()))
    }

    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }
}

impl<R: BufRead, W: Write> RunSink for Console<R, W> {
    fn query_synthesized(&mut self, query: &str) -> io::Result<()> {
        writeln!(self.output, "Search query: {query}\n")
    }

    fn results_fetched(&mut self, results: &ResultSet) -> io::Result<()> {
        for result in &results.results {
            writeln!(
                self.output,
                "Name: {}\nURL: {}\nDescription: {}\n",
                result.title, result.url, result.snippet
            )?;
        }
        Ok(())
    }

    fn summarized(&mut self, summary: &str) -> io::Result<()> {
        writeln!(self.output, "Summary:\n{summary}")?;
        self.output.flush()
    }
}
