mod config;
mod console;
mod error;
mod http;
mod instrumentation;
mod llm;
mod pipeline;
mod search;
mod secrets;

use anyhow::{Context, Result};
use clap::Parser;

use config::Config;
use console::Console;
use pipeline::Pipeline;

#[derive(Parser)]
#[command(
    name = "statement-search",
    about = "Turn a business statement into a web search and summarize what comes back"
)]
struct Cli {
    /// Statement to research; read from stdin when omitted
    statement: Option<String>,

    /// Print per-stage latency and token usage after the summary
    #[arg(short, long)]
    verbose: bool,

    /// Print the run record as JSON after the summary
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    let pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;

    let stdin = std::io::stdin();
    let mut console = Console::new(stdin.lock(), std::io::stdout());

    let statement = match cli.statement {
        Some(statement) => statement,
        None => console
            .read_statement()
            .context("Failed to read statement")?
            .context("No statement given")?,
    };

    let run_log = match pipeline.run(&statement, &mut console).await {
        Ok(run_log) => run_log,
        Err(err) => {
            tracing::error!(
                stage = ?err.stage(),
                cause = %err.root(),
                "run failed"
            );
            return Err(err.into());
        }
    };

    if cli.verbose {
        console.write_line(&format!("\n{}", run_log.summary()))?;
    }
    if cli.json {
        let json =
            serde_json::to_string_pretty(&run_log).context("Failed to serialize run log")?;
        console.write_line(&json)?;
    }

    Ok(())
}
