use clap::Parser;
use seek::Result;
use seek::commands::{SeekOptions, run_seek};
use seek::config::{Config, default_config_dir};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "seek")]
#[command(about = "Ask questions about a project and a list of web pages")]
#[command(version)]
struct Cli {
    /// Question to answer before the interactive prompt
    #[arg(short = 'q', long)]
    query: Option<String>,
    /// Answer the -q question and exit without prompting
    #[arg(long, requires = "query")]
    once: bool,
    /// Chat model to answer with
    #[arg(short = 'm', long)]
    model: Option<String>,
    /// Number of context chunks retrieved per question
    #[arg(short = 'k', long = "results", value_name = "COUNT", value_parser = parse_result_count)]
    results: Option<usize>,
    /// Store the index on disk and reuse it on later runs
    #[arg(long)]
    persist: bool,
    /// Neither index nor record the conversation history
    #[arg(long)]
    no_history: bool,
    /// Directory holding seek.toml and the data files (default: current directory)
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> SeekOptions {
        SeekOptions {
            query: self.query.clone(),
            once: self.once,
            model: self.model.clone(),
            results: self.results,
            persist: self.persist,
            history: !self.no_history,
        }
    }
}

fn parse_result_count(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(count) => Ok(count),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir.clone() {
        Some(dir) => dir,
        None => default_config_dir().map_err(|e| seek::SeekError::Config(e.to_string()))?,
    };
    let config = Config::load(&config_dir)?;

    run_seek(&config, &cli.options()).await?;

    Ok(())
}
