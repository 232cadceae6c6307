use clap::Parser;
use seek::Result;
use seek::commands::generate_metadata;
use seek::config::{Config, default_config_dir};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "generate-metadata")]
#[command(about = "Describe and tag every HTML file in a directory")]
#[command(version)]
struct Cli {
    /// Directory to scan (default: paths.metadata_source_dir, `project/src`)
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,
    /// Chat model to use
    #[arg(short = 'm', long)]
    model: Option<String>,
    /// Directory holding seek.toml (default: current directory)
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => default_config_dir().map_err(|e| seek::SeekError::Config(e.to_string()))?,
    };
    let config = Config::load(&config_dir)?;

    generate_metadata(&config, cli.dir.as_deref(), cli.model.as_deref())?;

    Ok(())
}
