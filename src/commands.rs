use anyhow::{Context, Result, bail};
use console::style;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::chain::RetrievalChain;
use crate::config::{Config, OpenAiConfig};
use crate::content_store::ContentStore;
use crate::conversation::ConversationLog;
use crate::crawler::{WebScraper, read_url_list};
use crate::database::sqlite::Database;
use crate::embeddings::openai::EmbeddingClient;
use crate::index::{IndexBuilder, IndexOrigin};
use crate::llm::ChatClient;
use crate::loaders::{ConversationLoader, DirectoryLoader, LoaderSet, discover_project_loaders};
use crate::metadata::MetadataGenerator;
use crate::session::ChatSession;

/// Per-run choices made on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeekOptions {
    /// Answered before the first prompt
    pub query: Option<String>,
    /// Answer `query` and return without prompting
    pub once: bool,
    /// Overrides `openai.chat_model`
    pub model: Option<String>,
    /// Overrides `retrieval.results`
    pub results: Option<usize>,
    pub persist: bool,
    /// Read and write the conversation table
    pub history: bool,
}

/// Scrape, index and chat on the process's stdin/stdout
#[inline]
pub async fn run_seek(config: &Config, options: &SeekOptions) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_seek_with_io(config, options, stdin.lock(), stdout.lock()).await?;
    Ok(())
}

/// The whole pipeline with injectable input and output.
///
/// Returns the number of questions answered.
pub async fn run_seek_with_io<R, W>(
    config: &Config,
    options: &SeekOptions,
    input: R,
    mut output: W,
) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    if options.once && options.query.is_none() {
        bail!("--once needs a question given with -q");
    }

    let api_key = config.api_key()?;
    let openai = openai_config_with_model(config, options.model.as_deref())?;

    eprintln!(
        "{} {}",
        style("Persisting index:").bold(),
        style(options.persist).cyan()
    );

    scrape_and_store(config)?;

    let database = if options.history {
        Some(Database::initialize_at(&config.database_path()).await?)
    } else {
        eprintln!("{}", style("Not loading history").yellow());
        None
    };

    let embeddings = EmbeddingClient::from_config(&openai, api_key)?;
    let builder = IndexBuilder::new(embeddings, config.chunking.clone(), config.persist_path());
    let index = builder
        .get_index(options.persist, || async {
            eprintln!("{}", style("Loading all files into loaders...").yellow());
            let loaders = build_loader_set(config, database.as_ref());
            let documents = loaders.load_all().await?;
            eprintln!("Creating index of {} documents..", style(documents.len()).cyan());
            Ok(documents)
        })
        .await?;

    match index.origin() {
        IndexOrigin::Reused => eprintln!("{}", style("Reusing index...").green()),
        IndexOrigin::Built => eprintln!("{}", style("Index created").green()),
    }

    let k = options.results.unwrap_or(config.retrieval.results);
    let model = style(&openai.chat_model).cyan();
    eprintln!("Creating chain with model: {model}");
    eprintln!("Number of results: {}", style(k).cyan());

    let chat = ChatClient::from_config(&openai, api_key)?;
    let chain = RetrievalChain::new(index.as_retriever(k), chat);
    let history = database.map(|db| ConversationLog::new(db, &config.history));

    let session = ChatSession::new(&chain, history.as_ref());
    let answered = match options.query.as_deref() {
        Some(query) if options.once => {
            session.ask(query, &mut output).await?;
            1
        }
        query => {
            eprintln!("{}", style("Ready to chat!").bold().green());
            session.run(query, input, output).await?
        }
    };

    info!("Session ended after {} questions", answered);
    Ok(answered)
}

/// Fetch every URL in the list and store the extracted text as numbered pages
pub fn scrape_and_store(config: &Config) -> Result<Vec<PathBuf>> {
    let urls = read_url_list(config.urls_file_path())?;
    let count = style(urls.len()).cyan();
    eprintln!("Scraping data and storing {count} urls");

    let pages = WebScraper::new(&config.crawler).scrape(&urls)?;
    let stored = ContentStore::new(config.web_content_path()).store_pages(&pages)?;

    eprintln!(
        "{} {}",
        style("Stored data in").green(),
        style(config.web_content_path().display()).dim()
    );
    Ok(stored)
}

/// Project files, then the scraped pages, then (optionally) the conversation history
pub fn build_loader_set(config: &Config, database: Option<&Database>) -> LoaderSet {
    let mut loaders = LoaderSet::new();

    loaders.extend(discover_project_loaders(
        &config.project_path(),
        &config.loader.extensions,
        &config.loader.exclude_dir,
        &config.loader.html_extensions,
    ));
    loaders.push(Box::new(DirectoryLoader::new(
        config.web_content_path(),
        "txt",
        config.loader.workers,
    )));

    if let Some(database) = database {
        loaders.push(Box::new(ConversationLoader::new(database.clone())));
    }

    loaders
}

/// Write `<file>.html-metadata.md` for each HTML file in `dir`
/// (default: `paths.metadata_source_dir`)
#[inline]
pub fn generate_metadata(
    config: &Config,
    dir: Option<&Path>,
    model: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let api_key = config.api_key()?;
    let openai = openai_config_with_model(config, model)?;
    let source_dir = dir.map_or_else(|| config.metadata_source_path(), Path::to_path_buf);

    eprintln!(
        "Generating metadata for HTML files in {}",
        style(source_dir.display()).cyan()
    );

    let generator = MetadataGenerator::new(ChatClient::from_config(&openai, api_key)?);
    let written = generator
        .process_directory(&source_dir)
        .context("Metadata generation failed")?;

    eprintln!(
        "{} {} metadata files",
        style("✓ Wrote").green(),
        style(written.len()).cyan()
    );
    Ok(written)
}

fn openai_config_with_model(config: &Config, model: Option<&str>) -> Result<OpenAiConfig> {
    let mut openai = config.openai.clone();
    if let Some(model) = model {
        openai.set_chat_model(model.to_string())?;
    }
    Ok(openai)
}
