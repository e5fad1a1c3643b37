//! repogest CLI binary.
//!
//! Ingests a GitHub repository or local directory and writes the assembled
//! LLM-ready text artifact to a file or stdout.

use anyhow::Context;
use clap::Parser;
use repogest::assemble::{AssemblyOutcome, StreamingAssembler};
use repogest::cancel::CancellationToken;
use repogest::config::IngestConfig;
use repogest::error::IngestError;
use repogest::github::GithubClient;
use repogest::ingest::{LocalTreeBuilder, RemoteTreeBuilder};
use repogest::loader::{ContentLoader, ContentSource};
use repogest::logging::init_logging;
use repogest::tree::FileTree;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::info;

/// repogest - turn a repository into a single LLM-ready text artifact
#[derive(Parser)]
#[command(name = "repogest")]
#[command(about = "Ingest a GitHub repository or local directory into one text artifact")]
#[command(version)]
struct Cli {
    /// Repository URL (https://github.com/owner/repo), owner/repo shorthand,
    /// or a local directory path
    source: String,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Branch to ingest (remote sources; defaults to the default branch)
    #[arg(long)]
    branch: Option<String>,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simultaneous in-flight content fetches
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Walk Python virtual-environment directories instead of skipping them
    #[arg(long)]
    include_venv: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<IngestConfig, IngestError> {
    let mut config = match &cli.config {
        Some(path) => IngestConfig::load_from_file(path)?,
        None => IngestConfig::from_env(),
    };
    if let Some(max_concurrent) = cli.max_concurrent {
        config.max_concurrent = max_concurrent.max(1);
    }
    if cli.include_venv {
        config.policy.include_virtual_envs = true;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        config.logging.output = output.clone();
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
        config.logging.output = "file".to_string();
    }
    Ok(config)
}

/// A source is remote when it is an explicit URL or GitHub shorthand;
/// anything naming an existing path is a local walk.
fn is_remote(source: &str) -> bool {
    if source.starts_with("http://")
        || source.starts_with("https://")
        || source.contains("github.com")
    {
        return true;
    }
    !Path::new(source).exists()
}

async fn discover(
    cli: &Cli,
    config: &IngestConfig,
    cancel: &CancellationToken,
) -> Result<(FileTree, ContentSource), IngestError> {
    if is_remote(&cli.source) {
        let client = Arc::new(GithubClient::new(
            config.github_token.clone(),
            config.request_timeout(),
        )?);
        let builder = RemoteTreeBuilder::new(
            client.clone(),
            cli.source.clone(),
            cli.branch.clone(),
            config.clone(),
            cancel.clone(),
        );
        let (repo, tree) = builder.discover_with_repo().await?;
        Ok((tree, ContentSource::Remote { api: client, repo }))
    } else {
        let root = dunce::canonicalize(&cli.source).map_err(|source| IngestError::Io {
            path: PathBuf::from(&cli.source),
            source,
        })?;
        let builder = LocalTreeBuilder::new(root.clone(), config.clone(), cancel.clone());
        let tree = builder.build().await?;
        Ok((tree, ContentSource::Local { root }))
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli).context("failed to load configuration")?;
    init_logging(&config.logging).context("failed to initialize logging")?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let (mut tree, source) = discover(&cli, &config, &cancel).await?;
    info!(
        files = tree.node(tree.root()).total_file_count,
        tokens = tree.node(tree.root()).total_token_count,
        "discovery complete"
    );

    let loader = ContentLoader::new(source, config.max_file_size);
    let assembler = StreamingAssembler::new(loader, config.max_concurrent, cancel.clone());
    let outcome = assembler
        .assemble(&mut tree, |progress| {
            info!(
                completed = progress.completed,
                total = progress.total,
                "{}",
                progress.status()
            );
        })
        .await;

    let output = match outcome {
        AssemblyOutcome::Complete(output) => output,
        AssemblyOutcome::Cancelled => return Err(IngestError::Cancelled.into()),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &output.document)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), files = output.files_rendered, "artifact written");
        }
        None => print!("{}", output.document),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        let cancelled = e
            .downcast_ref::<IngestError>()
            .is_some_and(IngestError::is_cancelled);
        if cancelled {
            eprintln!("Cancelled");
            process::exit(130);
        }
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
