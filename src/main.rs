mod cli;
mod error;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use sitemapper_cache::{Database, LastmodCache, MemoryStore, SqliteStore, StoreHandle};
use sitemapper_config::Config;
use sitemapper_core::{Context, Dispatcher, RegistryBuilder, Response, UrlBuilder, WarmEvent, WorkQueue, warm};
use sitemapper_render::Stylesheet;
use sitemapper_source::MemorySource;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    // Logs go to stderr so that XML on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;

    let source = MemorySource::from_json_file(&config.source.path).await.or_raise(|| ErrorKind::Source)?;
    let (store, database): (StoreHandle, _) = if config.cache.in_memory {
        (Arc::new(MemoryStore::new()), None)
    } else {
        let path = config.cache.resolved_path().ok_or_raise(|| ErrorKind::Cache)?;
        tracing::debug!(path = %path.display(), "Opening lastmod cache");
        let database = Database::connect(&path).await.or_raise(|| ErrorKind::Cache)?;
        (Arc::new(SqliteStore::from(&database)), Some(database))
    };

    let (queue, mut worker) = WorkQueue::new();
    let urls = UrlBuilder::new(&config.site.base_url, config.site.pretty_urls).or_raise(|| ErrorKind::Config)?;
    let ctx = Context::new(Arc::new(source), LastmodCache::new(store), Arc::new(queue), urls)
        .with_recompute_delay(config.sitemaps.recompute_delay())
        .with_cache_empty_pages(config.sitemaps.cache_empty_pages);
    let registry = RegistryBuilder::from_config(&config.sitemaps).or_raise(|| ErrorKind::Config)?.build();
    let mut dispatcher = Dispatcher::new(ctx.clone(), registry.clone());
    if config.sitemaps.stylesheets {
        dispatcher = dispatcher.with_stylesheets();
    }

    let outcome = execute(cli.command, &dispatcher).await;
    // A one-shot process has no time to wait out recompute delays; run
    // whatever the command scheduled before exiting.
    worker.drain(&ctx, &registry).await;
    if let Some(database) = database {
        database.close().await;
    }
    outcome
}

async fn execute(command: Command, dispatcher: &Dispatcher) -> Result<ExitCode> {
    match command {
        Command::Index => {
            let response = dispatcher.index().await.or_raise(|| ErrorKind::Sitemap)?;
            respond(response)
        },
        Command::Get { path } => {
            let response = dispatcher.handle(&path).await.or_raise(|| ErrorKind::Sitemap)?;
            respond(response)
        },
        Command::Warm => {
            let (mut computed, mut failed) = (0u64, 0u64);
            let mut events = std::pin::pin!(warm(dispatcher.context(), dispatcher.registry()));
            while let Some(event) = events.next().await {
                match event {
                    Ok(WarmEvent::Started) => tracing::info!("Warming lastmod cache"),
                    Ok(WarmEvent::DiscoveryComplete(pages)) => tracing::info!(pages, "Discovered sitemap pages"),
                    Ok(WarmEvent::Computed(key, lastmod)) => {
                        computed += 1;
                        tracing::debug!(%key, ?lastmod, "Computed lastmod");
                    },
                    Ok(WarmEvent::Complete) => tracing::info!(computed, failed, "Lastmod cache warm"),
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(error = ?e, "Could not compute lastmod");
                    },
                }
            }
            Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        },
        Command::Stylesheet { kind } => {
            let content = Stylesheet::from(kind).content().or_raise(|| ErrorKind::Sitemap)?;
            write_stdout(&content)?;
            Ok(ExitCode::SUCCESS)
        },
        Command::Robots => {
            write_stdout(format!("{}\n", dispatcher.robots_txt_line()).as_bytes())?;
            Ok(ExitCode::SUCCESS)
        },
    }
}

fn respond(response: Response) -> Result<ExitCode> {
    match response {
        Response::Xml(xml) => write_stdout(xml.as_bytes())?,
        Response::Stylesheet(content) => write_stdout(&content)?,
        Response::NotFound => {
            eprintln!("Not found: the sitemap page has no URLs");
            return Ok(ExitCode::FAILURE);
        },
        Response::PassThrough => {
            eprintln!("Not a sitemap route");
            return Ok(ExitCode::FAILURE);
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes).or_raise(|| ErrorKind::Output)?;
    stdout.flush().or_raise(|| ErrorKind::Output)
}
