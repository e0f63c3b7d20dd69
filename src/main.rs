mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, PopularArgs, ReadArgs, SearchArgs};
use std::time::Duration;
use storytime::{
    Book, CatalogClient, CatalogConfig, ContentStatus, LaunchTarget, ReaderConfig, ReaderHandle,
    ReaderView, Result, StorytimeError, TextFetcher, TextResource,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let timeout = Duration::from_secs(cli.timeout);
    let catalog_config = CatalogConfig {
        timeout,
        ..CatalogConfig::with_base_url(&cli.api_url).context("Invalid --api-url")?
    };

    let result = match &cli.command {
        Commands::Popular(args) => handle_popular_command(args, catalog_config).await,
        Commands::Search(args) => handle_search_command(args, catalog_config).await,
        Commands::Read(args) => handle_read_command(args, catalog_config, timeout).await,
    };

    if let Err(e) = result {
        error!("Operation failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn handle_popular_command(args: &PopularArgs, config: CatalogConfig) -> Result<()> {
    let catalog = CatalogClient::new(config)?;
    let books = catalog.popular(Some(args.limit)).await?;
    info!("Fetched {} popular books", books.len());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }

    println!("\n=== Most popular books ===");
    for book in &books {
        print_book(book, false);
    }
    Ok(())
}

async fn handle_search_command(args: &SearchArgs, config: CatalogConfig) -> Result<()> {
    let catalog = CatalogClient::new(config)?;
    let books = catalog.search(&args.query, Some(args.limit)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }

    if books.is_empty() {
        println!("No results found");
        return Ok(());
    }

    println!("\n=== Results for '{}' ===", args.query);
    for book in &books {
        print_book(book, true);
    }
    Ok(())
}

async fn handle_read_command(
    args: &ReadArgs,
    catalog_config: CatalogConfig,
    timeout: Duration,
) -> Result<()> {
    let resource = match resolve_resource(args, catalog_config).await? {
        Some(resource) => resource,
        None => return Ok(()),
    };

    let config = ReaderConfig {
        page_size: args.page_size,
        timeout,
    };
    let handle = ReaderHandle::new(TextFetcher::new(&config)?, config)?;

    println!("Loading...");
    tokio::select! {
        _ = handle.open(resource) => {}
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted while loading");
            handle.close().await;
            return Ok(());
        }
    }

    handle.go_to_page(page_index(args.page)).await;
    let view = handle.view().await;
    print_view(&view);

    if args.interactive && view.status == ContentStatus::Text {
        run_interactive(&handle).await?;
    }

    handle.close().await;
    Ok(())
}

/// Pick the text to read. `None` means the book can only be opened elsewhere.
async fn resolve_resource(
    args: &ReadArgs,
    catalog_config: CatalogConfig,
) -> Result<Option<TextResource>> {
    if let Some(url) = &args.url {
        return Ok(Some(TextResource::parse(url)?));
    }

    let id = args.book.ok_or_else(|| anyhow::anyhow!("Either --book or --url is required"))?;
    let book = CatalogClient::new(catalog_config)?.book(id).await?;

    match book.launch_target() {
        LaunchTarget::Reader(resource) => {
            info!("Reading '{}' by {}", book.title, book.author_names());
            Ok(Some(resource))
        }
        LaunchTarget::External(link) => {
            println!("'{}' has no plain text edition. Open it at: {}", book.title, link);
            Ok(None)
        }
        LaunchTarget::Unavailable => Err(StorytimeError::NoReadableFormat { id }),
    }
}

async fn run_interactive<S: storytime::TextSource>(handle: &ReaderHandle<S>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        let change = match (parts.next(), parts.next()) {
            (Some("n"), _) => handle.next_page().await,
            (Some("p"), _) => handle.previous_page().await,
            (Some("g"), Some(page)) => match page.parse::<i64>() {
                Ok(page) => handle.go_to_page(page_index(page)).await,
                Err(_) => {
                    println!("Not a page number: {}", page);
                    continue;
                }
            },
            (Some("q"), _) => break,
            _ => {
                println!("Commands: n (next), p (previous), g <page>, q (quit)");
                continue;
            }
        };

        debug!("Page change: {:?}", change);
        print_view(&handle.view().await);
    }

    Ok(())
}

/// 1-based page number from the command line to a 0-based index.
fn page_index(page: i64) -> i64 {
    page.saturating_sub(1)
}

fn print_book(book: &Book, with_subjects: bool) {
    println!("\n[{}] {}", book.id, book.title);
    println!("  By: {}", book.author_names());
    println!("  Downloads: {}", book.download_count);
    if with_subjects && !book.subjects.is_empty() {
        println!("  Subjects: {}", book.subjects.join(", "));
    }
    match book.launch_target() {
        LaunchTarget::Reader(_) => println!("  Read with: storytime read --book {}", book.id),
        LaunchTarget::External(link) => println!("  Open: {}", link),
        LaunchTarget::Unavailable => println!("  No readable format"),
    }
}

fn print_view(view: &ReaderView) {
    println!("\n=== {} ===\n", view.page_label());
    println!("{}", view.current_page_content);

    let previous = if view.has_previous { "[p] Previous" } else { "    Previous" };
    let next = if view.has_next { "[n] Next" } else { "    Next" };
    println!("\n{}    {}", previous, next);
}
