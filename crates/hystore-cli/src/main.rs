//! HyStore - sideloading app catalog
//!
//! Usage:
//!   hystore apps                 # List apps from all repositories
//!   hystore news                 # Show repository news
//!   hystore browse               # Search, pick and install interactively
//!   hystore install <id> ...     # Install an app
//!   hystore repo list|add|remove # Manage repositories

mod handoff;
mod interactive;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hystore_core::catalog::{SearchSortView, SortOption};
use hystore_core::context::AppContext;
use hystore_core::install::{InstallDispatcher, InstallMethod};
use hystore_core::news::NewsLink;
use hystore_core::registry::RegistryReport;
use hystore_core::service::Lookup;
use hystore_core::source::{AppRecord, NewsItem};

use crate::handoff::{CliNavigator, CliOpener};
use crate::interactive::{BrowseFlow, PrefilledBrowse};

#[derive(Parser)]
#[command(name = "hystore")]
#[command(about = "Sideloading app catalog", long_about = None)]
struct Cli {
    /// Config directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List apps from every repository
    Apps {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,

        /// Sort order (default, alphabetical)
        #[arg(long, default_value = "default")]
        sort: SortOption,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show news from every repository, newest first
    News {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show app details
    Show {
        /// Bundle identifier
        bundle_id: String,

        /// Repository URL listing the app
        #[arg(long)]
        source: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Install an app
    Install {
        /// Bundle identifier
        bundle_id: String,

        /// Repository URL listing the app
        #[arg(long)]
        source: String,

        /// Install method (overrides the saved preference)
        #[arg(short, long)]
        method: Option<InstallMethod>,
    },

    /// Search, pick and install an app interactively
    Browse {
        /// Initial search query (skips the search prompt)
        #[arg(short, long)]
        search: Option<String>,

        /// Sort order (skips the sort prompt)
        #[arg(long)]
        sort: Option<SortOption>,

        /// Install method (skips the method prompt)
        #[arg(short, long)]
        method: Option<InstallMethod>,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage repositories
    Repo(RepoArgs),

    /// Show or set the preferred install method
    Method {
        /// New preferred method
        method: Option<InstallMethod>,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
struct RepoArgs {
    #[command(subcommand)]
    command: RepoSubcommand,
}

#[derive(Subcommand)]
enum RepoSubcommand {
    /// List repositories
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Add a repository URL
    Add {
        url: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove every entry equal to a repository URL
    #[command(alias = "rm")]
    Remove {
        url: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Restore the default repositories
    Reset {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hystore=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let context = match cli.config_dir {
        Some(dir) => AppContext::with_config_dir(dir)?,
        None => AppContext::new()?,
    };

    run_cli(&context, cli.command)
}

fn run_cli(context: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Apps {
            search,
            sort,
            format,
        } => {
            block_on(run_apps(context, search, sort, format))?;
        }
        Commands::News { format } => {
            block_on(run_news(context, format))?;
        }
        Commands::Show {
            bundle_id,
            source,
            format,
        } => {
            block_on(run_show(context, &bundle_id, &source, format))?;
        }
        Commands::Install {
            bundle_id,
            source,
            method,
        } => {
            block_on(run_install(context, &bundle_id, &source, method))?;
        }
        Commands::Browse {
            search,
            sort,
            method,
            yes,
        } => {
            let prefilled = PrefilledBrowse {
                query: search,
                sort,
                method,
                yes,
            };
            block_on(run_browse(context, prefilled))?;
        }
        Commands::Repo(args) => {
            run_repo(context, args)?;
        }
        Commands::Method { method } => {
            run_method(context, method)?;
        }
    }

    Ok(())
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(future)
}

async fn run_apps(
    context: &AppContext,
    search: Option<String>,
    sort: SortOption,
    format: OutputFormat,
) -> Result<()> {
    let service = context.service()?;
    let snapshot = service.refresh().await;

    let mut view = SearchSortView::new(snapshot.catalog);
    view.set_sort(sort);
    if let Some(query) = search {
        view.set_query(query);
    }
    let records = view.records();

    match format {
        OutputFormat::Table => print_apps_table(&records),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

async fn run_news(context: &AppContext, format: OutputFormat) -> Result<()> {
    let service = context.service()?;
    let snapshot = service.refresh().await;

    match format {
        OutputFormat::Table => print_news_table(&snapshot.news),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*snapshot.news)?),
    }
    Ok(())
}

async fn run_show(
    context: &AppContext,
    bundle_id: &str,
    source: &str,
    format: OutputFormat,
) -> Result<()> {
    let app = fetch_app(context, bundle_id, source).await?;

    match format {
        OutputFormat::Table => print_app_details(&app),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&app)?),
    }
    Ok(())
}

async fn run_install(
    context: &AppContext,
    bundle_id: &str,
    source: &str,
    method: Option<InstallMethod>,
) -> Result<()> {
    let app = fetch_app(context, bundle_id, source).await?;
    let method = method.unwrap_or_else(|| context.preferences().preferred_method());

    install(&app, method).await
}

async fn run_browse(context: &AppContext, prefilled: PrefilledBrowse) -> Result<()> {
    let service = context.service()?;
    let snapshot = service.refresh().await;
    let preferred = context.preferences().preferred_method();

    let mut flow = BrowseFlow::new(SearchSortView::new(snapshot.catalog), preferred, prefilled);
    let Some(selection) = flow.collect()? else {
        return Ok(());
    };
    if !selection.confirmed {
        println!("Installation cancelled.");
        return Ok(());
    }

    install(&selection.app, selection.method).await
}

async fn fetch_app(context: &AppContext, bundle_id: &str, source: &str) -> Result<AppRecord> {
    let service = context.service()?;
    match service.fetch_app(bundle_id, source).await {
        Lookup::Found(app) => Ok(app),
        Lookup::NotFound => anyhow::bail!("App not found: '{}' in {}", bundle_id, source),
    }
}

async fn install(app: &AppRecord, method: InstallMethod) -> Result<()> {
    let dispatcher = InstallDispatcher::new(CliOpener, CliNavigator);
    let handoff = dispatcher.install(app, method).await?;

    println!("✓ Sent {} to {}", app.name, method.label());
    println!("  {}", handoff.url());
    Ok(())
}

fn run_repo(context: &AppContext, args: RepoArgs) -> Result<()> {
    let registry = context.registry();

    match args.command {
        RepoSubcommand::List { format } => {
            let repositories = registry.load();
            match format {
                OutputFormat::Table => print_repo_table(&repositories),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&repositories)?)
                }
            }
        }
        RepoSubcommand::Add { url, format } => {
            let report = registry.add(&url)?;
            match format {
                OutputFormat::Table => {
                    if report.changed {
                        println!("Added repository '{}'", url.trim());
                    } else {
                        println!("Nothing to add: the URL is blank");
                    }
                }
                OutputFormat::Json => print_repo_report(&report)?,
            }
        }
        RepoSubcommand::Remove { url, format } => {
            let report = registry.remove(&url)?;
            match format {
                OutputFormat::Table => {
                    if report.changed {
                        println!("Removed repository '{}'", url);
                    } else {
                        println!("Repository '{}' was not in the list", url);
                    }
                }
                OutputFormat::Json => print_repo_report(&report)?,
            }
        }
        RepoSubcommand::Reset { format } => {
            let report = registry.reset_to_default()?;
            match format {
                OutputFormat::Table => {
                    println!(
                        "Restored {} default repositories",
                        report.repositories.len()
                    );
                }
                OutputFormat::Json => print_repo_report(&report)?,
            }
        }
    }

    Ok(())
}

fn run_method(context: &AppContext, method: Option<InstallMethod>) -> Result<()> {
    let preferences = context.preferences();

    if let Some(method) = method {
        preferences.set_preferred_method(method)?;
        println!("Preferred install method: {}", method.label());
        return Ok(());
    }

    let current = preferences.preferred_method();
    for method in InstallMethod::ALL {
        let marker = if method == current { "*" } else { " " };
        println!("{} {:<12} {}", marker, method.as_str(), method.label());
    }
    Ok(())
}

fn print_apps_table(records: &[&AppRecord]) {
    if records.is_empty() {
        println!("No apps found.");
        return;
    }

    println!("{:<32} {:<12} {:<24} Source", "Name", "Version", "Developer");
    println!("{}", "-".repeat(90));

    for app in records {
        println!(
            "{:<32} {:<12} {:<24} {}",
            truncate(&app.name, 32),
            truncate(app.latest_version().unwrap_or("-"), 12),
            truncate(app.developer_name.as_deref().unwrap_or("-"), 24),
            app.source_name
        );
    }
    println!();
    println!("{} apps", records.len());
}

fn print_news_table(news: &[NewsItem]) {
    if news.is_empty() {
        println!("No news.");
        return;
    }

    for item in news {
        println!("{:<12} {}", truncate(&item.date, 10), item.title);
        if let Some(caption) = &item.caption {
            println!("{:<12} {}", "", caption);
        }
        match item.link() {
            NewsLink::App {
                bundle_identifier, ..
            } => println!("{:<12} app: {}", "", bundle_identifier),
            NewsLink::External(url) => println!("{:<12} {}", "", url),
            NewsLink::None => {}
        }
    }
}

fn print_app_details(app: &AppRecord) {
    println!("{}", app.name);
    if let Some(subtitle) = &app.subtitle {
        println!("{}", subtitle);
    }
    println!();
    println!("Bundle ID: {}", app.bundle_identifier);
    if let Some(developer) = &app.developer_name {
        println!("Developer: {}", developer);
    }
    if let Some(version) = app.latest_version() {
        println!("Version:   {}", version);
    }
    if let Some(size) = app.display_size() {
        println!("Size:      {}", size);
    }
    println!("Source:    {} ({})", app.source_name, app.source_url);
    println!(
        "Download:  {}",
        app.effective_download_url().unwrap_or("(none)")
    );
    if let Some(description) = &app.localized_description {
        println!();
        println!("{}", description);
    }
    if let Some(screenshots) = app.screenshot_urls.as_deref()
        && !screenshots.is_empty()
    {
        println!();
        println!("Screenshots:");
        for shot in screenshots {
            println!("  {}", shot.url());
        }
    }
}

fn print_repo_table(repositories: &[String]) {
    if repositories.is_empty() {
        println!("No repositories configured.");
        println!("Add one with: hystore repo add <url>");
        println!("Or restore the defaults with: hystore repo reset");
        return;
    }

    for (index, url) in repositories.iter().enumerate() {
        println!("{:>3}  {}", index + 1, url);
    }
}

fn print_repo_report(report: &RegistryReport) -> Result<()> {
    let output = serde_json::json!({
        "repositories": report.repositories,
        "changed": report.changed,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
