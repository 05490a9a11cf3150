//! Command line interface for operating the circular board. Supports
//! initialization, seeding, ingesting drafts, serving the HTTP API,
//! minting credentials, and running the polling feed client.

mod auth;
mod config;
mod error;
mod feed;
mod model;
mod seed;
mod server;
mod storage;
mod views;

use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::Settings;
use storage::Store;

/// Command line interface entry point.
#[derive(Parser)]
#[command(
    name = "circlr",
    author,
    version,
    about = "File-backed campus circular board"
)]
struct Cli {
    /// Path to the `.env` configuration file.
    #[arg(long, default_value = ".env")]
    env: String,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the directory tree at `STORE_ROOT`.
    Init,
    /// Insert the built-in sample circulars.
    Seed,
    /// Ingest one or more circular draft JSON files.
    Ingest {
        /// Paths to draft JSON files to insert.
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Rebuild index files from the stored documents.
    Reindex,
    /// Write a draft JSON pre-filled from an authoring template.
    Compose {
        /// Template name: custom, exam-notice, event-notice, fee-notice.
        #[arg(long, default_value = "custom")]
        template: String,
        /// Output path; prints to stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Mint an authentication token for a caller.
    Token {
        /// Caller display name.
        #[arg(long)]
        name: String,
        /// Caller role: admin or student.
        #[arg(long)]
        role: String,
    },
    /// Launch the HTTP API.
    Serve,
    /// Poll the API once and print feed statistics.
    Feed {
        /// Keep polling on the configured interval until interrupted.
        #[arg(long)]
        watch: bool,
    },
}

/// Execute the selected CLI subcommand.
async fn run(cli: Cli) -> anyhow::Result<()> {
    ensure_env_file(&cli.env)?;
    let cfg = Settings::from_env(&cli.env)?;
    let store = Store::new(cfg.store_root.clone());
    match cli.command {
        Commands::Init => {
            // Create the on-disk directory structure.
            store.init()?;
        }
        Commands::Seed => {
            store.init()?;
            for draft in seed::sample_circulars() {
                let circular = store.insert(draft)?;
                println!("seeded {}: {}", circular.id, circular.title);
            }
        }
        Commands::Ingest { files } => {
            // Validate and insert each draft file.
            for f in files {
                let data = fs::read_to_string(&f).with_context(|| format!("reading {f}"))?;
                let draft: model::CircularDraft = serde_json::from_str(&data)?;
                let circular = store.insert(draft)?;
                println!("ingested {}: {}", circular.id, circular.title);
            }
        }
        Commands::Reindex => {
            // Rebuild classification indexes from existing documents.
            store.reindex()?;
        }
        Commands::Compose { template, out } => {
            let template: model::NoticeTemplate =
                template.parse().map_err(anyhow::Error::msg)?;
            let json = serde_json::to_string_pretty(&template.draft())?;
            match out {
                Some(path) => {
                    fs::write(&path, json)?;
                    println!("wrote {} draft to {}", template.name(), path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Token { name, role } => {
            let role: model::Role = role.parse().map_err(anyhow::Error::msg)?;
            println!("{}", auth::mint(&cfg.auth_secret, &name, role));
        }
        Commands::Serve => {
            store.init()?;
            let addr: SocketAddr = cfg.bind_http.as_str().parse()?;
            server::serve_http(
                addr,
                store,
                cfg.auth_secret.clone(),
                std::future::pending(),
            )
            .await?;
        }
        Commands::Feed { watch } => {
            let feed = feed::Feed::new(cfg.api_url.clone());
            feed.refresh().await?;
            print_feed_summary(&feed);
            if watch {
                // Hand the cache to a cancellable poller until interrupted.
                let handle = feed::spawn(feed.clone(), cfg.poll_interval);
                tokio::signal::ctrl_c().await?;
                handle.stop().await;
                print_feed_summary(&feed);
            }
        }
    }
    Ok(())
}

/// Print aggregate statistics for the cached feed snapshot.
fn print_feed_summary(feed: &feed::Feed) {
    let list = feed.snapshot();
    println!("{} circulars, {} unread", list.len(), feed.unread_count());
    println!(
        "reach: {}%, average read rate: {}%",
        views::reach(&list),
        views::avg_read_rate(&list)
    );
    for (priority, count) in views::priority_counts(&list) {
        println!("  {}: {}", priority.as_str(), count);
    }
    for (department, count) in views::department_counts(&list) {
        println!("  {}: {}", department, count);
    }
    let all = views::ViewFilter::default();
    for circular in views::filter(&list, &all) {
        println!(
            "- [{}] {} ({}% read)",
            circular.priority.as_str(),
            circular.title,
            views::read_percentage(circular)
        );
    }
    let archived = views::archive(&list, &all, &feed.read_ids(), chrono::Utc::now());
    println!("{} archived", archived.len());
}

/// Create a default `.env` file if one is not already present at `path`.
fn ensure_env_file(path: &str) -> anyhow::Result<()> {
    let env_path = Path::new(path);
    if env_path.exists() {
        return Ok(());
    }
    if let Some(parent) = env_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let base_dir = match env_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let store_root = base_dir.join("circlr-data");
    let mut content = String::new();
    content.push_str(&format!("STORE_ROOT={}\n", display_path(&store_root)));
    content.push_str("BIND_HTTP=127.0.0.1:7070\n");
    content.push_str(&format!(
        "AUTH_SECRET={}\n",
        uuid::Uuid::new_v4().simple()
    ));
    content.push_str("API_URL=http://127.0.0.1:7070\n");
    content.push_str("POLL_INTERVAL_SECS=60\n");
    fs::write(env_path, content)?;
    Ok(())
}

fn display_path(path: &PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    run(cli).await
}
