use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use streaming_catalog::domain::Brand;
use streaming_catalog::{backup, browse, logging, CatalogError, Config, StreamingCatalog, Viewer};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "streaming_catalog")]
#[command(about = "Catalog, account and ranking store for the streaming front end")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file. Falls back to $CATALOG_CONFIG, then config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog items
    List {
        /// Include hidden items
        #[arg(long)]
        admin: bool,
        /// Movies, Series, Trending or a genre
        #[arg(long)]
        category: Option<String>,
    },
    /// Search item names
    Search {
        query: String,
        #[arg(long)]
        admin: bool,
    },
    /// Top items of one brand
    Top {
        brand: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Home rows of one brand, personalised for the signed-in session
    Home { brand: String },
    /// Record a view
    View {
        id: String,
        /// Viewer account, updates continue-watching
        #[arg(long)]
        email: Option<String>,
    },
    Register {
        name: String,
        email: String,
        password: String,
    },
    Login {
        identifier: String,
        password: String,
        /// Keep the secret in the quick-login cache
        #[arg(long)]
        remember: bool,
    },
    /// Sign out the current session
    Logout,
    /// Show the signed-in session
    Whoami,
    /// Show the activity ledger
    Logs {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Empty the activity ledger
    ClearLogs,
    /// Admin analytics report
    Report,
    /// Export a backup snapshot
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show an account's inbox
    Inbox { email: String },
    /// Send a message to an account
    Send {
        to: String,
        subject: String,
        body: String,
        #[arg(long, default_value = "Admin")]
        from: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn config_path(cli_value: Option<PathBuf>) -> PathBuf {
    cli_value
        .or_else(|| std::env::var("CATALOG_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

fn admin_viewer(admin: bool) -> Viewer {
    if admin {
        Viewer::Admin
    } else {
        Viewer::Guest
    }
}

async fn run(command: Commands, app: &StreamingCatalog) -> Result<()> {
    match command {
        Commands::List { admin, category } => {
            let items = app.catalog.list_for(admin_viewer(admin))?;
            let items = match category {
                Some(c) => browse::filter_by_category(&items, &c),
                None => items,
            };
            for item in &items {
                let hidden = if item.is_hidden { " (hidden)" } else { "" };
                println!("{:<38} {:<12} {}{}", item.id, item.brand.as_str(), item.name, hidden);
            }
        }
        Commands::Search { query, admin } => {
            for item in app.catalog.search_for(admin_viewer(admin), &query)? {
                println!("{:<38} {}", item.id, item.name);
            }
        }
        Commands::Top { brand, limit } => {
            let brand = Brand::parse(&brand)
                .with_context(|| format!("unknown brand '{}'", brand))?;
            let counts = app.ranking.get_counts()?;
            for (rank, item) in app.ranking.top_for(Viewer::Guest, brand, limit)?.iter().enumerate() {
                let views = counts.get(&item.id).copied().unwrap_or(0);
                let trending = if item.is_trending { " *" } else { "" };
                println!("{:>2}. {} ({} views){}", rank + 1, item.name, views, trending);
            }
        }
        Commands::Home { brand } => {
            let brand = Brand::parse(&brand)
                .with_context(|| format!("unknown brand '{}'", brand))?;
            let session = app.sessions.current_session()?;
            let viewer = Viewer::from_session(session.as_ref());
            let items = browse::brand_items(&app.catalog.list_for(viewer)?, brand);
            let shelves = match &session {
                Some(s) => {
                    let continue_watching = app.sessions.get_continue_watching(&s.email)?;
                    let watchlist = app.sessions.get_watchlist(&s.email)?;
                    browse::home_shelves(
                        &items,
                        Some(browse::PersonalLists {
                            continue_watching: &continue_watching,
                            watchlist: &watchlist,
                        }),
                    )
                }
                None => browse::home_shelves(&items, None),
            };
            for shelf in &shelves {
                let names: Vec<&str> = shelf.items.iter().map(|i| i.name.as_str()).collect();
                println!("{}: {}", shelf.title, names.join(", "));
            }
        }
        Commands::View { id, email } => {
            let count = app.ranking.record_view(&id, email.as_deref())?;
            println!("{} now has {} views", id, count);
        }
        Commands::Register { name, email, password } => {
            let session = app.sessions.register(&name, &email, &password)?;
            print_json(&session)?;
        }
        Commands::Login { identifier, password, remember } => {
            let session = app.sessions.login(&identifier, &password, remember).await?;
            print_json(&session)?;
        }
        Commands::Logout => match app.sessions.logout()? {
            Some(session) => println!("Signed out {}", session.email),
            None => println!("No one is signed in"),
        },
        Commands::Whoami => match app.sessions.current_session()? {
            Some(session) => print_json(&session)?,
            None => println!("No one is signed in"),
        },
        Commands::Logs { limit } => {
            for entry in app.ledger.recent(limit)? {
                println!(
                    "{} {:<8} {} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    format!("{:?}", entry.kind).to_uppercase(),
                    entry.details,
                    entry.user_email.unwrap_or_default()
                );
            }
        }
        Commands::ClearLogs => {
            app.ledger.clear()?;
            println!("Activity ledger cleared");
        }
        Commands::Report => {
            print_json(&app.analytics.intelligence_report().await?)?;
        }
        Commands::Export { out } => {
            let snapshot = backup::export_snapshot(&app.store)?;
            let json = serde_json::to_string_pretty(&snapshot)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing backup to {}", path.display()))?;
                    println!("Backup written to {} ({})", path.display(), snapshot.checksum);
                }
                None => println!("{}", json),
            }
        }
        Commands::Inbox { email } => {
            for message in app.inbox.list_for(&email).await? {
                let marker = if message.is_read { " " } else { "*" };
                println!("{} {} | {} | {}", marker, message.from_name, message.subject, message.id);
            }
        }
        Commands::Send { to, subject, body, from } => {
            let message = app.inbox.send(&to, &from, &subject, &body).await?;
            println!("Sent {}", message.id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(&config_path(cli.config)).context("loading configuration")?;
    let _log_guard = logging::init_logging(&config.logging);
    info!("Starting streaming_catalog");

    let app = StreamingCatalog::from_config(&config)?;
    if let Err(e) = run(cli.command, &app).await {
        if let Some(err) = user_facing(&e) {
            eprintln!("{}", err);
            return Ok(ExitCode::FAILURE);
        }
        error!("Command failed: {:#}", e);
        return Err(e);
    }
    Ok(ExitCode::SUCCESS)
}

/// Errors reported as a plain message and a failure code rather than a trace.
fn user_facing(e: &anyhow::Error) -> Option<&CatalogError> {
    e.downcast_ref::<CatalogError>().filter(|err| err.is_user_facing())
}
