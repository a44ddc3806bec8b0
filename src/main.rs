use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

mod backup;
mod blacklist;
mod canonical;
mod config;
mod debounce;
mod events;
mod matcher;
mod session;
mod storage;
mod store;
mod validity;

use backup::ImportError;
use config::TrackerConfig;
use events::LinkCandidate;
use storage::{JsonFileStorage, StorageBackend, KEY_HIGHLIGHT_ENABLED};
use store::VisitedStore;

#[derive(Parser)]
#[command(name = "visited-links")]
#[command(about = "Persistent visited-link tracking with fuzzy matching and JSON backup", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one link activation and persist it
    Record {
        /// The activated URL
        url: String,

        /// Link title, if the anchor carried one
        #[arg(long)]
        title: Option<String>,

        /// Alt text of the image inside the anchor, if any
        #[arg(long)]
        alt: Option<String>,
    },

    /// Decide whether one link counts as visited (exit code 0 = visited)
    Check {
        url: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        alt: Option<String>,
    },

    /// Batch render pass: read a JSON array of links, print one decision each
    Render {
        /// Read candidates from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Long-running session: read page events from stdin, flush debounced
    Watch {
        /// URL of the hosting page (gates excluded hosts, records the load)
        #[arg(long)]
        page_url: Option<String>,
    },

    /// Export the visited data as a timestamped JSON backup file
    Backup {
        /// Directory for the backup file
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Merge a backup file into the visited data
    Import {
        /// Path to the backup JSON file
        file: PathBuf,

        /// Replace the stored data instead of merging
        #[arg(long)]
        replace: bool,
    },

    /// Remove blacklisted titles/alts from the stored data
    Clean,

    /// Toggle the highlight style on or off
    Toggle,

    /// Print the stored data as pretty JSON
    Show,

    /// Print the highlight CSS block for the styling collaborator
    Style,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = TrackerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Record { url, title, alt } => {
            let backend = JsonFileStorage::new(config.storage_path()?);
            let mut store = VisitedStore::load(&backend, &config)?;
            if store.record(&url, title.as_deref(), alt.as_deref()) {
                // a one-shot process has no quiet period to wait out
                match store.flush(&backend) {
                    Ok(_) => info!("✅ recorded {}", url),
                    Err(e) => warn!("⚠️  could not persist {}: {:?}", url, e),
                }
            } else {
                info!("⏭️  nothing new to record for {}", url);
            }
        }

        Commands::Check { url, title, alt } => {
            let backend = JsonFileStorage::new(config.storage_path()?);
            let store = VisitedStore::load(&backend, &config)?;
            let candidate = LinkCandidate {
                href: url,
                title,
                alt,
            };
            if matcher::is_visited(&store, &candidate) {
                println!("visited");
            } else {
                println!("not visited");
                std::process::exit(1);
            }
        }

        Commands::Render { file } => {
            let backend = JsonFileStorage::new(config.storage_path()?);
            let store = VisitedStore::load(&backend, &config)?;
            let highlight_enabled = backend.load_flag(KEY_HIGHLIGHT_ENABLED, true)?;

            let raw = match file {
                Some(path) => std::fs::read_to_string(&path)?,
                None => {
                    use std::io::Read;
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            let links: Vec<LinkCandidate> = serde_json::from_str(&raw)?;
            let decisions = matcher::render_pass(&store, &links, highlight_enabled);
            println!("{}", serde_json::to_string(&events::RenderDecisions { decisions })?);
        }

        Commands::Watch { page_url } => {
            info!("👀 starting watch session");
            session::run(&config, page_url.as_deref()).await?;
        }

        Commands::Backup { output_dir } => {
            let backend = JsonFileStorage::new(config.storage_path()?);
            let store = VisitedStore::load(&backend, &config)?;
            let path = backup::export_snapshot(&store, &output_dir)?;
            info!("✅ backup written to {:?}", path);
        }

        Commands::Import { file, replace } => {
            let backend = JsonFileStorage::new(config.storage_path()?);
            let mut store = VisitedStore::load(&backend, &config)?;
            let raw = std::fs::read_to_string(&file)?;
            match backup::import_snapshot(&mut store, &backend, &raw, replace) {
                Ok(stats) if stats.total_added() == 0 && !replace => {
                    info!("✅ import complete: nothing new");
                }
                Ok(stats) => {
                    info!(
                        "✅ import complete: {} new links, {} new titles, {} new alts",
                        stats.added_links, stats.added_titles, stats.added_alts
                    );
                }
                Err(e @ ImportError::MalformedFormat) | Err(e @ ImportError::Parse(_)) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Clean => {
            let backend = JsonFileStorage::new(config.storage_path()?);
            let mut store = VisitedStore::load(&backend, &config)?;
            let report = store.clean(&backend)?;
            report.print_summary();
        }

        Commands::Toggle => {
            let backend = JsonFileStorage::new(config.storage_path()?);
            let enabled = !backend.load_flag(KEY_HIGHLIGHT_ENABLED, true)?;
            backend.save_flag(KEY_HIGHLIGHT_ENABLED, enabled)?;
            if enabled {
                info!("🎨 highlight style enabled");
            } else {
                info!("🎨 highlight style disabled");
            }
        }

        Commands::Show => {
            let backend = JsonFileStorage::new(config.storage_path()?);
            let store = VisitedStore::load(&backend, &config)?;
            println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
        }

        Commands::Style => {
            print!("{}", matcher::HIGHLIGHT_CSS);
        }
    }

    Ok(())
}
