//! `wikidict` command-line tool.
//!
//! Builds, refreshes and queries a dictionary kept in a local directory
//! object store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wikidict::iterator::source::JsonLinesSource;
use wikidict::{Dictionary, LocalStore, Options, PublishController, PublishReport, RetryStore};

/// Sorted, byte-indexed dictionary builder.
#[derive(Parser)]
#[command(name = "wikidict")]
#[command(about = "Build, refresh and query a wikidict dictionary", long_about = None)]
struct Cli {
    /// Root directory of the object store.
    #[arg(short, long, default_value = "./wikidict-store")]
    root: PathBuf,

    /// Records per sorted chunk (overrides WIKIDICT_CHUNK_SIZE).
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Local staging directory (overrides WIKIDICT_STAGING_DIR).
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full build from a JSON-lines source, published as a new generation.
    Build {
        /// JSON-lines file with one `{"key", "value"}` object per line.
        #[arg(short, long)]
        source: PathBuf,
    },

    /// Merge the live table with a staged delta.
    Refresh {
        /// Store path of the delta table (defaults to the manifest's).
        #[arg(short, long)]
        delta: Option<String>,
    },

    /// Refresh if a table is published, full build otherwise.
    Run {
        /// JSON-lines source used when nothing is published yet.
        #[arg(short, long)]
        source: PathBuf,

        /// Store path of the delta table for a refresh.
        #[arg(short, long)]
        delta: Option<String>,
    },

    /// Sort a JSON-lines changelog into a delta table in the store.
    StageDelta {
        #[arg(short, long)]
        source: PathBuf,

        /// Store path to upload the delta table to.
        #[arg(short, long)]
        dest: String,
    },

    /// Look up a key (case-insensitive).
    Get {
        key: String,
    },

    /// Print the current manifest.
    Manifest,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wikidict=info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut options = Options::from_env().context("invalid WIKIDICT_* configuration")?;
    if let Some(chunk_size) = cli.chunk_size {
        options.chunk_size = chunk_size;
    }
    if let Some(dir) = cli.staging_dir {
        options.staging_dir = dir;
    }

    let local = LocalStore::open(&cli.root)
        .with_context(|| format!("failed to open store at {}", cli.root.display()))?;
    let store = RetryStore::new(local, options.storage_retries, options.retry_backoff);

    match cli.command {
        Commands::Build { source } => {
            let controller = PublishController::new(store, options)?;
            let mut source = open_source(&source)?;
            print_report(&controller.bootstrap(&mut source)?);
        }

        Commands::Refresh { delta } => {
            let controller = PublishController::new(store, options)?;
            print_report(&controller.refresh(delta.as_deref())?);
        }

        Commands::Run { source, delta } => {
            let controller = PublishController::new(store, options)?;
            // Only opened if nothing usable is published yet.
            let open = || JsonLinesSource::open(&source);
            print_report(&controller.run(open, delta.as_deref())?);
        }

        Commands::StageDelta { source, dest } => {
            let controller = PublishController::new(store, options)?;
            let mut source = open_source(&source)?;
            let records = controller.stage_delta(&mut source, &dest)?;
            println!("Staged {records} delta records at {dest}");
        }

        Commands::Get { key } => {
            let dict = Dictionary::open(store, &options.manifest_path)?;
            match dict.get(&key)? {
                Some(record) => println!("{}\t{}", record.key, record.value),
                None => {
                    eprintln!("not found: {key}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Manifest => {
            let controller = PublishController::new(store, options)?;
            match controller.current_manifest()? {
                Some(manifest) => println!("{}", serde_json::to_string_pretty(&manifest)?),
                None => println!("No manifest published"),
            }
        }
    }

    Ok(())
}

fn open_source(path: &Path) -> Result<JsonLinesSource<std::io::BufReader<std::fs::File>>> {
    JsonLinesSource::open(path).with_context(|| format!("failed to open source {}", path.display()))
}

fn print_report(report: &PublishReport) {
    println!(
        "Published {:?} generation {} ({} records)",
        report.kind, report.manifest.version, report.records
    );
    println!("  table: {}", report.manifest.table_path);
    println!("  index: {}", report.manifest.index_path);
    if let Some(merge) = &report.merge {
        println!("  duplicates dropped: {}", merge.duplicates_dropped);
    }
    if let Some(update) = &report.update {
        println!(
            "  base-only: {}, inserted: {}, updated: {}",
            update.base_only, update.inserted, update.updated
        );
    }
}
