//! Grouper connector command line.
//!
//! Runs searches and syncs against a DuckDB copy of the Grouper tables and
//! prints results as JSON lines.
//!
//! Usage:
//!   grouper --config grouper.json search group --filter '{"equals":{"name":"__UID__","values":["34"]}}'
//!   grouper --config grouper.json sync all --token 0 --attrs members,member_of

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grouper_connector::{GrouperConfiguration, GrouperConnector};
use grouper_model::{Filter, GrouperObject};
use grouper_query::OperationOptions;
use grouper_sync::SyncDelta;
use grouper_types::{ObjectKind, SyncToken};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "grouper")]
#[command(about = "Read-only Grouper connector over a DuckDB database")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the attributes of every object class
    Schema,
    /// List extension attribute names present in the database
    Discover { kind: ObjectKind },
    /// Check configuration and connection
    Test,
    /// Search objects of one kind
    Search {
        kind: ObjectKind,
        /// Filter as JSON
        #[arg(long)]
        filter: Option<String>,
        /// Attributes to fetch besides the defaults
        #[arg(long, value_delimiter = ',')]
        attrs: Vec<String>,
        #[arg(long)]
        page_size: Option<u64>,
        /// 1-based page offset
        #[arg(long)]
        offset: Option<u64>,
        /// Last identifier of the previous page
        #[arg(long)]
        cookie: Option<String>,
    },
    /// Print changes after a token
    Sync {
        kind: ObjectKind,
        /// Last seen token; without it only the latest token is reported
        #[arg(long)]
        token: Option<SyncToken>,
        #[arg(long, value_delimiter = ',')]
        attrs: Vec<String>,
        #[arg(long)]
        page_size: Option<u64>,
    },
    /// Print the latest sync token
    LatestToken { kind: ObjectKind },
}

fn print_json<T: Serialize>(value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(line) => {
            println!("{line}");
            true
        }
        Err(e) => {
            warn!("Failed to serialize result: {}", e);
            false
        }
    }
}

fn options(attrs: Vec<String>) -> OperationOptions {
    if attrs.is_empty() {
        OperationOptions::default()
    } else {
        OperationOptions::default().with_attributes(attrs)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = GrouperConfiguration::load(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    let connector = GrouperConnector::open(config).context("opening connector")?;

    match args.command {
        Command::Schema => {
            for class in connector.schema() {
                print_json(&class);
            }
        }
        Command::Discover { kind } => {
            let names = connector.discover_extension_attributes(kind)?;
            print_json(&names);
        }
        Command::Test => {
            connector.test().context("connection test")?;
            info!("Connection test succeeded");
        }
        Command::Search {
            kind,
            filter,
            attrs,
            page_size,
            offset,
            cookie,
        } => {
            let filter = filter
                .map(|f| serde_json::from_str::<Filter>(&f))
                .transpose()
                .context("parsing --filter")?;
            let mut options = options(attrs);
            options.page_size = page_size;
            options.paged_results_offset = offset;
            options.paged_results_cookie = cookie;
            let result = connector.search(kind, filter.as_ref(), &options, &mut |object: GrouperObject| {
                print_json(&object)
            })?;
            info!(
                "Search finished (cookie: {:?}, remaining: {})",
                result.paged_results_cookie, result.remaining_paged_results
            );
        }
        Command::Sync {
            kind,
            token,
            attrs,
            page_size,
        } => {
            let mut options = options(attrs);
            options.page_size = page_size;
            let summary = connector.sync(kind, token, &options, &mut |delta: SyncDelta| print_json(&delta))?;
            print_json(&summary);
        }
        Command::LatestToken { kind } => {
            let token = connector.latest_sync_token(kind)?;
            print_json(&token);
        }
    }

    Ok(())
}
