use std::path::PathBuf;

use auctionos::error::AppError;
use auctionos::workflows::import::ImportKind;
use clap::{Args, Parser, Subcommand};

use crate::commands::{run_import, run_regions, run_status};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "auctionos-admin",
    about = "Import tax-sale data into AuctionOS and inspect the county map",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Upload a CSV file to the backend importer
    Import(ImportArgs),
    /// Show the current status of an import job
    Status(StatusArgs),
    /// Resolve per-county counts against the boundary dataset
    Regions(RegionsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV file to upload
    pub(crate) file: PathBuf,
    /// Which importer receives the file: properties or auctions
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: ImportKind,
    /// Poll until the job finishes
    #[arg(long)]
    pub(crate) wait: bool,
    /// Poll interval in milliseconds (defaults to APP_IMPORT_POLL_INTERVAL_MS)
    #[arg(long)]
    pub(crate) interval_ms: Option<u64>,
    /// Give up waiting after this many milliseconds (defaults to APP_IMPORT_TIMEOUT_MS)
    #[arg(long)]
    pub(crate) timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub(crate) struct StatusArgs {
    /// Job identifier printed by `import`
    pub(crate) job_id: String,
    /// Importer the job belongs to
    #[arg(long, value_parser = parse_kind, default_value = "properties")]
    pub(crate) kind: ImportKind,
}

#[derive(Args, Debug)]
pub(crate) struct RegionsArgs {
    /// CSV with state,county,count columns
    #[arg(long)]
    pub(crate) aggregates: PathBuf,
    /// Boundary dataset file or URL (defaults to APP_BOUNDARY_SOURCE)
    #[arg(long)]
    pub(crate) boundaries: Option<String>,
    /// Preferred state when a county name is shared; repeatable
    #[arg(long = "scope")]
    pub(crate) scope: Vec<String>,
    /// Number of color buckets
    #[arg(long, default_value_t = auctionos::workflows::regions::DEFAULT_BUCKETS)]
    pub(crate) buckets: usize,
    /// Print JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

fn parse_kind(raw: &str) -> Result<ImportKind, String> {
    raw.parse()
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Import(args) => run_import(args).await,
        Command::Status(args) => run_status(args).await,
        Command::Regions(args) => run_regions(args).await,
    }
}
