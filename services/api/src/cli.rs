use crate::infra::prepare_database;
use crate::server;
use bloodbank::config::AppConfig;
use bloodbank::error::AppError;
use bloodbank::telemetry;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Blood Bank Service",
    about = "Run the blood bank workflow API or manage its database",
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
    /// Create missing tables and seed reference roles and tasks, then exit
    Migrate(DatabaseArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) database: DatabaseArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DatabaseArgs {
    /// Override the configured SQLite database file
    #[arg(long = "database", value_name = "PATH")]
    pub(crate) path: Option<PathBuf>,
}

impl DatabaseArgs {
    pub(crate) fn apply(self, config: &mut AppConfig) {
        if let Some(path) = self.path {
            config.database.path = path;
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Migrate(args) => migrate(args),
    }
}

fn migrate(args: DatabaseArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    args.apply(&mut config);
    telemetry::init(&config.telemetry)?;

    prepare_database(&config)?;
    info!(path = %config.database.path.display(), "database schema is current");
    Ok(())
}
