//! Portico - command-line client for the portico backend.
//!
//! Main entry point for the CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod session;

use commands::{auth, config, files, users};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Portico - command-line client for the portico backend
#[derive(Parser)]
#[command(name = "portico")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server URL (overrides the selected context)
    #[arg(long, global = true, env = "PORTICO_SERVER_URL")]
    pub server: Option<String>,

    /// Named context from client.yaml to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in, log out and inspect the current session
    Auth(auth::AuthArgs),

    /// Manage users
    Users(users::UsersArgs),

    /// Upload fields and files as multipart form data
    Upload(files::UploadArgs),

    /// Download a file
    Download(files::DownloadArgs),

    /// Manage server contexts in client.yaml
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "portico=debug,portico_client=debug,portico_config=debug,info"
    } else {
        "portico=info,portico_client=info,portico_config=info,warn"
    };

    let log_dir = portico_config::config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "portico.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "portico=trace,portico_client=trace,portico_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        server_url: cli.server,
        context_name: cli.context,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Users(args) => users::run(args, &ctx).await,
        Commands::Upload(args) => files::upload(args, &ctx).await,
        Commands::Download(args) => files::download(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        commands::print_error(&e);
        drop(guard);
        std::process::exit(1);
    }

    Ok(())
}
