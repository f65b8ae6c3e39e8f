mod cmd_config;
mod cmd_import;
mod cmd_init;
mod cmd_source;
mod cmd_take;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slate", version, about = "Card ingest and take logging for film sets")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a new .slate/ workspace
    Init,
    /// Manage workspace configuration
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// List the clips on a card
    Source {
        /// Card root directory
        path: PathBuf,
        /// Include RED digital magazine files as a pseudo-clip
        #[arg(long)]
        red_magazine: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy clips to every storage dir and log their takes
    Import {
        /// Import job file (JSON)
        job: PathBuf,
    },
    /// Manage the take log
    Take {
        #[command(subcommand)]
        cmd: cmd_take::TakeCmd,
    },
}

/// Log to stderr so stdout stays clean for JSON and CSV output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let repo_root = std::env::current_dir()?;

    match cli.cmd {
        Command::Init => cmd_init::execute(&repo_root),
        Command::Config { cmd } => cmd_config::run(cmd, &repo_root),
        Command::Source {
            path,
            red_magazine,
            json,
        } => cmd_source::execute(&repo_root, &path, red_magazine, json),
        Command::Import { job } => cmd_import::execute(&repo_root, &job),
        Command::Take { cmd } => cmd_take::run(cmd, &repo_root),
    }
}
