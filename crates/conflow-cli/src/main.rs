//! conflow CLI
//!
//! Command-line front end for the configuration mutation engine

use clap::{Parser, Subcommand, ValueEnum};
use conflow_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "conflow")]
#[command(about = "conflow - concurrency-safe configuration edits", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormat::Pretty,
        env = "CONFLOW_LOG_FORMAT"
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines on stderr
    Pretty,
    /// One JSON object per event on stderr
    Json,
}

impl From<LogFormat> for Profile {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => Profile::Development,
            LogFormat::Json => Profile::Production,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Managed entity operations
    Agents(commands::agents::AgentsArgs),
    /// Three-way merge of JSON documents
    Rebase(commands::rebase::RebaseArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init(cli.log_format.into());

    let result = match cli.command {
        Commands::Agents(args) => commands::agents::execute(args).await,
        Commands::Rebase(args) => commands::rebase::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
