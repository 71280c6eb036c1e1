//! Askdb Chatbot Entry Point

use askdb::Config;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

/// Askdb: Natural-Language Internship Database Chatbot
#[derive(Parser, Debug)]
#[command(name = "askdb")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging (DEBUG level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,
    },
    /// Start the interactive chat loop (default behavior)
    Repl,
    /// Print the database schema
    Schema {
        /// Show a single table
        table: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep chatbot output clean: warnings and errors only, on stderr,
    // unless --verbose or RUST_LOG overrides.
    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = if let Some(path) = &args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };
    config.validate()?;

    match args.command {
        Some(Command::Ask { question }) => cli::run_ask(config, question, args.json).await,
        Some(Command::Schema { table }) => cli::run_schema(table, args.json),
        Some(Command::Repl) | None => cli::run_repl(config, args.json).await,
    }
}
