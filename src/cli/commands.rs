//! CLI command handlers.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use askdb::{
    ChatSession, Config, HttpOracle, MySqlExecutor, SchemaDescriptor, Synthesizer,
};

use super::output;

/// Build a session against the configured database and oracle.
async fn build_session(config: &Config) -> Result<ChatSession> {
    let schema = SchemaDescriptor::internships()?;

    let synthesizer = if config.oracle.enabled {
        let oracle = HttpOracle::from_config(&config.oracle)?;
        Synthesizer::with_oracle(Arc::new(oracle))
    } else {
        Synthesizer::template_only()
    };

    let executor = Arc::new(MySqlExecutor::connect(&config.database).await?);
    Ok(ChatSession::new(schema, synthesizer, executor, config))
}

/// Answer a single question and exit.
pub async fn run_ask(config: Config, question: String, json: bool) -> Result<()> {
    let session = build_session(&config).await?;
    let outcome = session.ask(&question).await;
    output::print_turn(&outcome, json, false);
    Ok(())
}

/// Interactive read-answer loop. `exit` or `quit` (or EOF) ends the
/// session; every turn prints the synthesized SQL and the answer.
pub async fn run_repl(config: Config, json: bool) -> Result<()> {
    let session = build_session(&config).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout
        .write_all(b"Ask me about internships. Type 'exit' to leave.\n")
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            stdout.write_all(b"Goodbye!\n").await?;
            break;
        }

        let outcome = session.ask(question).await;
        output::print_turn(&outcome, json, true);
    }

    Ok(())
}

/// Print the schema, or one table of it.
pub fn run_schema(table: Option<String>, json: bool) -> Result<()> {
    let schema = SchemaDescriptor::internships()?;
    match table {
        Some(name) => {
            let table = schema.describe(&name)?;
            output::print_table(table, json);
        }
        None => {
            for table in schema.tables() {
                output::print_table(table, json);
            }
        }
    }
    Ok(())
}
