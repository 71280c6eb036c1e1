//! Output formatting for CLI commands.
//!
//! Turn outcomes and schema listings print as either JSON or
//! human-readable text.

use askdb::{TableDescriptor, TurnOutcome};

/// Print one dialogue turn.
pub fn print_turn(outcome: &TurnOutcome, json: bool, show_sql: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome).unwrap());
        return;
    }
    if show_sql {
        if let Some(sql) = &outcome.sql {
            println!("SQL: {sql}");
        }
    }
    println!("{}", outcome.response);
}

/// Print a table descriptor.
pub fn print_table(table: &TableDescriptor, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(table).unwrap());
        return;
    }
    println!("{}", table.name);
    for column in &table.columns {
        println!("  {} ({:?})", column.name, column.semantic);
    }
}
