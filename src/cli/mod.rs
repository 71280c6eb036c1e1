//! CLI module for the askdb command-line interface.
//!
//! Command handlers for one-shot questions, the interactive REPL, and
//! schema inspection.

mod commands;
mod output;

pub use commands::*;
