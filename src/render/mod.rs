//! Result-to-prose rendering.
//!
//! Turns a [`QueryResult`] plus the intent that produced it into a single
//! English answer string. Rendering is deterministic: the same result and
//! intent always produce the same text.

mod interpreter;
mod table;

pub use interpreter::ResponseRenderer;
pub use table::render_table;
