//! Askdb: Natural-Language Database Chatbot
//!
//! Answers free-form questions about an internship database by classifying
//! the question's intent, synthesizing SQL (templates, optionally an
//! external text-to-SQL oracle), executing it against MySQL, and rendering
//! the result set back into English prose.

pub mod config;
pub mod error;
pub mod exec;
pub mod query;
pub mod render;
pub mod schema;
pub mod session;
pub mod synth;
pub mod utils;

pub use config::{Config, DatabaseConfig, OracleConfig, RenderConfig};
pub use error::{AskdbError, ExecutionError, OracleError, Result, SynthesisError};
pub use exec::{MySqlExecutor, QueryExecutor, QueryResult, SqlValue};
pub use query::{Archetype, Classification, Intent, IntentClassifier};
pub use render::ResponseRenderer;
pub use schema::{SchemaDescriptor, SemanticType, TableDescriptor};
pub use session::{ChatSession, TurnOutcome};
pub use synth::{HttpOracle, SqlOracle, SqlStatement, Synthesizer};
