//! Error types for askdb.

use thiserror::Error;

/// Main error type for askdb operations.
#[derive(Error, Debug)]
pub enum AskdbError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Schema descriptor errors.
///
/// A malformed descriptor is fatal at startup; an unknown table name is
/// fatal to the current turn only.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Schema mismatch: {0}")]
    Mismatch(String),
}

/// SQL synthesis errors. Recoverable at the turn level: the caller surfaces
/// a clarification message instead of executing anything.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Unknown column: {table}.{column}")]
    UnknownColumn { table: String, column: String },

    #[error("Unsupported intent: {0}")]
    UnsupportedIntent(String),

    #[error("Invalid literal for {column}: {value}")]
    InvalidLiteral { column: String, value: String },
}

/// Query execution errors, classified from the database driver.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    Other(String),
}

/// Text-to-SQL oracle errors. `Unavailable` triggers the template fallback
/// for the current turn; it is never fatal.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    #[error("Oracle request timed out after {0}s")]
    Timeout(u64),

    #[error("Oracle API error: {0}")]
    Api(String),

    #[error("Oracle returned unusable SQL: {0}")]
    InvalidCandidate(String),
}

/// Result type alias for askdb operations.
pub type Result<T> = std::result::Result<T, AskdbError>;
