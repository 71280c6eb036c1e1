//! Query execution against MySQL.
//!
//! Execution is abstracted behind [`QueryExecutor`] so the dialogue pipeline
//! and its tests can run against stub backends without a live database.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySqlPool, Row};

use crate::config::DatabaseConfig;
use crate::error::ExecutionError;
use crate::synth::SqlStatement;

// ============================================================================
// Result Types
// ============================================================================

/// A single cell value decoded from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Integer(n) => Some(*n as f64),
            SqlValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(n) => write!(f, "{n}"),
            SqlValue::Float(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{v}")
                }
            }
            SqlValue::Text(s) => write!(f, "{s}"),
            SqlValue::Boolean(b) => write!(f, "{}", if *b { "Yes" } else { "No" }),
        }
    }
}

/// An executed query's column names and decoded rows.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First cell of the first row, for scalar results (counts, aggregates).
    pub fn scalar(&self) -> Option<&SqlValue> {
        self.rows.first().and_then(|row| row.first())
    }
}

// ============================================================================
// Executor Trait
// ============================================================================

/// Backend-agnostic query execution seam.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, statement: &SqlStatement) -> Result<QueryResult, ExecutionError>;
}

// ============================================================================
// MySQL Executor
// ============================================================================

/// Executor backed by a sqlx MySQL connection pool.
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    /// Connect to the database described by `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ExecutionError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| classify_error(&e))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for MySqlExecutor {
    async fn execute(&self, statement: &SqlStatement) -> Result<QueryResult, ExecutionError> {
        tracing::debug!(sql = statement.as_str(), "executing query");

        let rows: Vec<MySqlRow> = sqlx::query(statement.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify_error(&e))?;

        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let decoded = rows
            .iter()
            .map(|row| {
                (0..columns.len())
                    .map(|idx| decode_cell(row, idx))
                    .collect()
            })
            .collect();

        Ok(QueryResult::new(columns, decoded))
    }
}

/// Decode one cell, probing the types the internship schema actually uses.
fn decode_cell(row: &MySqlRow, idx: usize) -> SqlValue {
    if let Ok(value) = row.try_get::<Option<i64>, _>(idx) {
        return value.map_or(SqlValue::Null, SqlValue::Integer);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(idx) {
        return value.map_or(SqlValue::Null, SqlValue::Float);
    }
    if let Ok(value) = row.try_get::<Option<sqlx::types::Decimal>, _>(idx) {
        return value.map_or(SqlValue::Null, |d| {
            SqlValue::Float(d.try_into().unwrap_or(f64::NAN))
        });
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(idx) {
        return value.map_or(SqlValue::Null, SqlValue::Boolean);
    }
    if let Ok(value) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return value.map_or(SqlValue::Null, |d| SqlValue::Text(d.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return value.map_or(SqlValue::Null, |d| {
            SqlValue::Text(d.format("%Y-%m-%d %H:%M:%S").to_string())
        });
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(idx) {
        return value.map_or(SqlValue::Null, SqlValue::Text);
    }
    SqlValue::Null
}

/// Map sqlx errors onto the pipeline's execution error categories.
fn classify_error(err: &sqlx::Error) -> ExecutionError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            match code.as_str() {
                "1064" => ExecutionError::Syntax(db_err.message().to_string()),
                "1044" | "1045" | "1142" => {
                    ExecutionError::PermissionDenied(db_err.message().to_string())
                }
                _ => ExecutionError::Other(db_err.message().to_string()),
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            ExecutionError::Connection(err.to_string())
        }
        other => ExecutionError::Other(other.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================
