//! SQL Synthesis.
//!
//! Two interchangeable strategies with one output contract: an optional
//! external text-to-SQL oracle, and deterministic templates. The oracle is
//! consulted first when configured; a failed translation or a candidate
//! that does not validate falls back to templates for that turn only.

mod oracle;
mod templates;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{OracleError, SynthesisError};
use crate::query::Intent;
use crate::schema::SchemaDescriptor;

pub use oracle::{HttpOracle, SqlOracle};
pub use templates::quote_text;

// ============================================================================
// SqlStatement
// ============================================================================

/// Which strategy produced a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisSource {
    Template,
    Oracle,
}

/// A synthesizer-validated SQL string plus metadata: the table it touches
/// and the intent that produced it. Opaque and immutable after synthesis;
/// the executor receives it unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlStatement {
    sql: String,
    pub table: Option<String>,
    pub intent: Intent,
    pub source: SynthesisSource,
}

impl SqlStatement {
    pub fn as_str(&self) -> &str {
        &self.sql
    }
}

impl std::fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}

// ============================================================================
// Synthesizer
// ============================================================================

/// Synthesizes SQL from a classified intent, optionally consulting an
/// external oracle. Selected once at process start; per-call oracle
/// failures fall back to templates without disabling the oracle.
pub struct Synthesizer {
    oracle: Option<Arc<dyn SqlOracle>>,
}

impl Synthesizer {
    /// Template-only synthesizer (no oracle configured).
    pub fn template_only() -> Self {
        Self { oracle: None }
    }

    /// Synthesizer that consults the given oracle before templates.
    pub fn with_oracle(oracle: Arc<dyn SqlOracle>) -> Self {
        Self {
            oracle: Some(oracle),
        }
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Produce a SQL statement for the intent. `Unknown` intents synthesize
    /// nothing and return `UnsupportedIntent`.
    pub async fn synthesize(
        &self,
        question: &str,
        intent: &Intent,
        schema: &SchemaDescriptor,
    ) -> Result<SqlStatement, SynthesisError> {
        if intent.is_unknown() {
            return Err(SynthesisError::UnsupportedIntent(
                "no recognizable table or question shape".to_string(),
            ));
        }

        if let Some(oracle) = &self.oracle {
            match self.try_oracle(oracle.as_ref(), question, intent, schema).await {
                Ok(statement) => return Ok(statement),
                Err(err) => {
                    tracing::warn!(error = %err, "oracle translation failed, using templates");
                }
            }
        }

        let sql = templates::render(intent, schema)?;
        Ok(SqlStatement {
            sql,
            table: intent.table.clone(),
            intent: intent.clone(),
            source: SynthesisSource::Template,
        })
    }

    async fn try_oracle(
        &self,
        oracle: &dyn SqlOracle,
        question: &str,
        intent: &Intent,
        schema: &SchemaDescriptor,
    ) -> Result<SqlStatement, OracleError> {
        let candidate = oracle.translate(question, &schema.oracle_context()).await?;
        validate_candidate(&candidate, schema)?;
        Ok(SqlStatement {
            sql: candidate.trim().to_string(),
            table: intent.table.clone(),
            intent: intent.clone(),
            source: SynthesisSource::Oracle,
        })
    }
}

// ============================================================================
// Candidate Validation
// ============================================================================

/// Gross well-formedness checks on oracle output: non-empty, starts with a
/// recognized read verb, references only known tables, balanced single
/// quotes. Anything deeper is the database's job.
fn validate_candidate(candidate: &str, schema: &SchemaDescriptor) -> Result<(), OracleError> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(OracleError::InvalidCandidate("empty response".to_string()));
    }

    let first_word = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase();
    if first_word != "SELECT" && first_word != "WITH" {
        return Err(OracleError::InvalidCandidate(format!(
            "does not start with a recognized SQL verb: {}",
            crate::utils::truncate_str(trimmed, 40)
        )));
    }

    for caps in TABLE_REF_PATTERN.captures_iter(trimmed) {
        let table = &caps[1];
        if !schema.has_table(table) {
            return Err(OracleError::InvalidCandidate(format!(
                "references unknown table: {table}"
            )));
        }
    }

    if trimmed.matches('\'').count() % 2 != 0 {
        return Err(OracleError::InvalidCandidate(
            "unbalanced string literal".to_string(),
        ));
    }

    Ok(())
}

static TABLE_REF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:from|join)\s+([a-zA-Z_][a-zA-Z0-9_]*)").expect("Invalid regex")
});

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Archetype, Intent};

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::internships().unwrap()
    }

    struct FixedOracle(String);

    #[async_trait::async_trait]
    impl SqlOracle for FixedOracle {
        async fn translate(&self, _q: &str, _ctx: &str) -> Result<String, OracleError> {
            Ok(self.0.clone())
        }
    }

    struct DownOracle;

    #[async_trait::async_trait]
    impl SqlOracle for DownOracle {
        async fn translate(&self, _q: &str, _ctx: &str) -> Result<String, OracleError> {
            Err(OracleError::Unavailable("connection refused".to_string()))
        }
    }

    #[test]
    fn test_validate_accepts_known_tables() {
        let sql = "SELECT company_name FROM internship_details JOIN user_internship ON 1=1";
        assert!(validate_candidate(sql, &schema()).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_select() {
        for sql in ["not sql at all", "DROP TABLE user_details", ""] {
            assert!(validate_candidate(sql, &schema()).is_err(), "{sql}");
        }
    }

    #[test]
    fn test_validate_rejects_unknown_table() {
        let err = validate_candidate("SELECT * FROM payroll", &schema()).unwrap_err();
        assert!(err.to_string().contains("payroll"));
    }

    #[test]
    fn test_validate_rejects_unbalanced_quotes() {
        let sql = "SELECT * FROM user_details WHERE name = 'broken";
        assert!(validate_candidate(sql, &schema()).is_err());
    }

    #[tokio::test]
    async fn test_malformed_oracle_falls_back_to_templates() {
        let synth = Synthesizer::with_oracle(Arc::new(FixedOracle("not sql at all".to_string())));
        let intent = Intent::new(Archetype::Count, "internship_details");
        let statement = synth
            .synthesize("how many internships", &intent, &schema())
            .await
            .unwrap();
        assert_eq!(statement.source, SynthesisSource::Template);
        assert_eq!(statement.as_str(), "SELECT COUNT(*) FROM internship_details;");
    }

    #[tokio::test]
    async fn test_unavailable_oracle_falls_back() {
        let synth = Synthesizer::with_oracle(Arc::new(DownOracle));
        let intent = Intent::new(Archetype::ListAll, "user_details");
        let statement = synth
            .synthesize("list users", &intent, &schema())
            .await
            .unwrap();
        assert_eq!(statement.source, SynthesisSource::Template);
    }

    #[tokio::test]
    async fn test_valid_oracle_candidate_is_used() {
        let sql = "SELECT company_name FROM internship_details";
        let synth = Synthesizer::with_oracle(Arc::new(FixedOracle(sql.to_string())));
        let intent = Intent::new(Archetype::ListAll, "internship_details");
        let statement = synth
            .synthesize("list internship companies", &intent, &schema())
            .await
            .unwrap();
        assert_eq!(statement.source, SynthesisSource::Oracle);
        assert_eq!(statement.as_str(), sql);
    }

    #[tokio::test]
    async fn test_unknown_intent_synthesizes_nothing() {
        let synth = Synthesizer::template_only();
        let err = synth
            .synthesize("asdkjasd", &Intent::unknown(), &schema())
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::UnsupportedIntent(_)));
    }
}
