//! Oracle fallback behavior across the synthesis boundary.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use askdb::error::OracleError;
use askdb::{
    IntentClassifier, SchemaDescriptor, SqlOracle, Synthesizer,
};
use askdb::synth::SynthesisSource;

/// Oracle that always returns the same reply.
struct CannedOracle {
    reply: String,
}

#[async_trait]
impl SqlOracle for CannedOracle {
    async fn translate(&self, _: &str, _: &str) -> Result<String, OracleError> {
        Ok(self.reply.clone())
    }
}

/// Oracle that is never reachable.
struct DownOracle;

#[async_trait]
impl SqlOracle for DownOracle {
    async fn translate(&self, _: &str, _: &str) -> Result<String, OracleError> {
        Err(OracleError::Unavailable("connection refused".to_string()))
    }
}

fn classify(question: &str) -> (askdb::Intent, SchemaDescriptor) {
    let schema = SchemaDescriptor::internships().unwrap();
    let classifier =
        IntentClassifier::with_reference_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    let intent = classifier.classify(question, &schema).intent;
    (intent, schema)
}

#[tokio::test]
async fn test_invalid_oracle_candidate_falls_back_to_template() {
    let synthesizer = Synthesizer::with_oracle(Arc::new(CannedOracle {
        reply: "not sql at all".to_string(),
    }));
    let (intent, schema) = classify("How many internships are available?");

    let statement = synthesizer
        .synthesize("How many internships are available?", &intent, &schema)
        .await
        .unwrap();

    assert_eq!(statement.source, SynthesisSource::Template);
    assert_eq!(statement.as_str(), "SELECT COUNT(*) FROM internship_details;");
}

#[tokio::test]
async fn test_unreachable_oracle_falls_back_to_template() {
    let synthesizer = Synthesizer::with_oracle(Arc::new(DownOracle));
    let (intent, schema) = classify("How many internships are available?");

    let statement = synthesizer
        .synthesize("How many internships are available?", &intent, &schema)
        .await
        .unwrap();

    assert_eq!(statement.source, SynthesisSource::Template);
}

#[tokio::test]
async fn test_valid_oracle_candidate_is_used() {
    let sql = "SELECT company_name FROM internship_details WHERE stipend > 5000;";
    let synthesizer = Synthesizer::with_oracle(Arc::new(CannedOracle {
        reply: sql.to_string(),
    }));
    let (intent, schema) = classify("List all internships");

    let statement = synthesizer
        .synthesize("Which companies pay more than 5000?", &intent, &schema)
        .await
        .unwrap();

    assert_eq!(statement.source, SynthesisSource::Oracle);
    assert_eq!(statement.as_str(), sql);
}

#[tokio::test]
async fn test_oracle_candidate_with_unknown_table_is_rejected() {
    let synthesizer = Synthesizer::with_oracle(Arc::new(CannedOracle {
        reply: "SELECT * FROM secret_table;".to_string(),
    }));
    let (intent, schema) = classify("List all internships");

    let statement = synthesizer
        .synthesize("List all internships", &intent, &schema)
        .await
        .unwrap();

    assert_eq!(statement.source, SynthesisSource::Template);
}

#[tokio::test]
async fn test_non_select_oracle_candidate_is_rejected() {
    let synthesizer = Synthesizer::with_oracle(Arc::new(CannedOracle {
        reply: "DROP TABLE internship_details;".to_string(),
    }));
    let (intent, schema) = classify("List all internships");

    let statement = synthesizer
        .synthesize("List all internships", &intent, &schema)
        .await
        .unwrap();

    assert_eq!(statement.source, SynthesisSource::Template);
}
