//! End-to-end dialogue turn tests against a scripted executor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use askdb::error::ExecutionError;
use askdb::{
    ChatSession, Config, IntentClassifier, QueryExecutor, QueryResult, SchemaDescriptor,
    SqlStatement, SqlValue, Synthesizer,
};

/// Executor that maps exact SQL strings to canned results and records
/// everything it was asked to run.
struct ScriptedExecutor {
    responses: HashMap<String, QueryResult>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            executed: Mutex::new(Vec::new()),
        }
    }

    fn respond(mut self, sql: &str, result: QueryResult) -> Self {
        self.responses.insert(sql.to_string(), result);
        self
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, statement: &SqlStatement) -> Result<QueryResult, ExecutionError> {
        self.executed
            .lock()
            .unwrap()
            .push(statement.as_str().to_string());
        self.responses
            .get(statement.as_str())
            .cloned()
            .ok_or_else(|| {
                ExecutionError::Other(format!("unscripted query: {}", statement.as_str()))
            })
    }
}

fn internship_rows(companies: &[(&str, i64)]) -> QueryResult {
    QueryResult::new(
        vec!["company_name".to_string(), "stipend".to_string()],
        companies
            .iter()
            .map(|(name, stipend)| {
                vec![
                    SqlValue::Text(name.to_string()),
                    SqlValue::Integer(*stipend),
                ]
            })
            .collect(),
    )
}

fn session(executor: Arc<ScriptedExecutor>) -> ChatSession {
    ChatSession::new(
        SchemaDescriptor::internships().unwrap(),
        Synthesizer::template_only(),
        executor,
        &Config::default(),
    )
    .with_classifier(IntentClassifier::with_reference_date(
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
    ))
}

#[tokio::test]
async fn test_how_many_internships() {
    let executor = Arc::new(ScriptedExecutor::new().respond(
        "SELECT COUNT(*) FROM internship_details;",
        QueryResult::new(
            vec!["COUNT(*)".to_string()],
            vec![vec![SqlValue::Integer(3)]],
        ),
    ));
    let outcome = session(executor.clone())
        .ask("How many internships are available?")
        .await;

    assert_eq!(
        outcome.sql.as_deref(),
        Some("SELECT COUNT(*) FROM internship_details;")
    );
    assert_eq!(outcome.response, "There are 3 internships.");
    assert_eq!(executor.executed().len(), 1);
}

#[tokio::test]
async fn test_list_internships_from_company() {
    let executor = Arc::new(ScriptedExecutor::new().respond(
        "SELECT * FROM internship_details WHERE company_name = 'Google';",
        internship_rows(&[("Google", 8000), ("Google", 7000), ("Google", 6500)]),
    ));
    let outcome = session(executor)
        .ask("List all internships from \"Google\"")
        .await;

    assert_eq!(
        outcome.sql.as_deref(),
        Some("SELECT * FROM internship_details WHERE company_name = 'Google';")
    );
    assert!(outcome
        .response
        .starts_with("Here are the 3 internships I found:"));
    assert!(outcome.response.contains("company_name | stipend"));
}

#[tokio::test]
async fn test_gibberish_produces_clarification_not_sql() {
    let executor = Arc::new(ScriptedExecutor::new());
    let outcome = session(executor.clone()).ask("asdkjasd").await;

    assert!(outcome.sql.is_none());
    assert!(outcome.classification.intent.is_unknown());
    assert!(outcome.response.contains("asdkjasd"));
    assert!(executor.executed().is_empty());
}

#[tokio::test]
async fn test_average_stipend() {
    let executor = Arc::new(ScriptedExecutor::new().respond(
        "SELECT AVG(stipend) FROM internship_details;",
        QueryResult::new(
            vec!["AVG(stipend)".to_string()],
            vec![vec![SqlValue::Float(5166.666_666_67)]],
        ),
    ));
    let outcome = session(executor)
        .ask("What is the average stipend for internships?")
        .await;

    assert_eq!(outcome.response, "The average of stipend is 5166.67.");
}

#[tokio::test]
async fn test_empty_result_is_no_results_message() {
    let executor = Arc::new(ScriptedExecutor::new().respond(
        "SELECT * FROM internship_details WHERE company_name = 'Nonesuch';",
        QueryResult::default(),
    ));
    let outcome = session(executor)
        .ask("List all internships from \"Nonesuch\"")
        .await;

    assert_eq!(outcome.response, "I couldn't find any matching records.");
    assert!(!outcome.response.contains('|'));
}

#[tokio::test]
async fn test_turn_failures_do_not_end_session() {
    let executor = Arc::new(ScriptedExecutor::new().respond(
        "SELECT COUNT(*) FROM internship_details;",
        QueryResult::new(
            vec!["COUNT(*)".to_string()],
            vec![vec![SqlValue::Integer(2)]],
        ),
    ));
    let session = session(executor);

    // A failed turn (unscripted query -> execution error)...
    let failed = session.ask("List all internships").await;
    assert!(failed.response.starts_with("I couldn't run that query:"));

    // ...leaves the session able to answer the next question.
    let ok = session.ask("How many internships are available?").await;
    assert_eq!(ok.response, "There are 2 internships.");
}
