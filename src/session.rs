//! Per-turn dialogue pipeline: classify, synthesize, execute, interpret.
//!
//! Every fallible stage is converted into user-facing text at the turn
//! boundary; `ask` itself never returns an error, so a bad question or a
//! broken database connection cannot end the session.

use std::sync::Arc;

use crate::config::Config;
use crate::exec::QueryExecutor;
use crate::query::{Classification, IntentClassifier};
use crate::render::ResponseRenderer;
use crate::schema::SchemaDescriptor;
use crate::synth::Synthesizer;

/// Everything one turn produced, for display and logging.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TurnOutcome {
    pub question: String,
    pub classification: Classification,
    /// Synthesized SQL, absent when the turn never reached synthesis.
    pub sql: Option<String>,
    /// The user-facing answer. Always present, even on failure.
    pub response: String,
}

/// A chat session over one schema, one synthesizer, and one executor.
///
/// Turns are independent; the session holds no conversational state
/// beyond its fixed components.
pub struct ChatSession {
    classifier: IntentClassifier,
    synthesizer: Synthesizer,
    executor: Arc<dyn QueryExecutor>,
    renderer: ResponseRenderer,
    schema: SchemaDescriptor,
}

impl ChatSession {
    pub fn new(
        schema: SchemaDescriptor,
        synthesizer: Synthesizer,
        executor: Arc<dyn QueryExecutor>,
        config: &Config,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            synthesizer,
            executor,
            renderer: ResponseRenderer::new(schema.clone(), config.render.clone()),
            schema,
        }
    }

    /// Replace the classifier, letting callers pin its reference date.
    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Run one question through the full pipeline.
    pub async fn ask(&self, question: &str) -> TurnOutcome {
        let classification = self.classifier.classify(question, &self.schema);
        tracing::debug!(
            archetype = classification.intent.archetype.display_name(),
            table = classification.intent.table.as_deref().unwrap_or("-"),
            "classified question"
        );

        if classification.intent.is_unknown() {
            let response = self.renderer.clarify(&classification);
            return TurnOutcome {
                question: question.to_string(),
                classification,
                sql: None,
                response,
            };
        }

        let statement = match self
            .synthesizer
            .synthesize(question, &classification.intent, &self.schema)
            .await
        {
            Ok(statement) => statement,
            Err(err) => {
                tracing::warn!(error = %err, "synthesis failed");
                return TurnOutcome {
                    question: question.to_string(),
                    classification,
                    sql: None,
                    response: "I couldn't form a query for that question.".to_string(),
                };
            }
        };

        let result = match self.executor.execute(&statement).await {
            Ok(result) => {
                tracing::debug!(
                    source = ?statement.source,
                    rows = result.row_count(),
                    "query executed"
                );
                result
            }
            Err(err) => {
                tracing::warn!(error = %err, sql = statement.as_str(), "execution failed");
                return TurnOutcome {
                    question: question.to_string(),
                    classification,
                    sql: Some(statement.as_str().to_string()),
                    response: format!("I couldn't run that query: {err}"),
                };
            }
        };

        let response = self
            .renderer
            .interpret(&classification.intent, &result)
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "interpretation failed");
                "I ran the query but couldn't describe the result.".to_string()
            });

        TurnOutcome {
            question: question.to_string(),
            classification,
            sql: Some(statement.as_str().to_string()),
            response,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::error::ExecutionError;
    use crate::exec::{QueryResult, SqlValue};
    use crate::synth::SqlStatement;

    /// Executor returning a canned result and recording nothing.
    struct StubExecutor {
        result: QueryResult,
    }

    #[async_trait]
    impl QueryExecutor for StubExecutor {
        async fn execute(&self, _: &SqlStatement) -> Result<QueryResult, ExecutionError> {
            Ok(self.result.clone())
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl QueryExecutor for FailingExecutor {
        async fn execute(&self, _: &SqlStatement) -> Result<QueryResult, ExecutionError> {
            Err(ExecutionError::Connection("connection refused".to_string()))
        }
    }

    fn session(executor: Arc<dyn QueryExecutor>) -> ChatSession {
        let schema = SchemaDescriptor::internships().unwrap();
        ChatSession::new(
            schema,
            Synthesizer::template_only(),
            executor,
            &Config::default(),
        )
        .with_classifier(IntentClassifier::with_reference_date(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_count_turn() {
        let executor = Arc::new(StubExecutor {
            result: QueryResult::new(
                vec!["COUNT(*)".to_string()],
                vec![vec![SqlValue::Integer(3)]],
            ),
        });
        let outcome = session(executor).ask("How many internships are available?").await;
        assert_eq!(
            outcome.sql.as_deref(),
            Some("SELECT COUNT(*) FROM internship_details;")
        );
        assert_eq!(outcome.response, "There are 3 internships.");
    }

    #[tokio::test]
    async fn test_unknown_question_skips_synthesis() {
        let executor = Arc::new(StubExecutor {
            result: QueryResult::default(),
        });
        let outcome = session(executor).ask("asdkjasd").await;
        assert!(outcome.sql.is_none());
        assert!(outcome.response.contains("asdkjasd"));
    }

    #[tokio::test]
    async fn test_execution_failure_becomes_text() {
        let outcome = session(Arc::new(FailingExecutor))
            .ask("How many internships are available?")
            .await;
        assert!(outcome.sql.is_some());
        assert!(outcome.response.starts_with("I couldn't run that query:"));
    }
}
