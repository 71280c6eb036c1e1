//! External text-to-SQL oracle (OpenAI-compatible HTTP endpoint).

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::OracleConfig;
use crate::error::OracleError;

/// Trait for text-to-SQL translation oracles.
///
/// The oracle is an opaque external capability; the synthesizer only sees
/// `translate` and an `Unavailable`/failure outcome, so the template path
/// stays fully decoupled from any specific model.
#[async_trait]
pub trait SqlOracle: Send + Sync {
    /// Translate a question into candidate SQL given a schema context.
    async fn translate(&self, question: &str, schema_context: &str)
        -> Result<String, OracleError>;
}

// ============================================================================
// HTTP Oracle
// ============================================================================

/// Oracle speaking the OpenAI chat-completions wire format, suitable for a
/// locally hosted sqlcoder-style model.
pub struct HttpOracle {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl HttpOracle {
    /// Create an oracle from configuration.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ASKDB_ORACLE_API_KEY").ok());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Api(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        })
    }

    async fn request_translation(
        &self,
        question: &str,
        schema_context: &str,
    ) -> Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);
        let prompt = format!(
            "Generate a single SQL query answering the question below.\n\
             Use only these tables and columns:\n{schema_context}\n\
             Question: {question}\n\
             Answer with SQL only."
        );

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You translate questions about an internship database into SQL.",
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.1,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                OracleError::Unavailable(format!("connection failed: {e}"))
            } else {
                OracleError::Api(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api(format!(
                "API error ({status}): {}",
                crate::utils::truncate_str(&body, 200)
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Api(format!("failed to parse response: {e}")))?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| OracleError::Api("empty choices".to_string()))?;

        Ok(extract_sql(content))
    }
}

#[async_trait]
impl SqlOracle for HttpOracle {
    async fn translate(
        &self,
        question: &str,
        schema_context: &str,
    ) -> Result<String, OracleError> {
        let mut attempt = 0;
        loop {
            match self.request_translation(question, schema_context).await {
                Ok(sql) => return Ok(sql),
                // Timeouts are retried a bounded number of times; every
                // other failure falls back to templates immediately.
                Err(OracleError::Timeout(_)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, "oracle request timed out, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Pull the SQL out of a model reply: the body of a ```sql fence if one is
/// present, otherwise the trimmed reply itself.
fn extract_sql(content: &str) -> String {
    if let Some(caps) = SQL_FENCE_PATTERN.captures(content) {
        return caps[1].trim().to_string();
    }
    content.trim().to_string()
}

static SQL_FENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:sql)?\s*(.*?)```").expect("Invalid regex")
});

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sql_from_fence() {
        let reply = "Here you go:\n```sql\nSELECT * FROM user_details;\n```\nDone.";
        assert_eq!(extract_sql(reply), "SELECT * FROM user_details;");
    }

    #[test]
    fn test_extract_sql_plain_fence() {
        let reply = "```\nSELECT COUNT(*) FROM internship_details;\n```";
        assert_eq!(extract_sql(reply), "SELECT COUNT(*) FROM internship_details;");
    }

    #[test]
    fn test_extract_sql_without_fence() {
        let reply = "  SELECT 1;  ";
        assert_eq!(extract_sql(reply), "SELECT 1;");
    }

    #[test]
    fn test_from_config() {
        let config = OracleConfig {
            enabled: true,
            base_url: "http://localhost:8000/v1/".to_string(),
            ..Default::default()
        };
        let oracle = HttpOracle::from_config(&config).unwrap();
        assert_eq!(oracle.base_url, "http://localhost:8000/v1");
    }
}
