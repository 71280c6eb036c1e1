//! Intent-keyed interpretation of query results into English.

use crate::config::RenderConfig;
use crate::error::Result;
use crate::exec::{QueryResult, SqlValue};
use crate::query::{Archetype, Classification, Intent};
use crate::render::table::render_table;
use crate::schema::{SchemaDescriptor, SemanticType};

const NO_RESULTS: &str = "I couldn't find any matching records.";

/// Renders query results as prose, keyed on the intent that produced them.
pub struct ResponseRenderer {
    schema: SchemaDescriptor,
    config: RenderConfig,
}

impl ResponseRenderer {
    pub fn new(schema: SchemaDescriptor, config: RenderConfig) -> Self {
        Self { schema, config }
    }

    /// Render the answer for an executed query.
    pub fn interpret(&self, intent: &Intent, result: &QueryResult) -> Result<String> {
        if intent.is_unknown() {
            return Ok(self.clarification(&[]));
        }
        let table = self.schema.describe(intent.table.as_deref().unwrap_or_default())?;
        let text = match &intent.archetype {
            Archetype::Count => {
                let count = result
                    .scalar()
                    .and_then(SqlValue::as_f64)
                    .map_or(0, |v| v as i64);
                match count {
                    0 => format!("There are no {}.", table.noun_plural),
                    1 => format!("There is 1 {}.", table.noun_singular),
                    n => format!("There are {n} {}.", table.noun_plural),
                }
            }
            Archetype::Aggregate { op, column } => {
                let Some(value) = result.scalar().filter(|v| !v.is_null()) else {
                    return Ok(NO_RESULTS.to_string());
                };
                let rendered = match table.column(column) {
                    Some(col) if col.semantic == SemanticType::Currency => value
                        .as_f64()
                        .map_or_else(|| value.to_string(), |v| format!("{v:.2}")),
                    _ => value.to_string(),
                };
                format!("The {} of {column} is {rendered}.", op.english())
            }
            Archetype::LookupEntity { value, .. } if result.row_count() == 1 => {
                let mut lines = vec![format!("Here's what I found about {value}:")];
                for (name, cell) in result.columns.iter().zip(&result.rows[0]) {
                    let display = table
                        .column(name)
                        .map_or_else(|| name.clone(), |c| c.display_name());
                    lines.push(format!("  {display}: {cell}"));
                }
                lines.join("\n")
            }
            _ if result.is_empty() => NO_RESULTS.to_string(),
            _ => {
                let count = result.row_count() as i64;
                let noun = table.noun(count);
                let lead = if count == 1 {
                    format!("Here is the 1 {noun} I found:")
                } else {
                    format!("Here are the {count} {noun} I found:")
                };
                format!("{lead}\n{}", render_table(result, &self.config))
            }
        };
        Ok(text)
    }

    /// Clarification prompt for questions that produced no interpretable
    /// intent, echoing the words that did not match anything.
    pub fn clarification(&self, unmatched: &[String]) -> String {
        let subjects = self
            .schema
            .tables()
            .iter()
            .map(|t| t.noun_plural.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if unmatched.is_empty() {
            format!(
                "I'm not sure what you're asking. Try a question about {subjects}, \
                 like \"How many internships are available?\""
            )
        } else {
            format!(
                "I didn't understand \"{}\". Try a question about {subjects}, \
                 like \"How many internships are available?\"",
                unmatched.join(" ")
            )
        }
    }

    /// Clarification for a full classification, echoing its unmatched terms.
    pub fn clarify(&self, classification: &Classification) -> String {
        self.clarification(&classification.unmatched_terms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::AggregateOp;

    fn renderer() -> ResponseRenderer {
        ResponseRenderer::new(
            SchemaDescriptor::internships().unwrap(),
            RenderConfig::default(),
        )
    }

    fn count_result(n: i64) -> QueryResult {
        QueryResult::new(vec!["COUNT(*)".to_string()], vec![vec![SqlValue::Integer(n)]])
    }

    #[test]
    fn test_count_plural_agreement() {
        let r = renderer();
        let intent = Intent::new(Archetype::Count, "internship_details");
        assert_eq!(
            r.interpret(&intent, &count_result(3)).unwrap(),
            "There are 3 internships."
        );
        assert_eq!(
            r.interpret(&intent, &count_result(1)).unwrap(),
            "There is 1 internship."
        );
        assert_eq!(
            r.interpret(&intent, &count_result(0)).unwrap(),
            "There are no internships."
        );
    }

    #[test]
    fn test_aggregate_currency_two_decimals() {
        let r = renderer();
        let intent = Intent::new(
            Archetype::Aggregate {
                op: AggregateOp::Avg,
                column: "stipend".to_string(),
            },
            "internship_details",
        );
        let result = QueryResult::new(
            vec!["AVG(stipend)".to_string()],
            vec![vec![SqlValue::Float(5166.666_666)]],
        );
        assert_eq!(
            r.interpret(&intent, &result).unwrap(),
            "The average of stipend is 5166.67."
        );
    }

    #[test]
    fn test_aggregate_null_is_no_results() {
        let r = renderer();
        let intent = Intent::new(
            Archetype::Aggregate {
                op: AggregateOp::Max,
                column: "stipend".to_string(),
            },
            "internship_details",
        );
        let result = QueryResult::new(
            vec!["MAX(stipend)".to_string()],
            vec![vec![SqlValue::Null]],
        );
        assert_eq!(r.interpret(&intent, &result).unwrap(), NO_RESULTS);
    }

    #[test]
    fn test_lookup_single_row_summary() {
        let r = renderer();
        let intent = Intent::new(
            Archetype::LookupEntity {
                key: "company_name".to_string(),
                value: "Google".to_string(),
            },
            "internship_details",
        );
        let result = QueryResult::new(
            vec!["company_name".to_string(), "stipend".to_string()],
            vec![vec![
                SqlValue::Text("Google".to_string()),
                SqlValue::Integer(8000),
            ]],
        );
        let text = r.interpret(&intent, &result).unwrap();
        assert!(text.starts_with("Here's what I found about Google:"));
        assert!(text.contains("Company Name: Google"));
        assert!(text.contains("Stipend: 8000"));
        // every column appears exactly once
        assert_eq!(text.matches("Company Name:").count(), 1);
    }

    #[test]
    fn test_list_multi_row_table() {
        let r = renderer();
        let intent = Intent::new(Archetype::ListFiltered, "internship_details");
        let result = QueryResult::new(
            vec!["company_name".to_string()],
            vec![
                vec![SqlValue::Text("Google".to_string())],
                vec![SqlValue::Text("Acme".to_string())],
                vec![SqlValue::Text("Initech".to_string())],
            ],
        );
        let text = r.interpret(&intent, &result).unwrap();
        assert!(text.starts_with("Here are the 3 internships I found:"));
        assert!(text.contains("company_name"));
        assert!(text.contains("Initech"));
    }

    #[test]
    fn test_empty_list_never_renders_table() {
        let r = renderer();
        let intent = Intent::new(Archetype::ListAll, "internship_details");
        let text = r.interpret(&intent, &QueryResult::default()).unwrap();
        assert_eq!(text, NO_RESULTS);
        assert!(!text.contains('|'));
    }

    #[test]
    fn test_clarification_echoes_unmatched() {
        let r = renderer();
        let text = r.clarification(&["asdkjasd".to_string()]);
        assert!(text.contains("asdkjasd"));
        assert!(text.contains("internships"));
    }

    #[test]
    fn test_interpret_is_byte_stable() {
        let r = renderer();
        let intent = Intent::new(Archetype::Count, "internship_details");
        assert_eq!(
            r.interpret(&intent, &count_result(3)).unwrap(),
            r.interpret(&intent, &count_result(3)).unwrap()
        );
    }
}
