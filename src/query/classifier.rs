//! Question Intent Classifier.
//!
//! A deterministic, rule-based classifier: an ordered list of
//! (predicate, archetype) rules evaluated top to bottom, most specific
//! first. The first matching rule wins; there is no scoring across
//! archetypes. `Unknown` is a valid terminal classification, not an error.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, Local, NaiveDate};
use regex::Regex;

use crate::schema::{ColumnDescriptor, SchemaDescriptor, SemanticType, TableDescriptor};

use super::types::*;

// ============================================================================
// Intent Classifier
// ============================================================================

/// Classifies natural language questions into structured intents.
pub struct IntentClassifier {
    /// Reference date for relative phrases ("next month"). Injectable so
    /// tests stay deterministic.
    today: NaiveDate,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Create a classifier anchored at today's date.
    pub fn new() -> Self {
        Self {
            today: Local::now().date_naive(),
        }
    }

    /// Create a classifier with a fixed reference date.
    pub fn with_reference_date(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Classify a question against the schema.
    ///
    /// Rule order: details-of lookup, Count, TopN, Aggregate, LookupEntity,
    /// ListFiltered, ListAll. Questions naming no known table classify as
    /// `Unknown`.
    pub fn classify(&self, question: &str, schema: &SchemaDescriptor) -> Classification {
        let normalized = normalize(question);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        // "details of <username>" is a user-profile lookup even without a
        // table keyword.
        if let Some(classification) = self.classify_details_of(&normalized, schema) {
            return classification;
        }

        let Some(table) = tokens.iter().find_map(|t| schema.resolve_table(t)) else {
            return Classification::new(Intent::unknown())
                .with_unmatched(unmatched_terms(&tokens, None, schema));
        };

        let entity = extract_entity(question, table, schema);
        let filters = self.extract_filters(&normalized, &tokens, table, entity.as_deref());

        let archetype = self
            .match_count(&normalized)
            .or_else(|| self.match_top_n(&normalized, table))
            .or_else(|| self.match_aggregate(&normalized, &tokens, table))
            .or_else(|| self.match_lookup(entity.as_deref(), table))
            .or_else(|| self.match_list_filtered(&filters))
            .unwrap_or(Archetype::ListAll);

        // For an entity lookup the entity rides in the archetype itself;
        // every other archetype consumes it as an equality filter.
        let filters = match (&archetype, entity) {
            (Archetype::LookupEntity { .. }, _) => filters,
            (_, Some(value)) => {
                let mut all = filters;
                if let Some(key) = &table.entity_key {
                    all.push(FilterPredicate::eq_text(key.clone(), value));
                }
                all
            }
            (_, None) => filters,
        };

        let intent = Intent::new(archetype, table.name.clone()).with_filters(filters);
        Classification::new(intent)
    }

    // ========================================================================
    // Archetype rules, in priority order
    // ========================================================================

    fn match_count(&self, question: &str) -> Option<Archetype> {
        COUNT_PATTERN.is_match(question).then_some(Archetype::Count)
    }

    /// TopN runs before Aggregate: its trigger phrase is more specific, so
    /// "highest paying internships" is a top-N while "highest stipend" is an
    /// aggregate.
    fn match_top_n(&self, question: &str, table: &TableDescriptor) -> Option<Archetype> {
        let caps = TOP_N_PATTERN.captures(question)?;
        let order_column = order_column(question, table)?;
        let n = caps
            .name("n")
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(5);
        let direction = if BOTTOM_PATTERN.is_match(question) {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        Some(Archetype::TopN {
            n,
            order_column: order_column.name.clone(),
            direction,
        })
    }

    fn match_aggregate(
        &self,
        question: &str,
        tokens: &[&str],
        table: &TableDescriptor,
    ) -> Option<Archetype> {
        let op = if AVG_PATTERN.is_match(question) {
            AggregateOp::Avg
        } else if SUM_PATTERN.is_match(question) {
            AggregateOp::Sum
        } else if MAX_PATTERN.is_match(question) {
            AggregateOp::Max
        } else if MIN_PATTERN.is_match(question) {
            AggregateOp::Min
        } else {
            return None;
        };

        // The aggregated column must be numeric; a question with no metric
        // column falls through to the list rules.
        let column = tokens
            .iter()
            .find_map(|t| table.column_by_keyword(t).filter(|c| c.is_metric()))
            .or_else(|| table.default_metric())?;

        Some(Archetype::Aggregate {
            op,
            column: column.name.clone(),
        })
    }

    fn match_lookup(&self, entity: Option<&str>, table: &TableDescriptor) -> Option<Archetype> {
        let value = entity?;
        let key = table.entity_key.as_ref()?;
        Some(Archetype::LookupEntity {
            key: key.clone(),
            value: value.to_string(),
        })
    }

    fn match_list_filtered(&self, filters: &[FilterPredicate]) -> Option<Archetype> {
        (!filters.is_empty()).then_some(Archetype::ListFiltered)
    }

    fn classify_details_of(
        &self,
        normalized: &str,
        schema: &SchemaDescriptor,
    ) -> Option<Classification> {
        let caps = DETAILS_OF_PATTERN.captures(normalized)?;
        let username = caps.name("who")?.as_str().to_string();
        let table = schema.describe("user_details").ok()?;
        let key = table.entity_key.clone()?;
        let intent = Intent::new(
            Archetype::LookupEntity {
                key,
                value: username,
            },
            table.name.clone(),
        );
        Some(Classification::new(intent))
    }

    // ========================================================================
    // Slot extraction
    // ========================================================================

    /// Build the filter-predicate list from comparison phrases and tokens
    /// matching known value domains. Values are coerced to each column's
    /// semantic type here; a token that fails coercion simply produces no
    /// predicate.
    fn extract_filters(
        &self,
        normalized: &str,
        tokens: &[&str],
        table: &TableDescriptor,
        entity: Option<&str>,
    ) -> Vec<FilterPredicate> {
        let mut filters = Vec::new();

        // Enum value domains ("open", "selected", ...)
        for column in &table.columns {
            if let SemanticType::Enum(domain) = &column.semantic {
                if let Some(value) = tokens.iter().find(|t| domain.iter().any(|d| d == **t)) {
                    filters.push(FilterPredicate::eq_text(column.name.clone(), *value));
                }
            }
        }

        // "remote" flags the table's boolean column
        if REMOTE_PATTERN.is_match(normalized) {
            if let Some(column) = table.first_boolean_column() {
                filters.push(FilterPredicate::eq_bool(column.name.clone(), true));
            }
        }

        // Relative date phrases become BETWEEN ranges on a date column
        if let Some(range) = self.extract_date_range(normalized) {
            let column = tokens
                .iter()
                .find_map(|t| {
                    table
                        .column_by_keyword(t)
                        .filter(|c| c.semantic == SemanticType::Date)
                })
                .or_else(|| table.first_date_column());
            if let Some(column) = column {
                filters.push(FilterPredicate::date_range(
                    column.name.clone(),
                    range.0,
                    range.1,
                ));
            }
        }

        // Numeric comparison phrases ("stipend over 5000")
        if let Some(caps) = NUMERIC_CMP_PATTERN.captures(normalized) {
            if let Ok(number) = caps["n"].parse::<f64>() {
                let column = tokens
                    .iter()
                    .find_map(|t| table.column_by_keyword(t).filter(|c| c.is_metric()))
                    .or_else(|| table.default_metric());
                if let Some(column) = column {
                    let op = match &caps["cmp"] {
                        "at least" => CompareOp::Ge,
                        "at most" => CompareOp::Le,
                        "less than" | "under" | "below" => CompareOp::Lt,
                        _ => CompareOp::Gt,
                    };
                    filters.push(FilterPredicate {
                        column: column.name.clone(),
                        op,
                        value: FilterValue::Number(number),
                    });
                }
            }
        }

        // A mentioned text column plus a quoted value that is not the
        // entity key ("role 'Data Analyst'")
        if let Some(quoted) = QUOTED_PATTERN
            .captures(normalized)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
        {
            let value = quoted.as_str();
            if entity != Some(value) {
                let column = tokens.iter().find_map(|t| {
                    table
                        .column_by_keyword(t)
                        .filter(|c| c.semantic == SemanticType::Text)
                });
                if let Some(column) = column {
                    filters.push(FilterPredicate::eq_text(column.name.clone(), value));
                }
            }
        }

        filters
    }

    fn extract_date_range(&self, normalized: &str) -> Option<(NaiveDate, NaiveDate)> {
        if normalized.contains("next month") {
            Some(month_range(add_months(self.today, 1)))
        } else if normalized.contains("this month") {
            Some(month_range(self.today))
        } else if normalized.contains("next week") {
            Some((self.today + Duration::days(1), self.today + Duration::days(7)))
        } else if normalized.contains("today") {
            Some((self.today, self.today))
        } else {
            None
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Lowercase and strip punctuation, preserving word and number boundaries.
fn normalize(question: &str) -> String {
    let lower = question.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    for ch in lower.chars() {
        // Underscores survive so usernames like john_doe stay one token;
        // quotes survive for quoted-literal extraction.
        if ch.is_alphanumeric() || ch == '_' || ch == '\'' || ch == '"' || ch == '.' {
            out.push(ch);
        } else {
            out.push(' ');
        }
    }
    out
}

/// Extract a looked-up entity value: a quoted string, or a run of
/// capitalized words that is not sentence-initial and not a keyword.
fn extract_entity(
    question: &str,
    table: &TableDescriptor,
    schema: &SchemaDescriptor,
) -> Option<String> {
    if let Some(caps) = QUOTED_PATTERN.captures(question) {
        let value = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    let words: Vec<&str> = question.split_whitespace().collect();
    let mut run: Vec<&str> = Vec::new();
    for (i, raw) in words.iter().enumerate() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
        let capitalized = word.chars().next().is_some_and(|c| c.is_uppercase());
        if i > 0 && capitalized && !is_keyword(&word.to_lowercase(), table, schema) {
            run.push(word);
        } else if !run.is_empty() {
            break;
        }
    }
    if run.is_empty() {
        None
    } else {
        Some(run.join(" "))
    }
}

/// Whether a lowercase token is a recognized keyword rather than a value.
fn is_keyword(token: &str, table: &TableDescriptor, schema: &SchemaDescriptor) -> bool {
    STOPWORDS.contains(&token)
        || INTENT_KEYWORDS.contains(&token)
        || schema.resolve_table(token).is_some()
        || table.column_by_keyword(token).is_some()
}

/// Tokens that matched nothing, echoed back in clarification prompts.
fn unmatched_terms(
    tokens: &[&str],
    table: Option<&TableDescriptor>,
    schema: &SchemaDescriptor,
) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| !STOPWORDS.contains(*t))
        .filter(|t| !INTENT_KEYWORDS.contains(*t))
        .filter(|t| schema.resolve_table(t).is_none())
        .filter(|t| table.map_or(true, |tab| tab.column_by_keyword(t).is_none()))
        .filter(|t| t.parse::<f64>().is_err())
        .take(5)
        .map(|t| t.to_string())
        .collect()
}

/// Order column for a top-N question: an explicitly named metric column,
/// else the table's default metric.
fn order_column<'a>(question: &str, table: &'a TableDescriptor) -> Option<&'a ColumnDescriptor> {
    question
        .split_whitespace()
        .find_map(|t| table.column_by_keyword(t).filter(|c| c.is_metric()))
        .or_else(|| table.default_metric())
}

fn month_range(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), 1)
        .unwrap_or(anchor);
    let next_first = add_months(first, 1);
    (first, next_first - Duration::days(1))
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.month0() + months;
    let year = date.year() + (total / 12) as i32;
    let month = total % 12 + 1;
    NaiveDate::from_ymd_opt(year, month, date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, month, 1))
        .unwrap_or(date)
}

// ============================================================================
// Vocabulary
// ============================================================================

const STOPWORDS: &[&str] = &[
    "a", "all", "an", "and", "are", "available", "be", "by", "can", "do", "does", "for", "from",
    "give", "have", "i", "in", "is", "it", "list", "me", "my", "of", "on", "or", "paying", "per",
    "please", "show", "tell", "that", "the", "there", "to", "what", "which", "with", "you",
];

const INTENT_KEYWORDS: &[&str] = &[
    "average", "avg", "best", "count", "details", "highest", "how", "lowest", "many", "max",
    "maximum", "min", "minimum", "most", "number", "sum", "top", "total",
];

// ============================================================================
// Regex Patterns (using LazyLock for static initialization)
// ============================================================================

static COUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(how\s+many|count|number\s+of)\b").expect("Invalid regex"));

static TOP_N_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(top|best|bottom)\s+(?P<n>\d+)?|\b(highest|lowest|best|top)[\s-]+paying\b")
        .expect("Invalid regex")
});

static BOTTOM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(bottom|lowest|least|cheapest)\b").expect("Invalid regex"));

static AVG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(average|avg|mean)\b").expect("Invalid regex"));

static SUM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(sum|total)\b").expect("Invalid regex"));

static MAX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(max|maximum|highest|most)\b").expect("Invalid regex"));

static MIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(min|minimum|lowest|least)\b").expect("Invalid regex"));

static REMOTE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bremote\b").expect("Invalid regex"));

static DETAILS_OF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bdetails\s+of\s+(?:user\s+)?(?P<who>[a-z0-9_.]+)").expect("Invalid regex")
});

static NUMERIC_CMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<cmp>more than|over|above|at least|at most|less than|under|below)\s+(?P<n>\d+(?:\.\d+)?)\b")
        .expect("Invalid regex")
});

static QUOTED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^']+)'|"([^"]+)""#).expect("Invalid regex"));

// ============================================================================
// Tests
// ============================================================================
