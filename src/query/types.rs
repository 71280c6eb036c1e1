//! Types for question classification.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Archetype
// ============================================================================

/// The closed set of question shapes the assistant understands. Each
/// archetype selects both a SQL template and a rendering strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// "How many X ..."
    Count,
    /// "List/show all X"
    ListAll,
    /// "List X that/with ..."
    ListFiltered,
    /// "Average/total/max of a column"
    Aggregate { op: AggregateOp, column: String },
    /// "Tell me about <entity>" keyed on a table's entity column
    LookupEntity { key: String, value: String },
    /// "Top N X by <column>"
    TopN {
        n: u32,
        order_column: String,
        direction: SortDirection,
    },
    /// No table or intent keyword recognized
    #[default]
    Unknown,
}

impl Archetype {
    /// Human-readable name for logging and JSON output.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Count => "Count",
            Self::ListAll => "List All",
            Self::ListFiltered => "List Filtered",
            Self::Aggregate { .. } => "Aggregate",
            Self::LookupEntity { .. } => "Entity Lookup",
            Self::TopN { .. } => "Top N",
            Self::Unknown => "Unknown",
        }
    }
}

/// Aggregate operations supported by the template synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOp {
    Avg,
    Sum,
    Min,
    Max,
}

impl AggregateOp {
    /// SQL function name.
    pub fn sql_name(&self) -> &str {
        match self {
            Self::Avg => "AVG",
            Self::Sum => "SUM",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    /// English name used in rendered answers.
    pub fn english(&self) -> &str {
        match self {
            Self::Avg => "average",
            Self::Sum => "total",
            Self::Min => "minimum",
            Self::Max => "maximum",
        }
    }
}

/// Sort direction for top/bottom-N questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn sql_keyword(&self) -> &str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Comparison operators available in filter predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
    Between,
}

impl CompareOp {
    pub fn sql_symbol(&self) -> &str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Like => "LIKE",
            Self::Between => "BETWEEN",
        }
    }
}

/// A filter value, already coerced to the column's semantic type during
/// classification. `Range` carries the value pair for `BETWEEN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Range(NaiveDate, NaiveDate),
}

/// One predicate in a WHERE clause: column, operator, coerced value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub column: String,
    pub op: CompareOp,
    pub value: FilterValue,
}

impl FilterPredicate {
    pub fn eq_text(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: CompareOp::Eq,
            value: FilterValue::Text(value.into()),
        }
    }

    pub fn eq_bool(column: impl Into<String>, value: bool) -> Self {
        Self {
            column: column.into(),
            op: CompareOp::Eq,
            value: FilterValue::Bool(value),
        }
    }

    pub fn date_range(column: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            column: column.into(),
            op: CompareOp::Between,
            value: FilterValue::Range(from, to),
        }
    }
}

// ============================================================================
// Intent
// ============================================================================

/// A fully classified question: the archetype plus the slots the
/// synthesizer needs. Created fresh per question and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub archetype: Archetype,
    /// Target table name; `None` only for `Unknown`.
    pub table: Option<String>,
    /// Ordered filter predicates for the WHERE clause.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterPredicate>,
    /// Optional projection column list; `None` means `*` or the template's
    /// own projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Vec<String>>,
}

impl Intent {
    pub fn new(archetype: Archetype, table: impl Into<String>) -> Self {
        Self {
            archetype,
            table: Some(table.into()),
            filters: Vec::new(),
            projection: None,
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: Vec<FilterPredicate>) -> Self {
        self.filters = filters;
        self
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.archetype, Archetype::Unknown)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Result of classifying one question: the intent plus the normalized
/// tokens that matched nothing, kept for clarification prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    /// Tokens that matched no table, column, or intent keyword.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched_terms: Vec<String>,
}

impl Classification {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            unmatched_terms: Vec::new(),
        }
    }

    pub fn with_unmatched(mut self, terms: Vec<String>) -> Self {
        self.unmatched_terms = terms;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archetype_display_name() {
        assert_eq!(Archetype::Count.display_name(), "Count");
        assert_eq!(
            Archetype::Aggregate {
                op: AggregateOp::Avg,
                column: "stipend".to_string()
            }
            .display_name(),
            "Aggregate"
        );
    }

    #[test]
    fn test_aggregate_op_names() {
        assert_eq!(AggregateOp::Avg.sql_name(), "AVG");
        assert_eq!(AggregateOp::Sum.english(), "total");
    }

    #[test]
    fn test_predicate_builders() {
        let p = FilterPredicate::eq_text("status", "open");
        assert_eq!(p.op, CompareOp::Eq);
        assert_eq!(p.value, FilterValue::Text("open".to_string()));

        let from = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let p = FilterPredicate::date_range("start_date", from, to);
        assert_eq!(p.op, CompareOp::Between);
    }

    #[test]
    fn test_unknown_intent() {
        let intent = Intent::unknown();
        assert!(intent.is_unknown());
        assert!(intent.table.is_none());
    }
}
