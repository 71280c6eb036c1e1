//! Schema descriptor types and the built-in internship schema.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

// ============================================================================
// Semantic Types
// ============================================================================

/// Semantic type of a column. Drives which comparison operators the
/// synthesizer may use and how the interpreter formats values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Opaque key or reference (never aggregated).
    Identifier,
    /// Free text, exact or LIKE matching.
    Text,
    /// Plain number, range comparisons allowed.
    Numeric,
    /// Monetary number, rendered to two decimal places.
    Currency,
    /// Calendar date, range comparisons allowed.
    Date,
    /// Date and time of day.
    Timestamp,
    /// True/false flag.
    Boolean,
    /// Closed set of known values, matched during slot extraction.
    Enum(Vec<String>),
}

impl SemanticType {
    /// Whether values of this type are written unquoted in SQL.
    pub fn is_unquoted(&self) -> bool {
        matches!(
            self,
            SemanticType::Numeric | SemanticType::Currency | SemanticType::Boolean
        )
    }

    /// Whether range operators (`>`, `<`, `BETWEEN`) make sense.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            SemanticType::Numeric | SemanticType::Currency | SemanticType::Date
        )
    }
}

// ============================================================================
// Column Descriptor
// ============================================================================

/// A single column: name plus semantic type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub semantic: SemanticType,
}

impl ColumnDescriptor {
    fn new(name: &str, semantic: SemanticType) -> Self {
        Self {
            name: name.to_string(),
            semantic,
        }
    }

    /// Whether this column can be the target of an aggregate.
    pub fn is_metric(&self) -> bool {
        matches!(self.semantic, SemanticType::Numeric | SemanticType::Currency)
    }

    /// Display form of the column name ("company_name" -> "Company Name").
    pub fn display_name(&self) -> String {
        self.name
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============================================================================
// Table Descriptor
// ============================================================================

/// Metadata for one table: ordered columns, question-matching synonyms,
/// display nouns, and the column used for entity lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    /// Words in a question that refer to this table.
    pub synonyms: Vec<String>,
    /// Display noun, singular ("internship").
    pub noun_singular: String,
    /// Display noun, plural ("internships").
    pub noun_plural: String,
    /// Column keyed for `LookupEntity` questions, if any.
    pub entity_key: Option<String>,
}

impl TableDescriptor {
    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Match a question token against column names. A token matches when it
    /// equals the column name or one of its underscore-separated words
    /// ("deadline" matches "application_deadline").
    pub fn column_by_keyword(&self, token: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.name == token || c.name.split('_').any(|w| w == token))
    }

    /// Default aggregate target: the first currency column, else the first
    /// numeric one.
    pub fn default_metric(&self) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.semantic == SemanticType::Currency)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.semantic == SemanticType::Numeric)
            })
    }

    /// First date-typed column, used for relative date filters when the
    /// question names no column.
    pub fn first_date_column(&self) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.semantic == SemanticType::Date)
    }

    /// First boolean column, used for flag filters like "remote".
    pub fn first_boolean_column(&self) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.semantic == SemanticType::Boolean)
    }

    /// Display noun with singular/plural agreement.
    pub fn noun(&self, count: i64) -> &str {
        if count == 1 {
            &self.noun_singular
        } else {
            &self.noun_plural
        }
    }
}

// ============================================================================
// Schema Descriptor
// ============================================================================

/// The full schema: an ordered set of table descriptors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    tables: Vec<TableDescriptor>,
}

impl SchemaDescriptor {
    /// Build a descriptor from table definitions, validating it up front.
    /// A malformed descriptor aborts startup.
    pub fn new(tables: Vec<TableDescriptor>) -> Result<Self> {
        let schema = Self { tables };
        schema.validate()?;
        Ok(schema)
    }

    /// The built-in internship database schema.
    pub fn internships() -> Result<Self> {
        use SemanticType::*;

        let user_details = TableDescriptor {
            name: "user_details".to_string(),
            columns: vec![
                ColumnDescriptor::new("name", Text),
                ColumnDescriptor::new("id", Identifier),
                ColumnDescriptor::new("user_name", Identifier),
                ColumnDescriptor::new("email", Text),
                ColumnDescriptor::new("phone", Text),
                ColumnDescriptor::new("address", Text),
                ColumnDescriptor::new("gender", Enum(domain(&["male", "female", "other"]))),
                ColumnDescriptor::new("status", Enum(domain(&["active", "inactive"]))),
                ColumnDescriptor::new("created_at", Timestamp),
                ColumnDescriptor::new("updated_at", Timestamp),
            ],
            synonyms: domain(&["user", "users", "student", "students", "candidate", "candidates"]),
            noun_singular: "user".to_string(),
            noun_plural: "users".to_string(),
            entity_key: Some("user_name".to_string()),
        };

        let internship_details = TableDescriptor {
            name: "internship_details".to_string(),
            columns: vec![
                ColumnDescriptor::new("id", Identifier),
                ColumnDescriptor::new("internship_id", Identifier),
                ColumnDescriptor::new("company_name", Text),
                ColumnDescriptor::new("job_description", Text),
                ColumnDescriptor::new("role", Text),
                ColumnDescriptor::new("seat", Numeric),
                ColumnDescriptor::new("stipend", Currency),
                ColumnDescriptor::new("duration", Numeric),
                ColumnDescriptor::new("location", Text),
                ColumnDescriptor::new("remote_work", Boolean),
                ColumnDescriptor::new("requirements", Text),
                ColumnDescriptor::new("created_at", Timestamp),
                ColumnDescriptor::new("start_date", Date),
                ColumnDescriptor::new("end_date", Date),
                ColumnDescriptor::new("application_deadline", Date),
                ColumnDescriptor::new("status", Enum(domain(&["open", "closed"]))),
            ],
            synonyms: domain(&[
                "internship",
                "internships",
                "job",
                "jobs",
                "position",
                "positions",
                "opening",
                "openings",
            ]),
            noun_singular: "internship".to_string(),
            noun_plural: "internships".to_string(),
            entity_key: Some("company_name".to_string()),
        };

        let user_internship = TableDescriptor {
            name: "user_internship".to_string(),
            columns: vec![
                ColumnDescriptor::new("id", Identifier),
                ColumnDescriptor::new("internship_id", Identifier),
                ColumnDescriptor::new("user_name", Identifier),
                ColumnDescriptor::new("application_date", Timestamp),
                ColumnDescriptor::new("resume_link", Text),
                ColumnDescriptor::new("cover_letter_text", Text),
                ColumnDescriptor::new("interview_date", Date),
                ColumnDescriptor::new("interview_feedback", Text),
                ColumnDescriptor::new("score", Numeric),
                ColumnDescriptor::new(
                    "status",
                    Enum(domain(&["applied", "pending", "selected", "rejected"])),
                ),
                ColumnDescriptor::new("updated_at", Timestamp),
            ],
            synonyms: domain(&["application", "applications", "applied", "applicant", "applicants"]),
            noun_singular: "application".to_string(),
            noun_plural: "applications".to_string(),
            entity_key: None,
        };

        Self::new(vec![user_details, internship_details, user_internship])
    }

    /// All tables, in declaration order.
    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    /// Look up a table descriptor by name.
    pub fn describe(&self, table: &str) -> Result<&TableDescriptor> {
        self.tables
            .iter()
            .find(|t| t.name == table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()).into())
    }

    /// Whether the table name is known.
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t.name == table)
    }

    /// Resolve a question token to a table via its name or synonyms.
    pub fn resolve_table(&self, token: &str) -> Option<&TableDescriptor> {
        self.tables
            .iter()
            .find(|t| t.name == token || t.synonyms.iter().any(|s| s == token))
    }

    /// Schema context handed to the text-to-SQL oracle.
    pub fn oracle_context(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            out.push_str("TABLE ");
            out.push_str(&table.name);
            out.push_str(" (");
            let cols: Vec<String> = table
                .columns
                .iter()
                .map(|c| match &c.semantic {
                    SemanticType::Enum(values) => {
                        format!("{} enum[{}]", c.name, values.join(", "))
                    }
                    other => format!("{} {:?}", c.name, other).to_lowercase(),
                })
                .collect();
            out.push_str(&cols.join(", "));
            out.push_str(")\n");
        }
        out
    }

    fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(SchemaError::Mismatch("no tables defined".to_string()).into());
        }
        for (i, table) in self.tables.iter().enumerate() {
            if self.tables[..i].iter().any(|t| t.name == table.name) {
                return Err(
                    SchemaError::Mismatch(format!("duplicate table: {}", table.name)).into(),
                );
            }
            if table.columns.is_empty() {
                return Err(
                    SchemaError::Mismatch(format!("table {} has no columns", table.name)).into(),
                );
            }
            for (j, col) in table.columns.iter().enumerate() {
                if table.columns[..j].iter().any(|c| c.name == col.name) {
                    return Err(SchemaError::Mismatch(format!(
                        "duplicate column: {}.{}",
                        table.name, col.name
                    ))
                    .into());
                }
            }
            if let Some(key) = &table.entity_key {
                if table.column(key).is_none() {
                    return Err(SchemaError::Mismatch(format!(
                        "entity key {}.{} does not exist",
                        table.name, key
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}

fn domain(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// ============================================================================
// Tests
// ============================================================================
