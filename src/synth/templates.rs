//! Template strategy: deterministic SQL generation, one fixed shape per
//! archetype. All literal values pass through a single quoting routine
//! keyed on the column's semantic type.

use crate::error::SynthesisError;
use crate::query::{Archetype, CompareOp, FilterPredicate, FilterValue, Intent};
use crate::schema::{SchemaDescriptor, TableDescriptor};

/// Render an intent into a SQL string.
pub fn render(intent: &Intent, schema: &SchemaDescriptor) -> Result<String, SynthesisError> {
    let table_name = intent.table.as_deref().ok_or_else(|| {
        SynthesisError::UnsupportedIntent("intent has no target table".to_string())
    })?;
    let table = schema
        .describe(table_name)
        .map_err(|_| SynthesisError::UnknownColumn {
            table: table_name.to_string(),
            column: "*".to_string(),
        })?;

    let where_clause = render_where(&intent.filters, table)?;

    let sql = match &intent.archetype {
        Archetype::Count => {
            format!("SELECT COUNT(*) FROM {}{};", table.name, where_clause)
        }
        Archetype::ListAll | Archetype::ListFiltered => {
            let columns = render_projection(intent, table)?;
            format!("SELECT {} FROM {}{};", columns, table.name, where_clause)
        }
        Archetype::Aggregate { op, column } => {
            let column = require_column(table, column)?;
            if !column.is_metric() {
                return Err(SynthesisError::UnsupportedIntent(format!(
                    "cannot aggregate non-numeric column {}",
                    column.name
                )));
            }
            format!(
                "SELECT {}({}) FROM {}{};",
                op.sql_name(),
                column.name,
                table.name,
                where_clause
            )
        }
        Archetype::LookupEntity { key, value } => {
            let key = require_column(table, key)?;
            let mut clause = format!("{} = {}", key.name, quote_text(value));
            for predicate in &intent.filters {
                clause.push_str(" AND ");
                clause.push_str(&render_predicate(predicate, table)?);
            }
            format!("SELECT * FROM {} WHERE {};", table.name, clause)
        }
        Archetype::TopN {
            n,
            order_column,
            direction,
        } => {
            let column = require_column(table, order_column)?;
            format!(
                "SELECT * FROM {}{} ORDER BY {} {} LIMIT {};",
                table.name,
                where_clause,
                column.name,
                direction.sql_keyword(),
                n
            )
        }
        Archetype::Unknown => {
            return Err(SynthesisError::UnsupportedIntent(
                "unknown intent".to_string(),
            ));
        }
    };

    Ok(sql)
}

fn render_projection(
    intent: &Intent,
    table: &TableDescriptor,
) -> Result<String, SynthesisError> {
    match &intent.projection {
        None => Ok("*".to_string()),
        Some(columns) => {
            let mut names = Vec::with_capacity(columns.len());
            for column in columns {
                names.push(require_column(table, column)?.name.clone());
            }
            Ok(names.join(", "))
        }
    }
}

fn render_where(
    filters: &[FilterPredicate],
    table: &TableDescriptor,
) -> Result<String, SynthesisError> {
    if filters.is_empty() {
        return Ok(String::new());
    }
    let mut parts = Vec::with_capacity(filters.len());
    for predicate in filters {
        parts.push(render_predicate(predicate, table)?);
    }
    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

fn render_predicate(
    predicate: &FilterPredicate,
    table: &TableDescriptor,
) -> Result<String, SynthesisError> {
    let column = require_column(table, &predicate.column)?;

    let rendered = match (&predicate.op, &predicate.value) {
        (CompareOp::Between, FilterValue::Range(from, to)) => {
            format!(
                "{} BETWEEN {} AND {}",
                column.name,
                quote_text(&from.to_string()),
                quote_text(&to.to_string())
            )
        }
        (CompareOp::Between, other) => {
            return Err(SynthesisError::InvalidLiteral {
                column: column.name.clone(),
                value: format!("{other:?}"),
            });
        }
        (op, value) => {
            format!(
                "{} {} {}",
                column.name,
                op.sql_symbol(),
                render_value(value, column)?
            )
        }
    };

    Ok(rendered)
}

fn render_value(
    value: &FilterValue,
    column: &crate::schema::ColumnDescriptor,
) -> Result<String, SynthesisError> {
    match value {
        FilterValue::Number(n) => {
            if !n.is_finite() {
                return Err(SynthesisError::InvalidLiteral {
                    column: column.name.clone(),
                    value: n.to_string(),
                });
            }
            if n.fract() == 0.0 {
                Ok(format!("{}", *n as i64))
            } else {
                Ok(n.to_string())
            }
        }
        FilterValue::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        FilterValue::Text(s) => Ok(quote_text(s)),
        FilterValue::Date(d) => Ok(quote_text(&d.to_string())),
        FilterValue::Range(..) => Err(SynthesisError::InvalidLiteral {
            column: column.name.clone(),
            value: "range outside BETWEEN".to_string(),
        }),
    }
}

fn require_column<'a>(
    table: &'a TableDescriptor,
    name: &str,
) -> Result<&'a crate::schema::ColumnDescriptor, SynthesisError> {
    table.column(name).ok_or_else(|| SynthesisError::UnknownColumn {
        table: table.name.clone(),
        column: name.to_string(),
    })
}

/// The single quoting routine for text and date literals: internal single
/// quotes are doubled, the result is wrapped in single quotes.
pub fn quote_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// ============================================================================
// Tests
// ============================================================================
