//! Pipe-separated text tables for multi-row results.

use crate::config::RenderConfig;
use crate::exec::QueryResult;
use crate::utils::truncate_str;

/// Render a result as an aligned text table.
///
/// Column widths fit the widest of header and cells, cells wider than
/// `max_cell_width` are truncated, and output past `max_table_rows` is
/// elided with a trailing "... and N more rows" line.
pub fn render_table(result: &QueryResult, config: &RenderConfig) -> String {
    if result.columns.is_empty() {
        return String::new();
    }

    let shown = result.rows.len().min(config.max_table_rows);
    let cells: Vec<Vec<String>> = result.rows[..shown]
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| truncate_str(&v.to_string(), config.max_cell_width).to_string())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            cells
                .iter()
                .map(|row| row.get(idx).map_or(0, String::len))
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&render_row(&result.columns, &widths));
    out.push('\n');
    out.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    for row in &cells {
        out.push('\n');
        out.push_str(&render_row(row, &widths));
    }
    if result.rows.len() > shown {
        out.push_str(&format!("\n... and {} more rows", result.rows.len() - shown));
    }
    out
}

fn render_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref()))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
