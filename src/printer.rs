use std::fmt::Write;

use crate::table::Table;
use crate::value::Value;

/// Renders a table as an ASCII grid.
///
/// One column per attribute, headed by `name:TYPE`, with column widths fitted
/// to the widest cell. Null cells render as `NULL`. A row-count footer closes
/// the grid.
pub fn render(table: &Table) -> String {
    let headers: Vec<String> = table
        .schema()
        .attributes()
        .iter()
        .map(|a| a.to_string())
        .collect();

    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| {
            table
                .schema()
                .attributes()
                .iter()
                .map(|a| match row.get(&a.name) {
                    None | Some(Value::Null) => "NULL".to_string(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let sep = separator(&widths);
    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_line(&mut out, &headers, &widths);
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out.push_str(&sep);
    out.push('\n');
    let _ = write!(out, "(rows: {})", rows.len());
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        let _ = write!(out, " {cell:<width$} |");
    }
    out.push('\n');
}

fn separator(widths: &[usize]) -> String {
    let mut sep = String::from("+");
    for width in widths {
        sep.push_str(&"-".repeat(width + 2));
        sep.push('+');
    }
    sep
}
