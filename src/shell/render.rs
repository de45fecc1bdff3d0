use crate::quality::{QualityReport, ValidationReport};
use crate::shell::prompt::{GREEN, RED, RESET, YELLOW};
use crate::table::Table;

/// Longest cell shown in a preview before truncation.
const MAX_CELL_WIDTH: usize = 24;

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_CELL_WIDTH {
        let kept: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", kept)
    } else {
        text.to_owned()
    }
}

/// Renders a table as aligned text with a header separator.
pub(crate) fn render_table(table: &Table) -> String {
    let header: Vec<String> = table.columns().iter().map(|column| truncate(column)).collect();
    let cells: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|value| truncate(&value.to_string())).collect())
        .collect();
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            cells
                .iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_owned()
    };
    let mut lines = vec![line(&header)];
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    lines.extend(cells.iter().map(|row| line(row)));
    lines.join("\n")
}

/// Short quality summary printed after a table is loaded.
pub(crate) fn render_quality(report: &QualityReport) -> String {
    let mut lines = vec![format!(
        "{} rows x {} columns, about {:.2} MB in memory",
        report.total_rows, report.total_columns, report.memory_usage_mb
    )];
    let with_nulls: Vec<String> = report
        .columns_with_nulls()
        .map(|column| format!("{} {:.1}%", column.name, column.null_percentage))
        .collect();
    if with_nulls.is_empty() {
        lines.push("No column has empty values".to_owned());
    } else {
        lines.push(format!("Columns with empty values: {}", with_nulls.join(", ")));
    }
    lines.join("\n")
}

/// Warnings and overlap figures of a key check.
pub(crate) fn render_validation(report: &ValidationReport) -> String {
    let errors = report.errors.iter().map(|error| format!("{}error:{} {}", RED, RESET, error));
    let warnings = report
        .warnings
        .iter()
        .map(|warning| format!("{}warning:{} {}", YELLOW, RESET, warning));
    let mut lines: Vec<String> = errors.chain(warnings).collect();
    if lines.is_empty() {
        lines.push(format!("{}Keys look good{}", GREEN, RESET));
    }
    if let Some(info) = &report.info {
        lines.push(format!(
            "Expected matching keys: {} (unique keys: {} in A, {} in B)",
            info.overlap, info.unique_a, info.unique_b
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    #[test]
    fn tables_are_aligned() {
        let table = Table::new(
            vec!["id".into(), "name".into()],
            vec![
                vec![Value::from(1), Value::from("Ana")],
                vec![Value::from(22), Value::Null],
            ],
        )
        .unwrap();
        assert_eq!(
            render_table(&table),
            "id | name\n---+-----\n1  | Ana\n22 |"
        );
    }

    #[test]
    fn long_cells_are_truncated() {
        let text = "x".repeat(40);
        assert_eq!(truncate(&text).chars().count(), MAX_CELL_WIDTH);
        assert!(truncate(&text).ends_with("..."));
    }
}
