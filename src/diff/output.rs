//! Terminal output rendering for diff reports.
//!
//! Renders one table per dimension with the columns
//! `name | old | new | delta`, followed by the aggregate row.

use super::schema::{DeltaRow, DeltaSection, DiffReport, DiffStatus};
use colored::*;

const NAME_HEADER: &str = "name";
const OLD_HEADER: &str = "old";
const NEW_HEADER: &str = "new";
const DELTA_HEADER: &str = "delta";

/// Render a human-readable summary of a diff report for the terminal
pub fn render_terminal_diff(report: &DiffReport) -> String {
    let mut out = String::new();

    out.push_str(&render_header(report));
    for section in &report.sections {
        out.push_str(&render_section(section));
    }
    out.push_str(&render_status(report));

    out
}

fn render_header(report: &DiffReport) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("{} comparison", report.kind).bold().to_string());
    out.push_str("\n---------------------------------------------------\n");
    out.push_str(&format!("Old: {} ({} keys)\n", report.old.source, report.old.key_count));
    out.push_str(&format!("New: {} ({} keys)\n", report.new.source, report.new.key_count));
    if let Some(rate) = report.old.sampling_rate {
        out.push_str(&format!("Sampling rate: {}\n", rate));
    }
    out.push_str("---------------------------------------------------\n");
    out
}

/// Render one dimension as a plain aligned table
pub fn render_section(section: &DeltaSection) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("[{}]\n", section.dimension));

    if section.rows.is_empty() {
        out.push_str("  no data\n");
    }

    let cells: Vec<[String; 4]> = section
        .rows
        .iter()
        .chain(std::iter::once(&section.total))
        .map(row_cells)
        .collect();

    let header = [
        NAME_HEADER.to_string(),
        OLD_HEADER.to_string(),
        NEW_HEADER.to_string(),
        DELTA_HEADER.to_string(),
    ];

    let mut widths = [0usize; 4];
    for row in std::iter::once(&header).chain(cells.iter()) {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    out.push_str(&format_line(&header, &widths));
    let rule_width = widths.iter().sum::<usize>() + 3 * 2;
    let (rows, total) = cells.split_at(cells.len() - 1);
    for row in rows {
        out.push_str(&format_line(row, &widths));
    }
    out.push_str(&format!("  {}\n", "-".repeat(rule_width)));
    out.push_str(&format_line(&total[0], &widths));

    out
}

fn row_cells(row: &DeltaRow) -> [String; 4] {
    [
        row.key.clone(),
        format_value(row.old),
        format_value(row.new),
        row.change.to_string(),
    ]
}

fn format_line(cells: &[String; 4], widths: &[usize; 4]) -> String {
    format!(
        "  {:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}\n",
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    )
}

/// Missing values render as "-"; whole numbers without decimals
fn format_value(value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{:.0}", v),
        Some(v) => format!("{:.2}", v),
    }
}

fn render_status(report: &DiffReport) -> String {
    let mut out = String::new();
    out.push_str("\n---------------------------------------------------\n");

    if let Some(warning) = &report.summary.warning {
        out.push_str(&format!("note: {}\n", warning));
    }

    for violation in &report.threshold_violations {
        let actual = violation
            .actual
            .map(|a| format!("{:+.2}%", a))
            .unwrap_or_else(|| "unbounded".to_string());
        out.push_str(&format!(
            "  {:?}: {} {} (limit {:.2}%)\n",
            violation.severity, violation.metric, actual, violation.threshold
        ));
    }

    let status_msg = match report.summary.status {
        DiffStatus::Failed => format!(
            "STATUS: REGRESSION DETECTED ({} violations)",
            report.summary.violation_count
        )
        .red()
        .bold(),
        DiffStatus::Warning => format!(
            "STATUS: WARNING ({} violations)",
            report.summary.violation_count
        )
        .yellow()
        .bold(),
        DiffStatus::Passed => "STATUS: PASSED".green().bold(),
    };
    out.push_str(&status_msg.to_string());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::schema::Change;
    use crate::utils::config::TOTAL_ROW_KEY;

    fn row(key: &str, old: Option<f64>, new: Option<f64>, change: Change) -> DeltaRow {
        DeltaRow {
            key: key.to_string(),
            old,
            new,
            change,
        }
    }

    #[test]
    fn test_render_section_columns() {
        let section = DeltaSection {
            dimension: "alloc_bytes".to_string(),
            rows: vec![
                row("a", Some(10.0), Some(15.0), Change::Percent(50.0)),
                row("b", Some(20.0), None, Change::Removed),
            ],
            total: row(TOTAL_ROW_KEY, Some(30.0), Some(15.0), Change::Percent(-50.0)),
        };

        let text = render_section(&section);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "[alloc_bytes]");
        assert!(lines[2].contains("name") && lines[2].contains("delta"));
        assert!(lines[3].starts_with("  a "));
        assert!(lines[3].ends_with("+50.00%"));
        assert!(lines[4].ends_with("removed"));
        assert!(lines[4].contains(" - "));
        assert!(lines.last().unwrap().starts_with("  [total]"));
        assert!(lines.last().unwrap().ends_with("-50.00%"));
    }

    #[test]
    fn test_render_empty_section() {
        let section = DeltaSection {
            dimension: "ns/op".to_string(),
            rows: vec![],
            total: row(TOTAL_ROW_KEY, Some(0.0), Some(0.0), Change::Percent(0.0)),
        };

        let text = render_section(&section);
        assert!(text.contains("no data"));
        assert!(text.trim_end().ends_with("+0.00%"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(None), "-");
        assert_eq!(format_value(Some(1024.0)), "1024");
        assert_eq!(format_value(Some(12.346)), "12.35");
    }
}
