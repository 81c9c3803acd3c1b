use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::export::ExportReport;
use crate::models::{SortColumn, SortOrder};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Amounts are shown with two decimals; the stored value keeps full precision.
pub(crate) fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Column title with an arrow when the table is ordered by it.
pub(crate) fn column_title(name: &str, column: SortColumn, sort: Option<SortOrder>) -> String {
    match sort {
        Some(order) if order.column == column => {
            let arrow = if order.descending { '▼' } else { '▲' };
            format!("{name} {arrow}")
        }
        _ => name.to_string(),
    }
}

/// Status line for a finished export.
pub(crate) fn export_message(report: &ExportReport) -> String {
    let rows = plural(report.rows, "expense");
    match report.pages {
        Some(pages) => format!(
            "Exported {rows} to {} ({}).",
            report.path.display(),
            plural(pages, "page")
        ),
        None => format!("Exported {rows} to {}.", report.path.display()),
    }
}

pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::export::ExportKind;

    #[test]
    fn sort_arrow_only_on_active_column() {
        let sort = Some(SortOrder {
            column: SortColumn::Amount,
            descending: true,
        });
        assert_eq!(column_title("Amount", SortColumn::Amount, sort), "Amount ▼");
        assert_eq!(column_title("Time", SortColumn::Time, sort), "Time");
    }

    #[test]
    fn export_message_mentions_pages_for_pdf() {
        let report = ExportReport {
            kind: ExportKind::Pdf,
            path: PathBuf::from("out.pdf"),
            rows: 1,
            pages: Some(2),
        };
        assert_eq!(
            export_message(&report),
            "Exported 1 expense to out.pdf (2 pages)."
        );
    }
}
