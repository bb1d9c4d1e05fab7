//! Trailing-window table: the last N calendar months of the panel.

use chrono::{Months, NaiveDate};
use marketpanel_core::Panel;

/// Rows dated on or after `last_date - months`, most recent first, with the
/// priority columns leading and the rest in panel order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailingWindow {
    pub columns: Vec<String>,
    /// `(date, values)` with one value per entry of `columns`.
    pub rows: Vec<(NaiveDate, Vec<Option<f64>>)>,
}

impl TrailingWindow {
    pub fn from_panel(panel: &Panel, months: u32, priority: &[String]) -> Self {
        let columns = ordered_columns(panel, priority);
        let Some(last) = panel.last_date() else {
            return Self {
                columns,
                rows: Vec::new(),
            };
        };
        // Month arithmetic clamps to the end of shorter months (03-31 → 02-29).
        let cutoff = last.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN);
        let view = panel.rows_since(cutoff);

        let rows = view
            .dates()
            .iter()
            .enumerate()
            .rev()
            .map(|(row, date)| {
                let values = columns.iter().map(|c| view.value_at(c, row)).collect();
                (*date, values)
            })
            .collect();
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a pipe table with a leading `date` column. Undefined cells are blank.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("| date |");
        for c in &self.columns {
            out.push_str(&format!(" {c} |"));
        }
        out.push_str("\n|:-----|");
        for _ in &self.columns {
            out.push_str("---:|");
        }
        out.push('\n');
        for (date, values) in &self.rows {
            out.push_str(&format!("| {date} |"));
            for v in values {
                match v {
                    Some(x) => out.push_str(&format!(" {x} |")),
                    None => out.push_str("  |"),
                }
            }
            out.push('\n');
        }
        out
    }
}

fn ordered_columns(panel: &Panel, priority: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = priority
        .iter()
        .filter(|c| panel.contains(c))
        .cloned()
        .collect();
    for name in panel.column_names() {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    }
    columns
}
