// Result presentation: flatten a ComparisonResult into display rows, apply
// search/filter/sort/pagination, and lay out an aligned text table.
// Pure functions: no IO, no clap.

use ledgermatch_engine::model::ComparisonResult;
use unicode_width::UnicodeWidthStr;

// ---------------------------------------------------------------------------
// Row view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Matched,
    Mismatched,
    MissingInFirst,
    MissingInSecond,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Matched => "matched",
            RowStatus::Mismatched => "mismatched",
            RowStatus::MissingInFirst => "missing_in_first",
            RowStatus::MissingInSecond => "missing_in_second",
        }
    }
}

/// One displayable line of a result. Mismatched rows carry both amounts;
/// one-sided rows carry only the side they exist on.
#[derive(Debug, Clone)]
pub struct RowView {
    pub status: RowStatus,
    pub invoice_no: String,
    pub first_amount: Option<f64>,
    pub second_amount: Option<f64>,
    pub date: String,
}

impl RowView {
    /// Signed difference, first minus second, for rows present on both sides.
    pub fn delta(&self) -> Option<f64> {
        match (self.first_amount, self.second_amount) {
            (Some(f), Some(s)) if self.status == RowStatus::Mismatched => Some(f - s),
            _ => None,
        }
    }

    fn sort_amount(&self) -> f64 {
        self.first_amount.or(self.second_amount).unwrap_or(0.0)
    }
}

/// Flatten a result into rows, preserving the engine's ordering contract
/// within each classification group.
pub fn flatten(result: &ComparisonResult) -> Vec<RowView> {
    let mut rows = Vec::with_capacity(
        result.matched.len()
            + result.mismatched.len()
            + result.missing_in_first.len()
            + result.missing_in_second.len(),
    );

    for rec in &result.matched {
        rows.push(RowView {
            status: RowStatus::Matched,
            invoice_no: rec.invoice_no.clone(),
            first_amount: Some(rec.amount),
            second_amount: Some(rec.amount),
            date: rec.date.clone(),
        });
    }
    for pair in &result.mismatched {
        rows.push(RowView {
            status: RowStatus::Mismatched,
            invoice_no: pair.first.invoice_no.clone(),
            first_amount: Some(pair.first.amount),
            second_amount: Some(pair.second.amount),
            date: pair.first.date.clone(),
        });
    }
    for rec in &result.missing_in_first {
        rows.push(RowView {
            status: RowStatus::MissingInFirst,
            invoice_no: rec.invoice_no.clone(),
            first_amount: None,
            second_amount: Some(rec.amount),
            date: rec.date.clone(),
        });
    }
    for rec in &result.missing_in_second {
        rows.push(RowView {
            status: RowStatus::MissingInSecond,
            invoice_no: rec.invoice_no.clone(),
            first_amount: Some(rec.amount),
            second_amount: None,
            date: rec.date.clone(),
        });
    }

    rows
}

// ---------------------------------------------------------------------------
// View options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Invoice,
    Amount,
    Date,
}

#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    /// Case-insensitive invoice-number substring.
    pub search: Option<String>,
    pub status: Option<RowStatus>,
    /// Stable sort: equal keys keep the engine's ordering.
    pub sort: Option<SortKey>,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Filter, sort, and paginate rows for display, in that order.
pub fn apply(mut rows: Vec<RowView>, options: &ViewOptions) -> Vec<RowView> {
    if let Some(status) = options.status {
        rows.retain(|r| r.status == status);
    }

    if let Some(ref term) = options.search {
        let term = term.to_lowercase();
        rows.retain(|r| r.invoice_no.to_lowercase().contains(&term));
    }

    match options.sort {
        Some(SortKey::Invoice) => rows.sort_by(|a, b| a.invoice_no.cmp(&b.invoice_no)),
        Some(SortKey::Amount) => {
            rows.sort_by(|a, b| a.sort_amount().total_cmp(&b.sort_amount()))
        }
        Some(SortKey::Date) => rows.sort_by(|a, b| a.date.cmp(&b.date)),
        None => {}
    }

    rows.into_iter()
        .skip(options.offset)
        .take(options.limit.unwrap_or(usize::MAX))
        .collect()
}

// ---------------------------------------------------------------------------
// Table layout
// ---------------------------------------------------------------------------

const MAX_CELL_WIDTH: usize = 32;

/// Render rows as an aligned text table. Numeric columns are right-aligned;
/// absent amounts render as `-`.
pub fn render_table(rows: &[RowView]) -> String {
    if rows.is_empty() {
        return "no records to display\n".to_string();
    }

    let header = ["STATUS", "INVOICE", "FIRST", "SECOND", "DELTA", "DATE"];
    let body: Vec<[String; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.status.as_str().to_string(),
                truncate_display(&r.invoice_no, MAX_CELL_WIDTH),
                format_amount(r.first_amount),
                format_amount(r.second_amount),
                format_amount(r.delta()),
                truncate_display(&r.date, MAX_CELL_WIDTH),
            ]
        })
        .collect();

    let mut widths: [usize; 6] = header.map(display_width);
    for line in &body {
        for (w, cell) in widths.iter_mut().zip(line.iter()) {
            *w = (*w).max(display_width(cell));
        }
    }

    let mut out = String::new();
    for (i, name) in header.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(&pad_right(name, widths[i]));
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out.push('\n');

    for line in &body {
        for (i, cell) in line.iter().enumerate() {
            if i > 0 {
                out.push_str("  ");
            }
            // Amount columns right-align.
            if (2..=4).contains(&i) {
                out.push_str(&pad_left(cell, widths[i]));
            } else {
                out.push_str(&pad_right(cell, widths[i]));
            }
        }
        // Trailing blanks from the last column are noise.
        while out.ends_with(' ') {
            out.pop();
        }
        out.push('\n');
    }

    out
}

fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(n) => format!("{n:.2}"),
        None => "-".to_string(),
    }
}

/// Display width of a string, accounting for CJK double-width, emoji, etc.
fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if
/// truncated.
fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }

    let budget = width.saturating_sub(2);
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(sw)))
}

fn pad_left(s: &str, width: usize) -> String {
    let sw = display_width(s);
    format!("{}{}", " ".repeat(width.saturating_sub(sw)), s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgermatch_engine::model::{CanonicalRecord, MismatchedPair};

    fn rec(invoice_no: &str, amount: f64, date: &str) -> CanonicalRecord {
        CanonicalRecord {
            invoice_no: invoice_no.into(),
            amount,
            date: date.into(),
        }
    }

    fn sample() -> ComparisonResult {
        ComparisonResult {
            matched: vec![rec("INV-1", 100.0, "2024-01-01")],
            mismatched: vec![MismatchedPair {
                first: rec("INV-2", 50.0, "2024-01-02"),
                second: rec("INV-2", 52.0, "2024-01-02"),
            }],
            missing_in_first: vec![rec("INV-3", 10.0, "2024-01-03")],
            missing_in_second: vec![rec("INV-4", 30.0, "2024-01-04")],
            duplicate_keys: vec![],
        }
    }

    #[test]
    fn flatten_preserves_group_order() {
        let rows = flatten(&sample());
        let statuses: Vec<&str> = rows.iter().map(|r| r.status.as_str()).collect();
        assert_eq!(
            statuses,
            ["matched", "mismatched", "missing_in_first", "missing_in_second"]
        );
        assert_eq!(rows[1].delta(), Some(-2.0));
        assert_eq!(rows[2].first_amount, None);
        assert_eq!(rows[3].second_amount, None);
    }

    #[test]
    fn status_filter() {
        let rows = apply(
            flatten(&sample()),
            &ViewOptions {
                status: Some(RowStatus::Mismatched),
                ..Default::default()
            },
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].invoice_no, "INV-2");
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let rows = apply(
            flatten(&sample()),
            &ViewOptions {
                search: Some("inv-3".into()),
                ..Default::default()
            },
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, RowStatus::MissingInFirst);
    }

    #[test]
    fn sort_by_amount_is_stable() {
        let mut result = sample();
        result.matched.push(rec("INV-0", 50.0, "2024-01-05"));
        let rows = apply(
            flatten(&result),
            &ViewOptions {
                sort: Some(SortKey::Amount),
                ..Default::default()
            },
        );
        let keys: Vec<&str> = rows.iter().map(|r| r.invoice_no.as_str()).collect();
        // 10, 30, 50, 50, 100 — the two 50s keep their flatten order
        // (matched INV-0 before mismatched INV-2).
        assert_eq!(keys, ["INV-3", "INV-4", "INV-0", "INV-2", "INV-1"]);
    }

    #[test]
    fn pagination_applies_after_sort() {
        let rows = apply(
            flatten(&sample()),
            &ViewOptions {
                sort: Some(SortKey::Invoice),
                offset: 1,
                limit: Some(2),
                ..Default::default()
            },
        );
        let keys: Vec<&str> = rows.iter().map(|r| r.invoice_no.as_str()).collect();
        assert_eq!(keys, ["INV-2", "INV-3"]);
    }

    #[test]
    fn offset_past_end_is_empty() {
        let rows = apply(
            flatten(&sample()),
            &ViewOptions {
                offset: 99,
                ..Default::default()
            },
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn table_renders_aligned_columns() {
        let table = render_table(&flatten(&sample()));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("STATUS"));
        assert!(lines[1].contains("100.00"));
        assert!(lines[2].contains("-2.00"));
        // One-sided rows show a dash on the absent side.
        assert!(lines[3].contains('-'));
    }

    #[test]
    fn long_invoice_numbers_truncate() {
        let long = "X".repeat(64);
        let rows = vec![RowView {
            status: RowStatus::Matched,
            invoice_no: long,
            first_amount: Some(1.0),
            second_amount: Some(1.0),
            date: String::new(),
        }];
        let table = render_table(&rows);
        assert!(table.contains(".."));
        assert!(!table.contains(&"X".repeat(33)));
    }
}
