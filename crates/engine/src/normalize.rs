use crate::model::{CanonicalRecord, Dataset, RawRow, RawValue};
use crate::resolve::ColumnResolver;

/// Join key assigned to rows with no resolvable invoice column.
pub const UNKNOWN_KEY: &str = "UNKNOWN";

/// Normalize one decoded row into the canonical record shape.
///
/// Total: every malformed or sparse input produces a best-effort record
/// rather than an error, so downstream reconciliation can classify every
/// row. An entirely blank row normalizes to
/// `{ invoice_no: "UNKNOWN", amount: 0, date: "" }`.
pub fn normalize(row: &RawRow, resolver: &ColumnResolver) -> CanonicalRecord {
    let invoice_no = match resolver.invoice.resolve(row) {
        Some(v) => normalize_key(&v.to_display()),
        None => UNKNOWN_KEY.to_string(),
    };

    let amount = resolver.amount.resolve(row).map_or(0.0, raw_amount);

    let date = resolver
        .date
        .resolve(row)
        .map(RawValue::to_display)
        .unwrap_or_default();

    CanonicalRecord {
        invoice_no,
        amount,
        date,
    }
}

/// Normalize a whole decoded file, retaining the original rows as a
/// side-table parallel to the canonical records.
pub fn normalize_all(rows: Vec<RawRow>, resolver: &ColumnResolver) -> Dataset {
    let records = rows.iter().map(|r| normalize(r, resolver)).collect();
    Dataset {
        records,
        originals: rows,
    }
}

/// Canonical join-key form: trimmed, upper-cased. Makes downstream key
/// comparison exact-string-equality safe despite inconsistent source
/// casing and whitespace.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Parse an amount out of free-form text: keep digits, the decimal point,
/// and the minus sign (strips currency symbols and thousands separators),
/// then parse as f64. A failed or empty parse yields 0.
pub fn parse_amount(s: &str) -> f64 {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

fn raw_amount(value: &RawValue) -> f64 {
    match value {
        RawValue::Number(n) if n.is_finite() => *n,
        RawValue::Number(_) | RawValue::Empty => 0.0,
        RawValue::Text(s) => parse_amount(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, RawValue)]) -> RawRow {
        let mut r = RawRow::default();
        for (name, value) in cells {
            r.push(*name, value.clone());
        }
        r
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn heterogeneous_headers_normalize() {
        let r = row(&[
            ("Invoice Number", text(" abc-9 ")),
            ("Amt", text("$1,200.50")),
            ("Txn Date", text("2024-02-02")),
        ]);
        let rec = normalize(&r, &ColumnResolver::default());
        assert_eq!(rec.invoice_no, "ABC-9");
        assert_eq!(rec.amount, 1200.50);
        assert_eq!(rec.date, "2024-02-02");
    }

    #[test]
    fn empty_row_normalizes_to_unknown() {
        let r = row(&[
            ("Invoice", RawValue::Empty),
            ("Amount", RawValue::Empty),
            ("Date", RawValue::Empty),
        ]);
        let rec = normalize(&r, &ColumnResolver::default());
        assert_eq!(rec.invoice_no, UNKNOWN_KEY);
        assert_eq!(rec.amount, 0.0);
        assert_eq!(rec.date, "");
    }

    #[test]
    fn missing_invoice_column_yields_unknown() {
        let r = row(&[("Vendor", text("Acme")), ("Amount", text("42"))]);
        let rec = normalize(&r, &ColumnResolver::default());
        assert_eq!(rec.invoice_no, UNKNOWN_KEY);
        assert_eq!(rec.amount, 42.0);
    }

    #[test]
    fn numeric_cells_pass_through() {
        let r = row(&[
            ("Invoice No", RawValue::Number(1001.0)),
            ("Amount", RawValue::Number(99.95)),
        ]);
        let rec = normalize(&r, &ColumnResolver::default());
        assert_eq!(rec.invoice_no, "1001");
        assert_eq!(rec.amount, 99.95);
    }

    #[test]
    fn normalization_is_idempotent() {
        let r = row(&[
            ("invoice_no", text("INV-7")),
            ("amount", RawValue::Number(31.5)),
            ("date", text("2024-05-05")),
        ]);
        let once = normalize(&r, &ColumnResolver::default());

        let again = row(&[
            ("invoice_no", text(&once.invoice_no)),
            ("amount", RawValue::Number(once.amount)),
            ("date", text(&once.date)),
        ]);
        let twice = normalize(&again, &ColumnResolver::default());
        assert_eq!(once.invoice_no, twice.invoice_no);
        assert_eq!(once.amount, twice.amount);
    }

    #[test]
    fn parse_amount_strips_currency_noise() {
        assert_eq!(parse_amount("$1,200.50"), 1200.50);
        assert_eq!(parse_amount("EUR 99"), 99.0);
        assert_eq!(parse_amount("-50"), -50.0);
        assert_eq!(parse_amount(" 685.00 "), 685.0);
    }

    #[test]
    fn parse_amount_failures_become_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("N/A"), 0.0);
        assert_eq!(parse_amount("--"), 0.0);
        assert_eq!(parse_amount("1.2.3"), 0.0);
    }

    #[test]
    fn normalize_all_keeps_originals_side_table() {
        let rows = vec![
            row(&[("Invoice", text("a-1")), ("Amount", text("10"))]),
            row(&[("Invoice", text("a-2")), ("Amount", text("20"))]),
        ];
        let ds = normalize_all(rows.clone(), &ColumnResolver::default());
        assert_eq!(ds.records.len(), 2);
        assert_eq!(ds.records[0].invoice_no, "A-1");
        assert_eq!(ds.original(1), Some(&rows[1]));
    }
}
