use crate::model::{RawRow, RawValue};

/// How one canonical field finds its source column.
///
/// A rule is a prioritized list of case-folded substring needles. Needles
/// are tried in order; within a needle, columns are scanned in source order
/// and the first column whose name contains the needle *and* whose value is
/// non-blank wins. Skipping blank-valued matches lets sparse rows fall
/// through to later needles, and ultimately to the caller's fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub needles: Vec<String>,
}

impl FieldRule {
    pub fn new<S: Into<String>>(needles: impl IntoIterator<Item = S>) -> Self {
        Self {
            needles: needles.into_iter().map(Into::into).collect(),
        }
    }

    /// First non-blank value whose column name matches, or None.
    pub fn resolve<'a>(&self, row: &'a RawRow) -> Option<&'a RawValue> {
        for needle in &self.needles {
            let needle = needle.to_lowercase();
            for (name, value) in &row.cells {
                if name.to_lowercase().contains(&needle) && !value.is_blank() {
                    return Some(value);
                }
            }
        }
        None
    }
}

/// Column-resolution strategy: one rule per canonical field.
///
/// The defaults encode the header heuristics invoice exports actually show
/// up with — source systems rarely agree on exact header names, so the
/// tool must work without a manual mapping step. Explicit header names can
/// be supplied through a run config; an exact name is just a needle that
/// happens to match one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnResolver {
    pub invoice: FieldRule,
    pub amount: FieldRule,
    pub date: FieldRule,
}

impl Default for ColumnResolver {
    fn default() -> Self {
        Self {
            invoice: FieldRule::new(["invoice", "no"]),
            amount: FieldRule::new(["amount", "amt"]),
            date: FieldRule::new(["date"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> RawRow {
        let mut r = RawRow::default();
        for (name, value) in cells {
            let v = if value.is_empty() {
                RawValue::Empty
            } else {
                RawValue::Text(value.to_string())
            };
            r.push(*name, v);
        }
        r
    }

    #[test]
    fn needle_priority_beats_column_order() {
        // "Ref No" appears before "Invoice" but the invoice needle is
        // tried first across all columns.
        let r = row(&[("Ref No", "X-1"), ("Invoice", "INV-1")]);
        let resolver = ColumnResolver::default();
        assert_eq!(
            resolver.invoice.resolve(&r),
            Some(&RawValue::Text("INV-1".into()))
        );
    }

    #[test]
    fn ambiguous_headers_pick_first_in_column_order() {
        let r = row(&[("Invoice Number", "INV-1"), ("Invoice Ref", "INV-2")]);
        let resolver = ColumnResolver::default();
        assert_eq!(
            resolver.invoice.resolve(&r),
            Some(&RawValue::Text("INV-1".into()))
        );
    }

    #[test]
    fn fallback_needle_used_when_primary_absent() {
        let r = row(&[("Doc No", "D-77"), ("Total", "10")]);
        let resolver = ColumnResolver::default();
        assert_eq!(
            resolver.invoice.resolve(&r),
            Some(&RawValue::Text("D-77".into()))
        );
    }

    #[test]
    fn blank_value_falls_through() {
        let r = row(&[("Invoice", ""), ("Order No", "ORD-3")]);
        let resolver = ColumnResolver::default();
        assert_eq!(
            resolver.invoice.resolve(&r),
            Some(&RawValue::Text("ORD-3".into()))
        );
    }

    #[test]
    fn no_match_yields_none() {
        let r = row(&[("Vendor", "Acme"), ("Total", "10")]);
        let resolver = ColumnResolver::default();
        assert_eq!(resolver.invoice.resolve(&r), None);
        assert_eq!(resolver.date.resolve(&r), None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let r = row(&[("INVOICE NUMBER", "inv-9")]);
        let resolver = ColumnResolver::default();
        assert!(resolver.invoice.resolve(&r).is_some());
    }
}
