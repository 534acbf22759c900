use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A scalar cell value as decoded from a tabular source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Empty,
}

impl RawValue {
    /// Whether the value carries no usable content (decoded null, or text
    /// that is empty after trimming). Numbers are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
            Self::Empty => true,
        }
    }

    /// Best-effort display string. Whole numbers drop the trailing `.0`
    /// (spreadsheet decoders hand back integer-valued floats).
    pub fn to_display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Self::Empty => String::new(),
        }
    }
}

/// One decoded row: `(column name, value)` pairs in source column order.
/// Order is significant — heuristic column resolution picks the first
/// matching column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub cells: Vec<(String, RawValue)>,
}

impl RawRow {
    pub fn push(&mut self, name: impl Into<String>, value: RawValue) {
        self.cells.push((name.into(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_blank())
    }
}

// ---------------------------------------------------------------------------
// Canonical records
// ---------------------------------------------------------------------------

/// The canonical shape every row normalizes to. `invoice_no` is the sole
/// join key, already trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub invoice_no: String,
    pub amount: f64,
    pub date: String,
}

/// A normalized dataset: canonical records plus a side-table of the
/// original rows, parallel by index. The side-table preserves the source
/// cells losslessly for display; only the canonical fields participate in
/// reconciliation.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<CanonicalRecord>,
    pub originals: Vec<RawRow>,
}

impl Dataset {
    /// The original row behind record `idx`, if retained.
    pub fn original(&self, idx: usize) -> Option<&RawRow> {
        self.originals.get(idx)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A key present in both datasets whose amounts differ by at least the
/// matching epsilon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchedPair {
    pub first: CanonicalRecord,
    pub second: CanonicalRecord,
}

impl MismatchedPair {
    /// Signed difference, first minus second.
    pub fn delta(&self) -> f64 {
        self.first.amount - self.second.amount
    }
}

/// Four-way classification of two datasets. Ordering contract:
/// `matched`/`mismatched`/`missing_in_first` follow the second dataset's
/// iteration order, `missing_in_second` follows the first's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub matched: Vec<CanonicalRecord>,
    pub mismatched: Vec<MismatchedPair>,
    pub missing_in_first: Vec<CanonicalRecord>,
    pub missing_in_second: Vec<CanonicalRecord>,
    /// Within-side key collisions, populated under `DuplicatePolicy::Report`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_keys: Vec<DuplicateKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::First => "first",
            Side::Second => "second",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub side: Side,
    pub key: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Derived counts for presentation and history listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub matched: usize,
    pub mismatched: usize,
    pub missing_in_first: usize,
    pub missing_in_second: usize,
    pub total: usize,
}
