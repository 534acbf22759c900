use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::model::{
    CanonicalRecord, ComparisonResult, DuplicateKey, MismatchedPair, Side,
};

/// Amount-equality threshold. Fixed, not configurable: it absorbs
/// floating-point and rounding noise for currency values in major units
/// (dollars, euros). Not suitable for amounts already in minor units.
pub const AMOUNT_EPSILON: f64 = 0.01;

/// What to do about duplicate invoice numbers within one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Later record silently overwrites the earlier one in the join index.
    #[default]
    LastWins,
    /// Same classification as `LastWins`, but every collision is surfaced
    /// in `ComparisonResult::duplicate_keys`.
    Report,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    pub duplicates: DuplicatePolicy,
}

/// Reconcile two canonical datasets with default options.
pub fn reconcile(first: &[CanonicalRecord], second: &[CanonicalRecord]) -> ComparisonResult {
    reconcile_with(first, second, ReconcileOptions::default())
}

/// Single join-key, one-pass-per-side reconciliation.
///
/// Pure function: no I/O, no mutation of inputs, deterministic. Cannot
/// fail on well-formed records — invalid numeric data was already
/// neutralized to 0 by normalization.
///
/// Ordering: `matched`/`mismatched`/`missing_in_first` preserve the second
/// dataset's iteration order; `missing_in_second` preserves the first's.
pub fn reconcile_with(
    first: &[CanonicalRecord],
    second: &[CanonicalRecord],
    options: ReconcileOptions,
) -> ComparisonResult {
    // Index the first dataset by key. Later records overwrite earlier
    // ones: explicit last-write-wins.
    let mut first_by_key: HashMap<&str, &CanonicalRecord> = HashMap::new();
    for rec in first {
        first_by_key.insert(rec.invoice_no.as_str(), rec);
    }

    let mut result = ComparisonResult::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for rec in second {
        seen.insert(rec.invoice_no.as_str());
        match first_by_key.get(rec.invoice_no.as_str()) {
            Some(first_rec) => {
                if (first_rec.amount - rec.amount).abs() < AMOUNT_EPSILON {
                    result.matched.push((*first_rec).clone());
                } else {
                    result.mismatched.push(MismatchedPair {
                        first: (*first_rec).clone(),
                        second: rec.clone(),
                    });
                }
            }
            None => result.missing_in_first.push(rec.clone()),
        }
    }

    for rec in first {
        if !seen.contains(rec.invoice_no.as_str()) {
            result.missing_in_second.push(rec.clone());
        }
    }

    if options.duplicates == DuplicatePolicy::Report {
        collect_duplicates(first, Side::First, &mut result.duplicate_keys);
        collect_duplicates(second, Side::Second, &mut result.duplicate_keys);
    }

    result
}

/// Keys appearing more than once within one side, in first-occurrence order.
fn collect_duplicates(records: &[CanonicalRecord], side: Side, out: &mut Vec<DuplicateKey>) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for rec in records {
        let entry = counts.entry(rec.invoice_no.as_str()).or_insert(0);
        if *entry == 0 {
            order.push(rec.invoice_no.as_str());
        }
        *entry += 1;
    }
    for key in order {
        let count = counts[key];
        if count > 1 {
            out.push(DuplicateKey {
                side,
                key: key.to_string(),
                count,
            });
        }
    }
}
