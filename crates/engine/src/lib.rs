//! `ledgermatch-engine` — Invoice reconciliation engine.
//!
//! Pure engine crate: receives decoded rows, returns classified results.
//! No CLI or IO dependencies. Normalization and reconciliation are total
//! over their inputs; the only fallible surface is run-config parsing.

pub mod config;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod resolve;
pub mod summary;

pub use config::{ConfigError, RunConfig};
pub use model::{CanonicalRecord, ComparisonResult, Dataset, RawRow, RawValue};
pub use normalize::{normalize, normalize_all};
pub use reconcile::{reconcile, reconcile_with, DuplicatePolicy, ReconcileOptions, AMOUNT_EPSILON};
pub use resolve::ColumnResolver;
pub use summary::compute_summary;
