//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of
//! the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                           |
//! |------|---------------------------------------------------|
//! | 0    | Success / reconciled clean                        |
//! | 1    | Differences found (mismatched or missing records) |
//! | 2    | Usage error (bad args)                            |
//! | 3    | Duplicate keys (under `--on-duplicate error`)     |
//! | 4    | Unsupported or corrupt input file                 |
//! | 5    | I/O error                                         |
//! | 6    | History store error                               |

/// Success - reconciliation completed and every record matched.
pub const EXIT_SUCCESS: u8 = 0;

/// Differences found. Like `diff(1)`, exit 1 means "the datasets differ."
pub const EXIT_DIFFERENCES: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Duplicate invoice numbers within one dataset (under `--on-duplicate error`).
pub const EXIT_DUPLICATE: u8 = 3;

/// Input file is an unsupported format or could not be decoded.
pub const EXIT_UNSUPPORTED_FILE: u8 = 4;

/// I/O error (file read/write).
pub const EXIT_IO: u8 = 5;

/// History store error (open, save, or load).
pub const EXIT_HISTORY: u8 = 6;
