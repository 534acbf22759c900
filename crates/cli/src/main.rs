// LedgerMatch CLI - reconcile two invoice exports from the command line

mod exit_codes;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use ledgermatch_engine::model::{ComparisonResult, Summary};
use ledgermatch_engine::normalize::normalize_all;
use ledgermatch_engine::reconcile::{reconcile_with, DuplicatePolicy, ReconcileOptions};
use ledgermatch_engine::summary::compute_summary;
use ledgermatch_engine::RunConfig;
use ledgermatch_history::{HistoryStore, HISTORY_CAPACITY};
use ledgermatch_io::{decode_file, DecodeError};

use exit_codes::{
    EXIT_DIFFERENCES, EXIT_DUPLICATE, EXIT_HISTORY, EXIT_IO, EXIT_SUCCESS, EXIT_UNSUPPORTED_FILE,
    EXIT_USAGE,
};
use render::{apply, flatten, render_table, RowStatus, SortKey, ViewOptions};

#[derive(Parser)]
#[command(name = "lmatch")]
#[command(about = "Reconcile two invoice exports (CSV, TSV, or Excel)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile two exported invoice files
    #[command(after_help = "\
Examples:
  lmatch run january-erp.csv january-bank.xlsx
  lmatch run a.csv b.csv --status mismatched
  lmatch run a.csv b.csv --search INV-10 --sort amount --limit 20
  lmatch run a.csv b.csv --json > result.json
  lmatch run a.csv b.csv --config mapping.toml --on-duplicate error")]
    Run {
        /// First dataset (the reference side)
        first: PathBuf,

        /// Second dataset (compared against the first)
        second: PathBuf,

        /// TOML run config (column needles, duplicate policy)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Duplicate-key policy; overrides the config file
        #[arg(long, value_enum)]
        on_duplicate: Option<DuplicateArg>,

        /// Output the full result as JSON to stdout instead of a table
        #[arg(long)]
        json: bool,

        /// Write the full result JSON to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        view: ViewArgs,

        /// Do not record this run in history
        #[arg(long)]
        no_save: bool,

        /// History database path (default: platform data dir)
        #[arg(long)]
        history_db: Option<PathBuf>,

        /// Suppress the stderr summary
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// List saved runs, most recent first
    History {
        /// History database path (default: platform data dir)
        #[arg(long)]
        history_db: Option<PathBuf>,

        /// Output entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display a saved run by id
    #[command(after_help = "\
Examples:
  lmatch show 11
  lmatch show 11 --status missing-in-second
  lmatch show 11 --json")]
    Show {
        /// Run id from `lmatch history`
        id: i64,

        /// History database path (default: platform data dir)
        #[arg(long)]
        history_db: Option<PathBuf>,

        /// Output the stored result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        view: ViewArgs,

        /// Suppress the stderr summary
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

/// Search/filter/sort/pagination flags shared by `run` and `show`.
#[derive(Args)]
struct ViewArgs {
    /// Show only records whose invoice number contains this text
    #[arg(long)]
    search: Option<String>,

    /// Show only one classification
    #[arg(long, value_enum)]
    status: Option<StatusArg>,

    /// Sort rows (stable; ties keep classification order)
    #[arg(long, value_enum)]
    sort: Option<SortArg>,

    /// Skip this many rows
    #[arg(long, default_value_t = 0)]
    offset: usize,

    /// Show at most this many rows
    #[arg(long)]
    limit: Option<usize>,
}

impl ViewArgs {
    fn to_options(&self) -> ViewOptions {
        ViewOptions {
            search: self.search.clone(),
            status: self.status.map(StatusArg::to_status),
            sort: self.sort.map(SortArg::to_key),
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StatusArg {
    Matched,
    Mismatched,
    MissingInFirst,
    MissingInSecond,
}

impl StatusArg {
    fn to_status(self) -> RowStatus {
        match self {
            Self::Matched => RowStatus::Matched,
            Self::Mismatched => RowStatus::Mismatched,
            Self::MissingInFirst => RowStatus::MissingInFirst,
            Self::MissingInSecond => RowStatus::MissingInSecond,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Invoice,
    Amount,
    Date,
}

impl SortArg {
    fn to_key(self) -> SortKey {
        match self {
            Self::Invoice => SortKey::Invoice,
            Self::Amount => SortKey::Amount,
            Self::Date => SortKey::Date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DuplicateArg {
    /// Later record silently wins the join (the default)
    LastWins,
    /// Classify as usual but list every collision
    Report,
    /// Fail with exit code 3 when either side has duplicate keys
    Error,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

struct CliError {
    code: u8,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn args(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: msg.into(),
            hint: None,
        }
    }

    fn io(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_IO,
            message: msg.into(),
            hint: None,
        }
    }

    fn history(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_HISTORY,
            message: msg.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn decode(path: &Path, err: DecodeError) -> Self {
        let code = match err {
            DecodeError::Io(_) => EXIT_IO,
            DecodeError::UnsupportedFormat(_) | DecodeError::Corrupt(_) => EXIT_UNSUPPORTED_FILE,
        };
        let hint = match err {
            DecodeError::UnsupportedFormat(_) => {
                Some("supported formats: .csv, .tsv, .txt, .xlsx, .xls, .xlsb, .ods".to_string())
            }
            _ => None,
        };
        Self {
            code,
            message: format!("{}: {err}", path.display()),
            hint,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            first,
            second,
            config,
            on_duplicate,
            json,
            output,
            view,
            no_save,
            history_db,
            quiet,
        } => cmd_run(
            first,
            second,
            config,
            on_duplicate,
            json,
            output,
            view,
            no_save,
            history_db,
            quiet,
        ),
        Commands::History { history_db, json } => cmd_history(history_db, json),
        Commands::Show {
            id,
            history_db,
            json,
            view,
            quiet,
        } => cmd_show(id, history_db, json, view, quiet),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("error: {}", e.message);
            }
            if let Some(hint) = e.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(e.code)
        }
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    first_path: PathBuf,
    second_path: PathBuf,
    config_path: Option<PathBuf>,
    on_duplicate: Option<DuplicateArg>,
    json: bool,
    output: Option<PathBuf>,
    view: ViewArgs,
    no_save: bool,
    history_db: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let config = match config_path {
        Some(ref path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::io(format!("{}: {e}", path.display())))?;
            RunConfig::from_toml(&text)
                .map_err(|e| CliError::args(format!("{}: {e}", path.display())))?
        }
        None => RunConfig::default(),
    };

    let first_rows = decode_file(&first_path).map_err(|e| CliError::decode(&first_path, e))?;
    let second_rows = decode_file(&second_path).map_err(|e| CliError::decode(&second_path, e))?;

    let resolver = config.resolver();
    let first = normalize_all(first_rows, &resolver);
    let second = normalize_all(second_rows, &resolver);

    // The error policy is presentation-level: the engine reports, the CLI
    // decides it is fatal.
    let policy = match on_duplicate {
        Some(DuplicateArg::LastWins) => DuplicatePolicy::LastWins,
        Some(DuplicateArg::Report) | Some(DuplicateArg::Error) => DuplicatePolicy::Report,
        None => config.options().duplicates,
    };
    let result = reconcile_with(
        &first.records,
        &second.records,
        ReconcileOptions { duplicates: policy },
    );

    if on_duplicate == Some(DuplicateArg::Error) && !result.duplicate_keys.is_empty() {
        let mut msg = String::from("duplicate keys found:\n");
        for dup in &result.duplicate_keys {
            msg.push_str(&format!(
                "  {} key {:?} appears {} times\n",
                dup.side.as_str(),
                dup.key,
                dup.count
            ));
        }
        return Err(CliError {
            code: EXIT_DUPLICATE,
            message: msg.trim_end().to_string(),
            hint: Some(
                "deduplicate the source exports, or rerun with --on-duplicate report".to_string(),
            ),
        });
    }

    if !no_save {
        let db_path = history_db.unwrap_or_else(HistoryStore::default_path);
        match HistoryStore::open(&db_path) {
            Ok(store) => {
                if let Err(e) =
                    store.save(&file_label(&first_path), &file_label(&second_path), &result)
                {
                    eprintln!("warning: failed to save history: {e}");
                }
            }
            Err(e) => eprintln!("warning: failed to save history: {e}"),
        }
    }

    let summary = compute_summary(&result);

    write_result(&result, json, output.as_deref())?;
    if !json && output.is_none() {
        let rows = apply(flatten(&result), &view.to_options());
        print!("{}", render_table(&rows));
    }

    if !quiet {
        eprintln!(
            "first:  {} records ({})",
            first.records.len(),
            file_label(&first_path)
        );
        eprintln!(
            "second: {} records ({})",
            second.records.len(),
            file_label(&second_path)
        );
        print_summary(&summary);
        if !result.duplicate_keys.is_empty() {
            eprintln!("duplicate_keys: {}", result.duplicate_keys.len());
        }
    }

    if summary.mismatched > 0 || summary.missing_in_first > 0 || summary.missing_in_second > 0 {
        return Err(CliError {
            code: EXIT_DIFFERENCES,
            message: String::new(),
            hint: None,
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// history / show
// ---------------------------------------------------------------------------

fn open_store(history_db: Option<PathBuf>) -> Result<HistoryStore, CliError> {
    let path = history_db.unwrap_or_else(HistoryStore::default_path);
    HistoryStore::open(&path).map_err(|e| CliError::history(e.to_string()))
}

fn cmd_history(history_db: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let store = open_store(history_db)?;
    let entries = store.list().map_err(|e| CliError::history(e.to_string()))?;

    if json {
        let text = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::history(e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("no history yet");
        return Ok(());
    }

    for entry in &entries {
        let s = &entry.summary;
        println!(
            "{:>3}  {}  {} vs {} — {} matched, {} mismatched, {} missing in first, {} missing in second",
            entry.id,
            entry.run_at,
            entry.first_label,
            entry.second_label,
            s.matched,
            s.mismatched,
            s.missing_in_first,
            s.missing_in_second,
        );
    }

    Ok(())
}

fn cmd_show(
    id: i64,
    history_db: Option<PathBuf>,
    json: bool,
    view: ViewArgs,
    quiet: bool,
) -> Result<(), CliError> {
    let store = open_store(history_db)?;
    let Some((entry, result)) = store.load(id).map_err(|e| CliError::history(e.to_string()))?
    else {
        return Err(CliError::history(format!(
            "run {id} not found (history keeps the {HISTORY_CAPACITY} most recent runs)"
        ))
        .with_hint("run `lmatch history` to list saved runs"));
    };

    if json {
        let text = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::history(e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    let rows = apply(flatten(&result), &view.to_options());
    print!("{}", render_table(&rows));

    if !quiet {
        eprintln!(
            "run {} from {} — {} vs {}",
            entry.id, entry.run_at, entry.first_label, entry.second_label
        );
        print_summary(&entry.summary);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_summary(summary: &Summary) {
    eprintln!("matched: {}", summary.matched);
    eprintln!("mismatched: {}", summary.mismatched);
    eprintln!("missing_in_first: {}", summary.missing_in_first);
    eprintln!("missing_in_second: {}", summary.missing_in_second);
}

fn write_result(
    result: &ComparisonResult,
    json: bool,
    output: Option<&Path>,
) -> Result<(), CliError> {
    if !json && output.is_none() {
        return Ok(());
    }

    let text = serde_json::to_string_pretty(result)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

    if let Some(path) = output {
        std::fs::write(path, &text).map_err(|e| CliError::io(format!("{}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if json {
        println!("{text}");
    }

    Ok(())
}
