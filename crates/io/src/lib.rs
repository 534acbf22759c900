// File decoding - delimited text and Excel sources into raw rows

use std::fmt;
use std::path::Path;

use ledgermatch_engine::model::RawRow;

pub mod csv;
pub mod xlsx;

/// Failure at the decoding boundary. Anything that cannot be decoded is
/// surfaced here, before a single row reaches the engine.
#[derive(Debug)]
pub enum DecodeError {
    /// File could not be read.
    Io(String),
    /// Extension is not a supported tabular format.
    UnsupportedFormat(String),
    /// File exists but could not be decoded as its claimed format.
    Corrupt(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::UnsupportedFormat(ext) => {
                write!(f, "unsupported file type: {ext} (expected csv, tsv, or Excel)")
            }
            Self::Corrupt(msg) => write!(f, "unsupported or corrupt file: {msg}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode a tabular file by extension.
///
/// `.csv`/`.txt` sniff their delimiter, `.tsv` is tab-delimited, and
/// `.xlsx`/`.xls`/`.xlsb`/`.ods` go through the Excel reader. The first
/// record is the header row; fully blank rows are skipped.
pub fn decode_file(path: &Path) -> Result<Vec<RawRow>, DecodeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "txt" => csv::import(path),
        "tsv" => csv::import_with_delimiter(path, b'\t'),
        "xlsx" | "xls" | "xlsb" | "ods" => xlsx::import(path),
        "" => Err(DecodeError::UnsupportedFormat("(no extension)".into())),
        other => Err(DecodeError::UnsupportedFormat(format!(".{other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unknown_extension_is_rejected() {
        let err = decode_file(Path::new("records.pdf")).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)));
        assert!(err.to_string().contains(".pdf"));
    }

    #[test]
    fn missing_extension_is_rejected() {
        let err = decode_file(Path::new("records")).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)));
    }

    #[test]
    fn garbage_excel_file_is_corrupt_not_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"this is not a zip archive").unwrap();
        drop(f);

        let err = decode_file(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt(_)));
    }
}
