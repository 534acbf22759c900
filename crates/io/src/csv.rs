// Delimited-text import: CSV, TSV, and friends.

use std::io::Read;
use std::path::Path;

use ledgermatch_engine::model::{RawRow, RawValue};

use crate::DecodeError;

pub fn import(path: &Path) -> Result<Vec<RawRow>, DecodeError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    rows_from_string(&content, delimiter)
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<Vec<RawRow>, DecodeError> {
    let content = read_file_as_utf8(path)?;
    rows_from_string(&content, delimiter)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
fn read_file_as_utf8(path: &Path) -> Result<String, DecodeError> {
    let mut file = std::fs::File::open(path).map_err(|e| DecodeError::Io(e.to_string()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| DecodeError::Io(e.to_string()))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Detect the most likely field delimiter by checking consistency across the
/// first few lines: the candidate producing the most consistent field count
/// (>1 field) wins, with higher field counts breaking ties.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// First record = headers; each following record becomes a RawRow pairing
/// the headers with that record's fields in column order. Fully blank rows
/// are skipped; blank fields decode as `RawValue::Empty`.
fn rows_from_string(content: &str, delimiter: u8) -> Result<Vec<RawRow>, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DecodeError::Corrupt(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DecodeError::Corrupt(e.to_string()))?;

        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let mut row = RawRow::default();
        for (i, header) in headers.iter().enumerate() {
            let field = record.get(i).unwrap_or("");
            let value = if field.trim().is_empty() {
                RawValue::Empty
            } else {
                RawValue::Text(field.to_string())
            };
            row.push(header.clone(), value);
        }
        rows.push(row);
    }

    Ok(rows)
}
