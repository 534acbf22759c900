// Excel import (xlsx, xls, xlsb, ods) via calamine. Read-only: the first
// worksheet's first row is the header row, everything below is data.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use ledgermatch_engine::model::{RawRow, RawValue};

use crate::DecodeError;

pub fn import(path: &Path) -> Result<Vec<RawRow>, DecodeError> {
    if !path.exists() {
        return Err(DecodeError::Io(format!("{}: not found", path.display())));
    }

    let mut workbook =
        open_workbook_auto(path).map_err(|e| DecodeError::Corrupt(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DecodeError::Corrupt("workbook has no sheets".into()))?
        .map_err(|e| DecodeError::Corrupt(e.to_string()))?;

    let mut row_iter = range.rows();
    let Some(header_cells) = row_iter.next() else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = header_cells
        .iter()
        .enumerate()
        .map(|(i, cell)| header_name(cell, i))
        .collect();

    let mut rows = Vec::new();
    for cells in row_iter {
        let mut row = RawRow::default();
        for (i, header) in headers.iter().enumerate() {
            let value = cells.get(i).map_or(RawValue::Empty, cell_value);
            row.push(header.clone(), value);
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Header cell text; blank header cells fall back to the spreadsheet
/// column letter so the row still has addressable names.
fn header_name(cell: &Data, idx: usize) -> String {
    let text = cell_value(cell).to_display();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        col_letter(idx)
    } else {
        trimmed.to_string()
    }
}

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Empty,
        Data::String(s) => RawValue::Text(s.clone()),
        Data::Float(n) => RawValue::Number(*n),
        Data::Int(n) => RawValue::Number(*n as f64),
        Data::Bool(b) => RawValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => {
                let formatted = if ndt.time() == chrono::NaiveTime::MIN {
                    ndt.format("%Y-%m-%d").to_string()
                } else {
                    ndt.format("%Y-%m-%d %H:%M:%S").to_string()
                };
                RawValue::Text(formatted)
            }
            // Out-of-range serial: keep the raw number rather than dropping the cell
            None => RawValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
    }
}

/// Convert column index to letter (0 -> A, 1 -> B, 26 -> AA, etc.)
fn col_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}
