use std::path::Path;

use chrono::NaiveDate;

use crate::error::{FinanzasError, Result};
use crate::models::{Cell, Table};

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

/// Numeric value of a cell; text is accepted with `$`, thousands commas and
/// surrounding whitespace. Anything unparseable is missing.
pub fn coerce_amount(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(raw) => {
            let s: String = raw
                .chars()
                .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
                .collect();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Calendar date of a cell: native dates, Excel serial numbers, or text in one
/// of the accepted layouts.
pub fn coerce_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => excel_serial_to_date(*n),
        Cell::Text(raw) => parse_date_text(raw),
        _ => None,
    }
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| chrono::NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

fn load_error(path: &Path, reason: impl Into<String>) -> FinanzasError {
    FinanzasError::Load {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Input formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    #[cfg(feature = "xlsx")]
    Spreadsheet,
    Csv,
}

impl SourceKind {
    pub fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            #[cfg(feature = "xlsx")]
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Read the `sheet` worksheet (ignored for CSV) into a [`Table`], using the
/// first row as header. Trailing all-empty rows are dropped.
pub fn load(path: &Path, sheet: &str) -> Result<Table> {
    if !path.exists() {
        return Err(load_error(path, "file not found"));
    }
    let kind = SourceKind::for_path(path)
        .ok_or_else(|| load_error(path, "unsupported file format"))?;
    let mut table = match kind {
        #[cfg(feature = "xlsx")]
        SourceKind::Spreadsheet => load_spreadsheet(path, sheet)?,
        SourceKind::Csv => load_csv(path)?,
    };
    while table.rows.last().is_some_and(|r| r.iter().all(Cell::is_empty)) {
        table.rows.pop();
    }
    Ok(table)
}

fn header_names(cells: impl Iterator<Item = String>) -> Vec<String> {
    cells
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim().to_string();
            if name.is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            }
        })
        .collect()
}

fn load_csv(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut records = rdr.records();
    let header = match records.next() {
        Some(record) => record.map_err(|e| load_error(path, e.to_string()))?,
        None => return Err(load_error(path, "empty file")),
    };
    let columns = header_names(header.iter().map(str::to_string));
    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| load_error(path, e.to_string()))?;
        rows.push(record.iter().map(csv_cell).collect());
    }
    Ok(Table::new(columns, rows))
}

fn csv_cell(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty() {
        return Cell::Empty;
    }
    if let Ok(n) = s.parse::<f64>() {
        return Cell::Number(n);
    }
    if let Some(d) = parse_date_text(s) {
        return Cell::Date(d);
    }
    // formatted amounts such as "$ 1,200.50"
    if s.chars().any(|c| c.is_ascii_digit()) {
        if let Some(n) = coerce_amount(&Cell::Text(s.to_string())) {
            return Cell::Number(n);
        }
    }
    Cell::Text(raw.to_string())
}

#[cfg(feature = "xlsx")]
fn load_spreadsheet(path: &Path, sheet: &str) -> Result<Table> {
    use calamine::Reader;

    let mut workbook =
        calamine::open_workbook_auto(path).map_err(|e| load_error(path, e.to_string()))?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(load_error(path, format!("worksheet '{sheet}' not found")));
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| load_error(path, e.to_string()))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| load_error(path, format!("worksheet '{sheet}' is empty")))?;
    let columns = header_names(header.iter().map(|c| sheet_cell(c).to_string()));
    let rows = rows.map(|r| r.iter().map(sheet_cell).collect()).collect();
    Ok(Table::new(columns, rows))
}

#[cfg(feature = "xlsx")]
fn sheet_cell(data: &calamine::Data) -> Cell {
    use calamine::Data;

    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) => parse_date_text(s)
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
