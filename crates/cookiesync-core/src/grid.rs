//! Sheet-shaped data: the string grid read from a worksheet and the typed
//! cells written back.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Rows of cell text as returned by the spreadsheet, header row first.
pub type Grid = Vec<Vec<String>>;

/// One row to write back to a sheet.
pub type Row = Vec<Cell>;

/// Date format used by every date column in the workbook.
pub const SHEET_DATE_FORMAT: &str = "%Y/%m/%d";

/// Format of the last-updated stamp written by the sync commands.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A cell value to write. Numbers are sent as JSON numbers so the sheet can
/// do arithmetic on them; everything else is sent verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Number(Decimal),
}

impl Cell {
    #[must_use]
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    /// The cell as the sheet would display it without formatting.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(d) => d.normalize().to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<Decimal> for Cell {
    fn from(d: Decimal) -> Self {
        Cell::Number(d)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(d) => {
                let d = d.normalize();
                if d.scale() == 0 {
                    if let Some(i) = d.to_i64() {
                        return serializer.serialize_i64(i);
                    }
                }
                serializer.serialize_f64(d.to_f64().unwrap_or_default())
            }
        }
    }
}

/// Converts an existing sheet row into writable cells, keeping the text as-is.
#[must_use]
pub fn text_row(row: &[String]) -> Row {
    row.iter().map(|s| Cell::Text(s.clone())).collect()
}

/// Builds a header row from static column titles.
#[must_use]
pub fn header_row(headers: &[&str]) -> Row {
    headers.iter().map(|h| Cell::from(*h)).collect()
}

/// Returns `true` when the grid's first row equals `headers` exactly.
#[must_use]
pub fn has_headers(grid: &Grid, headers: &[&str]) -> bool {
    grid.first().is_some_and(|first| {
        first.len() == headers.len() && first.iter().zip(headers).all(|(a, b)| a.trim() == *b)
    })
}

/// Trimmed cell text, or `""` when the row is too short.
#[must_use]
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map_or("", |s| s.trim())
}

/// Position of `name` in the header row, falling back to `fallback` when the
/// header is absent.
#[must_use]
pub fn column_index(header: &[String], name: &str, fallback: usize) -> usize {
    find_column(header, name).unwrap_or(fallback)
}

/// Position of `name` in the header row.
#[must_use]
pub fn find_column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim() == name)
}

/// Parses a quantity cell.
///
/// Blank cells count as zero. Thousands separators are ignored. Returns
/// `None` for text that is not a number.
#[must_use]
pub fn parse_quantity(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Parses a `YYYY/MM/DD` sheet date. ISO `YYYY-MM-DD` is accepted as well.
#[must_use]
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, SHEET_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

#[must_use]
pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format(SHEET_DATE_FORMAT).to_string()
}

#[must_use]
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
