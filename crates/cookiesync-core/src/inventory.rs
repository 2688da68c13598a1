//! Cookie stock: filtering ERP rows against the Index, consolidating them and
//! planning the upsert into the inventory sheet.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::grid::{cell, has_headers, header_row, Cell, Grid, Row};

pub const INVENTORY_HEADERS: [&str; 5] = [
    "餅乾代號",
    "目前庫存數量",
    "庫別代號",
    "單位",
    "最後更新日期",
];

/// Unit written when the ERP row carries none.
pub const DEFAULT_UNIT: &str = "片";

const CODE_COL: usize = 0;
const WAREHOUSE_COL: usize = 2;

/// One stock row as returned by the ERP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRecord {
    pub cookie_code: String,
    pub qty: Decimal,
    pub warehouse_code: String,
    pub unit: String,
}

/// How stock rows are keyed in the inventory sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockMode {
    /// One row per cookie, quantities summed across warehouses.
    #[default]
    Combined,
    /// One row per cookie and warehouse.
    PerWarehouse,
}

impl FromStr for StockMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combined" => Ok(StockMode::Combined),
            "per-warehouse" | "per_warehouse" => Ok(StockMode::PerWarehouse),
            other => Err(format!(
                "unknown stock mode '{other}' (expected combined or per-warehouse)"
            )),
        }
    }
}

impl fmt::Display for StockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockMode::Combined => f.write_str("combined"),
            StockMode::PerWarehouse => f.write_str("per-warehouse"),
        }
    }
}

/// Keeps the records whose code is in `codes`. Returns the kept records and
/// how many were dropped.
pub fn filter_by_reference<T, F>(
    records: Vec<T>,
    codes: &BTreeSet<String>,
    code_of: F,
) -> (Vec<T>, usize)
where
    F: Fn(&T) -> &str,
{
    let total = records.len();
    let kept: Vec<T> = records
        .into_iter()
        .filter(|r| codes.contains(code_of(r).trim()))
        .collect();
    let skipped = total - kept.len();
    (kept, skipped)
}

/// A consolidated stock line, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    pub cookie_code: String,
    pub qty: Decimal,
    /// A single warehouse code, or the sorted comma-joined list in combined mode.
    pub warehouses: String,
    pub unit: String,
}

impl StockLine {
    fn key(&self, mode: StockMode) -> String {
        match mode {
            StockMode::Combined => self.cookie_code.clone(),
            StockMode::PerWarehouse => format!("{}|{}", self.cookie_code, self.warehouses),
        }
    }

    fn to_row(&self, timestamp: &str) -> Row {
        vec![
            Cell::from(self.cookie_code.as_str()),
            Cell::Number(self.qty),
            Cell::from(self.warehouses.as_str()),
            Cell::from(self.unit.as_str()),
            Cell::from(timestamp),
        ]
    }
}

struct Accumulator {
    code: String,
    qty: Decimal,
    warehouses: BTreeSet<String>,
    unit: String,
}

/// Sums records that share a key under `mode`, in first-seen order.
///
/// Records with a blank code are dropped. The first non-blank unit of a key
/// wins; [`DEFAULT_UNIT`] is used when none is given.
#[must_use]
pub fn consolidate_stock(records: &[StockRecord], mode: StockMode) -> Vec<StockLine> {
    let mut order: Vec<Accumulator> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let code = record.cookie_code.trim();
        if code.is_empty() {
            continue;
        }
        let warehouse = record.warehouse_code.trim();
        let key = match mode {
            StockMode::Combined => code.to_string(),
            StockMode::PerWarehouse => format!("{code}|{warehouse}"),
        };

        let pos = *positions.entry(key).or_insert_with(|| {
            order.push(Accumulator {
                code: code.to_string(),
                qty: Decimal::ZERO,
                warehouses: BTreeSet::new(),
                unit: String::new(),
            });
            order.len() - 1
        });

        let acc = &mut order[pos];
        match acc.qty.checked_add(record.qty) {
            Some(total) => acc.qty = total,
            None => {
                tracing::warn!(code, qty = %record.qty, "stock total overflows; record skipped");
                continue;
            }
        }
        if !warehouse.is_empty() {
            acc.warehouses.insert(warehouse.to_string());
        }
        let unit = record.unit.trim();
        if acc.unit.is_empty() && !unit.is_empty() {
            acc.unit = unit.to_string();
        }
    }

    order
        .into_iter()
        .map(|acc| StockLine {
            cookie_code: acc.code,
            qty: acc.qty,
            warehouses: acc.warehouses.into_iter().collect::<Vec<_>>().join(","),
            unit: if acc.unit.is_empty() {
                DEFAULT_UNIT.to_string()
            } else {
                acc.unit
            },
        })
        .collect()
}

/// Writes needed to bring the inventory sheet up to date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpsertPlan {
    /// Row 1 does not hold the expected headers.
    pub header_needs_write: bool,
    /// 1-based sheet row number and its replacement.
    pub updates: Vec<(usize, Row)>,
    pub appends: Vec<Row>,
    /// 1-based rows repeating a key that is already updated. They are blanked.
    pub stale: Vec<usize>,
}

impl UpsertPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.header_needs_write
            && self.updates.is_empty()
            && self.appends.is_empty()
            && self.stale.is_empty()
    }
}

/// Key → 1-based row numbers of the existing data rows, in sheet order. Row 1
/// is always the header.
fn existing_rows(existing: &Grid, mode: StockMode) -> HashMap<String, Vec<usize>> {
    let mut rows: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, row) in existing.iter().enumerate().skip(1) {
        let code = cell(row, CODE_COL);
        if code.is_empty() {
            continue;
        }
        let key = match mode {
            StockMode::Combined => code.to_string(),
            StockMode::PerWarehouse => {
                let warehouse = cell(row, WAREHOUSE_COL);
                if warehouse.is_empty() {
                    continue;
                }
                format!("{code}|{warehouse}")
            }
        };
        rows.entry(key).or_default().push(idx + 1);
    }
    rows
}

/// Matches each line to the existing sheet rows with its key. The first match
/// is updated in place and any later ones are marked stale; lines with no
/// match are appended after the last row.
#[must_use]
pub fn plan_stock_upsert(
    existing: &Grid,
    lines: &[StockLine],
    mode: StockMode,
    timestamp: &str,
) -> UpsertPlan {
    let rows = existing_rows(existing, mode);
    let mut plan = UpsertPlan {
        header_needs_write: !has_headers(existing, &INVENTORY_HEADERS),
        ..UpsertPlan::default()
    };

    for line in lines {
        let row = line.to_row(timestamp);
        match rows.get(&line.key(mode)).map(Vec::as_slice) {
            Some([first, rest @ ..]) => {
                plan.updates.push((*first, row));
                plan.stale.extend_from_slice(rest);
            }
            _ => plan.appends.push(row),
        }
    }
    plan.stale.sort_unstable();
    plan
}

/// A row of empty cells, written over a stale inventory row.
#[must_use]
pub fn blank_row() -> Row {
    vec![Cell::empty(); INVENTORY_HEADERS.len()]
}

/// Header row of the inventory sheet.
#[must_use]
pub fn inventory_header() -> Row {
    header_row(&INVENTORY_HEADERS)
}
