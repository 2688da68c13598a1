//! Work-in-progress stock per manufacturing order.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::grid::{cell, header_row, text_row, Cell, Grid, Row};
use crate::inventory::DEFAULT_UNIT;

pub const WIP_HEADERS: [&str; 6] = [
    "餅乾代號",
    "製令單別",
    "製令單號",
    "在製品數量",
    "單位",
    "最後更新日期",
];

/// Issued-but-not-yet-produced quantity of one manufacturing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipRecord {
    pub mo_type: String,
    pub mo_number: String,
    pub cookie_code: String,
    pub wip_qty: Decimal,
    pub unit: String,
}

type WipKey = (String, String, String);

/// Result of [`merge_wip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipMerge {
    /// Header plus every data row, sorted by code, order type and order number.
    pub rows: Vec<Row>,
    pub updated: usize,
    pub added: usize,
}

fn existing_key(row: &[String]) -> Option<WipKey> {
    let code = cell(row, 0);
    let mo_type = cell(row, 1);
    let mo_number = cell(row, 2);
    if code.is_empty() || mo_type.is_empty() || mo_number.is_empty() {
        return None;
    }
    Some((code.to_string(), mo_type.to_string(), mo_number.to_string()))
}

/// Merges fresh WIP records into the existing sheet contents.
///
/// Rows are keyed by `(code, order type, order number)`. Fresh records replace
/// the matching row; existing rows with no fresh counterpart are kept as they
/// are. Existing rows missing any part of the key are discarded. When a key
/// repeats among the fresh records the last one wins.
#[must_use]
pub fn merge_wip(existing: &Grid, records: &[WipRecord], timestamp: &str) -> WipMerge {
    let mut merged: BTreeMap<WipKey, Row> = existing
        .iter()
        .skip(1)
        .filter_map(|row| existing_key(row).map(|key| (key, text_row(row))))
        .collect();

    let mut fresh: BTreeMap<WipKey, Row> = BTreeMap::new();
    for record in records {
        let code = record.cookie_code.trim();
        if code.is_empty() {
            continue;
        }
        let mo_type = record.mo_type.trim();
        let mo_number = record.mo_number.trim();
        let unit = match record.unit.trim() {
            "" => DEFAULT_UNIT,
            u => u,
        };
        let row = vec![
            Cell::from(code),
            Cell::from(mo_type),
            Cell::from(mo_number),
            Cell::Number(record.wip_qty),
            Cell::from(unit),
            Cell::from(timestamp),
        ];
        fresh.insert(
            (code.to_string(), mo_type.to_string(), mo_number.to_string()),
            row,
        );
    }

    let mut updated = 0;
    let mut added = 0;
    for (key, row) in fresh {
        if merged.insert(key, row).is_some() {
            updated += 1;
        } else {
            added += 1;
        }
    }

    let mut rows = Vec::with_capacity(merged.len() + 1);
    rows.push(header_row(&WIP_HEADERS));
    rows.extend(merged.into_values());

    WipMerge {
        rows,
        updated,
        added,
    }
}
