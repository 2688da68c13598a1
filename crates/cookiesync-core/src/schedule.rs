//! Production schedule: batch counts converted to cookie pieces.

use std::collections::HashMap;

use chrono::Duration;
use rust_decimal::Decimal;

use crate::grid::{
    cell, find_column, format_sheet_date, header_row, parse_quantity, parse_sheet_date, Cell,
    Grid, Row,
};
use crate::CoreError;

pub const SCHEDULE_HEADERS: [&str; 9] = [
    "日期",
    "產線代號",
    "餅乾代號",
    "名稱",
    "生產顆數",
    "生產片數",
    "預計完成日期",
    "狀態",
    "備註",
];

const REQUIRED_COLUMNS: [&str; 5] = ["日期", "產線代號", "餅乾代號", "生產顆數", "生產片數"];

const DATE: usize = 0;
const CODE: usize = 2;
const NAME: usize = 3;
const BATCHES: usize = 4;
const PIECES: usize = 5;
const COMPLETION: usize = 6;

/// Dough grams in one batch.
const BATCH_GRAMS: i64 = 160_000;
/// Share of dough that ends up as sellable pieces (5% loss).
const YIELD_PERCENT: i64 = 95;
/// Days from production start to expected completion.
const COMPLETION_DAYS: i64 = 2;

/// Result of [`recompute_schedule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRebuild {
    /// Header plus every data row, in standard column order.
    pub rows: Vec<Row>,
    pub pieces_updated: usize,
    pub names_updated: usize,
    /// Rows with a batch count but no raw weight for their cookie.
    pub skipped: usize,
    /// Rows whose batch count is not a number or gives an out-of-range
    /// piece count.
    pub errors: usize,
}

/// Pieces produced by `batches` batches of a cookie weighing `raw_weight`
/// grams before baking, rounded to two decimals. `None` when the result is
/// out of range or the weight is zero.
#[must_use]
pub fn pieces_for(batches: Decimal, raw_weight: Decimal) -> Option<Decimal> {
    batches
        .checked_mul(Decimal::from(BATCH_GRAMS))?
        .checked_div(raw_weight)?
        .checked_mul(Decimal::new(YIELD_PERCENT, 2))
        .map(|pieces| pieces.round_dp(2))
}

/// Rewrites the schedule sheet in standard column order, recomputing the
/// piece count and name of every row.
///
/// # Errors
///
/// Returns [`CoreError::EmptySheet`] when there are no data rows and
/// [`CoreError::MissingColumns`] when a required column is absent.
pub fn recompute_schedule(
    sheet: &str,
    grid: &Grid,
    raw_weights: &HashMap<String, Decimal>,
    names: &HashMap<String, String>,
) -> Result<ScheduleRebuild, CoreError> {
    let Some((header, data)) = grid.split_first().filter(|(_, data)| !data.is_empty()) else {
        return Err(CoreError::EmptySheet(sheet.to_string()));
    };

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| find_column(header, name).is_none())
        .map(|name| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::MissingColumns {
            sheet: sheet.to_string(),
            columns: missing,
        });
    }

    let source: Vec<Option<usize>> = SCHEDULE_HEADERS
        .iter()
        .map(|name| find_column(header, name))
        .collect();

    let mut rebuild = ScheduleRebuild {
        rows: vec![header_row(&SCHEDULE_HEADERS)],
        pieces_updated: 0,
        names_updated: 0,
        skipped: 0,
        errors: 0,
    };

    for (offset, row) in data.iter().enumerate() {
        let old = |col: usize| source[col].map_or("", |idx| cell(row, idx));
        let mut new_row: Row = (0..SCHEDULE_HEADERS.len())
            .map(|col| Cell::from(old(col)))
            .collect();

        if old(COMPLETION).is_empty() {
            if let Some(date) = parse_sheet_date(old(DATE)) {
                let completion = date + Duration::days(COMPLETION_DAYS);
                new_row[COMPLETION] = Cell::from(format_sheet_date(completion));
            }
        }

        let code = old(CODE);
        if code.is_empty() {
            rebuild.rows.push(new_row);
            continue;
        }

        if let Some(name) = names.get(code) {
            new_row[NAME] = Cell::from(name.as_str());
            rebuild.names_updated += 1;
        }

        let batches_raw = old(BATCHES);
        if !batches_raw.is_empty() {
            match parse_quantity(batches_raw) {
                Some(batches) if batches > Decimal::ZERO => {
                    match raw_weights.get(code).filter(|w| **w > Decimal::ZERO) {
                        Some(weight) => match pieces_for(batches, *weight) {
                            Some(pieces) => {
                                new_row[PIECES] = Cell::Number(pieces);
                                rebuild.pieces_updated += 1;
                            }
                            None => {
                                tracing::warn!(
                                    row = offset + 2,
                                    code,
                                    batches = %batches,
                                    weight = %weight,
                                    "piece count out of range"
                                );
                                rebuild.errors += 1;
                            }
                        },
                        None => {
                            tracing::debug!(
                                row = offset + 2,
                                code,
                                "no raw weight; pieces left as-is"
                            );
                            rebuild.skipped += 1;
                        }
                    }
                }
                Some(_) => {}
                None => {
                    tracing::warn!(
                        row = offset + 2,
                        value = batches_raw,
                        "unparsable batch count"
                    );
                    rebuild.errors += 1;
                }
            }
        }

        rebuild.rows.push(new_row);
    }

    Ok(rebuild)
}
