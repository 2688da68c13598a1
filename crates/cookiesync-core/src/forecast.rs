//! Day-by-day cookie stock projection.
//!
//! Opening stock is what the inventory and WIP sheets hold right now. Each
//! day adds the production finishing that day and subtracts the cookies the
//! assembly plan consumes, expanded through the BOM.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::grid::{
    cell, column_index, format_sheet_date, parse_quantity, parse_sheet_date, Cell, Grid, Row,
};

pub const DETAIL_HEADERS: [&str; 9] = [
    "日期",
    "餅乾代號",
    "餅乾品名",
    "期初庫存",
    "當天組裝需求",
    "當天入庫數量",
    "期末庫存",
    "是否負庫存",
    "缺口數量",
];

pub const SHORTAGE_HEADERS: [&str; 7] = [
    "日期",
    "餅乾代號",
    "餅乾品名",
    "缺口數量",
    "當天組裝需求",
    "期初庫存",
    "當天入庫數量",
];

/// Cookie quantities per day and code.
pub type DailyQty = BTreeMap<NaiveDate, BTreeMap<String, Decimal>>;

/// Pieces of each cookie per gift box, keyed by box code.
pub type Bom = BTreeMap<String, BTreeMap<String, Decimal>>;

/// Adds `qty` to the total of `code`. A total that would overflow keeps its
/// old value.
fn add(map: &mut BTreeMap<String, Decimal>, code: &str, qty: Decimal) {
    let total = map.entry(code.to_string()).or_insert(Decimal::ZERO);
    match total.checked_add(qty) {
        Some(sum) => *total = sum,
        None => tracing::warn!(code, qty = %qty, "quantity total overflows; row skipped"),
    }
}

fn sum_column(
    grid: &Grid,
    qty_header: &str,
    qty_fallback: usize,
    into: &mut BTreeMap<String, Decimal>,
) {
    let Some((header, rows)) = grid.split_first() else {
        return;
    };
    let code_idx = column_index(header, "餅乾代號", 0);
    let qty_idx = column_index(header, qty_header, qty_fallback);
    for row in rows {
        let code = cell(row, code_idx);
        if code.is_empty() {
            continue;
        }
        if let Some(qty) = parse_quantity(cell(row, qty_idx)) {
            add(into, code, qty);
        }
    }
}

/// Stock on hand plus work in progress, summed per cookie across warehouses
/// and orders. Codes with zero stock are kept.
#[must_use]
pub fn opening_stock(inventory: &Grid, wip: &Grid) -> BTreeMap<String, Decimal> {
    let mut stock = BTreeMap::new();
    sum_column(inventory, "目前庫存數量", 1, &mut stock);
    sum_column(wip, "在製品數量", 3, &mut stock);
    stock
}

/// Parses the BOM sheet. Rows without a box, a cookie or a positive quantity
/// are ignored.
#[must_use]
pub fn parse_bom(grid: &Grid) -> Bom {
    let mut bom = Bom::new();
    let Some((header, rows)) = grid.split_first() else {
        return bom;
    };
    let box_idx = column_index(header, "禮盒代號", 0);
    let cookie_idx = column_index(header, "餅乾代號", 1);
    let qty_idx = column_index(header, "每盒片數", 2);

    for row in rows {
        let box_code = cell(row, box_idx);
        let cookie_code = cell(row, cookie_idx);
        let Some(qty) = parse_quantity(cell(row, qty_idx)) else {
            continue;
        };
        if box_code.is_empty() || cookie_code.is_empty() || qty <= Decimal::ZERO {
            continue;
        }
        bom.entry(box_code.to_string())
            .or_default()
            .insert(cookie_code.to_string(), qty);
    }
    bom
}

/// Production arrivals read from the suggested production plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arrivals {
    /// Quantities keyed by the day production finishes.
    pub by_day: DailyQty,
    /// Entries starting today. These are already counted as WIP.
    pub skipped_today: usize,
}

/// Reads the suggested production plan and shifts every entry by the lead
/// time so it lands on the day it finishes.
#[must_use]
pub fn production_arrivals(grid: &Grid, today: NaiveDate, lead_time_days: u32) -> Arrivals {
    let mut arrivals = Arrivals::default();
    let Some((header, rows)) = grid.split_first() else {
        return arrivals;
    };
    let date_idx = column_index(header, "日期", 0);
    let code_idx = column_index(header, "餅乾代號", 2);
    let qty_idx = column_index(header, "建議生產數量_片", 3);

    for row in rows {
        let Some(start) = parse_sheet_date(cell(row, date_idx)) else {
            continue;
        };
        if start == today {
            arrivals.skipped_today += 1;
            continue;
        }
        let code = cell(row, code_idx);
        let Some(qty) = parse_quantity(cell(row, qty_idx)) else {
            continue;
        };
        if code.is_empty() || qty <= Decimal::ZERO {
            continue;
        }
        let finish = start + Duration::days(i64::from(lead_time_days));
        add(arrivals.by_day.entry(finish).or_default(), code, qty);
    }
    arrivals
}

/// Cookie demand derived from the assembly plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demand {
    pub by_day: DailyQty,
    /// Planned boxes with no BOM entry.
    pub unknown_boxes: BTreeSet<String>,
}

/// Expands the assembly plan through the BOM into cookie demand per day.
#[must_use]
pub fn assembly_demand(grid: &Grid, bom: &Bom) -> Demand {
    let mut demand = Demand::default();
    let Some((header, rows)) = grid.split_first() else {
        return demand;
    };
    let date_idx = column_index(header, "日期", 0);
    let box_idx = column_index(header, "禮盒代號", 1);
    let qty_idx = column_index(header, "計畫組裝數量", 2);

    for row in rows {
        let Some(date) = parse_sheet_date(cell(row, date_idx)) else {
            continue;
        };
        let box_code = cell(row, box_idx);
        let Some(boxes) = parse_quantity(cell(row, qty_idx)) else {
            continue;
        };
        if box_code.is_empty() || boxes <= Decimal::ZERO {
            continue;
        }
        let Some(recipe) = bom.get(box_code) else {
            if demand.unknown_boxes.insert(box_code.to_string()) {
                tracing::warn!(box_code, "gift box not found in BOM");
            }
            continue;
        };
        let day = demand.by_day.entry(date).or_default();
        for (cookie, per_box) in recipe {
            match boxes.checked_mul(*per_box) {
                Some(pieces) => add(day, cookie, pieces),
                None => tracing::warn!(
                    box_code,
                    cookie = cookie.as_str(),
                    "cookie demand overflows; row skipped"
                ),
            }
        }
    }
    demand
}

/// One cookie on one projected day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionLine {
    pub date: NaiveDate,
    pub code: String,
    pub name: String,
    pub opening: Decimal,
    pub demand: Decimal,
    pub arrivals: Decimal,
    pub ending: Decimal,
}

impl ProjectionLine {
    /// Missing pieces, or `None` when the day ends with non-negative stock.
    #[must_use]
    pub fn shortage(&self) -> Option<Decimal> {
        (self.ending < Decimal::ZERO).then(|| -self.ending)
    }

    fn detail_row(&self) -> Row {
        let shortage = self.shortage();
        vec![
            Cell::from(format_sheet_date(self.date)),
            Cell::from(self.code.as_str()),
            Cell::from(self.name.as_str()),
            Cell::Number(self.opening),
            Cell::Number(self.demand),
            Cell::Number(self.arrivals),
            Cell::Number(self.ending),
            Cell::from(if shortage.is_some() { "是" } else { "否" }),
            Cell::Number(shortage.unwrap_or(Decimal::ZERO)),
        ]
    }

    fn shortage_row(&self, missing: Decimal) -> Row {
        vec![
            Cell::from(format_sheet_date(self.date)),
            Cell::from(self.code.as_str()),
            Cell::from(self.name.as_str()),
            Cell::Number(missing),
            Cell::Number(self.demand),
            Cell::Number(self.opening),
            Cell::Number(self.arrivals),
        ]
    }
}

/// The projected horizon, ordered by day then cookie code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forecast {
    pub lines: Vec<ProjectionLine>,
}

impl Forecast {
    /// Rows for the detail sheet, without the header.
    #[must_use]
    pub fn detail_rows(&self) -> Vec<Row> {
        self.lines.iter().map(ProjectionLine::detail_row).collect()
    }

    /// Rows for the shortage sheet, without the header.
    #[must_use]
    pub fn shortage_rows(&self) -> Vec<Row> {
        self.lines
            .iter()
            .filter_map(|line| line.shortage().map(|missing| line.shortage_row(missing)))
            .collect()
    }

    #[must_use]
    pub fn shortage_count(&self) -> usize {
        self.lines.iter().filter(|l| l.shortage().is_some()).count()
    }
}

/// Projects stock for `days` days starting with `today`.
///
/// Every cookie that has opening stock, an arrival or a demand anywhere in the
/// inputs is projected, so a cookie with no stock still shows up once demand
/// for it appears. Each day's ending stock is the next day's opening.
#[must_use]
pub fn forecast(
    opening: &BTreeMap<String, Decimal>,
    arrivals: &DailyQty,
    demand: &DailyQty,
    names: &HashMap<String, String>,
    today: NaiveDate,
    days: u32,
) -> Forecast {
    let cookies: BTreeSet<&String> = opening
        .keys()
        .chain(arrivals.values().flat_map(BTreeMap::keys))
        .chain(demand.values().flat_map(BTreeMap::keys))
        .collect();

    let mut current: BTreeMap<&String, Decimal> = cookies
        .iter()
        .map(|code| (*code, opening.get(*code).copied().unwrap_or_default()))
        .collect();

    let empty = BTreeMap::new();
    let mut lines = Vec::new();
    for offset in 0..days {
        let date = today + Duration::days(i64::from(offset));
        let arriving = arrivals.get(&date).unwrap_or(&empty);
        let needed = demand.get(&date).unwrap_or(&empty);

        for code in &cookies {
            let start = current.get(*code).copied().unwrap_or_default();
            let inflow = arriving.get(*code).copied().unwrap_or_default();
            let outflow = needed.get(*code).copied().unwrap_or_default();
            let ending = start.saturating_add(inflow).saturating_sub(outflow);
            current.insert(*code, ending);

            lines.push(ProjectionLine {
                date,
                code: (*code).clone(),
                name: names.get(*code).cloned().unwrap_or_default(),
                opening: start,
                demand: outflow,
                arrivals: inflow,
                ending,
            });
        }
    }

    Forecast { lines }
}
