//! Decoding result rows into core records by column name.

use std::collections::HashMap;
use std::str::FromStr;

use cookiesync_core::inventory::DEFAULT_UNIT;
use cookiesync_core::{ItemInfo, StockRecord, WipRecord};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tiberius::{ColumnData, Row};

use crate::ErpError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlValue {
    Null,
    Text(String),
    Number(Decimal),
    /// A type none of the sync queries select, such as binary or dates.
    Unsupported,
}

impl SqlValue {
    fn from_column(data: ColumnData<'static>) -> Self {
        match data {
            ColumnData::String(Some(s)) => SqlValue::Text(s.trim().to_string()),
            ColumnData::U8(Some(n)) => SqlValue::Number(Decimal::from(n)),
            ColumnData::I16(Some(n)) => SqlValue::Number(Decimal::from(n)),
            ColumnData::I32(Some(n)) => SqlValue::Number(Decimal::from(n)),
            ColumnData::I64(Some(n)) => SqlValue::Number(Decimal::from(n)),
            ColumnData::F32(Some(n)) => {
                Decimal::from_f32(n).map_or(SqlValue::Unsupported, SqlValue::Number)
            }
            ColumnData::F64(Some(n)) => {
                Decimal::from_f64(n).map_or(SqlValue::Unsupported, SqlValue::Number)
            }
            ColumnData::Numeric(Some(n)) => {
                Decimal::try_from_i128_with_scale(n.value(), u32::from(n.scale()))
                    .map_or(SqlValue::Unsupported, SqlValue::Number)
            }
            ColumnData::Bit(Some(b)) => SqlValue::Number(Decimal::from(u8::from(b))),
            ColumnData::String(None)
            | ColumnData::U8(None)
            | ColumnData::I16(None)
            | ColumnData::I32(None)
            | ColumnData::I64(None)
            | ColumnData::F32(None)
            | ColumnData::F64(None)
            | ColumnData::Numeric(None)
            | ColumnData::Bit(None) => SqlValue::Null,
            _ => SqlValue::Unsupported,
        }
    }
}

/// One result row keyed by lower-cased column name.
#[derive(Debug, Clone, Default)]
pub(crate) struct NamedRow {
    values: HashMap<String, SqlValue>,
}

impl NamedRow {
    pub(crate) fn from_row(row: Row) -> Self {
        let names: Vec<String> = row
            .columns()
            .iter()
            .map(|c| c.name().to_ascii_lowercase())
            .collect();
        let values = names
            .into_iter()
            .zip(row.into_iter().map(SqlValue::from_column))
            .collect();
        Self { values }
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: Vec<(&str, SqlValue)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        }
    }

    pub(crate) fn has_column(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Text of `column`, or `""` when it is null or absent. Numbers are
    /// rendered without trailing zeros.
    fn text(&self, column: &str) -> String {
        match self.values.get(column) {
            Some(SqlValue::Text(s)) => s.clone(),
            Some(SqlValue::Number(n)) => n.normalize().to_string(),
            _ => String::new(),
        }
    }

    /// Numeric value of `column`. Null or absent counts as zero; numeric text
    /// is parsed.
    fn number(&self, column: &str) -> Result<Decimal, ErpError> {
        match self.values.get(column) {
            None | Some(SqlValue::Null) => Ok(Decimal::ZERO),
            Some(SqlValue::Number(n)) => Ok(*n),
            Some(SqlValue::Text(s)) if s.is_empty() => Ok(Decimal::ZERO),
            Some(SqlValue::Text(s)) => Decimal::from_str(s).map_err(|e| ErpError::InvalidValue {
                column: column.to_string(),
                reason: format!("'{s}': {e}"),
            }),
            Some(SqlValue::Unsupported) => Err(ErpError::InvalidValue {
                column: column.to_string(),
                reason: "not a numeric column".to_string(),
            }),
        }
    }

    fn unit(&self) -> String {
        let unit = self.text("unit");
        if unit.is_empty() {
            DEFAULT_UNIT.to_string()
        } else {
            unit
        }
    }
}

/// Fails unless the first row carries every one of `columns`. An empty result
/// passes.
pub(crate) fn require_columns(rows: &[NamedRow], columns: &[&str]) -> Result<(), ErpError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    match columns.iter().find(|c| !first.has_column(c)) {
        Some(missing) => Err(ErpError::MissingColumn((*missing).to_string())),
        None => Ok(()),
    }
}

pub(crate) fn stock_record(row: &NamedRow) -> Result<StockRecord, ErpError> {
    Ok(StockRecord {
        cookie_code: row.text("cookie_code"),
        qty: row.number("qty")?,
        warehouse_code: row.text("warehouse_code"),
        unit: row.unit(),
    })
}

pub(crate) fn wip_record(row: &NamedRow) -> Result<WipRecord, ErpError> {
    Ok(WipRecord {
        mo_type: row.text("mo_number_type"),
        mo_number: row.text("mo_number"),
        cookie_code: row.text("cookie_code"),
        wip_qty: row.number("wip_qty")?,
        unit: row.unit(),
    })
}

pub(crate) fn item_info(row: &NamedRow) -> Result<ItemInfo, ErpError> {
    Ok(ItemInfo {
        code: row.text("item_code"),
        name: row.text("item_name"),
        raw_weight: row.number("raw_weight")?,
        cooked_weight: row.number("cooked_weight")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(s.to_string())
    }

    #[test]
    fn stock_row_trims_and_defaults_unit() {
        let row = NamedRow::from_pairs(vec![
            ("COOKIE_CODE", text("10101A")),
            ("qty", SqlValue::Number(Decimal::new(12_500, 3))),
            ("warehouse_code", text("SP40")),
            ("unit", SqlValue::Null),
        ]);
        let record = stock_record(&row).unwrap();
        assert_eq!(record.cookie_code, "10101A");
        assert_eq!(record.qty, Decimal::new(125, 1));
        assert_eq!(record.unit, DEFAULT_UNIT);
    }

    #[test]
    fn null_quantity_counts_as_zero() {
        let row = NamedRow::from_pairs(vec![("cookie_code", text("A1")), ("qty", SqlValue::Null)]);
        assert_eq!(stock_record(&row).unwrap().qty, Decimal::ZERO);
    }

    #[test]
    fn numeric_text_is_parsed_and_garbage_rejected() {
        let ok = NamedRow::from_pairs(vec![("wip_qty", text("42.5"))]);
        assert_eq!(wip_record(&ok).unwrap().wip_qty, Decimal::new(425, 1));

        let bad = NamedRow::from_pairs(vec![("wip_qty", text("many"))]);
        assert!(matches!(
            wip_record(&bad),
            Err(ErpError::InvalidValue { ref column, .. }) if column == "wip_qty"
        ));
    }

    #[test]
    fn numeric_codes_render_as_text() {
        let row = NamedRow::from_pairs(vec![
            ("mo_number_type", SqlValue::Number(Decimal::from(5101))),
            ("mo_number", text("20251201001")),
            ("cookie_code", text("A1")),
            ("wip_qty", SqlValue::Number(Decimal::from(3))),
            ("unit", text("盒")),
        ]);
        let record = wip_record(&row).unwrap();
        assert_eq!(record.mo_type, "5101");
        assert_eq!(record.unit, "盒");
    }

    #[test]
    fn item_info_reads_weights() {
        let row = NamedRow::from_pairs(vec![
            ("item_code", text("A1")),
            ("item_name", text("Butter cookie")),
            ("raw_weight", SqlValue::Number(Decimal::new(85, 1))),
            ("cooked_weight", SqlValue::Null),
        ]);
        let info = item_info(&row).unwrap();
        assert_eq!(info.name, "Butter cookie");
        assert_eq!(info.raw_weight, Decimal::new(85, 1));
        assert_eq!(info.cooked_weight, Decimal::ZERO);
    }

    #[test]
    fn missing_column_is_reported_once_rows_exist() {
        assert!(require_columns(&[], &["cookie_code"]).is_ok());
        let rows = vec![NamedRow::from_pairs(vec![("code", text("A1"))])];
        assert!(matches!(
            require_columns(&rows, &["cookie_code", "qty"]),
            Err(ErpError::MissingColumn(ref c)) if c == "cookie_code"
        ));
    }
}
