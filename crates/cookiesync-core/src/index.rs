//! The `Index` reference sheet: item kinds, codes, names and weights.
//!
//! Every other sheet refers to items by code only; this sheet is the single
//! code → name table and the source of the valid cookie codes the syncs
//! filter against.

use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;

use crate::grid::{
    cell, column_index, find_column, header_row, parse_quantity, text_row, Cell, Grid, Row,
};

/// Standard column order of the Index sheet.
pub const INDEX_HEADERS: [&str; 6] = ["類型", "代號", "名稱", "生重", "熟重", "備註"];

const TYPE_COL: usize = 0;
const CODE_COL: usize = 1;
const NAME_COL: usize = 2;
const RAW_WEIGHT_COL: usize = 3;
const COOKED_WEIGHT_COL: usize = 4;
const NOTE_COL: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Cookie,
    GiftBox,
    Line,
}

impl ItemKind {
    /// Parses the `類型` column. Both the Chinese labels and their English
    /// aliases are accepted.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "餅乾" | "Cookie" => Some(ItemKind::Cookie),
            "禮盒" | "Box" => Some(ItemKind::GiftBox),
            "產線" | "Line" | "LINE" => Some(ItemKind::Line),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Cookie => "餅乾",
            ItemKind::GiftBox => "禮盒",
            ItemKind::Line => "產線",
        }
    }
}

/// Item master data as held by the ERP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInfo {
    pub code: String,
    pub name: String,
    pub raw_weight: Decimal,
    pub cooked_weight: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub kind: ItemKind,
    pub code: String,
    pub name: String,
    pub raw_weight: Option<Decimal>,
    pub cooked_weight: Option<Decimal>,
    pub note: String,
}

/// Parsed contents of the Index sheet.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<IndexEntry>,
}

impl CatalogIndex {
    /// Parses the Index grid. Columns are located by header, falling back to
    /// the standard positions. Rows without a recognised kind or a code are
    /// ignored.
    #[must_use]
    pub fn parse(grid: &Grid) -> Self {
        let Some((header, rows)) = grid.split_first() else {
            return Self::default();
        };

        let type_idx = column_index(header, INDEX_HEADERS[TYPE_COL], TYPE_COL);
        let code_idx = column_index(header, INDEX_HEADERS[CODE_COL], CODE_COL);
        let name_idx = column_index(header, INDEX_HEADERS[NAME_COL], NAME_COL);
        let raw_idx = column_index(header, INDEX_HEADERS[RAW_WEIGHT_COL], RAW_WEIGHT_COL);
        let cooked_idx = column_index(header, INDEX_HEADERS[COOKED_WEIGHT_COL], COOKED_WEIGHT_COL);
        let note_idx = column_index(header, INDEX_HEADERS[NOTE_COL], NOTE_COL);

        let entries = rows
            .iter()
            .filter_map(|row| {
                let kind = ItemKind::parse(cell(row, type_idx))?;
                let code = cell(row, code_idx);
                if code.is_empty() {
                    return None;
                }
                Some(IndexEntry {
                    kind,
                    code: code.to_string(),
                    name: cell(row, name_idx).to_string(),
                    raw_weight: positive(cell(row, raw_idx)),
                    cooked_weight: positive(cell(row, cooked_idx)),
                    note: cell(row, note_idx).to_string(),
                })
            })
            .collect();

        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Codes of `kind` that also carry a name. These are the codes the syncs
    /// accept.
    #[must_use]
    pub fn reference_codes(&self, kind: ItemKind) -> BTreeSet<String> {
        self.of_kind(kind)
            .filter(|e| !e.name.is_empty())
            .map(|e| e.code.clone())
            .collect()
    }

    /// Code → name for every named entry of `kind`.
    #[must_use]
    pub fn names(&self, kind: ItemKind) -> HashMap<String, String> {
        self.of_kind(kind)
            .filter(|e| !e.name.is_empty())
            .map(|e| (e.code.clone(), e.name.clone()))
            .collect()
    }

    /// Code → raw (dough) weight for cookies with a positive weight.
    #[must_use]
    pub fn raw_weights(&self) -> HashMap<String, Decimal> {
        self.of_kind(ItemKind::Cookie)
            .filter_map(|e| e.raw_weight.map(|w| (e.code.clone(), w)))
            .collect()
    }

    fn of_kind(&self, kind: ItemKind) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }
}

/// Every code in the Index sheet regardless of kind, in sheet order and
/// without duplicates.
#[must_use]
pub fn all_codes(grid: &Grid) -> Vec<String> {
    let Some((header, rows)) = grid.split_first() else {
        return Vec::new();
    };
    let code_idx = column_index(header, INDEX_HEADERS[CODE_COL], CODE_COL);
    let mut seen = BTreeSet::new();
    rows.iter()
        .map(|row| cell(row, code_idx))
        .filter(|code| !code.is_empty() && seen.insert((*code).to_string()))
        .map(str::to_string)
        .collect()
}

/// Result of [`rebuild_index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRebuild {
    /// Header plus every data row, in standard column order.
    pub rows: Vec<Row>,
    pub updated: usize,
    pub not_found: usize,
}

/// Rewrites the Index sheet in standard column order and refreshes name and
/// weights from ERP item data.
///
/// Existing columns are located by header in the old layout, so a sheet whose
/// columns were reordered or that predates the weight columns is migrated.
/// Rows whose code is not in `info` keep their existing values. Weights that
/// are not positive are written as blank cells.
#[must_use]
pub fn rebuild_index(grid: &Grid, info: &HashMap<String, ItemInfo>) -> IndexRebuild {
    let mut rows = vec![header_row(&INDEX_HEADERS)];
    let mut updated = 0;
    let mut not_found = 0;

    let Some((header, data)) = grid.split_first() else {
        return IndexRebuild {
            rows,
            updated,
            not_found,
        };
    };

    // A header that names any standard column is authoritative: columns it
    // lacks are new and start blank. Otherwise assume the standard layout.
    let named = header.iter().any(|h| INDEX_HEADERS.contains(&h.trim()));
    let old_positions: Vec<Option<usize>> = INDEX_HEADERS
        .iter()
        .enumerate()
        .map(|(pos, name)| {
            if named {
                find_column(header, name)
            } else {
                Some(pos)
            }
        })
        .collect();

    for old_row in data {
        let remapped: Vec<String> = old_positions
            .iter()
            .map(|idx| idx.map_or("", |i| cell(old_row, i)).to_string())
            .collect();
        let mut new_row = text_row(&remapped);

        let code = remapped[CODE_COL].as_str();
        if let Some(item) = info.get(code) {
            new_row[NAME_COL] = Cell::Text(item.name.clone());
            new_row[RAW_WEIGHT_COL] = weight_cell(item.raw_weight);
            new_row[COOKED_WEIGHT_COL] = weight_cell(item.cooked_weight);
            updated += 1;
        } else if !code.is_empty() {
            not_found += 1;
        }
        rows.push(new_row);
    }

    IndexRebuild {
        rows,
        updated,
        not_found,
    }
}

fn weight_cell(weight: Decimal) -> Cell {
    if weight > Decimal::ZERO {
        Cell::Number(weight)
    } else {
        Cell::empty()
    }
}

fn positive(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    parse_quantity(raw).filter(|w| *w > Decimal::ZERO)
}
