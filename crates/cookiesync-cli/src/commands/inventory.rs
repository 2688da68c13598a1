use anyhow::Context;
use chrono::NaiveDateTime;
use cookiesync_core::grid::format_timestamp;
use cookiesync_core::inventory::{
    blank_row, consolidate_stock, filter_by_reference, inventory_header, plan_stock_upsert,
    INVENTORY_HEADERS,
};
use cookiesync_core::{AppConfig, ItemKind, StockRecord};
use cookiesync_sheets::{a1, SheetsClient};

use super::{load_catalog, open_target};
use crate::source::ErpSource;

/// Upsert current ERP stock into the inventory sheet.
///
/// Only cookies listed (with a name) in the Index sheet are synced. Each
/// consolidated stock line overwrites its existing row, matched by cookie code
/// (and warehouse in per-warehouse mode), or is appended when the sheet has no
/// row for it yet. Further rows with the same key are blanked so each key
/// appears once.
///
/// When `dry_run` is `true` the planned writes are printed and the sheet is
/// left untouched.
///
/// # Errors
///
/// Returns an error if the Index sheet lists no cookie codes, the ERP
/// returns no stock rows, no row survives the Index filter, or any ERP or
/// Sheets call fails.
pub(crate) async fn run_inventory<E: ErpSource>(
    config: &AppConfig,
    sheets: &SheetsClient,
    erp: &mut E,
    now: NaiveDateTime,
    dry_run: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(sheets, &config.sheets.index).await?;
    let codes = catalog.reference_codes(ItemKind::Cookie);
    if codes.is_empty() {
        anyhow::bail!(
            "Index sheet '{}' lists no cookie codes; nothing to sync",
            config.sheets.index
        );
    }

    let records = erp
        .stock_levels()
        .await
        .context("failed to query ERP stock levels")?;
    if records.is_empty() {
        anyhow::bail!("ERP stock query returned no rows");
    }

    let fetched = records.len();
    let (kept, skipped) = filter_by_reference(records, &codes, |r: &StockRecord| {
        r.cookie_code.as_str()
    });
    tracing::info!(
        fetched,
        kept = kept.len(),
        skipped,
        "filtered stock rows to Index cookie codes"
    );
    if kept.is_empty() {
        anyhow::bail!(
            "none of the {fetched} ERP stock rows match a cookie code in the Index sheet"
        );
    }

    let lines = consolidate_stock(&kept, config.stock_mode);
    let title = config.sheets.inventory.as_str();
    let columns = INVENTORY_HEADERS.len();
    let existing = open_target(sheets, title, columns, dry_run).await?;
    let plan = plan_stock_upsert(
        &existing,
        &lines,
        config.stock_mode,
        &format_timestamp(now),
    );

    if dry_run {
        println!(
            "dry-run: would write {} stock lines to '{title}' ({} updates, {} appends, {} stale rows blanked{})",
            lines.len(),
            plan.updates.len(),
            plan.appends.len(),
            plan.stale.len(),
            if plan.header_needs_write {
                ", header rewrite"
            } else {
                ""
            }
        );
        for line in &lines {
            println!(
                "  {} {} {} [{}]",
                line.cookie_code, line.qty, line.unit, line.warehouses
            );
        }
        return Ok(());
    }

    let mut ranges = Vec::with_capacity(plan.updates.len() + plan.stale.len() + 1);
    if plan.header_needs_write {
        ranges.push((a1::row_range(title, 1, columns), vec![inventory_header()]));
    }
    for (row_number, row) in &plan.updates {
        let range = a1::row_range(title, *row_number, columns);
        ranges.push((range, vec![row.clone()]));
    }
    for row_number in &plan.stale {
        let range = a1::row_range(title, *row_number, columns);
        ranges.push((range, vec![blank_row()]));
    }
    sheets
        .batch_write(&ranges)
        .await
        .with_context(|| format!("failed to update rows in '{title}'"))?;
    sheets
        .append(&a1::columns_range(title, columns), &plan.appends)
        .await
        .with_context(|| format!("failed to append rows to '{title}'"))?;

    tracing::info!(
        sheet = title,
        mode = %config.stock_mode,
        updated = plan.updates.len(),
        appended = plan.appends.len(),
        blanked = plan.stale.len(),
        "inventory sync complete"
    );
    Ok(())
}

#[cfg(test)]
#[path = "inventory_test.rs"]
mod tests;
