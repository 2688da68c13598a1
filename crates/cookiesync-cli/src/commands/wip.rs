use anyhow::Context;
use chrono::NaiveDateTime;
use cookiesync_core::grid::format_timestamp;
use cookiesync_core::inventory::filter_by_reference;
use cookiesync_core::wip::{merge_wip, WIP_HEADERS};
use cookiesync_core::{AppConfig, ItemKind, WipRecord};
use cookiesync_sheets::SheetsClient;

use super::{load_catalog, open_target, rewrite_sheet};
use crate::source::ErpSource;

/// Merge open manufacturing orders into the WIP sheet.
///
/// Orders are matched on cookie code, order type and order number. Rows for
/// orders the ERP no longer reports are kept. The merged table is sorted and
/// the sheet is rewritten in one pass.
///
/// # Errors
///
/// Returns an error if the Index sheet lists no cookie codes, the ERP has no
/// open orders, none of them is for an Index cookie, or any ERP or Sheets
/// call fails.
pub(crate) async fn run_wip<E: ErpSource>(
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
        .wip_levels()
        .await
        .context("failed to query ERP work in progress")?;
    if records.is_empty() {
        anyhow::bail!("ERP reported no open manufacturing orders");
    }

    let fetched = records.len();
    let (kept, skipped) =
        filter_by_reference(records, &codes, |r: &WipRecord| r.cookie_code.as_str());
    tracing::info!(
        fetched,
        kept = kept.len(),
        skipped,
        "filtered WIP rows to Index cookie codes"
    );
    if kept.is_empty() {
        anyhow::bail!("none of the {fetched} open orders are for a cookie in the Index sheet");
    }

    let title = config.sheets.wip.as_str();
    let existing = open_target(sheets, title, WIP_HEADERS.len(), dry_run).await?;
    let merge = merge_wip(&existing, &kept, &format_timestamp(now));

    if dry_run {
        println!(
            "dry-run: would rewrite '{title}' with {} rows ({} updated, {} new)",
            merge.rows.len() - 1,
            merge.updated,
            merge.added
        );
        return Ok(());
    }

    rewrite_sheet(sheets, title, &merge.rows, WIP_HEADERS.len()).await?;
    tracing::info!(
        sheet = title,
        rows = merge.rows.len() - 1,
        updated = merge.updated,
        added = merge.added,
        "WIP sync complete"
    );
    Ok(())
}
