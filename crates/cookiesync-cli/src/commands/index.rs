use anyhow::Context;
use cookiesync_core::index::{all_codes, rebuild_index, INDEX_HEADERS};
use cookiesync_core::AppConfig;
use cookiesync_sheets::SheetsClient;

use super::{read_sheet, rewrite_sheet};
use crate::source::ErpSource;

/// Refresh names and weights in the Index sheet from the ERP item master.
///
/// Every code in the sheet is looked up regardless of its kind. The sheet is
/// rewritten in the standard column order; rows the ERP does not know keep
/// their current values.
///
/// # Errors
///
/// Returns an error if the Index sheet has no codes, the ERP knows none of
/// them, or any ERP or Sheets call fails.
pub(crate) async fn run_index<E: ErpSource>(
    config: &AppConfig,
    sheets: &SheetsClient,
    erp: &mut E,
    dry_run: bool,
) -> anyhow::Result<()> {
    let title = config.sheets.index.as_str();
    let grid = read_sheet(sheets, title).await?;
    let codes = all_codes(&grid);
    if codes.is_empty() {
        anyhow::bail!("Index sheet '{title}' has no codes to refresh");
    }
    tracing::info!(
        sheet = title,
        codes = codes.len(),
        "looking up Index codes in ERP"
    );

    let info = erp
        .item_info(&codes)
        .await
        .context("failed to query ERP item master")?;
    if info.is_empty() {
        anyhow::bail!(
            "ERP item master has none of the {} Index codes",
            codes.len()
        );
    }

    let rebuild = rebuild_index(&grid, &info);
    if dry_run {
        println!(
            "dry-run: would rewrite '{title}' ({} updated, {} not found in ERP)",
            rebuild.updated, rebuild.not_found
        );
        return Ok(());
    }

    rewrite_sheet(sheets, title, &rebuild.rows, INDEX_HEADERS.len()).await?;
    tracing::info!(
        sheet = title,
        updated = rebuild.updated,
        not_found = rebuild.not_found,
        "Index refresh complete"
    );
    Ok(())
}
