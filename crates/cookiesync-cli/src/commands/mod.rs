//! Command handlers for the CLI.
//!
//! Each handler reads what it needs from the spreadsheet, asks the ERP for
//! fresh data and writes the result back. Any failed call aborts the run; the
//! next scheduled invocation is the retry.

mod forecast;
mod index;
mod inventory;
mod schedule;
mod wip;

#[cfg(test)]
pub(crate) mod test_support;

use anyhow::Context;
use cookiesync_core::{CatalogIndex, Grid, Row};
use cookiesync_sheets::{a1, SheetsClient};

pub(crate) use forecast::run_forecast;
pub(crate) use index::run_index;
pub(crate) use inventory::run_inventory;
pub(crate) use schedule::run_schedule;
pub(crate) use wip::run_wip;

/// Row count given to worksheets created by a sync.
const NEW_SHEET_ROWS: u32 = 1000;

/// Reads every populated cell of `title`.
async fn read_sheet(sheets: &SheetsClient, title: &str) -> anyhow::Result<Grid> {
    sheets
        .read(&a1::sheet_range(title))
        .await
        .with_context(|| format!("failed to read sheet '{title}'"))
}

/// Reads and parses the Index sheet.
async fn load_catalog(sheets: &SheetsClient, title: &str) -> anyhow::Result<CatalogIndex> {
    let grid = read_sheet(sheets, title).await?;
    let catalog = CatalogIndex::parse(&grid);
    tracing::info!(
        sheet = title,
        entries = catalog.entries().len(),
        "loaded Index sheet"
    );
    Ok(catalog)
}

/// Reads a sync target, creating the worksheet first when it does not exist.
/// A dry run never creates anything and treats a missing sheet as empty.
async fn open_target(
    sheets: &SheetsClient,
    title: &str,
    columns: usize,
    dry_run: bool,
) -> anyhow::Result<Grid> {
    let exists = if dry_run {
        sheets
            .list_sheets()
            .await
            .context("failed to list worksheets")?
            .iter()
            .any(|s| s.title == title)
    } else {
        let columns = u32::try_from(columns).unwrap_or(u32::MAX);
        !sheets
            .ensure_sheet(title, NEW_SHEET_ROWS, columns)
            .await
            .with_context(|| format!("failed to create sheet '{title}'"))?
    };

    if exists {
        read_sheet(sheets, title).await
    } else {
        if dry_run {
            println!("dry-run: sheet '{title}' does not exist and would be created");
        }
        Ok(Vec::new())
    }
}

/// Replaces the contents of `title` with `rows`, starting at A1.
async fn rewrite_sheet(
    sheets: &SheetsClient,
    title: &str,
    rows: &[Row],
    columns: usize,
) -> anyhow::Result<()> {
    sheets
        .clear(&a1::sheet_range(title))
        .await
        .with_context(|| format!("failed to clear sheet '{title}'"))?;
    sheets
        .write(&a1::block_range(title, rows.len(), columns), rows)
        .await
        .with_context(|| format!("failed to write sheet '{title}'"))?;
    Ok(())
}
