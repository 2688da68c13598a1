use std::collections::HashSet;

use anyhow::Context;
use chrono::NaiveDate;
use cookiesync_core::forecast::{
    assembly_demand, forecast, opening_stock, parse_bom, production_arrivals, DETAIL_HEADERS,
    SHORTAGE_HEADERS,
};
use cookiesync_core::grid::header_row;
use cookiesync_core::{AppConfig, CatalogIndex, Grid, ItemKind, Row};
use cookiesync_sheets::SheetsClient;

use super::{read_sheet, rewrite_sheet, NEW_SHEET_ROWS};

/// Project cookie stock day by day and publish the detail and shortage sheets.
///
/// Opening stock is the inventory sheet plus work in progress. Assembly
/// plans consume cookies through the BOM; suggested production arrives after
/// the configured lead time. Input sheets that do not exist are treated as
/// empty. The forecast needs no ERP connection.
///
/// # Errors
///
/// Returns an error if any Sheets call fails.
pub(crate) async fn run_forecast(
    config: &AppConfig,
    sheets: &SheetsClient,
    today: NaiveDate,
    dry_run: bool,
) -> anyhow::Result<()> {
    let present: HashSet<String> = sheets
        .list_sheets()
        .await
        .context("failed to list worksheets")?
        .into_iter()
        .map(|s| s.title)
        .collect();

    let names = &config.sheets;
    let inventory = read_if_present(sheets, &present, &names.inventory).await?;
    let wip = read_if_present(sheets, &present, &names.wip).await?;
    let bom = parse_bom(&read_if_present(sheets, &present, &names.bom).await?);
    let assembly = read_if_present(sheets, &present, &names.assembly_plan).await?;
    let production = read_if_present(sheets, &present, &names.production_plan).await?;
    let catalog = CatalogIndex::parse(&read_if_present(sheets, &present, &names.index).await?);

    let opening = opening_stock(&inventory, &wip);
    let demand = assembly_demand(&assembly, &bom);
    let arrivals = production_arrivals(&production, today, config.lead_time_days);
    tracing::info!(
        cookies = opening.len(),
        boxes = bom.len(),
        demand_days = demand.by_day.len(),
        arrival_days = arrivals.by_day.len(),
        skipped_today = arrivals.skipped_today,
        unknown_boxes = demand.unknown_boxes.len(),
        "forecast inputs loaded"
    );

    let projection = forecast(
        &opening,
        &arrivals.by_day,
        &demand.by_day,
        &catalog.names(ItemKind::Cookie),
        today,
        config.forecast_days,
    );

    if dry_run {
        println!(
            "dry-run: would write {} projection rows to '{}' and {} shortages to '{}'",
            projection.lines.len(),
            names.forecast_detail,
            projection.shortage_count(),
            names.shortage_alert
        );
        return Ok(());
    }

    let detail = with_header(&DETAIL_HEADERS, projection.detail_rows());
    publish(
        sheets,
        &names.forecast_detail,
        &detail,
        DETAIL_HEADERS.len(),
    )
    .await?;
    let shortages = with_header(&SHORTAGE_HEADERS, projection.shortage_rows());
    publish(
        sheets,
        &names.shortage_alert,
        &shortages,
        SHORTAGE_HEADERS.len(),
    )
    .await?;

    tracing::info!(
        days = config.forecast_days,
        rows = projection.lines.len(),
        shortages = projection.shortage_count(),
        "forecast published"
    );
    Ok(())
}

async fn read_if_present(
    sheets: &SheetsClient,
    present: &HashSet<String>,
    title: &str,
) -> anyhow::Result<Grid> {
    if present.contains(title) {
        read_sheet(sheets, title).await
    } else {
        tracing::warn!(sheet = title, "sheet not found; treating as empty");
        Ok(Vec::new())
    }
}

fn with_header(headers: &[&str], rows: Vec<Row>) -> Vec<Row> {
    let mut all = Vec::with_capacity(rows.len() + 1);
    all.push(header_row(headers));
    all.extend(rows);
    all
}

/// Rows a new worksheet needs to hold `rows` without growing.
fn new_sheet_rows(rows: usize) -> u32 {
    u32::try_from(rows).unwrap_or(u32::MAX).max(NEW_SHEET_ROWS)
}

async fn publish(
    sheets: &SheetsClient,
    title: &str,
    rows: &[Row],
    columns: usize,
) -> anyhow::Result<()> {
    let cols = u32::try_from(columns).unwrap_or(u32::MAX);
    sheets
        .ensure_sheet(title, new_sheet_rows(rows.len()), cols)
        .await
        .with_context(|| format!("failed to create sheet '{title}'"))?;
    rewrite_sheet(sheets, title, rows, columns).await
}
