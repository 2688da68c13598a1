use std::collections::{BTreeSet, HashMap};

use cookiesync_core::grid::{cell, find_column};
use cookiesync_core::schedule::{recompute_schedule, SCHEDULE_HEADERS};
use cookiesync_core::{AppConfig, CatalogIndex, Grid, ItemKind};
use cookiesync_sheets::SheetsClient;

use super::{load_catalog, read_sheet, rewrite_sheet};
use crate::source::ErpSource;

/// Recompute piece counts and cookie names in the production schedule.
///
/// Raw weights come from the Index sheet. Names come from the ERP item
/// master; when the ERP is unavailable (`erp` is `None`) or the lookup fails,
/// the Index names are used instead.
///
/// # Errors
///
/// Returns an error if the Index has no raw weights, the schedule sheet is
/// empty or lacks a required column, or any Sheets call fails.
pub(crate) async fn run_schedule<E: ErpSource>(
    config: &AppConfig,
    sheets: &SheetsClient,
    erp: Option<&mut E>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(sheets, &config.sheets.index).await?;
    let raw_weights = catalog.raw_weights();
    if raw_weights.is_empty() {
        anyhow::bail!(
            "Index sheet '{}' has no raw weights; cannot compute piece counts",
            config.sheets.index
        );
    }

    let title = config.sheets.schedule.as_str();
    let grid = read_sheet(sheets, title).await?;
    let codes = scheduled_codes(&grid);
    let names = cookie_names(erp, &codes, &catalog).await;

    let rebuild = recompute_schedule(title, &grid, &raw_weights, &names)?;
    tracing::info!(
        pieces_updated = rebuild.pieces_updated,
        names_updated = rebuild.names_updated,
        skipped = rebuild.skipped,
        errors = rebuild.errors,
        "schedule recomputed"
    );

    if dry_run {
        println!(
            "dry-run: would rewrite '{title}' with {} rows ({} piece counts, {} names)",
            rebuild.rows.len() - 1,
            rebuild.pieces_updated,
            rebuild.names_updated
        );
        return Ok(());
    }

    rewrite_sheet(sheets, title, &rebuild.rows, SCHEDULE_HEADERS.len()).await?;
    tracing::info!(
        sheet = title,
        rows = rebuild.rows.len() - 1,
        "schedule sheet rewritten"
    );
    Ok(())
}

/// Distinct cookie codes on the schedule, sorted.
fn scheduled_codes(grid: &Grid) -> Vec<String> {
    let Some((header, rows)) = grid.split_first() else {
        return Vec::new();
    };
    let Some(code_idx) = find_column(header, "餅乾代號") else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| cell(row, code_idx))
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

async fn cookie_names<E: ErpSource>(
    erp: Option<&mut E>,
    codes: &[String],
    catalog: &CatalogIndex,
) -> HashMap<String, String> {
    let Some(erp) = erp else {
        return catalog.names(ItemKind::Cookie);
    };
    if codes.is_empty() {
        return HashMap::new();
    }
    match erp.item_info(codes).await {
        Ok(info) => {
            tracing::info!(
                requested = codes.len(),
                found = info.len(),
                "looked up cookie names in ERP"
            );
            info.into_values()
                .filter(|item| !item.name.is_empty())
                .map(|item| (item.code, item.name))
                .collect()
        }
        Err(e) => {
            tracing::warn!(error = %e, "ERP name lookup failed; using Index names");
            catalog.names(ItemKind::Cookie)
        }
    }
}

#[cfg(test)]
mod tests {
    use cookiesync_core::ItemInfo;
    use rust_decimal::Decimal;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::commands::test_support::{
        expect_clear, forbid_writes, mount_sheet, sheets_client, test_config, values_path,
    };
    use crate::source::FakeErp;

    const INDEX: &[&[&str]] = &[
        &["類型", "代號", "名稱", "生重", "熟重", "備註"],
        &["餅乾", "C001", "Index chocolate", "25", "22", ""],
        &["餅乾", "C002", "Index vanilla", "", "", ""],
    ];

    const SCHEDULE: &[&[&str]] = &[
        &[
            "日期",
            "產線代號",
            "餅乾代號",
            "生產顆數",
            "生產片數",
            "狀態",
        ],
        &["2026/10/20", "L1", "C001", "2", "", "planned"],
        &["2026/10/21", "L2", "C002", "1", "900", ""],
    ];

    async fn expect_rewrite(server: &MockServer, body: serde_json::Value) {
        expect_clear(server, "Schedule", 1).await;
        Mock::given(method("PUT"))
            .and(path(values_path("'Schedule'!A1:I3")))
            .and(body_partial_json(body))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "updatedCells": 27
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn erp_with_names() -> FakeErp {
        FakeErp {
            items: HashMap::from([(
                "C001".to_string(),
                ItemInfo {
                    code: "C001".to_string(),
                    name: "ERP chocolate".to_string(),
                    raw_weight: Decimal::from(25),
                    cooked_weight: Decimal::from(22),
                },
            )]),
            ..FakeErp::default()
        }
    }

    #[test]
    fn scheduled_codes_are_distinct_and_sorted() {
        let grid: Grid = vec![
            vec!["餅乾代號".to_string()],
            vec!["C002".to_string()],
            vec![String::new()],
            vec!["C001".to_string()],
            vec!["C002".to_string()],
        ];
        assert_eq!(scheduled_codes(&grid), vec!["C001", "C002"]);
    }

    #[tokio::test]
    async fn recomputes_pieces_with_erp_names() {
        let server = MockServer::start().await;
        mount_sheet(&server, "Index", INDEX).await;
        mount_sheet(&server, "Schedule", SCHEDULE).await;
        expect_rewrite(
            &server,
            serde_json::json!({
                "values": [
                    ["日期", "產線代號", "餅乾代號", "名稱", "生產顆數", "生產片數", "預計完成日期", "狀態", "備註"],
                    ["2026/10/20", "L1", "C001", "ERP chocolate", "2", 12160, "2026/10/22", "planned", ""],
                    ["2026/10/21", "L2", "C002", "", "1", "900", "2026/10/23", "", ""]
                ]
            }),
        )
        .await;

        let mut erp = erp_with_names();
        run_schedule(
            &test_config(),
            &sheets_client(&server),
            Some(&mut erp),
            false,
        )
        .await
        .expect("schedule sync should succeed");
        assert_eq!(
            erp.item_info_requests,
            vec![vec!["C001".to_string(), "C002".to_string()]]
        );
    }

    #[tokio::test]
    async fn failed_erp_lookup_falls_back_to_index_names() {
        let server = MockServer::start().await;
        mount_sheet(&server, "Index", INDEX).await;
        mount_sheet(&server, "Schedule", SCHEDULE).await;
        expect_rewrite(
            &server,
            serde_json::json!({
                "values": [
                    ["日期", "產線代號", "餅乾代號", "名稱", "生產顆數", "生產片數", "預計完成日期", "狀態", "備註"],
                    ["2026/10/20", "L1", "C001", "Index chocolate", "2", 12160, "2026/10/22", "planned", ""],
                    ["2026/10/21", "L2", "C002", "Index vanilla", "1", "900", "2026/10/23", "", ""]
                ]
            }),
        )
        .await;

        let mut erp = FakeErp {
            fail_item_info: true,
            ..erp_with_names()
        };
        run_schedule(
            &test_config(),
            &sheets_client(&server),
            Some(&mut erp),
            false,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn runs_without_erp_connection() {
        let server = MockServer::start().await;
        mount_sheet(&server, "Index", INDEX).await;
        mount_sheet(&server, "Schedule", SCHEDULE).await;
        forbid_writes(&server).await;

        run_schedule(
            &test_config(),
            &sheets_client(&server),
            None::<&mut FakeErp>,
            true,
        )
        .await
        .expect("dry run without ERP should succeed");
    }

    #[tokio::test]
    async fn index_without_raw_weights_aborts_without_writing() {
        let server = MockServer::start().await;
        mount_sheet(
            &server,
            "Index",
            &[
                &["類型", "代號", "名稱", "生重"],
                &["餅乾", "C001", "Choc", ""],
            ],
        )
        .await;
        mount_sheet(&server, "Schedule", SCHEDULE).await;
        forbid_writes(&server).await;

        let err = run_schedule(
            &test_config(),
            &sheets_client(&server),
            None::<&mut FakeErp>,
            false,
        )
        .await
        .unwrap_err();
        assert!(format!("{err}").contains("no raw weights"), "got: {err}");
    }

    #[tokio::test]
    async fn missing_columns_abort_without_writing() {
        let server = MockServer::start().await;
        mount_sheet(&server, "Index", INDEX).await;
        mount_sheet(
            &server,
            "Schedule",
            &[&["日期", "餅乾代號"], &["2026/10/20", "C001"]],
        )
        .await;
        forbid_writes(&server).await;

        let err = run_schedule(
            &test_config(),
            &sheets_client(&server),
            None::<&mut FakeErp>,
            false,
        )
        .await
        .unwrap_err();
        assert!(
            format!("{err}").contains("missing required columns"),
            "got: {err}"
        );
    }
}
