//! Shared fixtures for the pipeline tests: an ASCII-named workbook config and
//! wiremock helpers for the Sheets endpoints.

use std::env::VarError;

use cookiesync_core::config::build_app_config;
use cookiesync_core::AppConfig;
use cookiesync_sheets::{HttpSettings, SheetsClient, TokenSource};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub(crate) const SHEET_ID: &str = "sheet-123";

pub(crate) fn test_config() -> AppConfig {
    let mut config = build_app_config(|key| match key {
        "GOOGLE_SHEET_URL" => Ok(format!("https://docs.google.com/spreadsheets/d/{SHEET_ID}/edit")),
        _ => Err(VarError::NotPresent),
    })
    .expect("test config should build");

    config.sheets.index = "Index".to_string();
    config.sheets.inventory = "Stock".to_string();
    config.sheets.wip = "Wip".to_string();
    config.sheets.schedule = "Schedule".to_string();
    config.sheets.bom = "Bom".to_string();
    config.sheets.assembly_plan = "Assembly".to_string();
    config.sheets.production_plan = "Production".to_string();
    config.sheets.forecast_detail = "Detail".to_string();
    config.sheets.shortage_alert = "Shortage".to_string();
    config
}

pub(crate) fn sheets_client(server: &MockServer) -> SheetsClient {
    SheetsClient::with_base_url(
        SHEET_ID,
        TokenSource::Static("test-token".to_string()),
        HttpSettings {
            timeout_secs: 5,
            max_retries: 0,
            retry_backoff_ms: 0,
        },
        &server.uri(),
    )
    .expect("client construction should not fail")
}

/// `values.get` path of a whole-sheet read.
pub(crate) fn sheet_path(title: &str) -> String {
    format!("/v4/spreadsheets/{SHEET_ID}/values/'{title}'")
}

pub(crate) fn values_path(range: &str) -> String {
    format!("/v4/spreadsheets/{SHEET_ID}/values/{range}")
}

/// Serves `rows` for a whole-sheet read of `title`.
pub(crate) async fn mount_sheet(server: &MockServer, title: &str, rows: &[&[&str]]) {
    Mock::given(method("GET"))
        .and(path(sheet_path(title)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "range": format!("'{title}'!A1:Z1000"),
            "majorDimension": "ROWS",
            "values": rows,
        })))
        .mount(server)
        .await;
}

/// Serves the worksheet list with the given titles.
pub(crate) async fn mount_sheet_list(server: &MockServer, titles: &[&str]) {
    let sheets: Vec<serde_json::Value> = titles
        .iter()
        .enumerate()
        .map(|(id, title)| {
            serde_json::json!({ "properties": { "sheetId": id, "title": title } })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/v4/spreadsheets/{SHEET_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sheets": sheets
        })))
        .mount(server)
        .await;
}

/// Accepts a clear of `title`, expecting it exactly `times` times.
pub(crate) async fn expect_clear(server: &MockServer, title: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!("{}:clear", sheet_path(title))))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "spreadsheetId": SHEET_ID
        })))
        .expect(times)
        .mount(server)
        .await;
}

/// Rejects any write at all. Used by dry-run tests.
pub(crate) async fn forbid_writes(server: &MockServer) {
    for verb in ["POST", "PUT"] {
        Mock::given(method(verb))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
    }
}
