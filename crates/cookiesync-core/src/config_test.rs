use std::collections::HashMap;
use std::env::VarError;

use super::*;

const SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/1AbC-dEf_123/edit#gid=0";

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("GOOGLE_SHEET_URL", SHEET_URL);
    m
}

#[test]
fn build_app_config_fails_without_sheet_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "GOOGLE_SHEET_URL"),
        "expected MissingEnvVar(GOOGLE_SHEET_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_value_as_missing() {
    let mut map = HashMap::new();
    map.insert("GOOGLE_SHEET_URL", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("config should build");

    assert_eq!(cfg.spreadsheet_id, "1AbC-dEf_123");
    assert!(cfg.erp_host.is_none());
    assert_eq!(cfg.erp_port, 1433);
    assert!(!cfg.erp_trust_cert);
    assert_eq!(cfg.erp_warehouses, vec!["SP40", "SP50", "SP60"]);
    assert!(cfg.erp_stock_period.is_none());
    assert!(cfg.erp_stock_query.is_none());
    assert_eq!(
        cfg.service_account_path,
        std::path::PathBuf::from("./service_account.json")
    );
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.stock_mode, StockMode::Combined);
    assert_eq!(cfg.sheets, SheetNames::default());
    assert_eq!(cfg.http_timeout_secs, 30);
    assert_eq!(cfg.http_max_retries, 3);
    assert_eq!(cfg.http_retry_backoff_ms, 500);
    assert_eq!(cfg.forecast_days, 14);
    assert_eq!(cfg.lead_time_days, 5);
}

#[test]
fn erp_settings_are_read_when_present() {
    let mut map = full_env();
    map.insert("ERP_HOST", "erp.local");
    map.insert("ERP_PORT", "14330");
    map.insert("ERP_DATABASE", "AS_online");
    map.insert("ERP_USERNAME", "reader");
    map.insert("ERP_PASSWORD", "hunter2");
    map.insert("ERP_TRUST_CERT", "yes");
    map.insert("ERP_WAREHOUSES", " SP50 , ,SP60");
    map.insert("ERP_STOCK_PERIOD", "202512");
    map.insert("ERP_WIP_SINCE", "20251101");

    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.erp_host.as_deref(), Some("erp.local"));
    assert_eq!(cfg.erp_port, 14330);
    assert_eq!(cfg.erp_database.as_deref(), Some("AS_online"));
    assert!(cfg.erp_trust_cert);
    assert_eq!(cfg.erp_warehouses, vec!["SP50", "SP60"]);
    assert_eq!(cfg.erp_stock_period.as_deref(), Some("202512"));
    assert_eq!(cfg.erp_wip_since.as_deref(), Some("20251101"));
}

#[test]
fn debug_output_redacts_password() {
    let mut map = full_env();
    map.insert("ERP_PASSWORD", "hunter2");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("hunter2"), "password leaked: {rendered}");
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn invalid_port_is_rejected() {
    let mut map = full_env();
    map.insert("ERP_PORT", "not-a-port");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ERP_PORT"),
        "expected InvalidEnvVar(ERP_PORT), got: {result:?}"
    );
}

#[test]
fn invalid_trust_cert_is_rejected() {
    let mut map = full_env();
    map.insert("ERP_TRUST_CERT", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ERP_TRUST_CERT")
    );
}

#[test]
fn malformed_stock_period_is_rejected() {
    let mut map = full_env();
    map.insert("ERP_STOCK_PERIOD", "2025-12");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ERP_STOCK_PERIOD")
    );
}

#[test]
fn empty_warehouse_list_is_rejected() {
    let mut map = full_env();
    map.insert("ERP_WAREHOUSES", " , ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ERP_WAREHOUSES")
    );
}

#[test]
fn inline_stock_query_is_used() {
    let mut map = full_env();
    map.insert("ERP_STOCK_QUERY", "SELECT 1");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.erp_stock_query,
        Some(QuerySource::Inline("SELECT 1".to_string()))
    );
}

#[test]
fn stock_query_path_is_used() {
    let mut map = full_env();
    map.insert("ERP_WIP_QUERY_PATH", "./sql/wip.sql");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.erp_wip_query,
        Some(QuerySource::File(PathBuf::from("./sql/wip.sql")))
    );
}

#[test]
fn inline_query_and_path_are_mutually_exclusive() {
    let mut map = full_env();
    map.insert("ERP_STOCK_QUERY", "SELECT 1");
    map.insert("ERP_STOCK_QUERY_PATH", "./sql/stock.sql");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ERP_STOCK_QUERY_PATH")
    );
}

#[test]
fn stock_mode_override() {
    let mut map = full_env();
    map.insert("COOKIESYNC_STOCK_MODE", "per-warehouse");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.stock_mode, StockMode::PerWarehouse);
}

#[test]
fn unknown_stock_mode_is_rejected() {
    let mut map = full_env();
    map.insert("COOKIESYNC_STOCK_MODE", "sideways");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COOKIESYNC_STOCK_MODE")
    );
}

#[test]
fn sheet_name_overrides_keep_other_defaults() {
    let mut map = full_env();
    map.insert("COOKIESYNC_INVENTORY_SHEET", "Stock");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.sheets.inventory, "Stock");
    assert_eq!(cfg.sheets.index, "Index");
    assert_eq!(cfg.sheets.bom, "BOM");
}

#[test]
fn zero_forecast_days_is_rejected() {
    let mut map = full_env();
    map.insert("COOKIESYNC_FORECAST_DAYS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COOKIESYNC_FORECAST_DAYS")
    );
}

#[test]
fn spreadsheet_id_from_full_url() {
    assert_eq!(
        parse_spreadsheet_id("https://docs.google.com/spreadsheets/d/abc123/edit?usp=sharing")
            .unwrap(),
        "abc123"
    );
}

#[test]
fn spreadsheet_id_from_bare_id() {
    assert_eq!(
        parse_spreadsheet_id(" abc_123-XYZ ").unwrap(),
        "abc_123-XYZ"
    );
}

#[test]
fn spreadsheet_id_rejects_url_without_d_segment() {
    assert!(parse_spreadsheet_id("https://example.com/spreadsheets/abc").is_err());
}

#[test]
fn spreadsheet_id_rejects_garbage() {
    assert!(parse_spreadsheet_id("not a sheet").is_err());
}
