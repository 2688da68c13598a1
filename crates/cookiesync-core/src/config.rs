use std::path::PathBuf;

use crate::app_config::{AppConfig, QuerySource, SheetNames};
use crate::inventory::StockMode;
use crate::ConfigError;

const DEFAULT_WAREHOUSES: &str = "SP40,SP50,SP60";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// ERP connection settings are optional here: commands that never touch the
/// ERP (the forecast) must run without them. The ERP crate reports the
/// missing variable when a connection is actually attempted.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let require = |var: &str| -> Result<String, ConfigError> {
        optional(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        or_default(var, default)
            .parse::<u16>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let query_source = |inline: &str, file: &str| -> Result<Option<QuerySource>, ConfigError> {
        match (optional(inline), optional(file)) {
            (Some(_), Some(_)) => Err(invalid(
                file,
                format!("{inline} and {file} are mutually exclusive"),
            )),
            (Some(sql), None) => Ok(Some(QuerySource::Inline(sql))),
            (None, Some(path)) => Ok(Some(QuerySource::File(PathBuf::from(path)))),
            (None, None) => Ok(None),
        }
    };

    let spreadsheet_id = parse_spreadsheet_id(&require("GOOGLE_SHEET_URL")?)
        .map_err(|reason| invalid("GOOGLE_SHEET_URL", reason))?;
    let service_account_path =
        PathBuf::from(or_default("GOOGLE_SERVICE_ACCOUNT_PATH", "./service_account.json"));

    let erp_trust_cert = parse_bool(&or_default("ERP_TRUST_CERT", "false"))
        .ok_or_else(|| invalid("ERP_TRUST_CERT", "expected true or false".to_string()))?;

    let erp_warehouses = parse_list(&or_default("ERP_WAREHOUSES", DEFAULT_WAREHOUSES));
    if erp_warehouses.is_empty() {
        return Err(invalid(
            "ERP_WAREHOUSES",
            "at least one warehouse code is required".to_string(),
        ));
    }

    let erp_stock_period = optional("ERP_STOCK_PERIOD")
        .map(|raw| validate_digits(&raw, 6).map_err(|r| invalid("ERP_STOCK_PERIOD", r)))
        .transpose()?;
    let erp_wip_since = optional("ERP_WIP_SINCE")
        .map(|raw| validate_digits(&raw, 8).map_err(|r| invalid("ERP_WIP_SINCE", r)))
        .transpose()?;

    let stock_mode = or_default("COOKIESYNC_STOCK_MODE", "combined")
        .parse::<StockMode>()
        .map_err(|reason| invalid("COOKIESYNC_STOCK_MODE", reason))?;

    let defaults = SheetNames::default();
    let sheets = SheetNames {
        index: or_default("COOKIESYNC_INDEX_SHEET", &defaults.index),
        inventory: or_default("COOKIESYNC_INVENTORY_SHEET", &defaults.inventory),
        wip: or_default("COOKIESYNC_WIP_SHEET", &defaults.wip),
        schedule: or_default("COOKIESYNC_SCHEDULE_SHEET", &defaults.schedule),
        ..defaults
    };

    let forecast_days = parse_u32("COOKIESYNC_FORECAST_DAYS", "14")?;
    if forecast_days == 0 {
        return Err(invalid("COOKIESYNC_FORECAST_DAYS", "must be positive".to_string()));
    }

    Ok(AppConfig {
        erp_host: optional("ERP_HOST"),
        erp_port: parse_u16("ERP_PORT", "1433")?,
        erp_database: optional("ERP_DATABASE"),
        erp_username: optional("ERP_USERNAME"),
        erp_password: optional("ERP_PASSWORD"),
        erp_trust_cert,
        erp_warehouses,
        erp_stock_period,
        erp_wip_since,
        erp_stock_query: query_source("ERP_STOCK_QUERY", "ERP_STOCK_QUERY_PATH")?,
        erp_wip_query: query_source("ERP_WIP_QUERY", "ERP_WIP_QUERY_PATH")?,
        spreadsheet_id,
        service_account_path,
        log_level: or_default("COOKIESYNC_LOG_LEVEL", "info"),
        stock_mode,
        sheets,
        http_timeout_secs: parse_u64("COOKIESYNC_HTTP_TIMEOUT_SECS", "30")?,
        http_max_retries: parse_u32("COOKIESYNC_HTTP_MAX_RETRIES", "3")?,
        http_retry_backoff_ms: parse_u64("COOKIESYNC_HTTP_RETRY_BACKOFF_MS", "500")?,
        forecast_days,
        lead_time_days: parse_u32("COOKIESYNC_LEAD_TIME_DAYS", "5")?,
    })
}

/// Extract the spreadsheet id from a full Google Sheets URL, or accept a bare id.
///
/// `https://docs.google.com/spreadsheets/d/<id>/edit#gid=0` yields `<id>`.
///
/// # Errors
///
/// Returns a human-readable reason when no id can be found.
pub fn parse_spreadsheet_id(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    if raw.contains("://") {
        let mut segments = raw.split('/');
        segments
            .by_ref()
            .find(|s| *s == "d")
            .ok_or_else(|| format!("no '/d/<id>' segment in '{raw}'"))?;
        let id = segments
            .next()
            .map(|s| s.split(['?', '#']).next().unwrap_or_default())
            .unwrap_or_default();
        if id.is_empty() {
            return Err(format!("empty spreadsheet id in '{raw}'"));
        }
        return Ok(id.to_string());
    }

    if raw.is_empty()
        || !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!("'{raw}' is neither a sheet URL nor a spreadsheet id"));
    }
    Ok(raw.to_string())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_digits(raw: &str, len: usize) -> Result<String, String> {
    if raw.len() == len && raw.chars().all(|c| c.is_ascii_digit()) {
        Ok(raw.to_string())
    } else {
        Err(format!("expected {len} digits, got '{raw}'"))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
