use std::path::PathBuf;

use crate::inventory::StockMode;

/// Where a custom SQL statement comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    Inline(String),
    File(PathBuf),
}

/// Worksheet titles the commands read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNames {
    pub index: String,
    pub inventory: String,
    pub wip: String,
    pub schedule: String,
    pub bom: String,
    pub assembly_plan: String,
    pub production_plan: String,
    pub forecast_detail: String,
    pub shortage_alert: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            index: "Index".to_string(),
            inventory: "庫存狀態".to_string(),
            wip: "在製品庫存".to_string(),
            schedule: "生產排程".to_string(),
            bom: "BOM".to_string(),
            assembly_plan: "組裝計劃".to_string(),
            production_plan: "生產排程建議".to_string(),
            forecast_detail: "庫存預估明細".to_string(),
            shortage_alert: "負庫存警示".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub erp_host: Option<String>,
    pub erp_port: u16,
    pub erp_database: Option<String>,
    pub erp_username: Option<String>,
    pub erp_password: Option<String>,
    pub erp_trust_cert: bool,
    pub erp_warehouses: Vec<String>,
    /// `YYYYMM`; the current month when unset.
    pub erp_stock_period: Option<String>,
    /// `YYYYMMDD`; no lower bound when unset.
    pub erp_wip_since: Option<String>,
    pub erp_stock_query: Option<QuerySource>,
    pub erp_wip_query: Option<QuerySource>,
    pub spreadsheet_id: String,
    pub service_account_path: PathBuf,
    pub log_level: String,
    pub stock_mode: StockMode,
    pub sheets: SheetNames,
    pub http_timeout_secs: u64,
    pub http_max_retries: u32,
    pub http_retry_backoff_ms: u64,
    pub forecast_days: u32,
    pub lead_time_days: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("erp_host", &self.erp_host)
            .field("erp_port", &self.erp_port)
            .field("erp_database", &self.erp_database)
            .field("erp_username", &self.erp_username)
            .field(
                "erp_password",
                &self.erp_password.as_ref().map(|_| "[redacted]"),
            )
            .field("erp_trust_cert", &self.erp_trust_cert)
            .field("erp_warehouses", &self.erp_warehouses)
            .field("erp_stock_period", &self.erp_stock_period)
            .field("erp_wip_since", &self.erp_wip_since)
            .field("erp_stock_query", &self.erp_stock_query)
            .field("erp_wip_query", &self.erp_wip_query)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("service_account_path", &self.service_account_path)
            .field("log_level", &self.log_level)
            .field("stock_mode", &self.stock_mode)
            .field("sheets", &self.sheets)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_max_retries", &self.http_max_retries)
            .field("http_retry_backoff_ms", &self.http_retry_backoff_ms)
            .field("forecast_days", &self.forecast_days)
            .field("lead_time_days", &self.lead_time_days)
            .finish()
    }
}
