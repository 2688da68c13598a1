//! Read-only access to the ERP's SQL Server database.

pub mod client;
pub mod queries;
mod rows;

use std::path::PathBuf;

use chrono::NaiveDate;
use cookiesync_core::{AppConfig, QuerySource};
use thiserror::Error;

pub use client::ErpClient;

#[derive(Debug, Error)]
pub enum ErpError {
    #[error("ERP connection is not configured: {0} is not set")]
    NotConfigured(&'static str),

    #[error("failed to read query file {path}: {source}")]
    QueryFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("query result has no '{0}' column")]
    MissingColumn(String),

    #[error("invalid value in column '{column}': {reason}")]
    InvalidValue { column: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sql(#[from] tiberius::error::Error),
}

/// Everything needed to connect to the ERP and run the stock queries.
#[derive(Clone)]
pub struct ErpConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub trust_cert: bool,
    /// Custom stock SQL; the built-in query is used when `None`.
    pub stock_query: Option<String>,
    /// Custom WIP SQL; the built-in query is used when `None`.
    pub wip_query: Option<String>,
    pub warehouses: Vec<String>,
    /// Opening-balance period, `YYYYMM`.
    pub stock_period: String,
    /// First day of `stock_period`, `YYYYMMDD`. Movements on or after this
    /// date are added to the opening balance.
    pub movement_since: String,
    /// Orders opened before this `YYYYMMDD` date are ignored.
    pub wip_since: Option<String>,
}

impl ErpConfig {
    /// Builds the ERP settings from the application config. Custom query
    /// files are read here so a bad path fails before any connection is made.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::NotConfigured`] when a connection setting is
    /// missing and [`ErpError::QueryFile`] when a query file cannot be read.
    pub fn from_app_config(app: &AppConfig, today: NaiveDate) -> Result<Self, ErpError> {
        let stock_period = app
            .erp_stock_period
            .clone()
            .unwrap_or_else(|| today.format("%Y%m").to_string());
        let movement_since = format!("{stock_period}01");

        Ok(Self {
            host: required(app.erp_host.as_ref(), "ERP_HOST")?,
            port: app.erp_port,
            database: required(app.erp_database.as_ref(), "ERP_DATABASE")?,
            username: required(app.erp_username.as_ref(), "ERP_USERNAME")?,
            password: required(app.erp_password.as_ref(), "ERP_PASSWORD")?,
            trust_cert: app.erp_trust_cert,
            stock_query: load_query(app.erp_stock_query.as_ref())?,
            wip_query: load_query(app.erp_wip_query.as_ref())?,
            warehouses: app.erp_warehouses.clone(),
            stock_period,
            movement_since,
            wip_since: app.erp_wip_since.clone(),
        })
    }
}

impl std::fmt::Debug for ErpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("trust_cert", &self.trust_cert)
            .field("stock_query", &self.stock_query.is_some())
            .field("wip_query", &self.wip_query.is_some())
            .field("warehouses", &self.warehouses)
            .field("stock_period", &self.stock_period)
            .field("movement_since", &self.movement_since)
            .field("wip_since", &self.wip_since)
            .finish()
    }
}

fn required(value: Option<&String>, var: &'static str) -> Result<String, ErpError> {
    value.cloned().ok_or(ErpError::NotConfigured(var))
}

fn load_query(source: Option<&QuerySource>) -> Result<Option<String>, ErpError> {
    match source {
        None => Ok(None),
        Some(QuerySource::Inline(sql)) => Ok(Some(sql.clone())),
        Some(QuerySource::File(path)) => std::fs::read_to_string(path)
            .map(|sql| Some(sql.trim().to_string()))
            .map_err(|source| ErpError::QueryFile {
                path: path.clone(),
                source,
            }),
    }
}
