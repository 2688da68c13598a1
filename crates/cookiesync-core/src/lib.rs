pub mod app_config;
pub mod config;
pub mod forecast;
pub mod grid;
pub mod index;
pub mod inventory;
pub mod schedule;
pub mod wip;

use thiserror::Error;

pub use app_config::{AppConfig, QuerySource, SheetNames};
pub use config::{load_app_config, load_app_config_from_env, parse_spreadsheet_id};
pub use grid::{Cell, Grid, Row};
pub use index::{CatalogIndex, IndexEntry, ItemInfo, ItemKind};
pub use inventory::{StockMode, StockRecord};
pub use wip::WipRecord;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Errors raised while interpreting sheet contents.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("sheet '{0}' has no data rows")]
    EmptySheet(String),

    #[error("sheet '{sheet}' is missing required columns: {}", columns.join(", "))]
    MissingColumns { sheet: String, columns: Vec<String> },
}
