//! Google Sheets v4 client used by the sync commands.

pub mod a1;
pub mod auth;
pub mod client;
pub mod error;
mod retry;
mod types;

pub use auth::{ServiceAccountKey, TokenSource, SHEETS_SCOPE};
pub use client::{HttpSettings, SheetsClient};
pub use error::SheetsError;
pub use types::SheetProperties;
