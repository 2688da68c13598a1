//! HTTP client for the Google Sheets v4 REST API.
//!
//! Wraps `reqwest` with service-account auth, retry on transient failures
//! and typed request bodies. Values are written with `RAW` input so codes
//! such as `0012` keep their leading zeros.

use std::time::Duration;

use cookiesync_core::{Grid, Row};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::{Authenticator, TokenSource};
use crate::error::SheetsError;
use crate::retry::retry_with_backoff;
use crate::types::{
    cell_text, AppendResponse, ApiErrorBody, BatchUpdateResponse, BatchWrite, SheetProperties,
    SpreadsheetMeta, UpdateResponse, ValueRange, WriteRange,
};

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/";
const VALUE_INPUT_OPTION: &str = "RAW";

/// Timeout and retry policy for API calls.
#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// Client bound to one spreadsheet.
///
/// Use [`SheetsClient::new`] for production or [`SheetsClient::with_base_url`]
/// to point at a mock server in tests.
pub struct SheetsClient {
    http: Client,
    auth: Authenticator,
    base_url: Url,
    spreadsheet_id: String,
    settings: HttpSettings,
}

impl SheetsClient {
    /// Creates a client pointed at the production Sheets API.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the HTTP client cannot be built and
    /// [`SheetsError::InvalidKey`] if the service-account key is unusable.
    pub fn new(
        spreadsheet_id: &str,
        source: TokenSource,
        settings: HttpSettings,
    ) -> Result<Self, SheetsError> {
        Self::with_base_url(spreadsheet_id, source, settings, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// As [`SheetsClient::new`], plus [`SheetsError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        spreadsheet_id: &str,
        source: TokenSource,
        settings: HttpSettings,
        base_url: &str,
    ) -> Result<Self, SheetsError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("cookiesync/0.1 (inventory-sync)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|_| SheetsError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(SheetsError::InvalidBaseUrl(normalised));
        }

        Ok(Self {
            http,
            auth: Authenticator::new(source)?,
            base_url,
            spreadsheet_id: spreadsheet_id.to_string(),
            settings,
        })
    }

    #[must_use]
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Titles and ids of every worksheet, in tab order.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] if the request fails.
    pub async fn list_sheets(&self) -> Result<Vec<SheetProperties>, SheetsError> {
        let mut url = self.spreadsheet_url(None);
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");
        let meta: SpreadsheetMeta = self.send(Method::GET, url, None::<&()>).await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties).collect())
    }

    /// Adds a worksheet named `title` unless one already exists. Returns
    /// `true` when the sheet was created.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] if a request fails.
    pub async fn ensure_sheet(
        &self,
        title: &str,
        rows: u32,
        columns: u32,
    ) -> Result<bool, SheetsError> {
        if self.list_sheets().await?.iter().any(|s| s.title == title) {
            return Ok(false);
        }
        let body = serde_json::json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": columns }
                    }
                }
            }]
        });
        let url = self.spreadsheet_url(Some("batchUpdate"));
        let _: serde_json::Value = self.send(Method::POST, url, Some(&body)).await?;
        tracing::info!(sheet = title, "created worksheet");
        Ok(true)
    }

    /// Reads `range` as display text. Trailing empty rows and cells are
    /// omitted by the API, so rows may be ragged.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] if the request fails.
    pub async fn read(&self, range: &str) -> Result<Grid, SheetsError> {
        let mut url = self.values_url(range, None);
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "FORMATTED_VALUE");
        let body: ValueRange = self.send(Method::GET, url, None::<&()>).await?;
        Ok(body
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    /// Overwrites `range` with `rows`. Returns the number of cells updated.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] if the request fails.
    pub async fn write(&self, range: &str, rows: &[Row]) -> Result<u64, SheetsError> {
        let mut url = self.values_url(range, None);
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_OPTION);
        let response: UpdateResponse = self
            .send(Method::PUT, url, Some(&WriteRange::rows(range, rows)))
            .await?;
        Ok(response.updated_cells)
    }

    /// Writes several ranges in one request. Returns the number of cells
    /// updated.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] if the request fails.
    pub async fn batch_write(&self, ranges: &[(String, Vec<Row>)]) -> Result<u64, SheetsError> {
        if ranges.is_empty() {
            return Ok(0);
        }
        let body = BatchWrite {
            value_input_option: VALUE_INPUT_OPTION,
            data: ranges
                .iter()
                .map(|(range, rows)| WriteRange::rows(range, rows))
                .collect(),
        };
        let url = self.values_url("", Some("batchUpdate"));
        let response: BatchUpdateResponse = self.send(Method::POST, url, Some(&body)).await?;
        Ok(response.total_updated_cells)
    }

    /// Appends `rows` after the last row of the table in `range`. Returns the
    /// number of cells written.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] if the request fails.
    pub async fn append(&self, range: &str, rows: &[Row]) -> Result<u64, SheetsError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut url = self.values_url(range, Some("append"));
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_OPTION)
            .append_pair("insertDataOption", "INSERT_ROWS");
        let response: AppendResponse = self
            .send(Method::POST, url, Some(&WriteRange::rows(range, rows)))
            .await?;
        Ok(response.updates.map_or(0, |u| u.updated_cells))
    }

    /// Clears the values in `range`, keeping formatting.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] if the request fails.
    pub async fn clear(&self, range: &str) -> Result<(), SheetsError> {
        let url = self.values_url(range, Some("clear"));
        let _: serde_json::Value = self
            .send(Method::POST, url, Some(&serde_json::json!({})))
            .await?;
        Ok(())
    }

    /// `v4/spreadsheets/{id}` with an optional `:action` suffix.
    fn spreadsheet_url(&self, action: Option<&str>) -> Url {
        let last = match action {
            Some(action) => format!("{}:{action}", self.spreadsheet_id),
            None => self.spreadsheet_id.clone(),
        };
        self.url_with_segments(&["v4", "spreadsheets", &last])
    }

    /// `v4/spreadsheets/{id}/values/{range}` with an optional `:action`
    /// suffix. An empty range addresses the values collection itself, as
    /// `values:batchUpdate` does.
    fn values_url(&self, range: &str, action: Option<&str>) -> Url {
        let last = match (range.is_empty(), action) {
            (true, Some(action)) => format!("values:{action}"),
            (true, None) => "values".to_string(),
            (false, Some(action)) => format!("{range}:{action}"),
            (false, None) => range.to_string(),
        };
        if range.is_empty() {
            self.url_with_segments(&["v4", "spreadsheets", &self.spreadsheet_id, &last])
        } else {
            self.url_with_segments(&["v4", "spreadsheets", &self.spreadsheet_id, "values", &last])
        }
    }

    fn url_with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }

    /// Sends an authorised request with retry and decodes the JSON response.
    async fn send<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, SheetsError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let context = format!("{method} {}", url.path());
        let max_retries = self.settings.max_retries;
        let backoff_ms = self.settings.retry_backoff_ms;
        let text = retry_with_backoff(max_retries, backoff_ms, || {
            let url = url.clone();
            let method = method.clone();
            async move {
                let token = self.auth.token(&self.http).await?;
                let mut request = self.http.request(method, url).bearer_auth(token);
                if let Some(body) = body {
                    request = request.json(body);
                }
                let response = request.send().await?;
                let status = response.status();
                let text = response.text().await?;
                if !status.is_success() {
                    let message = serde_json::from_str::<ApiErrorBody>(&text)
                        .map_or_else(|_| text.clone(), |e| e.error.message);
                    return Err(SheetsError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }
                Ok(text)
            }
        })
        .await?;

        tracing::debug!(
            request = %context,
            bytes = text.len(),
            "Sheets API call completed"
        );
        serde_json::from_str(&text).map_err(|e| SheetsError::Deserialize { context, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> SheetsClient {
        SheetsClient::with_base_url(
            "sheet-123",
            TokenSource::Static("token".to_string()),
            HttpSettings::default(),
            base_url,
        )
        .expect("client construction should not fail")
    }

    #[test]
    fn values_url_encodes_sheet_titles() {
        let client = test_client("https://sheets.googleapis.com");
        let url = client.values_url("'庫存狀態'!A1:E", None);
        let prefix = "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/'";
        assert!(url.as_str().starts_with(prefix));
        assert!(
            url.as_str().contains("%E5%BA%AB"),
            "title should be percent-encoded: {url}"
        );
        assert!(url.as_str().ends_with("!A1:E"));
    }

    #[test]
    fn values_url_with_action() {
        let client = test_client("https://sheets.googleapis.com/");
        assert_eq!(
            client.values_url("'S'!A:E", Some("append")).as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/'S'!A:E:append"
        );
        assert_eq!(
            client.values_url("", Some("batchUpdate")).as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values:batchUpdate"
        );
    }

    #[test]
    fn spreadsheet_url_with_action() {
        let client = test_client("http://localhost:9999");
        assert_eq!(
            client.spreadsheet_url(Some("batchUpdate")).as_str(),
            "http://localhost:9999/v4/spreadsheets/sheet-123:batchUpdate"
        );
    }

    #[test]
    fn slash_in_range_is_escaped() {
        let client = test_client("https://sheets.googleapis.com");
        let url = client.values_url("'a/b'!A1", None);
        assert!(url.as_str().contains("a%2Fb"));
    }
}
