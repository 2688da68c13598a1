//! Request and response bodies of the Sheets v4 and OAuth token endpoints.

use cookiesync_core::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WriteRange<'a> {
    pub range: &'a str,
    pub major_dimension: &'static str,
    pub values: &'a [Row],
}

impl<'a> WriteRange<'a> {
    pub(crate) fn rows(range: &'a str, values: &'a [Row]) -> Self {
        Self {
            range,
            major_dimension: "ROWS",
            values,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchWrite<'a> {
    pub value_input_option: &'static str,
    pub data: Vec<WriteRange<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateResponse {
    #[serde(default)]
    pub updated_cells: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchUpdateResponse {
    #[serde(default)]
    pub total_updated_cells: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppendResponse {
    #[serde(default)]
    pub updates: Option<UpdateResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpreadsheetMeta {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SheetEntry {
    pub properties: SheetProperties,
}

/// Identity of one worksheet tab.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}

/// Converts one cell of a values response into the text shown in the sheet.
pub(crate) fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookiesync_core::Cell;

    #[test]
    fn cell_text_renders_scalars() {
        assert_eq!(cell_text(&serde_json::json!("SP40")), "SP40");
        assert_eq!(cell_text(&serde_json::json!(12)), "12");
        assert_eq!(cell_text(&serde_json::json!(true)), "TRUE");
        assert_eq!(cell_text(&serde_json::Value::Null), "");
    }

    #[test]
    fn write_range_serializes_rows() {
        let rows = vec![vec![Cell::from("A1"), Cell::from("x")]];
        let body = serde_json::to_value(WriteRange::rows("'S'!A1:B1", &rows)).unwrap();
        assert_eq!(body["majorDimension"], "ROWS");
        assert_eq!(body["values"][0][0], "A1");
    }

    #[test]
    fn value_range_without_values_is_empty() {
        let parsed: ValueRange = serde_json::from_str(r#"{"range":"'S'!A1:Z1000"}"#).unwrap();
        assert!(parsed.values.is_empty());
    }
}
