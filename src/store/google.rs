use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::json;

use super::sheet::{SheetClient, SheetError};
use crate::config::SheetConfig;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Google Sheets client bound to the first worksheet of one spreadsheet
pub struct GoogleSheetsClient {
    token: String,
    spreadsheet_id: String,
    sheet_id: i64,
    sheet_title: String,
}

impl GoogleSheetsClient {
    /// Locate the spreadsheet (by id, or by name through Drive) and its first worksheet
    pub fn connect(config: &SheetConfig, token: String) -> Result<Self, SheetError> {
        let spreadsheet_id = if config.spreadsheet_id.trim().is_empty() {
            find_spreadsheet_by_name(&config.spreadsheet_name, &token)?
        } else {
            config.spreadsheet_id.trim().to_string()
        };

        let url = format!("{}/{}", SHEETS_API, spreadsheet_id);
        let response = attohttpc::get(&url)
            .bearer_auth(&token)
            .param("fields", "sheets.properties")
            .send()?;
        let meta: SpreadsheetMeta = check(response)?.json()?;
        let first = meta
            .sheets
            .into_iter()
            .next()
            .ok_or_else(|| SheetError::NotFound(format!("{} (no worksheets)", config.spreadsheet_name)))?;

        tracing::info!(
            spreadsheet = %spreadsheet_id,
            sheet = %first.properties.title,
            "connected to remote sheet"
        );

        Ok(Self {
            token,
            spreadsheet_id,
            sheet_id: first.properties.sheet_id,
            sheet_title: first.properties.title,
        })
    }

    /// A1 range on the bound worksheet, e.g. `'Sheet 1'!A2:I2`
    fn range(&self, cells: &str) -> String {
        let quoted = format!("'{}'", self.sheet_title.replace('\'', "''"));
        if cells.is_empty() {
            encode_path_segment(&quoted)
        } else {
            encode_path_segment(&format!("{}!{}", quoted, cells))
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/{}/values/{}", SHEETS_API, self.spreadsheet_id, range)
    }
}

impl SheetClient for GoogleSheetsClient {
    fn fetch_rows(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let response = attohttpc::get(self.values_url(&self.range("")))
            .bearer_auth(&self.token)
            .send()?;
        let values: ValueRange = check(response)?.json()?;
        Ok(values.values)
    }

    fn append_row(&mut self, cells: &[String]) -> Result<(), SheetError> {
        let url = format!("{}:append", self.values_url(&self.range("A1")));
        let response = attohttpc::post(url)
            .bearer_auth(&self.token)
            .param("valueInputOption", "RAW")
            .param("insertDataOption", "INSERT_ROWS")
            .json(&json!({ "values": [cells] }))?
            .send()?;
        check(response)?;
        Ok(())
    }

    fn update_row(&mut self, row_number: usize, cells: &[String]) -> Result<(), SheetError> {
        let range = self.range(&format!("A{row_number}:I{row_number}"));
        let response = attohttpc::put(self.values_url(&range))
            .bearer_auth(&self.token)
            .param("valueInputOption", "RAW")
            .json(&json!({ "values": [cells] }))?
            .send()?;
        check(response)?;
        Ok(())
    }

    fn delete_row(&mut self, row_number: usize) -> Result<(), SheetError> {
        let url = format!("{}/{}:batchUpdate", SHEETS_API, self.spreadsheet_id);
        // deleteDimension takes 0-based, end-exclusive indexes
        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": self.sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row_number - 1,
                        "endIndex": row_number,
                    }
                }
            }]
        });
        let response = attohttpc::post(url)
            .bearer_auth(&self.token)
            .json(&body)?
            .send()?;
        check(response)?;
        Ok(())
    }
}

fn find_spreadsheet_by_name(name: &str, token: &str) -> Result<String, SheetError> {
    let query = format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        name.replace('\'', "\\'"),
        SPREADSHEET_MIME
    );
    let response = attohttpc::get(DRIVE_FILES_API)
        .bearer_auth(token)
        .param("q", query)
        .param("fields", "files(id,name)")
        .send()?;
    let list: DriveFileList = check(response)?.json()?;
    list.files
        .into_iter()
        .next()
        .map(|f| f.id)
        .ok_or_else(|| SheetError::NotFound(name.to_string()))
}

/// Turn a non-2xx response into a `SheetError::Status` carrying the body
fn check(response: attohttpc::Response) -> Result<attohttpc::Response, SheetError> {
    if response.is_success() {
        return Ok(response);
    }
    let code = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    tracing::warn!(code, "sheet API request failed");
    Err(SheetError::Status { code, body })
}

/// Bytes escaped in a URL path segment. A1 ranges keep `!` and `:` literal;
/// quotes and spaces in worksheet titles are escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b':');

fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_quoted_and_encoded() {
        assert_eq!(encode_path_segment("'Sheet 1'!A2:I2"), "%27Sheet%201%27!A2:I2");
        assert_eq!(encode_path_segment("Blad1"), "Blad1");
        assert_eq!(encode_path_segment("'Planning é'!A1"), "%27Planning%20%C3%A9%27!A1");
    }
}
