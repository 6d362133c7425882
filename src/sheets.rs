use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::JobLogError;
use crate::models::SheetRow;

pub const DEFAULT_TAB: &str = "Jobs Applied For";

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

// --- Appender trait ---

pub trait SheetAppender {
    /// Insert a blank row under the header of `tab_name` (or the first tab)
    /// and append `row` anchored at A2.
    fn append_row(
        &self,
        sheet_name: &str,
        row: &SheetRow,
        tab_name: Option<&str>,
    ) -> Result<(), JobLogError>;
}

/// Append `row` and describe the outcome for the user.
pub fn log_google_sheet_data(
    appender: &dyn SheetAppender,
    sheet_name: &str,
    row: &SheetRow,
    tab_name: Option<&str>,
) -> String {
    let msg = match appender.append_row(sheet_name, row, tab_name) {
        Ok(()) => format!("Google sheet '{}' updated successfully.", sheet_name),
        Err(e) => format!("An error occurred while updating the google sheet: {}", e),
    };
    info!("{}", msg);
    msg
}

/// `M/D/YYYY` without leading zeros, the format used in the Date column.
pub fn sheet_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

// --- Google Sheets client ---

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetProperties {
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: i64,
}

#[derive(Debug, Deserialize)]
struct Worksheet {
    properties: WorksheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<Worksheet>,
}

/// Talks to the Google Drive and Sheets REST APIs with a service account.
///
/// Authentication happens on each append, so a bad credentials file shows up
/// as an append error rather than at construction.
#[derive(Debug)]
pub struct GoogleSheetsClient {
    creds_path: PathBuf,
    scopes: Vec<String>,
    client: Client,
}

impl GoogleSheetsClient {
    pub fn new(creds_path: impl Into<PathBuf>, scopes: &[&str]) -> Self {
        Self {
            creds_path: creds_path.into(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            client: Client::new(),
        }
    }

    fn authenticate(&self) -> Result<String, JobLogError> {
        let raw = fs::read_to_string(&self.creds_path).map_err(|e| {
            JobLogError::Auth(format!(
                "Failed to read credentials file {}: {}",
                self.creds_path.display(),
                e
            ))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
            JobLogError::Auth(format!(
                "Invalid service account file {}: {}",
                self.creds_path.display(),
                e
            ))
        })?;

        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &key.client_email,
            scope: self.scopes.join(" "),
            aud: &key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .map_err(|e| JobLogError::Auth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(JobLogError::Auth(format!(
                "Token request failed with status {}: {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| JobLogError::Auth(format!("Failed to parse token response: {}", e)))?;
        debug!(account = %key.client_email, "Authenticated with Google");
        Ok(token.access_token)
    }

    fn find_spreadsheet(&self, token: &str, sheet_name: &str) -> Result<String, JobLogError> {
        let query = drive_query(sheet_name);
        let response = self
            .client
            .get(DRIVE_FILES_URL)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()?;
        let list: DriveFileList = check_status(response, "Spreadsheet lookup")?.json()?;

        list.files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| JobLogError::NotFound(format!("Spreadsheet '{}'", sheet_name)))
    }

    fn worksheets(&self, token: &str, spreadsheet_id: &str) -> Result<Vec<WorksheetProperties>, JobLogError> {
        let url = api_url(&[spreadsheet_id])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties(sheetId,title,index)")])
            .send()?;
        let meta: SpreadsheetMeta = check_status(response, "Spreadsheet metadata request")?.json()?;
        Ok(meta.sheets.into_iter().map(|s| s.properties).collect())
    }

    fn insert_blank_row(&self, token: &str, spreadsheet_id: &str, sheet_id: i64) -> Result<(), JobLogError> {
        let segment = format!("{}:batchUpdate", spreadsheet_id);
        let url = api_url(&[segment.as_str()])?;
        let body = json!({
            "requests": [{
                "insertDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": 1,
                        "endIndex": 2
                    },
                    "inheritFromBefore": false
                }
            }]
        });
        let response = self.client.post(url).bearer_auth(token).json(&body).send()?;
        check_status(response, "Row insert")?;
        Ok(())
    }

    fn append_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        title: &str,
        values: Vec<String>,
    ) -> Result<(), JobLogError> {
        let range = format!("{}:append", a1_range(title, "A2"));
        let url = api_url(&[spreadsheet_id, "values", range.as_str()])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": [values] }))
            .send()?;
        check_status(response, "Row append")?;
        Ok(())
    }
}

impl SheetAppender for GoogleSheetsClient {
    fn append_row(
        &self,
        sheet_name: &str,
        row: &SheetRow,
        tab_name: Option<&str>,
    ) -> Result<(), JobLogError> {
        let token = self.authenticate()?;
        let spreadsheet_id = self.find_spreadsheet(&token, sheet_name)?;
        let worksheets = self.worksheets(&token, &spreadsheet_id)?;
        let worksheet = select_worksheet(&worksheets, tab_name)?;
        debug!(
            spreadsheet = %spreadsheet_id,
            tab = %worksheet.title,
            "Appending row"
        );

        self.insert_blank_row(&token, &spreadsheet_id, worksheet.sheet_id)?;
        self.append_values(&token, &spreadsheet_id, &worksheet.title, row.values())
    }
}

fn check_status(response: Response, what: &str) -> Result<Response, JobLogError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().unwrap_or_default();
    Err(JobLogError::Sheets(format!(
        "{} failed with status {}: {}",
        what, status, error_text
    )))
}

fn api_url(segments: &[&str]) -> Result<Url, JobLogError> {
    let mut url = Url::parse(SHEETS_API_URL).map_err(|e| JobLogError::Sheets(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| JobLogError::Sheets("Sheets API URL cannot take path segments".to_string()))?
        .extend(segments);
    Ok(url)
}

/// Drive search expression matching a spreadsheet by exact name.
fn drive_query(sheet_name: &str) -> String {
    let escaped = sheet_name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME
    )
}

/// `'Tab Title'!A2`, with quotes in the title doubled.
fn a1_range(title: &str, cell: &str) -> String {
    format!("'{}'!{}", title.replace('\'', "''"), cell)
}

/// The tab called `tab_name`, or the first tab when no name is given.
pub fn select_worksheet<'a>(
    worksheets: &'a [WorksheetProperties],
    tab_name: Option<&str>,
) -> Result<&'a WorksheetProperties, JobLogError> {
    match tab_name {
        Some(name) => worksheets
            .iter()
            .find(|w| w.title == name)
            .ok_or_else(|| JobLogError::NotFound(format!("Worksheet '{}'", name))),
        None => worksheets
            .iter()
            .min_by_key(|w| w.index)
            .ok_or_else(|| JobLogError::NotFound("Spreadsheet has no worksheets".to_string())),
    }
}
