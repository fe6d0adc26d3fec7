//! Google Sheets API connector implementation
//!
//! Every remote call goes through the same path: wait for the quota pacer,
//! attach a bearer token through the [`AuthorizedCaller`] (which recovers
//! once from a rejected token) and hand the request to the host HTTP client
//! with the configured retry policy.

use std::sync::Arc;

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use chrono::{DateTime, Utc};
use core_auth::{AuthorizedCaller, CredentialId, TokenCache};
use core_runtime::config::{ConnectorConfig, Dimension, WorksheetRef};
use core_runtime::context::CallContext;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SheetsError};
use crate::pacer::QuotaPacer;
use crate::types::{
    AppendValuesResponse, BatchGetValuesResponse, DriveFile, ErrorEnvelope, FilesListResponse,
    SheetProperties, Spreadsheet, UpdateValuesResponse, ValueRange,
};

/// Google Sheets API base URL
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// How written values are interpreted: as if typed into the UI
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

/// Google Sheets API connector
///
/// # Example
///
/// ```ignore
/// use provider_google_sheets::GoogleSheetsConnector;
///
/// let connector = GoogleSheetsConnector::from_config(http_client, token_cache, &config)?;
/// let modified = connector.get_modified_time("1BxiMVs0XRA5nFMd").await?;
/// ```
#[derive(Clone)]
pub struct GoogleSheetsConnector {
    http_client: Arc<dyn HttpClient>,
    caller: AuthorizedCaller,
    pacer: QuotaPacer,
    retry_policy: RetryPolicy,
}

impl GoogleSheetsConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, caller: AuthorizedCaller, pacer: QuotaPacer) -> Self {
        Self {
            http_client,
            caller,
            pacer,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Build a connector for the credential, quota and retry count in
    /// `config`.
    pub fn from_config(
        http_client: Arc<dyn HttpClient>,
        token_cache: Arc<TokenCache>,
        config: &ConnectorConfig,
    ) -> Result<Self> {
        let pacer = QuotaPacer::new(config.quota)?;
        let caller = AuthorizedCaller::new(token_cache, CredentialId::new(config.secret_id.clone()));
        Ok(Self::new(http_client, caller, pacer)
            .with_retry_policy(RetryPolicy::default().with_max_attempts(config.retry_count)))
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn pacer(&self) -> &QuotaPacer {
        &self.pacer
    }

    pub fn credential_id(&self) -> &CredentialId {
        self.caller.credential_id()
    }

    /// Reject an invocation context issued for another credential than the
    /// one this connector authorizes with.
    pub fn ensure_context(&self, ctx: &CallContext) -> Result<()> {
        if ctx.credential_id != self.credential_id().as_str() {
            return Err(SheetsError::Configuration(format!(
                "invocation is for credential '{}' but the connector uses '{}'",
                ctx.credential_id,
                self.credential_id()
            )));
        }
        Ok(())
    }

    /// Last modification time of the spreadsheet file
    #[instrument(skip(self))]
    pub async fn get_modified_time(&self, spreadsheet_id: &str) -> Result<DateTime<Utc>> {
        let url = format!(
            "{}/files/{}?fields=modifiedTime&supportsAllDrives=true",
            DRIVE_API_BASE,
            urlencoding::encode(spreadsheet_id)
        );

        let response = self.send(HttpRequest::new(HttpMethod::Get, url)).await?;
        let file: DriveFile = parse_body(&response, "file metadata")?;

        file.modified_time.ok_or_else(|| {
            SheetsError::ParseError("file metadata has no modifiedTime".to_string())
        })
    }

    /// Read several ranges in one request. The result has one entry per
    /// requested range, in order.
    #[instrument(skip(self), fields(range_count = ranges.len()))]
    pub async fn batch_get(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        dimension: Dimension,
    ) -> Result<Vec<ValueRange>> {
        let mut url = format!(
            "{}/spreadsheets/{}/values:batchGet?majorDimension={}",
            SHEETS_API_BASE,
            urlencoding::encode(spreadsheet_id),
            dimension.as_str()
        );
        for range in ranges {
            url.push_str(&format!("&ranges={}", urlencoding::encode(range)));
        }

        let response = self.send(HttpRequest::new(HttpMethod::Get, url)).await?;
        let batch: BatchGetValuesResponse = parse_body(&response, "batchGet response")?;

        if batch.value_ranges.len() != ranges.len() {
            return Err(SheetsError::DataShape(format!(
                "requested {} ranges but received {}",
                ranges.len(),
                batch.value_ranges.len()
            )));
        }

        debug!("Read {} value ranges", batch.value_ranges.len());
        Ok(batch.value_ranges)
    }

    #[instrument(skip(self))]
    pub async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        dimension: Dimension,
    ) -> Result<ValueRange> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}?majorDimension={}",
            SHEETS_API_BASE,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range),
            dimension.as_str()
        );

        let response = self.send(HttpRequest::new(HttpMethod::Get, url)).await?;
        parse_body(&response, "value range")
    }

    /// Overwrite `range` with `values`
    #[instrument(skip(self, values), fields(slices = values.len()))]
    pub async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        dimension: Dimension,
        values: Vec<Vec<Value>>,
    ) -> Result<UpdateValuesResponse> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}?valueInputOption={}",
            SHEETS_API_BASE,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range),
            VALUE_INPUT_OPTION
        );
        let body = ValueRange {
            range: Some(range.to_string()),
            major_dimension: Some(dimension.as_str().to_string()),
            values,
        };

        let response = self
            .send(HttpRequest::new(HttpMethod::Put, url).json(&body)?)
            .await?;
        let updated: UpdateValuesResponse = parse_body(&response, "update response")?;

        info!(
            updated_range = updated.updated_range.as_deref().unwrap_or(""),
            "Updated values"
        );
        Ok(updated)
    }

    /// Append `values` after the last slice of the table found in `range`
    #[instrument(skip(self, values), fields(slices = values.len()))]
    pub async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        dimension: Dimension,
        values: Vec<Vec<Value>>,
    ) -> Result<AppendValuesResponse> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}:append?valueInputOption={}&insertDataOption=INSERT_ROWS",
            SHEETS_API_BASE,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range),
            VALUE_INPUT_OPTION
        );
        let body = ValueRange {
            range: Some(range.to_string()),
            major_dimension: Some(dimension.as_str().to_string()),
            values,
        };

        let response = self
            .send(HttpRequest::new(HttpMethod::Post, url).json(&body)?)
            .await?;
        let appended: AppendValuesResponse = parse_body(&response, "append response")?;

        info!(
            table_range = appended.table_range.as_deref().unwrap_or(""),
            "Appended values"
        );
        Ok(appended)
    }

    /// Every spreadsheet visible to the credential, following pagination
    #[instrument(skip(self))]
    pub async fn list_spreadsheets(&self) -> Result<Vec<DriveFile>> {
        let query = format!("mimeType='{}' and trashed=false", SPREADSHEET_MIME_TYPE);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/files?q={}&pageSize={}&fields=nextPageToken,files(id,name,modifiedTime)",
                DRIVE_API_BASE,
                urlencoding::encode(&query),
                MAX_PAGE_SIZE
            );
            if let Some(token) = &page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
            }

            let response = self.send(HttpRequest::new(HttpMethod::Get, url)).await?;
            let page: FilesListResponse = parse_body(&response, "files list response")?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!("Listed {} spreadsheets", files.len());
        Ok(files)
    }

    /// Worksheets (tabs) of a spreadsheet in display order
    #[instrument(skip(self))]
    pub async fn list_worksheets(&self, spreadsheet_id: &str) -> Result<Vec<SheetProperties>> {
        let url = format!(
            "{}/spreadsheets/{}?fields=sheets.properties",
            SHEETS_API_BASE,
            urlencoding::encode(spreadsheet_id)
        );

        let response = self.send(HttpRequest::new(HttpMethod::Get, url)).await?;
        let spreadsheet: Spreadsheet = parse_body(&response, "spreadsheet")?;

        let mut sheets: Vec<SheetProperties> =
            spreadsheet.sheets.into_iter().map(|s| s.properties).collect();
        sheets.sort_by_key(|s| s.index);
        Ok(sheets)
    }

    /// Title to use in A1 ranges. A numeric id is looked up among the
    /// spreadsheet's worksheets.
    pub async fn resolve_worksheet_title(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetRef,
    ) -> Result<String> {
        match worksheet {
            WorksheetRef::Name(name) => Ok(name.clone()),
            WorksheetRef::Id(id) => self
                .list_worksheets(spreadsheet_id)
                .await?
                .into_iter()
                .find(|sheet| sheet.sheet_id == *id)
                .map(|sheet| sheet.title)
                .ok_or_else(|| {
                    SheetsError::Configuration(format!(
                        "worksheet with id {} not found in spreadsheet {}",
                        id, spreadsheet_id
                    ))
                }),
        }
    }

    /// Pace, authorize and execute one request. Non-success statuses other
    /// than an unrecovered 401/403 become [`SheetsError::ApiError`].
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.pacer.pace().await;

        let response = self
            .caller
            .call(|token| {
                let request = request.clone().bearer_token(token);
                let http_client = Arc::clone(&self.http_client);
                let policy = self.retry_policy.clone();
                async move { http_client.execute_with_retry(request, policy).await }
            })
            .await?;

        if !response.is_success() {
            let message = api_error_message(&response);
            warn!(status = response.status, error = %message, "Google API request failed");
            return Err(SheetsError::ApiError {
                status_code: response.status,
                message,
            });
        }

        debug!(status = response.status, "Google API request succeeded");
        Ok(response)
    }
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
    serde_json::from_slice(&response.body)
        .map_err(|e| SheetsError::ParseError(format!("Failed to parse {}: {}", what, e)))
}

fn api_error_message(response: &HttpResponse) -> String {
    match serde_json::from_slice::<ErrorEnvelope>(&response.body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => String::from_utf8_lossy(&response.body).into_owned(),
    }
}
