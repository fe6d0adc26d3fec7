#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::secrets::SecretStore;
use core_auth::{AuthorizedCaller, CredentialId, TokenCache};
use core_runtime::config::{ConnectorConfig, QuotaConfig};
use provider_google_sheets::a1::column_letters_to_index;
use provider_google_sheets::{GoogleSheetsConnector, QuotaPacer};
use serde_json::{json, Value};

/// Vault handing out `token-<refresh count>`
#[derive(Default)]
pub struct CountingVault {
    pub fetches: AtomicUsize,
    pub refreshes: AtomicUsize,
}

#[async_trait]
impl SecretStore for CountingVault {
    async fn fetch_secret(&self, _secret_id: &str) -> BridgeResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let token = format!("token-{}", self.refreshes.load(Ordering::SeqCst));
        Ok(json!({ "access_token": token }).to_string().into_bytes())
    }

    async fn refresh_secret(&self, _secret_id: &str) -> BridgeResult<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory Sheets and Drive APIs over a single row-major grid named
/// `Sheet1` (sheet id 0).
pub struct FakeSheetsApi {
    pub modified_time: Mutex<String>,
    pub grid: Mutex<Vec<Vec<Value>>>,
    pub rejected_tokens: Mutex<HashSet<String>>,
    pub fail_reads_with: Mutex<Option<u16>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeSheetsApi {
    pub fn new(modified_time: &str, grid: Vec<Vec<Value>>) -> Arc<Self> {
        Arc::new(Self {
            modified_time: Mutex::new(modified_time.to_string()),
            grid: Mutex::new(grid),
            rejected_tokens: Mutex::new(HashSet::new()),
            fail_reads_with: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn reject_token(&self, token: &str) {
        self.rejected_tokens.lock().unwrap().insert(token.to_string());
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    /// Decoded `ranges` parameters of every batchGet request
    pub fn batch_get_ranges(&self) -> Vec<Vec<String>> {
        self.urls()
            .iter()
            .filter(|url| url.contains("values:batchGet"))
            .map(|url| query_values(url, "ranges"))
            .collect()
    }

    /// Method, decoded range and JSON body of every write
    pub fn writes(&self) -> Vec<(HttpMethod, String, Value)> {
        self.requests()
            .into_iter()
            .filter(|r| matches!(r.method, HttpMethod::Put | HttpMethod::Post))
            .map(|r| {
                let body = r
                    .body
                    .as_ref()
                    .and_then(|b| serde_json::from_slice(b).ok())
                    .unwrap_or(Value::Null);
                let range = path_range(&r.url);
                (r.method, range, body)
            })
            .collect()
    }

    fn respond(&self, request: &HttpRequest) -> HttpResponse {
        let url = request.url.as_str();

        if url.contains("/drive/v3/files/") {
            let modified = self.modified_time.lock().unwrap().clone();
            return ok(json!({ "modifiedTime": modified }));
        }

        if url.contains("fields=sheets.properties") {
            return ok(json!({ "sheets": [
                { "properties": { "sheetId": 0, "title": "Sheet1", "index": 0 } }
            ] }));
        }

        if request.method == HttpMethod::Get {
            if let Some(status) = *self.fail_reads_with.lock().unwrap() {
                return HttpResponse::new(
                    status,
                    json!({ "error": { "message": "backend unavailable" } }).to_string(),
                );
            }
        }

        let dimension = query_values(url, "majorDimension")
            .into_iter()
            .next()
            .unwrap_or_else(|| "ROWS".to_string());
        let grid = self.grid.lock().unwrap().clone();

        if url.contains("values:batchGet") {
            let value_ranges: Vec<Value> = query_values(url, "ranges")
                .iter()
                .map(|range| json!({ "range": range, "values": read_range(&grid, range, &dimension) }))
                .collect();
            return ok(json!({ "spreadsheetId": "sheet-1", "valueRanges": value_ranges }));
        }

        match request.method {
            HttpMethod::Get => {
                let range = path_range(url);
                ok(json!({ "range": range, "values": read_range(&grid, &range, &dimension) }))
            }
            HttpMethod::Put => ok(json!({
                "spreadsheetId": "sheet-1",
                "updatedRange": path_range(url),
                "updatedRows": 1
            })),
            HttpMethod::Post => ok(json!({
                "spreadsheetId": "sheet-1",
                "tableRange": "Sheet1!A1:C4",
                "updates": { "spreadsheetId": "sheet-1", "updatedRange": "Sheet1!A5:C5", "updatedRows": 1 }
            })),
            _ => HttpResponse::new(405, "unsupported"),
        }
    }
}

#[async_trait]
impl HttpClient for FakeSheetsApi {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let token = request
            .headers
            .get("Authorization")
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| BridgeError::OperationFailed("missing bearer token".to_string()))?;
        if self.rejected_tokens.lock().unwrap().contains(token) {
            return Ok(HttpResponse::new(
                401,
                json!({ "error": { "message": "Invalid Credentials" } }).to_string(),
            ));
        }

        Ok(self.respond(&request))
    }
}

fn ok(body: Value) -> HttpResponse {
    HttpResponse::new(200, body.to_string())
}

fn query_values(url: &str, name: &str) -> Vec<String> {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| *key == name)
        .map(|(_, value)| urlencoding::decode(value).map(|v| v.into_owned()).unwrap_or_default())
        .collect()
}

/// Range embedded in a `/values/{range}` path
fn path_range(url: &str) -> String {
    let path = url.split_once('?').map(|(p, _)| p).unwrap_or(url);
    let encoded = path.rsplit("/values/").next().unwrap_or("");
    let encoded = encoded.strip_suffix(":append").unwrap_or(encoded);
    urlencoding::decode(encoded).map(|v| v.into_owned()).unwrap_or_default()
}

fn is_empty(cell: &Value) -> bool {
    cell.is_null() || cell.as_str() == Some("")
}

fn trim(mut slices: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
    for slice in &mut slices {
        while slice.last().is_some_and(is_empty) {
            slice.pop();
        }
    }
    while slices.last().is_some_and(|s| s.is_empty()) {
        slices.pop();
    }
    slices
}

/// (column index, row index), either open when the part is absent
fn parse_cell(cell: &str) -> (Option<usize>, Option<usize>) {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];
    (
        column_letters_to_index(&letters),
        digits.parse::<usize>().ok().map(|n| n - 1),
    )
}

/// Evaluate an A1 range the way the values API does, trimming trailing
/// empty cells and slices.
fn read_range(grid: &[Vec<Value>], range: &str, dimension: &str) -> Vec<Vec<Value>> {
    let cells = range.split_once('!').map(|(_, c)| c);
    let (row_lo, row_hi, col_lo, col_hi) = match cells {
        None => (0, usize::MAX, 0, usize::MAX),
        Some(cells) => {
            let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
            let (start_col, start_row) = parse_cell(start);
            let (end_col, end_row) = parse_cell(end);
            (
                start_row.unwrap_or(0),
                end_row.unwrap_or(usize::MAX),
                start_col.unwrap_or(0),
                end_col.unwrap_or(usize::MAX),
            )
        }
    };

    let rows: Vec<Vec<Value>> = grid
        .iter()
        .enumerate()
        .filter(|(index, _)| *index >= row_lo && *index <= row_hi)
        .map(|(_, row)| {
            row.iter()
                .enumerate()
                .filter(|(index, _)| *index >= col_lo && *index <= col_hi)
                .map(|(_, cell)| cell.clone())
                .collect()
        })
        .collect();
    let rows = trim(rows);

    if dimension != "COLUMNS" {
        return rows;
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let columns = (0..width)
        .map(|c| {
            rows.iter()
                .map(|row| row.get(c).cloned().unwrap_or_else(|| json!("")))
                .collect()
        })
        .collect();
    trim(columns)
}

pub fn row(cells: &[&str]) -> Vec<Value> {
    cells.iter().map(|c| json!(c)).collect()
}

pub fn config(mode: &str, dimension: &str) -> ConnectorConfig {
    ConnectorConfig::from_value(&json!({
        "secretId": "secret-1",
        "spreadsheetId": "sheet-1",
        "worksheetName": "Sheet1",
        "mode": mode,
        "dimension": dimension,
        "upsertCriteria": "Email"
    }))
    .unwrap()
}

pub fn connector(api: Arc<FakeSheetsApi>, vault: Arc<CountingVault>) -> GoogleSheetsConnector {
    let cache = Arc::new(TokenCache::new(vault));
    let caller = AuthorizedCaller::new(cache, CredentialId::new("secret-1"));
    let pacer = QuotaPacer::new(QuotaConfig::new(0, 500)).unwrap();
    GoogleSheetsConnector::new(api, caller, pacer)
}
