//! Google Sheets connector facade.
//!
//! Re-exports the workspace crates so a host runtime can depend on a single
//! package. With the default `desktop-shims` feature the reqwest-backed HTTP
//! client and the platform secrets adapter are included as well.

pub use bridge_traits;
pub use core_auth;
pub use core_runtime;
pub use provider_google_sheets;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;

pub use core_auth::{AuthorizedCaller, Credential, CredentialId, TokenCache};
pub use core_runtime::config::ConnectorConfig;
pub use core_runtime::events::{ConnectorEvent, EventSink};
pub use provider_google_sheets::{
    ActionResult, GoogleSheetsConnector, QuotaPacer, RowDiffWatcher, SheetActions, SheetsError,
    WatcherSnapshot,
};
