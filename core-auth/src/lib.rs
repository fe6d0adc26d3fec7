//! # Authentication Module
//!
//! Bearer-token lifecycle for calls to the spreadsheet and drive APIs.
//!
//! ## Overview
//!
//! The host vault ([`SecretStore`](bridge_traits::SecretStore)) owns the
//! OAuth credential. This crate keeps the currently believed-valid copy in a
//! [`TokenCache`] and wraps every remote operation in an
//! [`AuthorizedCaller`] that attaches the token and recovers once from a
//! rejected token.
//!
//! ## Features
//!
//! - Lazy, per-credential cache with single-flight population
//! - Invalidation and vault-side refresh after a 401/403
//! - Exactly one retry after refresh; a second rejection is surfaced
//! - Optional [`TokenObserver`] hook for hosts that persist tokens themselves

pub mod caller;
pub mod error;
pub mod token_cache;
pub mod types;

pub use caller::{AuthStatus, AuthorizedCaller};
pub use error::{AuthError, Result};
pub use token_cache::{TokenCache, TokenObserver};
pub use types::{Credential, CredentialId};
