pub mod client;

pub use client::AirbnbClient;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    Deserialize(String),
}

/// Session state needed by the platform's private API.
///
/// An empty bundle is a valid degraded state: acquisition failure is
/// tolerated and some endpoints still answer without a key.
#[derive(Debug, Clone, Default)]
pub struct CredentialBundle {
    pub api_key: String,
    pub cookies: Vec<(String, String)>,
}

impl CredentialBundle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_empty() && self.cookies.is_empty()
    }
}

/// The marketplace backend as the pipeline consumes it.
///
/// Payloads are raw `Value`s on purpose: the upstream response shape is not
/// part of this crate's contract and every consumer navigates defensively.
pub trait MarketplaceApi {
    fn acquire_credentials(&self) -> impl Future<Output = Result<CredentialBundle, ApiError>>;

    /// Detail payload for one listing, `Ok(None)` when the upstream answers
    /// without listing data.
    fn fetch_listing_detail(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<Option<Value>, ApiError>>;

    /// Raw host-profile payload. May be error-shaped (an `errors` key)
    /// instead of failing; callers treat both as no data.
    fn fetch_host_detail(
        &self,
        credentials: &CredentialBundle,
        host_id: &str,
    ) -> impl Future<Output = Result<Value, ApiError>>;

    /// Every listing-like item published by the host, empty when absent.
    fn fetch_user_listings(
        &self,
        host_id: &str,
        credentials: &CredentialBundle,
    ) -> impl Future<Output = Result<Vec<Value>, ApiError>>;
}
