use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{IpLocation, SearchOutcome, SearchQuery, Venue};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider rejected the request: {0}")]
    Status(String),
    #[error("provider response could not be decoded: {0}")]
    Decode(String),
    #[error("no record found for `{0}`")]
    NotFound(String),
}

/// Capability interface over one POI search backend. The relaxation engine
/// depends only on this contract, never on which provider implements it.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// One remote POI search. Transport and provider failures are folded
    /// into the outcome's `error` marker; the call itself never fails, so
    /// one bad sub-call cannot abort a multi-call search strategy.
    async fn search(&self, query: &SearchQuery) -> SearchOutcome;

    async fn detail(&self, id: &str) -> Result<Venue, ProviderError>;

    /// Resolve a free-text address to a canonical coordinate string.
    /// Returns `None` on any failure; geocoding is always best-effort.
    async fn geocode(&self, address: &str, city: Option<&str>) -> Option<String>;

    async fn ip_locate(&self, ip: Option<&str>) -> Result<IpLocation, ProviderError>;

    /// Provider category code (or tag) for a cuisine keyword, if this
    /// backend has one.
    fn cuisine_category(&self, cuisine: &str) -> Option<String>;
}
