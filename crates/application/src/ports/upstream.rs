use async_trait::async_trait;
use ember_dns_domain::DomainError;

/// Port for the single-shot upstream round trip.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Sends the raw query once and returns the raw reply datagram.
    /// No reply within the deadline yields `DomainError::UpstreamTimeout`.
    async fn query(&self, raw_query: &[u8]) -> Result<Vec<u8>, DomainError>;
}
