pub mod cache;
pub mod server;
pub mod snapshot;
pub mod upstream;

pub use cache::{CacheEntry, CacheKey, CacheMetrics, DnsCache};
pub use upstream::UdpUpstream;
