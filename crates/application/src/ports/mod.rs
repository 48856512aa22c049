mod record_cache;
mod upstream;

pub use record_cache::RecordCache;
pub use upstream::UpstreamClient;
