//! Ember DNS application layer: ports and use cases.
pub mod ports;
pub mod use_cases;

pub use ports::{RecordCache, UpstreamClient};
pub use use_cases::{ResolveOutcome, ResolveQueryUseCase};
