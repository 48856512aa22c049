//! Ember DNS infrastructure layer: cache, persistence, and transport adapters.
pub mod dns;
