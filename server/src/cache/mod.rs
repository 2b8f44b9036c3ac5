//! In-process caches

pub mod ttl;

pub use ttl::TtlCache;
