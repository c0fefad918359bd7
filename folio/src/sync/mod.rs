//! Keeping portfolio content in step with the database and the local cache.
//!
//! - [`store`]: the shared [`ContentStore`](store::ContentStore) with its debouncer and poller
//! - [`remote`]: database access that reports availability instead of failing
//! - [`cache`]: the local JSON snapshot used when the database is unreachable

pub mod cache;
pub mod remote;
pub mod store;
