// Cache layer
// Key derivation, the CacheStore seam and the read-through response cache.

pub mod keys;
mod memory;
pub mod operations;
mod store;

pub use memory::MemoryCacheStore;
pub use operations::ResponseCache;
pub use store::{CacheError, CacheStore, RedisCacheStore};
