/// Cache operations built on a `CacheStore`

pub mod response;

pub use response::ResponseCache;
