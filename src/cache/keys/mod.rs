/// Response cache key prefix
const RESPONSE_PREFIX: &str = "response:";

/// Rate limit counter key prefix
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// Cache key for a GET response: the full request path including the query
/// string, so `/api/products?page=2` and `/api/products` never share an entry.
pub fn response_key(path_and_query: &str) -> String {
    format!("{}{}", RESPONSE_PREFIX, path_and_query)
}

/// Fixed-window request counter for one client address
pub fn rate_limit_key(client: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, client)
}
