mod auth;
mod error_handler;
mod rate_limit;

pub use auth::{admin_only, auth_middleware, authorize};
pub use error_handler::log_errors;
pub use rate_limit::{RateLimiter, rate_limit};
