pub mod auth;

pub use auth::{AuthError, Claims, Identity, TokenService};
