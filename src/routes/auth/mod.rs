mod handler;
mod model;

pub use handler::{login, register};
pub use model::{AuthResponse, LoginRequest, RegisterRequest};
