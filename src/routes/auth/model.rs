use serde::{Deserialize, Serialize};

use crate::models::{PublicUser, User};

/// Missing fields deserialize as empty and are rejected by validation, so the
/// caller gets a readable message instead of a serde error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub admin_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: PublicUser,
}

impl AuthResponse {
    pub fn new(token: String, user: &User) -> Self {
        Self {
            success: true,
            token,
            user: PublicUser::from(user),
        }
    }
}
