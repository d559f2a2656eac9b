// Storage layer
// InventoryStore is the only path to durable product and user records.

mod memory;
mod postgres;

pub use memory::MemoryInventoryStore;
pub use postgres::PgInventoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewProduct, NewUser, Product, ProductPatch, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn product_not_found() -> Self {
        StoreError::NotFound { entity: "Product" }
    }

    pub fn user_not_found() -> Self {
        StoreError::NotFound { entity: "User" }
    }

    pub fn duplicate_email() -> Self {
        StoreError::Conflict("Email already exists".into())
    }
}

/// Outcome of a conditional stock decrement on an existing product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockDecrement {
    Applied { product_name: String, new_stock: i32 },
    /// Nothing was written; `available` is the stock seen when the guard failed.
    Insufficient { available: i32 },
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError>;

    async fn find_product(&self, id: Uuid) -> Result<Product, StoreError>;

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Product, StoreError>;

    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError>;

    /// Subtracts `quantity` from the product's stock only if at least that much
    /// is available, as one atomic step with respect to other decrements.
    ///
    /// Returns `StoreError::NotFound` when the product does not exist.
    async fn decrement_stock(&self, id: Uuid, quantity: i64) -> Result<StockDecrement, StoreError>;

    /// Fails with `StoreError::Conflict` when the email is already registered.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError>;
}
