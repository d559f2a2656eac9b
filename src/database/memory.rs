use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{InventoryStore, StockDecrement, StoreError};
use crate::models::{NewProduct, NewUser, Product, ProductPatch, User};

/// Process-local store for tests and local runs.
///
/// Every mutation holds the write guard for its whole read-modify-write, which
/// gives the same per-product serializability the Postgres conditional update
/// provides. It is not shared between processes.
#[derive(Debug, Default)]
pub struct MemoryInventoryStore {
    products: RwLock<HashMap<Uuid, Product>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        new.validate().map_err(StoreError::Invalid)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: new.name,
            price: new.price,
            stock: new.stock,
            image_url: new.image_url,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_product(&self, id: Uuid) -> Result<Product, StoreError> {
        self.products
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(StoreError::product_not_found)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Product, StoreError> {
        patch.validate().map_err(StoreError::Invalid)?;

        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(StoreError::product_not_found)?;
        patch.apply(product);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(StoreError::product_not_found)
    }

    async fn decrement_stock(&self, id: Uuid, quantity: i64) -> Result<StockDecrement, StoreError> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(StoreError::product_not_found)?;

        let remaining = i64::from(product.stock)
            .checked_sub(quantity)
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| *n >= 0);
        let Some(remaining) = remaining else {
            return Ok(StockDecrement::Insufficient {
                available: product.stock,
            });
        };

        product.stock = remaining;
        product.updated_at = Utc::now();
        Ok(StockDecrement::Applied {
            product_name: product.name.clone(),
            new_stock: product.stock,
        })
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::duplicate_email());
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(StoreError::user_not_found)
    }
}
