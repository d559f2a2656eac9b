use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{InventoryStore, StockDecrement, StoreError};
use crate::models::{NewProduct, NewUser, Product, ProductPatch, Role, User};

const PRODUCT_COLUMNS: &str =
    "id, name, price, stock, image_url, description, created_at, updated_at";

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

#[derive(Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e: crate::models::UnknownRole| StoreError::Internal(e.to_string()))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct DecrementRow {
    name: String,
    stock: i32,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::duplicate_email();
            }
            if db.is_check_violation() {
                return StoreError::Invalid("Price and stock must be non-negative".into());
            }
        }
        match err {
            e @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed) => StoreError::Unavailable(e.to_string()),
            other => StoreError::Internal(other.to_string()),
        }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        new.validate().map_err(StoreError::Invalid)?;

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (id, name, price, stock, image_url, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.price)
        .bind(new.stock)
        .bind(new.image_url)
        .bind(new.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn find_product(&self, id: Uuid) -> Result<Product, StoreError> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(StoreError::product_not_found)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Product, StoreError> {
        patch.validate().map_err(StoreError::Invalid)?;

        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                price = COALESCE($3, price),
                stock = COALESCE($4, stock),
                image_url = CASE WHEN $5 THEN $6 ELSE image_url END,
                description = CASE WHEN $7 THEN $8 ELSE description END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.price)
        .bind(patch.stock)
        .bind(patch.image_url.is_some())
        .bind(patch.image_url.flatten())
        .bind(patch.description.is_some())
        .bind(patch.description.flatten())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(StoreError::product_not_found)
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::product_not_found());
        }
        Ok(())
    }

    async fn decrement_stock(&self, id: Uuid, quantity: i64) -> Result<StockDecrement, StoreError> {
        // The guard and the write are one statement, so concurrent buyers
        // serialize on the row lock and re-check `stock >= $2` after waiting.
        let applied = sqlx::query_as::<_, DecrementRow>(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            RETURNING name, stock
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = applied {
            return Ok(StockDecrement::Applied {
                product_name: row.name,
                new_stock: row.stock,
            });
        }

        // No row matched: either the product is gone or the guard failed.
        let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match available {
            Some(available) => Ok(StockDecrement::Insufficient { available }),
            None => Err(StoreError::product_not_found()),
        }
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(StoreError::user_not_found)?
        .try_into()
    }
}
