use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    database::{InventoryStore, StockDecrement},
    error::AppError,
    infrastructure::Identity,
};

pub const DEFAULT_QUANTITY: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub product_id: Uuid,
    pub quantity: i64,
    pub new_stock: i32,
}

/// Stock decrement for purchases. Bypasses the response cache.
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn InventoryStore>,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Availability check and decrement happen in a single conditional store
    /// update, so concurrent checkouts on one product cannot oversell it.
    pub async fn checkout(
        &self,
        product_id: Uuid,
        quantity: Option<i64>,
        buyer: &Identity,
    ) -> Result<CheckoutReceipt, AppError> {
        let quantity = requested_quantity(quantity)?;

        match self.store.decrement_stock(product_id, quantity).await? {
            StockDecrement::Applied {
                product_name,
                new_stock,
            } => {
                tracing::info!(
                    buyer_id = %buyer.subject_id,
                    %product_id,
                    product = %product_name,
                    quantity,
                    new_stock,
                    "Checkout completed"
                );
                Ok(CheckoutReceipt {
                    product_id,
                    quantity,
                    new_stock,
                })
            }
            StockDecrement::Insufficient { available } => {
                tracing::info!(
                    buyer_id = %buyer.subject_id,
                    %product_id,
                    quantity,
                    available,
                    "Checkout rejected, not enough stock"
                );
                Err(AppError::InsufficientStock { available })
            }
        }
    }
}

/// Any positive quantity is accepted here; one larger than the stock column
/// can hold is simply never available.
fn requested_quantity(quantity: Option<i64>) -> Result<i64, AppError> {
    let quantity = quantity.unwrap_or(DEFAULT_QUANTITY);
    if quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".into()));
    }
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryInventoryStore;
    use crate::models::{NewProduct, Role};

    fn buyer() -> Identity {
        Identity {
            subject_id: Uuid::new_v4(),
            role: Role::User,
        }
    }

    async fn setup(stock: i32) -> (Arc<MemoryInventoryStore>, CheckoutService, Uuid) {
        let store = Arc::new(MemoryInventoryStore::new());
        let product = store
            .create_product(NewProduct {
                name: "Mechanical Keyboard".into(),
                price: 89.0,
                stock,
                image_url: None,
                description: None,
            })
            .await
            .unwrap();
        let service = CheckoutService::new(store.clone());
        (store, service, product.id)
    }

    #[tokio::test]
    async fn defaults_to_one_unit() {
        let (_, service, id) = setup(3).await;
        let receipt = service.checkout(id, None, &buyer()).await.unwrap();
        assert_eq!(receipt.quantity, 1);
        assert_eq!(receipt.new_stock, 2);
    }

    #[tokio::test]
    async fn insufficient_stock_leaves_stock_unchanged() {
        let (store, service, id) = setup(2).await;
        let err = service.checkout(id, Some(3), &buyer()).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 2 }));
        assert_eq!(store.find_product(id).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn rejects_non_positive_quantities() {
        let (store, service, id) = setup(2).await;
        for quantity in [0, -4] {
            assert!(matches!(
                service.checkout(id, Some(quantity), &buyer()).await,
                Err(AppError::Validation(_))
            ));
        }
        assert_eq!(store.find_product(id).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn oversized_quantity_is_insufficient_stock() {
        let (store, service, id) = setup(5).await;
        for quantity in [3_000_000_000, i64::MAX] {
            assert!(matches!(
                service.checkout(id, Some(quantity), &buyer()).await,
                Err(AppError::InsufficientStock { available: 5 })
            ));
        }
        assert_eq!(store.find_product(id).await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let (_, service, _) = setup(2).await;
        assert!(matches!(
            service.checkout(Uuid::new_v4(), Some(1), &buyer()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn two_buyers_cannot_both_take_the_last_units() {
        let (store, service, id) = setup(5).await;

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.checkout(id, Some(3), &buyer()).await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.checkout(id, Some(3), &buyer()).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        let successes: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(successes.len(), 1);
        assert_eq!(successes[0].new_stock, 2);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(AppError::InsufficientStock { available }) if *available == 2 || *available == 5
        )));
        assert_eq!(store.find_product(id).await.unwrap().stock, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_checkouts_never_oversell() {
        let initial = 40;
        let (store, service, id) = setup(initial).await;

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let service = service.clone();
                let quantity = i % 3 + 1;
                tokio::spawn(async move {
                    service
                        .checkout(id, Some(quantity), &buyer())
                        .await
                        .map(|r| r.quantity)
                })
            })
            .collect();

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(quantity) => sold += quantity,
                Err(AppError::InsufficientStock { available }) => assert!(available >= 0),
                Err(other) => panic!("unexpected checkout error: {other:?}"),
            }
        }

        let remaining = store.find_product(id).await.unwrap().stock;
        assert!(remaining >= 0);
        assert_eq!(i64::from(remaining), i64::from(initial) - sold);
    }
}
