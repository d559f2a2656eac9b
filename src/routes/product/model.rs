use serde::{Deserialize, Serialize};

use crate::models::Product;
use crate::services::CheckoutReceipt;

/// Body of `GET /products`; this is what the response cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Product>,
}

impl ProductListResponse {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            success: true,
            count: products.len(),
            data: products,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub message: String,
    pub new_stock: i32,
}

impl From<CheckoutReceipt> for CheckoutResponse {
    fn from(receipt: CheckoutReceipt) -> Self {
        Self {
            success: true,
            message: "Purchase successful".into(),
            new_stock: receipt.new_stock,
        }
    }
}
