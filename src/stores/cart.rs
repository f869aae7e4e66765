// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;
use crate::stores::persisted::PersistedDocument;
use crate::storage::KeyValueStore;

pub const CART_KEY: &str = "cart-storage";

/// Merchandise line in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    pub price: f64,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub quantity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Product fields the cart does not interpret (sizes, stock, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub item_count: u32,
    pub subtotal: f64,
    pub platform_fee: f64,
    pub total: f64,
}

pub struct CartStore {
    doc: PersistedDocument<Vec<CartItem>>,
}

impl CartStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            doc: PersistedDocument::new(store, CART_KEY),
        }
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.doc.read().await
    }

    /// Add one unit of `item`; an item already in the cart gains one in quantity
    pub async fn add(&self, item: CartItem) -> anyhow::Result<Vec<CartItem>> {
        info!(item_id = %item.id, "Adding item to cart");
        self.doc
            .update(|cart| {
                match cart.iter_mut().find(|line| line.id == item.id) {
                    Some(line) => line.quantity += 1,
                    None => cart.push(CartItem { quantity: 1, ..item }),
                }
                cart.clone()
            })
            .await
    }

    pub async fn remove(&self, id: &str) -> anyhow::Result<Vec<CartItem>> {
        self.doc
            .update(|cart| {
                cart.retain(|line| line.id != id);
                cart.clone()
            })
            .await
    }

    /// Set a line's quantity; zero or less drops the line
    pub async fn update_quantity(&self, id: &str, quantity: i64) -> anyhow::Result<Vec<CartItem>> {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        self.doc
            .update(|cart| {
                for line in cart.iter_mut().filter(|line| line.id == id) {
                    line.quantity = quantity;
                }
                cart.retain(|line| line.quantity > 0);
                cart.clone()
            })
            .await
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        info!("Clearing cart");
        self.doc.update(|cart| cart.clear()).await
    }

    /// Totals shown on the cart and checkout screens. The platform fee only
    /// applies to a non-empty cart.
    pub async fn summary(&self, platform_fee: u32) -> CartSummary {
        summarize(&self.items().await, platform_fee)
    }
}

pub(crate) fn summarize(cart: &[CartItem], platform_fee: u32) -> CartSummary {
    let subtotal: f64 = cart
        .iter()
        .map(|line| line.price * f64::from(line.quantity))
        .sum();
    let platform_fee = if cart.is_empty() { 0.0 } else { f64::from(platform_fee) };

    CartSummary {
        item_count: cart.iter().map(|line| line.quantity).sum(),
        subtotal,
        platform_fee,
        total: subtotal + platform_fee,
    }
}
