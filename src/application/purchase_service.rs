use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::{ProductRepository, PurchaseRepository};
use crate::domain::purchase::{LineItem, Purchase, PurchaseView};
use crate::domain::validation;

/// Owns the cart → purchase lifecycle for a single owner at a time.
pub struct PurchaseService {
    purchases: Arc<dyn PurchaseRepository>,
    products: Arc<dyn ProductRepository>,
}

impl PurchaseService {
    pub fn new(
        purchases: Arc<dyn PurchaseRepository>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            purchases,
            products,
        }
    }

    /// Adds `quantity` (default 1) of a product to the owner's open cart,
    /// creating the cart on first use. Title and price are snapshotted from
    /// the catalog only when the product is not already in the cart.
    pub fn add_item(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
        quantity: Option<i64>,
    ) -> Result<Purchase, DomainError> {
        let quantity = validation::quantity(quantity)?;
        let listing = self
            .products
            .find_by_id(product_id)?
            .ok_or_else(|| DomainError::not_found("Product not found"))?;

        let cart = self
            .purchases
            .add_or_increment_item(owner_id, LineItem::snapshot(&listing.product, quantity))?;
        log::debug!(
            "cart {} of {owner_id}: +{quantity} x {product_id} ({} lines)",
            cart.id,
            cart.items.len()
        );
        Ok(cart)
    }

    /// The owner's open cart, or an unsaved empty placeholder.
    pub fn view_cart(&self, owner_id: Uuid) -> Result<PurchaseView, DomainError> {
        Ok(self
            .purchases
            .find_open_cart(owner_id)?
            .unwrap_or_else(|| PurchaseView::empty_cart(owner_id)))
    }

    pub fn checkout(&self, owner_id: Uuid) -> Result<Purchase, DomainError> {
        let purchase = self
            .purchases
            .finalize_open_cart(owner_id)?
            .ok_or_else(|| DomainError::InvalidState("Cart is empty".into()))?;
        log::info!(
            "purchase {} finalized for {owner_id} with {} lines",
            purchase.id,
            purchase.items.len()
        );
        Ok(purchase)
    }

    pub fn list_purchases(&self, owner_id: Uuid) -> Result<Vec<PurchaseView>, DomainError> {
        self.purchases.list_finalized(owner_id)
    }
}
