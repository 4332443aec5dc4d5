use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::product::Product;

/// Lifecycle of a cart. Only `Open -> Finalized` is ever allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStatus {
    Open,
    Finalized,
}

impl PurchaseStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            PurchaseStatus::Open => "OPEN",
            PurchaseStatus::Finalized => "FINALIZED",
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "OPEN" => Ok(PurchaseStatus::Open),
            "FINALIZED" => Ok(PurchaseStatus::Finalized),
            other => Err(DomainError::Internal(format!(
                "unknown purchase status '{other}'"
            ))),
        }
    }
}

/// A cart line. Title and price are copied from the catalog when the line is
/// first added and never refreshed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub product_id: Uuid,
    pub title: String,
    pub price: BigDecimal,
    pub quantity: i32,
}

impl LineItem {
    pub fn snapshot(product: &Product, quantity: i32) -> Self {
        Self {
            product_id: product.id,
            title: product.title.clone(),
            price: product.price.clone(),
            quantity,
        }
    }
}

/// Either the owner's open cart or a finalized purchase, as stored.
#[derive(Debug, Clone)]
pub struct Purchase {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub status: PurchaseStatus,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    /// Merges `item` into the lines: an existing line for the same product has
    /// its quantity increased, otherwise the item is appended.
    pub fn merge_item(&mut self, item: LineItem) -> Result<(), DomainError> {
        if self.status != PurchaseStatus::Open {
            return Err(DomainError::InvalidState(
                "finalized purchases cannot be modified".into(),
            ));
        }
        match self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| DomainError::invalid("quantity is too large"))?;
            }
            None => self.items.push(item),
        }
        Ok(())
    }
}

/// A line item alongside the catalog entry it points at today, if that entry
/// still exists. The stored snapshot is left as-is.
#[derive(Debug, Clone)]
pub struct LineItemView {
    pub item: LineItem,
    pub product: Option<Product>,
}

/// Read model for carts and purchase history. `id` and timestamps are absent
/// for the placeholder returned when an owner has no open cart yet.
#[derive(Debug, Clone)]
pub struct PurchaseView {
    pub id: Option<Uuid>,
    pub owner_id: Uuid,
    pub status: PurchaseStatus,
    pub items: Vec<LineItemView>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PurchaseView {
    pub fn empty_cart(owner_id: Uuid) -> Self {
        Self {
            id: None,
            owner_id,
            status: PurchaseStatus::Open,
            items: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn from_purchase<F>(purchase: Purchase, mut resolve: F) -> Self
    where
        F: FnMut(Uuid) -> Option<Product>,
    {
        Self {
            id: Some(purchase.id),
            owner_id: purchase.owner_id,
            status: purchase.status,
            items: purchase
                .items
                .into_iter()
                .map(|item| LineItemView {
                    product: resolve(item.product_id),
                    item,
                })
                .collect(),
            created_at: Some(purchase.created_at),
            updated_at: Some(purchase.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_cart() -> Purchase {
        Purchase {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            status: PurchaseStatus::Open,
            items: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(product_id: Uuid, price: i32, quantity: i32) -> LineItem {
        LineItem {
            product_id,
            title: "Lamp".into(),
            price: BigDecimal::from(price),
            quantity,
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [PurchaseStatus::Open, PurchaseStatus::Finalized] {
            assert_eq!(status.as_str().parse::<PurchaseStatus>().unwrap(), status);
        }
        assert!("cart".parse::<PurchaseStatus>().is_err());
    }

    #[test]
    fn merging_same_product_increments_quantity() {
        let mut cart = open_cart();
        let product = Uuid::new_v4();
        cart.merge_item(line(product, 10, 2)).unwrap();
        cart.merge_item(line(product, 99, 3)).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.items[0].price, BigDecimal::from(10));
    }

    #[test]
    fn merging_new_product_appends_in_order() {
        let mut cart = open_cart();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        cart.merge_item(line(first, 1, 1)).unwrap();
        cart.merge_item(line(second, 1, 1)).unwrap();

        let ids: Vec<_> = cart.items.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn finalized_purchase_rejects_merge() {
        let mut purchase = open_cart();
        purchase.status = PurchaseStatus::Finalized;
        let err = purchase.merge_item(line(Uuid::new_v4(), 1, 1)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn quantity_overflow_is_rejected() {
        let mut cart = open_cart();
        let product = Uuid::new_v4();
        cart.merge_item(line(product, 1, i32::MAX)).unwrap();
        assert!(cart.merge_item(line(product, 1, 1)).is_err());
        assert_eq!(cart.items[0].quantity, i32::MAX);
    }

    #[test]
    fn empty_cart_placeholder_has_no_id() {
        let owner = Uuid::new_v4();
        let view = PurchaseView::empty_cart(owner);
        assert!(view.id.is_none());
        assert_eq!(view.owner_id, owner);
        assert_eq!(view.status, PurchaseStatus::Open);
        assert!(view.items.is_empty());
    }
}
