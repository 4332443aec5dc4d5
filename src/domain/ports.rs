use uuid::Uuid;

use super::errors::DomainError;
use super::product::{NewProduct, Product, ProductChanges, ProductListing, ProductPage, ProductQuery};
use super::purchase::{LineItem, Purchase, PurchaseView};
use super::user::{NewUser, ProfileChanges, User};

pub trait UserRepository: Send + Sync + 'static {
    /// Fails with `Conflict` when the email or username is taken.
    fn create(&self, user: NewUser) -> Result<User, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    fn exists_by_email_or_username(&self, email: &str, username: &str)
        -> Result<bool, DomainError>;
    fn update_profile(&self, id: Uuid, changes: ProfileChanges)
        -> Result<Option<User>, DomainError>;
}

pub trait ProductRepository: Send + Sync + 'static {
    fn create(&self, owner_id: Uuid, product: NewProduct) -> Result<Product, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<ProductListing>, DomainError>;
    fn search(&self, query: &ProductQuery) -> Result<ProductPage, DomainError>;
    fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

/// Storage for carts and finalized purchases.
///
/// Implementations must make `add_or_increment_item` and `finalize_open_cart`
/// atomic per owner: concurrent additions never lose an update, and a checkout
/// never interleaves with an addition to the same open cart.
pub trait PurchaseRepository: Send + Sync + 'static {
    /// Finds or creates the owner's open cart and merges `item` into it.
    fn add_or_increment_item(&self, owner_id: Uuid, item: LineItem)
        -> Result<Purchase, DomainError>;
    fn find_open_cart(&self, owner_id: Uuid) -> Result<Option<PurchaseView>, DomainError>;
    /// Flips the open cart to finalized. Returns `None`, writing nothing, when
    /// the owner has no open cart or it holds no items.
    fn finalize_open_cart(&self, owner_id: Uuid) -> Result<Option<Purchase>, DomainError>;
    /// Finalized purchases, newest first.
    fn list_finalized(&self, owner_id: Uuid) -> Result<Vec<PurchaseView>, DomainError>;
}
