use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{
    NewProduct, Product, ProductChanges, ProductListing, ProductPage, ProductQuery,
};

const PRODUCT_NOT_FOUND: &str = "Product not found";

pub struct ProductService {
    products: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    pub fn create_product(&self, owner_id: Uuid, product: NewProduct) -> Result<Product, DomainError> {
        let product = product.validate()?;
        self.products.create(owner_id, product)
    }

    pub fn list_products(&self, query: ProductQuery) -> Result<ProductPage, DomainError> {
        self.products.search(&query.normalized())
    }

    pub fn get_product(&self, id: Uuid) -> Result<ProductListing, DomainError> {
        self.products
            .find_by_id(id)?
            .ok_or_else(|| DomainError::not_found(PRODUCT_NOT_FOUND))
    }

    pub fn update_product(
        &self,
        actor: Uuid,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Product, DomainError> {
        self.authorize_owner(actor, id)?;
        let changes = changes.validate()?;
        self.products
            .update(id, changes)?
            .ok_or_else(|| DomainError::not_found(PRODUCT_NOT_FOUND))
    }

    pub fn delete_product(&self, actor: Uuid, id: Uuid) -> Result<(), DomainError> {
        self.authorize_owner(actor, id)?;
        if !self.products.delete(id)? {
            return Err(DomainError::not_found(PRODUCT_NOT_FOUND));
        }
        log::info!("product {id} deleted by owner {actor}");
        Ok(())
    }

    /// Only the seller who listed a product may change it. There is no admin
    /// override.
    fn authorize_owner(&self, actor: Uuid, id: Uuid) -> Result<(), DomainError> {
        let listing = self.get_product(id)?;
        if listing.product.owner_id != actor {
            log::warn!("user {actor} tried to modify product {id} owned by someone else");
            return Err(DomainError::Forbidden("Unauthorized".into()));
        }
        Ok(())
    }
}
