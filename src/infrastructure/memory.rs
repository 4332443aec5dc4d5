//! Process-local store implementing every repository port.
//!
//! All state sits behind a single mutex, so each repository call is one
//! critical section. That serialises cart mutations per owner (and globally),
//! which is what the purchase port requires.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::{ProductRepository, PurchaseRepository, UserRepository};
use crate::domain::product::{
    NewProduct, Product, ProductChanges, ProductListing, ProductPage, ProductQuery, DEFAULT_IMAGE,
};
use crate::domain::purchase::{LineItem, Purchase, PurchaseStatus, PurchaseView};
use crate::domain::user::{NewUser, ProfileChanges, User};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    /// Insertion order doubles as creation order.
    purchases: Vec<Purchase>,
}

impl State {
    fn listing(&self, product: &Product) -> ProductListing {
        ProductListing {
            product: product.clone(),
            owner_username: self
                .users
                .get(&product.owner_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
        }
    }

    fn view(&self, purchase: &Purchase) -> PurchaseView {
        PurchaseView::from_purchase(purchase.clone(), |id| self.products.get(&id).cloned())
    }

    fn open_cart_mut(&mut self, owner_id: Uuid) -> Option<&mut Purchase> {
        self.purchases
            .iter_mut()
            .find(|p| p.owner_id == owner_id && p.status == PurchaseStatus::Open)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Internal("in-memory store lock poisoned".into()))
    }
}

impl UserRepository for InMemoryStore {
    fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut state = self.lock()?;
        if state
            .users
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(DomainError::Conflict("User already exists".into()));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            full_name: user.full_name,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    fn exists_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<bool, DomainError> {
        Ok(self
            .lock()?
            .users
            .values()
            .any(|u| u.email == email || u.username == username))
    }

    fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, DomainError> {
        let mut state = self.lock()?;
        if let Some(username) = &changes.username {
            if state
                .users
                .values()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(DomainError::Conflict("Username already taken".into()));
            }
        }
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = Some(full_name);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

impl ProductRepository for InMemoryStore {
    fn create(&self, owner_id: Uuid, product: NewProduct) -> Result<Product, DomainError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let created = Product {
            id: Uuid::new_v4(),
            owner_id,
            title: product.title,
            description: product.description,
            category: product.category,
            price: product.price,
            image: product.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            created_at: now,
            updated_at: now,
        };
        state.products.insert(created.id, created.clone());
        Ok(created)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<ProductListing>, DomainError> {
        let state = self.lock()?;
        Ok(state.products.get(&id).map(|p| state.listing(p)))
    }

    fn search(&self, query: &ProductQuery) -> Result<ProductPage, DomainError> {
        let state = self.lock()?;
        let mut matching: Vec<&Product> = state
            .products
            .values()
            .filter(|p| query.matches(p))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit()).unwrap_or(usize::MAX);
        Ok(ProductPage {
            total: i64::try_from(matching.len()).unwrap_or(i64::MAX),
            items: matching
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|p| state.listing(p))
                .collect(),
            page: query.page(),
            limit: query.limit(),
        })
    }

    fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>, DomainError> {
        let mut state = self.lock()?;
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(product);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.lock()?.products.remove(&id).is_some())
    }
}

impl PurchaseRepository for InMemoryStore {
    fn add_or_increment_item(
        &self,
        owner_id: Uuid,
        item: LineItem,
    ) -> Result<Purchase, DomainError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        if state.open_cart_mut(owner_id).is_none() {
            state.purchases.push(Purchase {
                id: Uuid::new_v4(),
                owner_id,
                status: PurchaseStatus::Open,
                items: Vec::new(),
                created_at: now,
                updated_at: now,
            });
        }
        let cart = state
            .open_cart_mut(owner_id)
            .ok_or_else(|| DomainError::Internal("open cart vanished".into()))?;

        // Merge on a copy so a failed merge leaves the stored cart untouched.
        let mut merged = cart.clone();
        merged.merge_item(item)?;
        merged.updated_at = now;
        *cart = merged.clone();
        Ok(merged)
    }

    fn find_open_cart(&self, owner_id: Uuid) -> Result<Option<PurchaseView>, DomainError> {
        let state = self.lock()?;
        Ok(state
            .purchases
            .iter()
            .find(|p| p.owner_id == owner_id && p.status == PurchaseStatus::Open)
            .map(|p| state.view(p)))
    }

    fn finalize_open_cart(&self, owner_id: Uuid) -> Result<Option<Purchase>, DomainError> {
        let mut state = self.lock()?;
        let Some(cart) = state.open_cart_mut(owner_id) else {
            return Ok(None);
        };
        if cart.items.is_empty() {
            return Ok(None);
        }
        cart.status = PurchaseStatus::Finalized;
        cart.updated_at = Utc::now();
        Ok(Some(cart.clone()))
    }

    fn list_finalized(&self, owner_id: Uuid) -> Result<Vec<PurchaseView>, DomainError> {
        let state = self.lock()?;
        Ok(state
            .purchases
            .iter()
            .rev()
            .filter(|p| p.owner_id == owner_id && p.status == PurchaseStatus::Finalized)
            .map(|p| state.view(p))
            .collect())
    }
}
