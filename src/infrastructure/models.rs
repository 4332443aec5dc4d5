use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::product::Product;
use crate::domain::purchase::{LineItem, Purchase, PurchaseStatus};
use crate::domain::user::User;
use crate::schema::{products, purchase_items, purchases, users};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChangesRow {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: BigDecimal,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: BigDecimal,
    pub image: String,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChangesRow {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<BigDecimal>,
    pub image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            category: row.category,
            price: row.price,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Identifiable)]
#[diesel(table_name = purchases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PurchaseRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseRow {
    pub fn into_purchase(self, items: Vec<LineItem>) -> Result<Purchase, DomainError> {
        Ok(Purchase {
            id: self.id,
            owner_id: self.owner_id,
            status: self.status.parse::<PurchaseStatus>()?,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = purchase_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PurchaseItemRow {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<PurchaseItemRow> for LineItem {
    fn from(row: PurchaseItemRow) -> Self {
        LineItem {
            product_id: row.product_id,
            title: row.title,
            price: row.price,
            quantity: row.quantity,
        }
    }
}
