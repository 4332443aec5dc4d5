use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::validation;

pub const DEFAULT_IMAGE: &str = "placeholder.jpg";
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct Product {
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

/// A product together with the username of the seller who listed it.
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub product: Product,
    pub owner_username: String,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: BigDecimal,
    pub image: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<NewProduct, DomainError> {
        Ok(NewProduct {
            title: validation::text("title", &self.title)?,
            description: validation::required("description", &self.description)?,
            category: validation::text("category", &self.category)?,
            price: validation::price(&self.price)?,
            image: image(self.image.as_deref())?,
        })
    }
}

fn image(value: Option<&str>) -> Result<Option<String>, DomainError> {
    validation::optional(value)
        .map(|v| validation::bounded("image", v, validation::MAX_IMAGE_LEN))
        .transpose()
}

/// Owner-editable fields. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<BigDecimal>,
    pub image: Option<String>,
}

impl ProductChanges {
    pub fn validate(&self) -> Result<ProductChanges, DomainError> {
        Ok(ProductChanges {
            title: self
                .title
                .as_deref()
                .map(|v| validation::text("title", v))
                .transpose()?,
            description: self
                .description
                .as_deref()
                .map(|v| validation::required("description", v))
                .transpose()?,
            category: self
                .category
                .as_deref()
                .map(|v| validation::text("category", v))
                .transpose()?,
            price: self.price.as_ref().map(validation::price).transpose()?,
            image: self
                .image
                .as_deref()
                .map(|v| validation::required("image", v))
                .transpose()?
                .map(|v| validation::bounded("image", v, validation::MAX_IMAGE_LEN))
                .transpose()?,
        })
    }

    pub fn apply_to(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.title = title.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(price) = &self.price {
            product.price = price.clone();
        }
        if let Some(image) = &self.image {
            product.image = image.clone();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ProductQuery {
    /// Page is 1-based; limit is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn normalized(&self) -> ProductQuery {
        ProductQuery {
            category: validation::optional(self.category.as_deref()),
            keyword: validation::optional(self.keyword.as_deref()),
            page: Some(self.page.unwrap_or(1).max(1)),
            limit: Some(self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Saturates instead of overflowing for absurd page numbers; such a
    /// page is simply empty.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Case-insensitive title/category match, used by stores without a query engine.
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = self
            .category
            .as_ref()
            .map_or(true, |c| &product.category == c);
        let keyword_ok = self.keyword.as_ref().map_or(true, |k| {
            product.title.to_lowercase().contains(&k.to_lowercase())
        });
        category_ok && keyword_ok
    }
}

#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<ProductListing>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}
