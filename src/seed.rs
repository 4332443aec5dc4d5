//! Demo catalog loaded by the `seed` binary.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::product::{NewProduct, ProductQuery, MAX_PAGE_SIZE};
use crate::domain::user::Registration;
use crate::state::AppState;

pub const SEED_EMAIL: &str = "seller@ecofinds.local";
pub const SEED_USERNAME: &str = "ecofinds-demo";
pub const DEFAULT_SEED_PASSWORD: &str = "ecofinds-demo";

struct Sample {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    price: &'static str,
    image: &'static str,
}

const SAMPLES: [Sample; 3] = [
    Sample {
        title: "Vintage Leather Jacket",
        description: "Gently used brown leather jacket",
        category: "Clothing",
        price: "75",
        image: "placeholder1.jpg",
    },
    Sample {
        title: "Wireless Headphones",
        description: "Noise-cancelling headphones",
        category: "Electronics",
        price: "120",
        image: "placeholder2.jpg",
    },
    Sample {
        title: "Wooden Coffee Table",
        description: "Solid oak coffee table",
        category: "Furniture",
        price: "60",
        image: "placeholder3.jpg",
    },
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub skipped: usize,
}

/// Ensures the demo seller exists and owns the sample products.
///
/// Samples the seller already lists (matched by title) are left alone, so
/// running it twice creates nothing new.
pub fn seed_catalog(state: &AppState, password: &str) -> Result<SeedReport, DomainError> {
    let seller = demo_seller(state, password)?;
    let mut report = SeedReport::default();

    for sample in &SAMPLES {
        if already_listed(state, seller, sample.title)? {
            report.skipped += 1;
            continue;
        }
        let price = BigDecimal::from_str(sample.price)
            .map_err(|e| DomainError::Internal(format!("bad sample price: {e}")))?;
        let product = state.products.create_product(
            seller,
            NewProduct {
                title: sample.title.to_string(),
                description: sample.description.to_string(),
                category: sample.category.to_string(),
                price,
                image: Some(sample.image.to_string()),
            },
        )?;
        log::info!("seeded product {} ({})", product.id, product.title);
        report.created += 1;
    }
    Ok(report)
}

fn demo_seller(state: &AppState, password: &str) -> Result<Uuid, DomainError> {
    let registration = Registration {
        email: SEED_EMAIL.to_string(),
        username: SEED_USERNAME.to_string(),
        password: password.to_string(),
        full_name: Some("EcoFinds Demo".to_string()),
    };
    match state.auth.register(registration) {
        Ok(user) => Ok(user.id),
        Err(DomainError::Conflict(_)) => {
            log::info!("demo seller already registered");
            Ok(state.auth.login(SEED_EMAIL, password)?.user.id)
        }
        Err(e) => Err(e),
    }
}

fn already_listed(state: &AppState, seller: Uuid, title: &str) -> Result<bool, DomainError> {
    let page = state.products.list_products(ProductQuery {
        keyword: Some(title.to_string()),
        limit: Some(MAX_PAGE_SIZE),
        ..ProductQuery::default()
    })?;
    Ok(page
        .items
        .iter()
        .any(|l| l.product.owner_id == seller && l.product.title == title))
}
