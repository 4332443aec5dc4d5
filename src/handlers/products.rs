use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::extractors::AuthenticatedUser;
use crate::domain::product::{NewProduct, Product, ProductChanges, ProductListing, ProductQuery};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    /// Accepts a JSON number or a decimal string, e.g. `19.99` or `"19.99"`.
    #[schema(value_type = Option<String>, example = "19.99")]
    pub price: Option<BigDecimal>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[schema(value_type = Option<String>, example = "24.50")]
    pub price: Option<BigDecimal>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OwnerResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Present when the seller's profile was loaded alongside the product.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerResponse>,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            owner_id: p.owner_id,
            owner: None,
            title: p.title,
            description: p.description,
            category: p.category,
            price: p.price.to_string(),
            image: p.image,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<ProductListing> for ProductResponse {
    fn from(listing: ProductListing) -> Self {
        let owner = OwnerResponse {
            id: listing.product.owner_id,
            username: listing.owner_username,
        };
        ProductResponse {
            owner: Some(owner),
            ..listing.product.into()
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductEnvelope {
    pub product: ProductResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductMessageResponse {
    pub message: String,
    pub product: ProductResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListProductsParams {
    pub category: Option<String>,
    /// Case-insensitive substring of the title.
    pub keyword: Option<String>,
    /// Page number (1-based). Defaults to 1.
    pub page: Option<i64>,
    /// Number of items per page. Defaults to 20, maximum 100.
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListProductsResponse {
    pub products: Vec<ProductResponse>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/v1/products
///
/// Browse the catalog, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(
        ("category" = Option<String>, Query, description = "Exact category"),
        ("keyword" = Option<String>, Query, description = "Case-insensitive title search"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of products", body = ListProductsResponse),
    ),
    tag = "products"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let query = ProductQuery {
        category: params.category,
        keyword: params.keyword,
        page: params.page,
        limit: params.limit,
    };

    let page = web::block(move || state.products.list_products(query)).await??;

    Ok(HttpResponse::Ok().json(ListProductsResponse {
        products: page.items.into_iter().map(ProductResponse::from).collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
    }))
}

/// POST /api/v1/products
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductMessageResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let price = body
        .price
        .ok_or_else(|| AppError::InvalidArgument("price is required".into()))?;
    let new_product = NewProduct {
        title: body.title,
        description: body.description,
        category: body.category,
        price,
        image: body.image,
    };
    let owner_id = user.id();

    let product = web::block(move || state.products.create_product(owner_id, new_product)).await??;

    Ok(HttpResponse::Created().json(ProductMessageResponse {
        message: "Product created".to_string(),
        product: product.into(),
    }))
}

/// GET /api/v1/products/{id}
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductEnvelope),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let listing = web::block(move || state.products.get_product(id)).await??;

    Ok(HttpResponse::Ok().json(ProductEnvelope {
        product: listing.into(),
    }))
}

/// PUT /api/v1/products/{id}
///
/// Only the seller who listed the product may update it.
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductMessageResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller does not own the product"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let changes = ProductChanges {
        title: body.title,
        description: body.description,
        category: body.category,
        price: body.price,
        image: body.image,
    };
    let actor = user.id();

    let product = web::block(move || state.products.update_product(actor, id, changes)).await??;

    Ok(HttpResponse::Ok().json(ProductMessageResponse {
        message: "Product updated".to_string(),
        product: product.into(),
    }))
}

/// DELETE /api/v1/products/{id}
///
/// Only the seller who listed the product may delete it.
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller does not own the product"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let actor = user.id();

    web::block(move || state.products.delete_product(actor, id)).await??;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Product deleted".to_string(),
    }))
}
