use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::extractors::AuthenticatedUser;
use super::products::ProductResponse;
use crate::domain::purchase::{LineItem, LineItemView, Purchase, PurchaseView};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<Uuid>,
    /// Defaults to 1. An integer string such as `"2"` is accepted too.
    #[schema(value_type = Option<i64>)]
    pub quantity: Option<QuantityInput>,
}

/// A quantity sent either as a JSON number or as an integer string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Number(i64),
    Text(String),
}

impl QuantityInput {
    pub fn parse(self) -> Result<i64, AppError> {
        match self {
            QuantityInput::Number(n) => Ok(n),
            QuantityInput::Text(s) => s.trim().parse().map_err(|_| {
                AppError::InvalidArgument("quantity must be a positive integer".into())
            }),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub product_id: Uuid,
    /// Title at the time the line was added.
    pub title: String,
    /// Price at the time the line was added.
    pub price: String,
    pub quantity: i32,
    /// The catalog entry as it is now; `null` once the product is deleted.
    pub product: Option<ProductResponse>,
}

impl LineItemResponse {
    fn snapshot(item: LineItem, product: Option<ProductResponse>) -> Self {
        LineItemResponse {
            product_id: item.product_id,
            title: item.title,
            price: item.price.to_string(),
            quantity: item.quantity,
            product,
        }
    }
}

impl From<LineItemView> for LineItemResponse {
    fn from(view: LineItemView) -> Self {
        LineItemResponse::snapshot(view.item, view.product.map(ProductResponse::from))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    /// `null` for a cart that has not been created yet.
    pub id: Option<Uuid>,
    pub owner: Uuid,
    pub items: Vec<LineItemResponse>,
    /// `OPEN` or `FINALIZED`
    #[schema(example = "OPEN")]
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Purchase> for PurchaseResponse {
    fn from(p: Purchase) -> Self {
        PurchaseResponse {
            id: Some(p.id),
            owner: p.owner_id,
            items: p
                .items
                .into_iter()
                .map(|item| LineItemResponse::snapshot(item, None))
                .collect(),
            status: p.status.to_string(),
            created_at: Some(p.created_at),
            updated_at: Some(p.updated_at),
        }
    }
}

impl From<PurchaseView> for PurchaseResponse {
    fn from(view: PurchaseView) -> Self {
        PurchaseResponse {
            id: view.id,
            owner: view.owner_id,
            items: view.items.into_iter().map(LineItemResponse::from).collect(),
            status: view.status.to_string(),
            created_at: view.created_at,
            updated_at: view.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartMessageResponse {
    pub message: String,
    pub cart: PurchaseResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartEnvelope {
    pub cart: PurchaseResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub message: String,
    pub purchase: PurchaseResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseListResponse {
    pub purchases: Vec<PurchaseResponse>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/v1/purchases/cart/add
///
/// Adding a product already in the cart increases its quantity.
#[utoipa::path(
    post,
    path = "/api/v1/purchases/cart/add",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Added to cart", body = CartMessageResponse),
        (status = 400, description = "Missing productId or invalid quantity"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn add_to_cart(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::InvalidArgument("productId required".into()))?;
    let quantity = body.quantity.map(QuantityInput::parse).transpose()?;
    let owner_id = user.id();

    let cart =
        web::block(move || state.purchases.add_item(owner_id, product_id, quantity)).await??;

    Ok(HttpResponse::Ok().json(CartMessageResponse {
        message: "Added to cart".to_string(),
        cart: cart.into(),
    }))
}

/// GET /api/v1/purchases/cart
#[utoipa::path(
    get,
    path = "/api/v1/purchases/cart",
    responses(
        (status = 200, description = "The open cart, or an empty placeholder", body = CartEnvelope),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn view_cart(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let owner_id = user.id();

    let cart = web::block(move || state.purchases.view_cart(owner_id)).await??;

    Ok(HttpResponse::Ok().json(CartEnvelope { cart: cart.into() }))
}

/// POST /api/v1/purchases/cart/checkout
#[utoipa::path(
    post,
    path = "/api/v1/purchases/cart/checkout",
    responses(
        (status = 200, description = "Checkout successful", body = CheckoutResponse),
        (status = 400, description = "Cart is empty"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn checkout(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let owner_id = user.id();

    let purchase = web::block(move || state.purchases.checkout(owner_id)).await??;

    Ok(HttpResponse::Ok().json(CheckoutResponse {
        message: "Checkout successful".to_string(),
        purchase: purchase.into(),
    }))
}

/// GET /api/v1/purchases
///
/// Finalized purchases of the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    responses(
        (status = 200, description = "Purchase history", body = PurchaseListResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "purchases"
)]
pub async fn list_purchases(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let owner_id = user.id();

    let purchases = web::block(move || state.purchases.list_purchases(owner_id)).await??;

    Ok(HttpResponse::Ok().json(PurchaseListResponse {
        purchases: purchases.into_iter().map(PurchaseResponse::from).collect(),
    }))
}
