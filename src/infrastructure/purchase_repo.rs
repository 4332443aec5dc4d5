use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::PurchaseRepository;
use crate::domain::product::Product;
use crate::domain::purchase::{LineItem, LineItemView, Purchase, PurchaseStatus, PurchaseView};
use crate::schema::{products, purchase_items, purchases};

use super::models::{ProductRow, PurchaseItemRow, PurchaseRow};

/// Find-or-create of the owner's open cart in one statement. The conflicting
/// row is updated, so it stays locked until the surrounding transaction ends.
const UPSERT_OPEN_CART_SQL: &str = include_str!("sql/upsert_open_cart.sql");

/// Appends a line or bumps its quantity. The snapshot columns are left alone
/// on conflict, and an increment that would overflow `INT4` touches no row.
const ADD_LINE_ITEM_SQL: &str = include_str!("sql/add_line_item.sql");

pub struct DieselPurchaseRepository {
    pool: DbPool,
}

impl DieselPurchaseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn load_items(conn: &mut PgConnection, purchase_id: Uuid) -> Result<Vec<LineItem>, DomainError> {
    let rows = purchase_items::table
        .filter(purchase_items::purchase_id.eq(purchase_id))
        .select(PurchaseItemRow::as_select())
        .order((purchase_items::created_at.asc(), purchase_items::id.asc()))
        .load(conn)?;
    Ok(rows.into_iter().map(LineItem::from).collect())
}

/// Loads the lines of every purchase in `rows`, each joined with the product
/// it references as it exists now.
fn load_views(
    conn: &mut PgConnection,
    rows: Vec<PurchaseRow>,
) -> Result<Vec<PurchaseView>, DomainError> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let lines: Vec<(PurchaseItemRow, Option<ProductRow>)> = purchase_items::table
        .left_join(products::table.on(products::id.eq(purchase_items::product_id)))
        .filter(purchase_items::purchase_id.eq_any(ids))
        .select((PurchaseItemRow::as_select(), Option::<ProductRow>::as_select()))
        .order((purchase_items::created_at.asc(), purchase_items::id.asc()))
        .load(conn)?;

    let mut by_purchase: HashMap<Uuid, Vec<LineItemView>> = HashMap::new();
    for (item, product) in lines {
        by_purchase
            .entry(item.purchase_id)
            .or_default()
            .push(LineItemView {
                item: item.into(),
                product: product.map(Product::from),
            });
    }

    rows.into_iter()
        .map(|row| {
            Ok(PurchaseView {
                id: Some(row.id),
                owner_id: row.owner_id,
                status: row.status.parse::<PurchaseStatus>()?,
                items: by_purchase.remove(&row.id).unwrap_or_default(),
                created_at: Some(row.created_at),
                updated_at: Some(row.updated_at),
            })
        })
        .collect()
}

impl PurchaseRepository for DieselPurchaseRepository {
    fn add_or_increment_item(
        &self,
        owner_id: Uuid,
        item: LineItem,
    ) -> Result<Purchase, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Find or create the open cart, locking it.
            let cart = diesel::sql_query(UPSERT_OPEN_CART_SQL)
                .bind::<sql_types::Uuid, _>(Uuid::new_v4())
                .bind::<sql_types::Uuid, _>(owner_id)
                .get_result::<PurchaseRow>(conn)?;

            // 2. Append the line, or bump its quantity.
            let affected = diesel::sql_query(ADD_LINE_ITEM_SQL)
                .bind::<sql_types::Uuid, _>(Uuid::new_v4())
                .bind::<sql_types::Uuid, _>(cart.id)
                .bind::<sql_types::Uuid, _>(item.product_id)
                .bind::<sql_types::Text, _>(item.title)
                .bind::<sql_types::Numeric, _>(item.price)
                .bind::<sql_types::Integer, _>(item.quantity)
                .execute(conn)?;
            if affected == 0 {
                return Err(DomainError::invalid("quantity is too large"));
            }

            let items = load_items(conn, cart.id)?;
            cart.into_purchase(items)
        })
    }

    fn find_open_cart(&self, owner_id: Uuid) -> Result<Option<PurchaseView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = purchases::table
            .filter(purchases::owner_id.eq(owner_id))
            .filter(purchases::status.eq(PurchaseStatus::Open.as_str()))
            .select(PurchaseRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(load_views(&mut conn, vec![row])?.pop())
    }

    fn finalize_open_cart(&self, owner_id: Uuid) -> Result<Option<Purchase>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Waits for any in-flight addition to the same cart to commit.
            let cart = purchases::table
                .filter(purchases::owner_id.eq(owner_id))
                .filter(purchases::status.eq(PurchaseStatus::Open.as_str()))
                .select(PurchaseRow::as_select())
                .for_update()
                .first(conn)
                .optional()?;

            let Some(cart) = cart else {
                return Ok(None);
            };

            let items = load_items(conn, cart.id)?;
            if items.is_empty() {
                return Ok(None);
            }

            let finalized = diesel::update(purchases::table.find(cart.id))
                .set((
                    purchases::status.eq(PurchaseStatus::Finalized.as_str()),
                    purchases::updated_at.eq(Utc::now()),
                ))
                .returning(PurchaseRow::as_returning())
                .get_result(conn)?;

            finalized.into_purchase(items).map(Some)
        })
    }

    fn list_finalized(&self, owner_id: Uuid) -> Result<Vec<PurchaseView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let rows = purchases::table
                .filter(purchases::owner_id.eq(owner_id))
                .filter(purchases::status.eq(PurchaseStatus::Finalized.as_str()))
                .select(PurchaseRow::as_select())
                .order((purchases::created_at.desc(), purchases::id.desc()))
                .load(conn)?;

            load_views(conn, rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::ports::ProductRepository;
    use crate::domain::product::{NewProduct, ProductChanges};
    use crate::infrastructure::product_repo::DieselProductRepository;
    use crate::infrastructure::test_db::{insert_user, setup_db};

    fn listed(pool: &DbPool, owner: Uuid, title: &str, price: &str) -> Product {
        DieselProductRepository::new(pool.clone())
            .create(
                owner,
                NewProduct {
                    title: title.to_string(),
                    description: "used".to_string(),
                    category: "Misc".to_string(),
                    price: BigDecimal::from_str(price).expect("valid decimal"),
                    image: None,
                },
            )
            .expect("create product failed")
    }

    #[tokio::test]
    async fn adding_same_product_twice_merges_quantities() {
        let (_container, pool) = setup_db().await;
        let seller = insert_user(&pool, "seller");
        let buyer = insert_user(&pool, "buyer");
        let p1 = listed(&pool, seller, "Kettle", "10.00");
        let repo = DieselPurchaseRepository::new(pool);

        let first = repo
            .add_or_increment_item(buyer, LineItem::snapshot(&p1, 2))
            .expect("add failed");
        let second = repo
            .add_or_increment_item(buyer, LineItem::snapshot(&p1, 3))
            .expect("add failed");

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, PurchaseStatus::Open);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].quantity, 5);
        assert_eq!(second.items[0].price.to_string(), "10.00");
    }

    #[tokio::test]
    async fn open_cart_view_joins_current_product_but_keeps_snapshot() {
        let (_container, pool) = setup_db().await;
        let seller = insert_user(&pool, "seller");
        let buyer = insert_user(&pool, "buyer");
        let p1 = listed(&pool, seller, "Kettle", "10.00");
        let repo = DieselPurchaseRepository::new(pool.clone());

        repo.add_or_increment_item(buyer, LineItem::snapshot(&p1, 1))
            .expect("add failed");
        DieselProductRepository::new(pool)
            .update(
                p1.id,
                ProductChanges {
                    title: Some("Steel Kettle".to_string()),
                    ..Default::default()
                },
            )
            .expect("update failed");

        let view = repo
            .find_open_cart(buyer)
            .expect("find failed")
            .expect("cart should exist");
        assert_eq!(view.items[0].item.title, "Kettle");
        assert_eq!(
            view.items[0].product.as_ref().map(|p| p.title.as_str()),
            Some("Steel Kettle")
        );
    }

    #[tokio::test]
    async fn finalize_without_cart_writes_nothing() {
        let (_container, pool) = setup_db().await;
        let buyer = insert_user(&pool, "buyer");
        let repo = DieselPurchaseRepository::new(pool);

        assert!(repo.finalize_open_cart(buyer).expect("finalize failed").is_none());
        assert!(repo.list_finalized(buyer).expect("list failed").is_empty());
    }

    #[tokio::test]
    async fn finalize_then_add_creates_new_cart() {
        let (_container, pool) = setup_db().await;
        let seller = insert_user(&pool, "seller");
        let buyer = insert_user(&pool, "buyer");
        let p1 = listed(&pool, seller, "Kettle", "10.00");
        let repo = DieselPurchaseRepository::new(pool);

        let cart = repo
            .add_or_increment_item(buyer, LineItem::snapshot(&p1, 2))
            .expect("add failed");
        let purchase = repo
            .finalize_open_cart(buyer)
            .expect("finalize failed")
            .expect("cart had items");
        assert_eq!(purchase.id, cart.id);
        assert_eq!(purchase.status, PurchaseStatus::Finalized);

        assert!(repo.finalize_open_cart(buyer).expect("finalize failed").is_none());

        let fresh = repo
            .add_or_increment_item(buyer, LineItem::snapshot(&p1, 1))
            .expect("add failed");
        assert_ne!(fresh.id, cart.id);
        assert_eq!(fresh.items.len(), 1);
        assert_eq!(fresh.items[0].quantity, 1);

        let history = repo.list_finalized(buyer).expect("list failed");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, Some(cart.id));
        assert_eq!(history[0].items[0].item.quantity, 2);
    }

    #[tokio::test]
    async fn deleted_product_keeps_purchase_history() {
        let (_container, pool) = setup_db().await;
        let seller = insert_user(&pool, "seller");
        let buyer = insert_user(&pool, "buyer");
        let p1 = listed(&pool, seller, "Kettle", "10.00");
        let repo = DieselPurchaseRepository::new(pool.clone());

        repo.add_or_increment_item(buyer, LineItem::snapshot(&p1, 1))
            .expect("add failed");
        repo.finalize_open_cart(buyer).expect("finalize failed");
        DieselProductRepository::new(pool)
            .delete(p1.id)
            .expect("delete failed");

        let history = repo.list_finalized(buyer).expect("list failed");
        assert_eq!(history[0].items[0].item.title, "Kettle");
        assert!(history[0].items[0].product.is_none());
    }

    #[tokio::test]
    async fn concurrent_adds_do_not_lose_updates() {
        let (_container, pool) = setup_db().await;
        let seller = insert_user(&pool, "seller");
        let buyer = insert_user(&pool, "buyer");
        let p1 = listed(&pool, seller, "Kettle", "10.00");
        let p2 = listed(&pool, seller, "Teapot", "4.50");
        let repo = Arc::new(DieselPurchaseRepository::new(pool));

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let repo = repo.clone();
                let item = LineItem::snapshot(if i % 2 == 0 { &p1 } else { &p2 }, 1);
                tokio::task::spawn_blocking(move || repo.add_or_increment_item(buyer, item))
            })
            .collect();
        for task in tasks {
            task.await.expect("task panicked").expect("add failed");
        }

        let cart = repo
            .find_open_cart(buyer)
            .expect("find failed")
            .expect("cart should exist");
        assert_eq!(cart.items.len(), 2);
        let total: i32 = cart.items.iter().map(|l| l.item.quantity).sum();
        assert_eq!(total, 20);
    }

    #[tokio::test]
    async fn quantity_overflow_is_rejected_and_leaves_line_untouched() {
        let (_container, pool) = setup_db().await;
        let seller = insert_user(&pool, "seller");
        let buyer = insert_user(&pool, "buyer");
        let p1 = listed(&pool, seller, "Kettle", "10.00");
        let repo = DieselPurchaseRepository::new(pool);

        repo.add_or_increment_item(buyer, LineItem::snapshot(&p1, i32::MAX))
            .expect("add failed");
        let err = repo
            .add_or_increment_item(buyer, LineItem::snapshot(&p1, 1))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)), "{err:?}");

        let cart = repo
            .find_open_cart(buyer)
            .expect("find failed")
            .expect("cart should exist");
        assert_eq!(cart.items[0].item.quantity, i32::MAX);
    }

    #[tokio::test]
    async fn checkout_racing_adds_accounts_for_every_unit() {
        let (_container, pool) = setup_db().await;
        let seller = insert_user(&pool, "seller");
        let buyer = insert_user(&pool, "buyer");
        let p1 = listed(&pool, seller, "Kettle", "10.00");
        let repo = Arc::new(DieselPurchaseRepository::new(pool));

        // Checkout always has something to finalize.
        repo.add_or_increment_item(buyer, LineItem::snapshot(&p1, 1))
            .expect("add failed");

        let adds: Vec<_> = (0..20)
            .map(|_| {
                let repo = repo.clone();
                let item = LineItem::snapshot(&p1, 1);
                tokio::task::spawn_blocking(move || repo.add_or_increment_item(buyer, item))
            })
            .collect();
        let checkout = {
            let repo = repo.clone();
            tokio::task::spawn_blocking(move || repo.finalize_open_cart(buyer))
        };

        let mut added = 1;
        for task in adds {
            task.await.expect("task panicked").expect("add failed");
            added += 1;
        }
        let purchase = checkout
            .await
            .expect("task panicked")
            .expect("finalize failed")
            .expect("cart had items");

        let finalized: i32 = purchase.items.iter().map(|l| l.quantity).sum();
        let still_open: i32 = repo
            .find_open_cart(buyer)
            .expect("find failed")
            .map(|cart| cart.items.iter().map(|l| l.item.quantity).sum())
            .unwrap_or(0);
        assert_eq!(finalized + still_open, added);

        // Nothing slipped into the purchase after it was finalized.
        let history = repo.list_finalized(buyer).expect("list failed");
        assert_eq!(history.len(), 1);
        let stored: i32 = history[0].items.iter().map(|l| l.item.quantity).sum();
        assert_eq!(stored, finalized);
    }
}
