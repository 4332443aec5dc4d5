use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{
    NewProduct, Product, ProductChanges, ProductListing, ProductPage, ProductQuery, DEFAULT_IMAGE,
};
use crate::schema::{products, users};

use super::models::{NewProductRow, ProductChangesRow, ProductRow};

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Escapes `%`, `_` and `\` so a keyword is matched literally by `ILIKE`.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn filtered(query: &ProductQuery) -> products::BoxedQuery<'static, Pg> {
    let mut q = products::table.into_boxed();
    if let Some(category) = &query.category {
        q = q.filter(products::category.eq(category.clone()));
    }
    if let Some(keyword) = &query.keyword {
        q = q.filter(products::title.ilike(like_pattern(keyword)));
    }
    q
}

fn usernames(
    conn: &mut PgConnection,
    owner_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, String>, DomainError> {
    let pairs: Vec<(Uuid, String)> = users::table
        .filter(users::id.eq_any(owner_ids))
        .select((users::id, users::username))
        .load(conn)?;
    Ok(pairs.into_iter().collect())
}

impl ProductRepository for DieselProductRepository {
    fn create(&self, owner_id: Uuid, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                id: Uuid::new_v4(),
                owner_id,
                title: product.title,
                description: product.description,
                category: product.category,
                price: product.price,
                image: product.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;

        Ok(row.into())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<ProductListing>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = products::table
            .inner_join(users::table)
            .filter(products::id.eq(id))
            .select((ProductRow::as_select(), users::username))
            .first::<(ProductRow, String)>(&mut conn)
            .optional()?;

        Ok(row.map(|(product, owner_username)| ProductListing {
            product: product.into(),
            owner_username,
        }))
    }

    fn search(&self, query: &ProductQuery) -> Result<ProductPage, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(query).count().get_result(conn)?;

            let rows = filtered(query)
                .select(ProductRow::as_select())
                .order((products::created_at.desc(), products::id.desc()))
                .limit(query.limit())
                .offset(query.offset())
                .load(conn)?;

            let names = usernames(conn, rows.iter().map(|r| r.owner_id).collect())?;

            Ok(ProductPage {
                items: rows
                    .into_iter()
                    .map(|row| ProductListing {
                        owner_username: names.get(&row.owner_id).cloned().unwrap_or_default(),
                        product: row.into(),
                    })
                    .collect(),
                total,
                page: query.page(),
                limit: query.limit(),
            })
        })
    }

    fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(products::table.find(id))
            .set(&ProductChangesRow {
                title: changes.title,
                description: changes.description,
                category: changes.category,
                price: changes.price,
                image: changes.image,
                updated_at: Utc::now(),
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;

        Ok(row.map(Product::from))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(products::table.find(id)).execute(&mut conn)?;

        Ok(deleted > 0)
    }
}
