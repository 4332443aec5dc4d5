use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::{NewUser, ProfileChanges, User};
use crate::schema::users;

use super::conflict_on_unique;
use super::models::{NewUserRow, UserChangesRow, UserRow};

pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for DieselUserRepository {
    fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(users::table)
            .values(&NewUserRow {
                id: Uuid::new_v4(),
                email: user.email,
                username: user.username,
                password_hash: user.password_hash,
                full_name: user.full_name,
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .map_err(conflict_on_unique("User already exists"))?;

        Ok(row.into())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(User::from))
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(User::from))
    }

    fn exists_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let exists = diesel::select(diesel::dsl::exists(
            users::table.filter(users::email.eq(email).or(users::username.eq(username))),
        ))
        .get_result(&mut conn)?;

        Ok(exists)
    }

    fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(users::table.find(id))
            .set(&UserChangesRow {
                username: changes.username,
                full_name: changes.full_name,
                updated_at: Utc::now(),
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .optional()
            .map_err(conflict_on_unique("Username already taken"))?;

        Ok(row.map(User::from))
    }
}
