use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::validation;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw sign-up fields as submitted by a client.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl Registration {
    pub fn validate(&self) -> Result<Registration, DomainError> {
        let email = validation::email(&self.email)?;
        let username = validation::text("username", &self.username)?;
        validation::password(&self.password)?;
        Ok(Registration {
            email,
            username,
            password: self.password.clone(),
            full_name: full_name(self.full_name.as_deref())?,
        })
    }
}

/// A validated user ready to be persisted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub full_name: Option<String>,
}

fn full_name(value: Option<&str>) -> Result<Option<String>, DomainError> {
    validation::optional(value)
        .map(|v| validation::bounded("fullName", v, validation::MAX_TEXT_LEN))
        .transpose()
}

impl ProfileChanges {
    /// Blank fields are dropped rather than rejected; oversized ones are
    /// rejected.
    pub fn validate(&self) -> Result<ProfileChanges, DomainError> {
        Ok(ProfileChanges {
            username: validation::optional(self.username.as_deref())
                .map(|v| validation::bounded("username", v, validation::MAX_TEXT_LEN))
                .transpose()?,
            full_name: full_name(self.full_name.as_deref())?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.full_name.is_none()
    }
}
