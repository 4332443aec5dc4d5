use std::sync::Arc;

use uuid::Uuid;

use super::tokens::TokenIssuer;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::{NewUser, ProfileChanges, Registration, User};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenIssuer, hash_cost: u32) -> Self {
        Self {
            users,
            tokens,
            hash_cost,
        }
    }

    pub fn register(&self, registration: Registration) -> Result<User, DomainError> {
        let registration = registration.validate()?;

        if self
            .users
            .exists_by_email_or_username(&registration.email, &registration.username)?
        {
            return Err(DomainError::Conflict("User already exists".into()));
        }

        let password_hash = bcrypt::hash(&registration.password, self.hash_cost)
            .map_err(|e| DomainError::Internal(format!("failed to hash password: {e}")))?;

        let user = self.users.create(NewUser {
            email: registration.email,
            username: registration.username,
            password_hash,
            full_name: registration.full_name,
        })?;
        log::info!("registered user {}", user.id);
        Ok(user)
    }

    /// Checks the credentials and issues a session token. Unknown emails and
    /// wrong passwords are indistinguishable to the caller.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, DomainError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(DomainError::invalid("Email and password required"));
        }

        let Some(user) = self.users.find_by_email(email)? else {
            log::warn!("login attempt for unknown email");
            return Err(DomainError::invalid(INVALID_CREDENTIALS));
        };

        let matches = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(format!("failed to verify password: {e}")))?;
        if !matches {
            log::warn!("failed login for user {}", user.id);
            return Err(DomainError::invalid(INVALID_CREDENTIALS));
        }

        let token = self.tokens.issue(user.id)?;
        Ok(Session { token, user })
    }

    /// Resolves a bearer token to the user it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<User, DomainError> {
        let user_id = self.tokens.verify(token)?;
        self.users
            .find_by_id(user_id)?
            .ok_or_else(|| DomainError::Unauthorized("Invalid token".into()))
    }

    pub fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, DomainError> {
        let changes = changes.validate()?;
        let user = if changes.is_empty() {
            self.users.find_by_id(user_id)?
        } else {
            self.users.update_profile(user_id, changes)?
        };
        user.ok_or_else(|| DomainError::not_found("User not found"))
    }
}
