//! Field checks run before any mutation reaches a repository.
//!
//! Bounds mirror the storage columns so that oversized input is rejected here
//! instead of failing inside the database.

use bigdecimal::{BigDecimal, Zero};

use super::errors::DomainError;

/// `VARCHAR(255)` columns: email, username, full name, title, category.
pub const MAX_TEXT_LEN: usize = 255;
/// `VARCHAR(1024)`: product image reference.
pub const MAX_IMAGE_LEN: usize = 1024;
/// bcrypt only reads the first 72 bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// `NUMERIC(12, 2)` leaves ten digits before the decimal point.
const PRICE_INTEGER_DIGITS: i64 = 10;
/// Finer input is refused outright; rounding it would cost more than it is worth.
const PRICE_MAX_SCALE: i64 = 100;

/// Trims `value` and rejects it when nothing is left.
pub fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Like [`required`], but `None` and blank strings both mean "not provided".
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Rejects values longer than `max` characters.
pub fn bounded(field: &str, value: String, max: usize) -> Result<String, DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::invalid(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value)
}

/// A required single-line field stored as `VARCHAR(255)`.
pub fn text(field: &str, value: &str) -> Result<String, DomainError> {
    bounded(field, required(field, value)?, MAX_TEXT_LEN)
}

pub fn email(value: &str) -> Result<String, DomainError> {
    let email = text("email", value)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::invalid("email is not a valid address")),
    }
}

pub fn password(value: &str) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::invalid("password is required"));
    }
    if value.len() > MAX_PASSWORD_BYTES {
        return Err(DomainError::invalid(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Digits left of the decimal point, computed from the representation
/// without expanding it.
fn integer_digits(value: &BigDecimal) -> i64 {
    let (_, scale) = value.as_bigint_and_exponent();
    i64::try_from(value.digits())
        .unwrap_or(i64::MAX)
        .saturating_sub(scale)
}

/// Non-negative, below 10^10, rounded to cents.
pub fn price(value: &BigDecimal) -> Result<BigDecimal, DomainError> {
    let (_, scale) = value.as_bigint_and_exponent();
    if scale > PRICE_MAX_SCALE {
        return Err(DomainError::invalid("price has too many decimal places"));
    }
    if integer_digits(value) > PRICE_INTEGER_DIGITS {
        return Err(DomainError::invalid("price is too large"));
    }
    if *value < BigDecimal::zero() {
        return Err(DomainError::invalid("price must not be negative"));
    }
    let rounded = value.round(2).with_scale(2);
    if integer_digits(&rounded) > PRICE_INTEGER_DIGITS {
        return Err(DomainError::invalid("price is too large"));
    }
    Ok(rounded)
}

/// Quantity defaults to 1 and must fit a positive `i32`.
pub fn quantity(value: Option<i64>) -> Result<i32, DomainError> {
    let raw = value.unwrap_or(1);
    if raw < 1 {
        return Err(DomainError::invalid("quantity must be a positive integer"));
    }
    i32::try_from(raw).map_err(|_| DomainError::invalid("quantity is too large"))
}
