pub mod errors;
pub mod ports;
pub mod product;
pub mod purchase;
pub mod user;
pub mod validation;
