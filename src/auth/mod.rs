//! Authentication utilities: signed tokens and password hashing.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::TokenSigner;
