//! Credential handling for user accounts.
//!
//! Only password hashing lives here; session and token issuance are not
//! part of the service.

pub mod password;

pub use password::{hash_password, validate_password_strength, verify_password};
