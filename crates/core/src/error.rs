//! Domain errors shared by the core and persistence crates.
//!
//! Validation rule failures are not errors; they are reported through
//! [`crate::validation::ValidationResult`].

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A stored or submitted `access` value outside `Public|Private|Shared`.
    #[error("Invalid access '{value}'. Must be one of: {allowed}")]
    InvalidAccess { value: String, allowed: String },

    /// An email design key that cannot be stored.
    #[error("Invalid email design source: {0}")]
    InvalidEmailSource(String),
}
