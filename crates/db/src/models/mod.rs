//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) where rows are editable

pub mod campaign;
pub mod email_design;
pub mod lead;
pub mod opportunity;
pub mod permission;
pub mod task;
