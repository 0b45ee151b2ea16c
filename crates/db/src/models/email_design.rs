//! Email design entity model and DTOs.

use crm_core::email_design::{validate_source_id, EmailDesignSource};
use crm_core::error::CoreError;
use crm_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An email design row from the `email_designs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailDesign {
    pub id: DbId,
    pub source_info_type: String,
    pub source_info_id: String,
    pub name: Option<String>,
    /// The send-service payload, stored verbatim.
    pub source_info: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting or refreshing an email design by its source key.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertEmailDesign {
    pub source: EmailDesignSource,
    pub source_id: String,
    pub name: Option<String>,
    pub source_info: serde_json::Value,
}

impl UpsertEmailDesign {
    /// Check the source key before it is written.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_source_id(&self.source_id)
    }
}
