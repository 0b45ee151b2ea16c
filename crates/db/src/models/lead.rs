//! Lead entity model and DTOs.

use crm_core::types::{DbId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A lead row from the `leads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lead {
    pub id: DbId,
    pub user_id: UserId,
    /// Written only through the attachment store.
    pub campaign_id: Option<DbId>,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new lead. Leads start unattached.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLead {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
}
