//! Opportunity entity model and DTOs.

use crm_core::types::{Date, DbId, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An opportunity row from the `opportunities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Opportunity {
    pub id: DbId,
    pub user_id: UserId,
    /// Written only through the attachment store.
    pub campaign_id: Option<DbId>,
    pub name: String,
    pub stage: Option<String>,
    pub amount: Option<Decimal>,
    pub probability: Option<i32>,
    pub closes_on: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new opportunity. Opportunities start unattached.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOpportunity {
    pub user_id: UserId,
    pub name: String,
    pub stage: Option<String>,
    pub amount: Option<Decimal>,
    pub probability: Option<i32>,
    pub closes_on: Option<Date>,
}
