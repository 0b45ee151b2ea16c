//! Campaign permission model.

use crm_core::types::{DbId, Timestamp, UserId};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `campaign_permissions` table: one user a shared campaign
/// is visible to.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CampaignPermission {
    pub id: DbId,
    pub campaign_id: DbId,
    pub user_id: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
