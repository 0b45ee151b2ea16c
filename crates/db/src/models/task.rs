//! Task entity model and DTOs.

use crm_core::types::{DbId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// `tasks.asset_type` value for tasks that belong to a campaign.
pub const ASSET_TYPE_CAMPAIGN: &str = "Campaign";

/// A task row from the `tasks` table.
///
/// `asset_type` / `asset_id` form a polymorphic reference; both are set or
/// both are null.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub user_id: UserId,
    pub asset_type: Option<String>,
    pub asset_id: Option<DbId>,
    pub name: String,
    pub category: Option<String>,
    pub due_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// The campaign this task belongs to, if its asset is a campaign.
    pub fn campaign_id(&self) -> Option<DbId> {
        match self.asset_type.as_deref() {
            Some(ASSET_TYPE_CAMPAIGN) => self.asset_id,
            _ => None,
        }
    }
}

/// DTO for creating a new standalone task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub user_id: UserId,
    pub name: String,
    pub category: Option<String>,
    pub due_at: Option<Timestamp>,
}
