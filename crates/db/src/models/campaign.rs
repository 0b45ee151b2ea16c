//! Campaign entity model and DTOs.

use crm_core::campaign::CampaignAccess;
use crm_core::error::CoreError;
use crm_core::types::{Date, DbId, Timestamp, UserId};
use crm_core::validation::SiblingCampaign;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A campaign row from the `campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: DbId,
    pub user_id: UserId,
    pub assigned_to: Option<UserId>,
    pub name: String,
    pub access: String,
    pub status: Option<String>,
    pub budget: Option<Decimal>,
    pub target_leads: Option<i32>,
    pub target_conversion: Option<f64>,
    pub target_revenue: Option<Decimal>,
    /// Maintained by the attachment protocol only.
    pub leads_count: i32,
    /// Maintained by the attachment protocol only.
    pub opportunities_count: i32,
    pub revenue: Option<Decimal>,
    pub starts_on: Option<Date>,
    pub ends_on: Option<Date>,
    pub objectives: Option<String>,
    pub background_info: Option<String>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Campaign {
    /// Parse the stored access column.
    pub fn access(&self) -> Result<CampaignAccess, CoreError> {
        self.access.parse()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn as_sibling(&self) -> SiblingCampaign {
        SiblingCampaign {
            id: self.id,
            user_id: self.user_id,
            name: self.name.clone(),
            deleted_at: self.deleted_at,
        }
    }
}

/// DTO for creating a new campaign.
///
/// Counters are not accepted; they start at zero and only move through
/// attach/discard.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaign {
    pub user_id: UserId,
    pub assigned_to: Option<UserId>,
    pub name: String,
    /// Defaults to `Public` if omitted.
    pub access: Option<CampaignAccess>,
    pub status: Option<String>,
    pub budget: Option<Decimal>,
    pub target_leads: Option<i32>,
    pub target_conversion: Option<f64>,
    pub target_revenue: Option<Decimal>,
    pub revenue: Option<Decimal>,
    pub starts_on: Option<Date>,
    pub ends_on: Option<Date>,
    pub objectives: Option<String>,
    pub background_info: Option<String>,
    /// Users a `Shared` campaign is visible to. Ignored for other access modes.
    #[serde(default)]
    pub permitted_user_ids: Vec<UserId>,
}

/// DTO for updating an existing campaign. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCampaign {
    pub assigned_to: Option<UserId>,
    pub name: Option<String>,
    pub access: Option<CampaignAccess>,
    pub status: Option<String>,
    pub budget: Option<Decimal>,
    pub target_leads: Option<i32>,
    pub target_conversion: Option<f64>,
    pub target_revenue: Option<Decimal>,
    pub revenue: Option<Decimal>,
    pub starts_on: Option<Date>,
    pub ends_on: Option<Date>,
    pub objectives: Option<String>,
    pub background_info: Option<String>,
    /// Replaces the permitted-user set when present.
    pub permitted_user_ids: Option<Vec<UserId>>,
}

/// A campaign whose cached counters disagreed with its attachments.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CounterDrift {
    pub campaign_id: DbId,
    pub recorded_leads: i32,
    pub actual_leads: i32,
    pub recorded_opportunities: i32,
    pub actual_opportunities: i32,
}
