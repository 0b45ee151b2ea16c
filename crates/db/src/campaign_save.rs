//! Validated campaign create/update.
//!
//! Gathers the facts the pure validator needs (same-owner siblings, the
//! permitted-user set, allowed statuses), runs every rule, and only writes
//! when the candidate is valid.

use std::collections::BTreeSet;

use crm_core::error::CoreError;
use crm_core::settings::CampaignSettings;
use crm_core::types::{DbId, UserId};
use crm_core::validation::{
    validate_campaign, CampaignCandidate, FieldViolation, ValidationContext, ValidationResult,
    ViolationKind,
};
use sqlx::PgPool;

use crate::models::campaign::{Campaign, CreateCampaign, UpdateCampaign};
use crate::repositories::{CampaignRepo, PermissionRepo};

/// Name of the partial unique index guarding live campaign names.
const UNIQUE_LIVE_NAME_INDEX: &str = "uq_campaigns_user_name_live";

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// One or more rules failed; nothing was written.
    #[error("Campaign is invalid: {} violation(s)", .0.errors.len())]
    Invalid(ValidationResult),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SaveError {
    /// The validation result, if this is a rule failure.
    pub fn violations(&self) -> Option<&ValidationResult> {
        match self {
            Self::Invalid(result) => Some(result),
            _ => None,
        }
    }
}

/// Validate and insert a new campaign together with its permissions.
pub async fn create_campaign(
    pool: &PgPool,
    input: &CreateCampaign,
    settings: &CampaignSettings,
) -> Result<Campaign, SaveError> {
    let candidate = CampaignCandidate {
        id: None,
        user_id: input.user_id,
        name: input.name.clone(),
        access: input.access.unwrap_or_default(),
        status: input.status.clone(),
        starts_on: input.starts_on,
        ends_on: input.ends_on,
    };
    let permitted: BTreeSet<UserId> = input.permitted_user_ids.iter().copied().collect();

    check(pool, &candidate, &permitted, settings).await?;

    CampaignRepo::create(pool, input)
        .await
        .map_err(|err| map_write_error(err, &candidate.name))
}

/// Validate and apply an update to a live campaign.
///
/// Pending values from `input` are merged over the stored row before the
/// rules run. When `permitted_user_ids` is absent, the stored permission set
/// is used.
pub async fn update_campaign(
    pool: &PgPool,
    id: DbId,
    input: &UpdateCampaign,
    settings: &CampaignSettings,
) -> Result<Campaign, SaveError> {
    let existing = CampaignRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Campaign",
            id,
        })?;

    let candidate = CampaignCandidate {
        id: Some(existing.id),
        user_id: existing.user_id,
        name: input.name.clone().unwrap_or_else(|| existing.name.clone()),
        access: match input.access {
            Some(access) => access,
            None => existing.access()?,
        },
        status: input.status.clone().or_else(|| existing.status.clone()),
        starts_on: input.starts_on.or(existing.starts_on),
        ends_on: input.ends_on.or(existing.ends_on),
    };
    let permitted: BTreeSet<UserId> = match &input.permitted_user_ids {
        Some(user_ids) => user_ids.iter().copied().collect(),
        None => PermissionRepo::user_ids_for_campaign(pool, id).await?,
    };

    check(pool, &candidate, &permitted, settings).await?;

    CampaignRepo::update(pool, id, input)
        .await
        .map_err(|err| map_write_error(err, &candidate.name))?
        .ok_or(SaveError::Core(CoreError::NotFound {
            entity: "Campaign",
            id,
        }))
}

/// Run every rule against `candidate`, returning [`SaveError::Invalid`] on
/// any violation.
async fn check(
    pool: &PgPool,
    candidate: &CampaignCandidate,
    permitted: &BTreeSet<UserId>,
    settings: &CampaignSettings,
) -> Result<(), SaveError> {
    let siblings = CampaignRepo::name_siblings(pool, candidate.user_id, &candidate.name).await?;
    let ctx = ValidationContext {
        permitted_users: permitted,
        allowed_statuses: &settings.statuses,
        siblings: &siblings,
    };

    let result = validate_campaign(candidate, &ctx);
    if result.is_valid {
        return Ok(());
    }

    tracing::debug!(
        campaign_id = ?candidate.id,
        user_id = candidate.user_id,
        violations = ?result.kinds(),
        "Campaign failed validation"
    );
    Err(SaveError::Invalid(result))
}

/// A concurrent save can slip a duplicate name past the sibling check; the
/// partial unique index catches it and it is reported as the same rule.
fn map_write_error(err: sqlx::Error, name: &str) -> SaveError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(UNIQUE_LIVE_NAME_INDEX) {
            return SaveError::Invalid(ValidationResult::from_violations(vec![
                FieldViolation::new(ViolationKind::DuplicateName, Some(name.to_string())),
            ]));
        }
    }
    SaveError::Database(err)
}
