//! Campaign rule evaluator: pure logic, no database access.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::campaign::{is_blank, CampaignAccess, MAX_NAME_LENGTH};
use crate::types::{Date, DbId, Timestamp, UserId};

use super::rules::{FieldViolation, ValidationResult, ViolationKind};

/// The pending field values of a campaign about to be saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCandidate {
    /// `None` for a campaign that has not been inserted yet.
    pub id: Option<DbId>,
    pub user_id: UserId,
    pub name: String,
    pub access: CampaignAccess,
    pub status: Option<String>,
    pub starts_on: Option<Date>,
    pub ends_on: Option<Date>,
}

/// Another campaign owned by the same user, used for the uniqueness rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingCampaign {
    pub id: DbId,
    pub user_id: UserId,
    pub name: String,
    pub deleted_at: Option<Timestamp>,
}

/// Externally supplied facts the rules are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Users currently permitted to view the campaign.
    pub permitted_users: &'a BTreeSet<UserId>,
    /// Currently allowed `status` values.
    pub allowed_statuses: &'a [String],
    /// Campaigns that may collide with the candidate's name. Soft-deleted
    /// and foreign-owned entries are ignored, so callers may pass a superset.
    pub siblings: &'a [SiblingCampaign],
}

/// Evaluate every campaign rule. All rules run; there is no short-circuit.
pub fn validate_campaign(
    candidate: &CampaignCandidate,
    ctx: &ValidationContext<'_>,
) -> ValidationResult {
    let checks = [
        check_name_present(candidate),
        check_name_length(candidate),
        check_name_unique(candidate, ctx.siblings),
        check_dates_in_sequence(candidate),
        check_shared_has_users(candidate, ctx.permitted_users),
        check_status_allowed(candidate, ctx.allowed_statuses),
    ];

    ValidationResult::from_violations(checks.into_iter().flatten().collect())
}

fn check_name_present(candidate: &CampaignCandidate) -> Option<FieldViolation> {
    is_blank(&candidate.name).then(|| FieldViolation::new(ViolationKind::MissingName, None))
}

fn check_name_length(candidate: &CampaignCandidate) -> Option<FieldViolation> {
    (candidate.name.chars().count() > MAX_NAME_LENGTH).then(|| {
        FieldViolation::new(ViolationKind::NameTooLong, Some(candidate.name.clone()))
    })
}

fn check_name_unique(
    candidate: &CampaignCandidate,
    siblings: &[SiblingCampaign],
) -> Option<FieldViolation> {
    if is_blank(&candidate.name) {
        return None;
    }
    let taken = siblings.iter().any(|sibling| {
        sibling.deleted_at.is_none()
            && sibling.user_id == candidate.user_id
            && Some(sibling.id) != candidate.id
            && sibling.name == candidate.name
    });
    taken.then(|| FieldViolation::new(ViolationKind::DuplicateName, Some(candidate.name.clone())))
}

fn check_dates_in_sequence(candidate: &CampaignCandidate) -> Option<FieldViolation> {
    match (candidate.starts_on, candidate.ends_on) {
        (Some(starts_on), Some(ends_on)) if starts_on > ends_on => Some(FieldViolation::new(
            ViolationKind::DatesNotInSequence,
            Some(ends_on.to_string()),
        )),
        _ => None,
    }
}

fn check_shared_has_users(
    candidate: &CampaignCandidate,
    permitted_users: &BTreeSet<UserId>,
) -> Option<FieldViolation> {
    (candidate.access == CampaignAccess::Shared && permitted_users.is_empty()).then(|| {
        FieldViolation::new(
            ViolationKind::ShareCampaignRequiresUsers,
            Some(candidate.access.to_string()),
        )
    })
}

fn check_status_allowed(
    candidate: &CampaignCandidate,
    allowed_statuses: &[String],
) -> Option<FieldViolation> {
    let status = candidate.status.as_deref().filter(|s| !is_blank(s))?;
    if allowed_statuses.iter().any(|allowed| allowed == status) {
        None
    } else {
        Some(FieldViolation::new(
            ViolationKind::InvalidStatus,
            Some(status.to_string()),
        ))
    }
}
