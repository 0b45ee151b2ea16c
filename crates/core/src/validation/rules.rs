//! Violation and result types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The rule a campaign broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingName,
    NameTooLong,
    DuplicateName,
    DatesNotInSequence,
    ShareCampaignRequiresUsers,
    InvalidStatus,
}

impl ViolationKind {
    /// The campaign field the violation is reported on.
    pub fn field(self) -> &'static str {
        match self {
            Self::MissingName | Self::NameTooLong | Self::DuplicateName => "name",
            Self::DatesNotInSequence => "ends_on",
            Self::ShareCampaignRequiresUsers => "access",
            Self::InvalidStatus => "status",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::MissingName => "Name can't be blank",
            Self::NameTooLong => "Name is too long",
            Self::DuplicateName => "Name has already been taken",
            Self::DatesNotInSequence => {
                "Please make sure the campaign end date is after the start date"
            }
            Self::ShareCampaignRequiresUsers => {
                "Please specify users to share the campaign with"
            }
            Self::InvalidStatus => "Status is not included in the list",
        }
    }
}

/// Aggregated result of evaluating every campaign rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldViolation>,
}

impl ValidationResult {
    pub fn from_violations(errors: Vec<FieldViolation>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// The distinct rules that failed.
    pub fn kinds(&self) -> BTreeSet<ViolationKind> {
        self.errors.iter().map(|v| v.kind).collect()
    }

    pub fn has(&self, kind: ViolationKind) -> bool {
        self.errors.iter().any(|v| v.kind == kind)
    }
}

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldViolation {
    pub fn new(kind: ViolationKind, value: Option<String>) -> Self {
        Self {
            field: kind.field().to_string(),
            kind,
            message: kind.message().to_string(),
            value,
        }
    }
}
