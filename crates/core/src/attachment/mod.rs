//! Attaching tasks, leads and opportunities to campaigns.
//!
//! Tasks reference a campaign through their generic `asset` relation and are
//! not counted. Leads and opportunities reference a campaign directly and the
//! campaign caches how many of each it holds. [`AttachmentCoordinator`] keeps
//! both sides in step inside a single store transaction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

pub mod coordinator;
pub mod memory;
pub mod store;

pub use coordinator::AttachmentCoordinator;
pub use memory::InMemoryAttachmentStore;
pub use store::{AttachmentStore, StoreError};

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// The three record kinds a campaign can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Task,
    Lead,
    Opportunity,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 3] = [Self::Task, Self::Lead, Self::Opportunity];

    /// The campaign counter this kind maintains. Tasks are not counted.
    pub fn counter(self) -> Option<CampaignCounter> {
        match self {
            Self::Task => None,
            Self::Lead => Some(CampaignCounter::Leads),
            Self::Opportunity => Some(CampaignCounter::Opportunities),
        }
    }

    /// Entity name used in errors and logs.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::Lead => "Lead",
            Self::Opportunity => "Opportunity",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity())
    }
}

/// A denormalized counter column on `campaigns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignCounter {
    Leads,
    Opportunities,
}

impl CampaignCounter {
    pub fn column(self) -> &'static str {
        match self {
            Self::Leads => "leads_count",
            Self::Opportunities => "opportunities_count",
        }
    }
}

impl fmt::Display for CampaignCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// A record that can be linked to a campaign, identified by kind and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Attachment {
    Task(DbId),
    Lead(DbId),
    Opportunity(DbId),
}

impl Attachment {
    pub fn new(kind: AttachmentKind, id: DbId) -> Self {
        match kind {
            AttachmentKind::Task => Self::Task(id),
            AttachmentKind::Lead => Self::Lead(id),
            AttachmentKind::Opportunity => Self::Opportunity(id),
        }
    }

    pub fn kind(self) -> AttachmentKind {
        match self {
            Self::Task(_) => AttachmentKind::Task,
            Self::Lead(_) => AttachmentKind::Lead,
            Self::Opportunity(_) => AttachmentKind::Opportunity,
        }
    }

    pub fn id(self) -> DbId {
        match self {
            Self::Task(id) | Self::Lead(id) | Self::Opportunity(id) => id,
        }
    }
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

// ---------------------------------------------------------------------------
// Outcomes and errors
// ---------------------------------------------------------------------------

/// Result of a successful `attach`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttachOutcome {
    /// The record now references the campaign. `previous_campaign` is the
    /// campaign it was moved away from, if any.
    Attached {
        attachment: Attachment,
        previous_campaign: Option<DbId>,
    },
    /// The record already referenced the campaign; nothing was written.
    AlreadyAttached,
}

/// Result of a successful `discard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiscardOutcome {
    Discarded(Attachment),
    /// The record did not reference the campaign; nothing was written.
    NotAttached,
}

/// Which of the two writes of an attach/discard failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttachmentHalf {
    /// The attachment's campaign (or asset) reference.
    Reference,
    /// The campaign's cached counter.
    Counter,
}

impl fmt::Display for AttachmentHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => f.write_str("campaign reference"),
            Self::Counter => f.write_str("campaign counter"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("Campaign {0} not found")]
    CampaignNotFound(DbId),

    /// The store rejected one half of the update. The transaction was rolled
    /// back, so neither half is visible.
    #[error("Failed to update {half} for {attachment}: {source}")]
    PersistenceFailure {
        half: AttachmentHalf,
        attachment: Attachment,
        #[source]
        source: StoreError,
    },

    /// Opening or committing the transaction failed.
    #[error("Attachment transaction failed: {0}")]
    Transaction(#[source] StoreError),
}

impl AttachmentError {
    /// The failing half, for persistence failures.
    pub fn half(&self) -> Option<AttachmentHalf> {
        match self {
            Self::PersistenceFailure { half, .. } => Some(*half),
            _ => None,
        }
    }
}
