//! The record-store port used by the coordinator.

use async_trait::async_trait;

use crate::types::DbId;

use super::{Attachment, CampaignCounter};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    RecordNotFound { entity: &'static str, id: DbId },

    #[error("{counter} on campaign {campaign_id} cannot go below zero")]
    CounterUnderflow {
        campaign_id: DbId,
        counter: CampaignCounter,
    },

    /// A record read in this transaction was changed by another transaction
    /// that committed first.
    #[error("{0} was changed by a concurrent transaction")]
    Conflict(Attachment),

    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Transactional access to campaign references and counters.
///
/// Every call between [`begin`](Self::begin) and [`commit`](Self::commit)
/// runs in one transaction. Dropping the transaction without committing
/// discards every write made through it.
///
/// Implementations must apply [`adjust_counter`](Self::adjust_counter) as an
/// atomic increment at the storage layer, never as a read followed by a write.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Lock the campaign for the rest of the transaction and report whether
    /// it exists and is not soft-deleted.
    ///
    /// A concurrent soft delete of a locked campaign must wait for this
    /// transaction to finish.
    async fn lock_campaign(
        &self,
        tx: &mut Self::Tx,
        campaign_id: DbId,
    ) -> Result<bool, StoreError>;

    /// The campaign the record currently references.
    ///
    /// For tasks this is the asset id when the asset is a campaign. Fails with
    /// [`StoreError::RecordNotFound`] when the record does not exist.
    async fn current_campaign(
        &self,
        tx: &mut Self::Tx,
        attachment: Attachment,
    ) -> Result<Option<DbId>, StoreError>;

    /// Point the record at `campaign_id`, or clear the reference with `None`.
    async fn set_campaign(
        &self,
        tx: &mut Self::Tx,
        attachment: Attachment,
        campaign_id: Option<DbId>,
    ) -> Result<(), StoreError>;

    /// Add `delta` to a campaign counter.
    async fn adjust_counter(
        &self,
        tx: &mut Self::Tx,
        campaign_id: DbId,
        counter: CampaignCounter,
        delta: i32,
    ) -> Result<(), StoreError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;
}
