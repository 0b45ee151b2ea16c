//! Attach/discard protocol.

use crate::types::DbId;

use super::store::{AttachmentStore, StoreError};
use super::{AttachOutcome, Attachment, AttachmentError, AttachmentHalf, DiscardOutcome};

/// Attaches records to campaigns and discards them again, keeping the
/// campaign's `leads_count` / `opportunities_count` equal to the number of
/// records that reference it.
///
/// Both writes of an operation go through one store transaction; if either
/// fails the transaction is dropped and nothing is persisted. A transaction
/// refused with [`StoreError::Conflict`] is rerun against the fresh state, up
/// to [`MAX_ATTEMPTS`] times.
#[derive(Debug, Clone)]
pub struct AttachmentCoordinator<S> {
    store: S,
}

/// Attempts per operation before a conflict is reported to the caller.
pub const MAX_ATTEMPTS: usize = 3;

fn conflicted(err: &AttachmentError) -> bool {
    matches!(err, AttachmentError::Transaction(StoreError::Conflict(_)))
}

fn failed(
    half: AttachmentHalf,
    attachment: Attachment,
) -> impl FnOnce(StoreError) -> AttachmentError {
    move |source| {
        tracing::warn!(%attachment, %half, error = %source, "Attachment write failed");
        AttachmentError::PersistenceFailure {
            half,
            attachment,
            source,
        }
    }
}

impl<S: AttachmentStore> AttachmentCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Link `attachment` to the campaign.
    ///
    /// Already-linked records are left untouched. A lead or opportunity that
    /// belonged to another campaign is moved, decrementing the old campaign's
    /// counter in the same transaction.
    #[tracing::instrument(skip(self))]
    pub async fn attach(
        &self,
        campaign_id: DbId,
        attachment: Attachment,
    ) -> Result<AttachOutcome, AttachmentError> {
        let mut attempt = 1;
        loop {
            match self.attach_once(campaign_id, attachment).await {
                Err(err) if conflicted(&err) && attempt < MAX_ATTEMPTS => {
                    tracing::debug!(attempt, "Retrying attach after conflict");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn attach_once(
        &self,
        campaign_id: DbId,
        attachment: Attachment,
    ) -> Result<AttachOutcome, AttachmentError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(AttachmentError::Transaction)?;

        // The record is locked first, then every campaign whose counter moves,
        // in ascending id order, so opposite moves cannot wait on each other.
        let previous = self
            .store
            .current_campaign(&mut tx, attachment)
            .await
            .map_err(failed(AttachmentHalf::Reference, attachment))?;

        let mut locked = vec![campaign_id];
        if let Some(previous_id) = previous {
            if previous_id != campaign_id && attachment.kind().counter().is_some() {
                locked.push(previous_id);
            }
        }
        locked.sort_unstable();

        for id in locked {
            let live = self
                .store
                .lock_campaign(&mut tx, id)
                .await
                .map_err(AttachmentError::Transaction)?;
            if id == campaign_id && !live {
                return Err(AttachmentError::CampaignNotFound(campaign_id));
            }
        }

        if previous == Some(campaign_id) {
            tracing::debug!(campaign_id, "Record already attached");
            return Ok(AttachOutcome::AlreadyAttached);
        }

        self.store
            .set_campaign(&mut tx, attachment, Some(campaign_id))
            .await
            .map_err(failed(AttachmentHalf::Reference, attachment))?;

        if let Some(counter) = attachment.kind().counter() {
            if let Some(previous_id) = previous {
                self.store
                    .adjust_counter(&mut tx, previous_id, counter, -1)
                    .await
                    .map_err(failed(AttachmentHalf::Counter, attachment))?;
            }
            self.store
                .adjust_counter(&mut tx, campaign_id, counter, 1)
                .await
                .map_err(failed(AttachmentHalf::Counter, attachment))?;
        }

        self.store
            .commit(tx)
            .await
            .map_err(AttachmentError::Transaction)?;

        tracing::info!(
            campaign_id,
            previous_campaign = ?previous,
            "Attached record to campaign"
        );
        Ok(AttachOutcome::Attached {
            attachment,
            previous_campaign: previous,
        })
    }

    /// Unlink `attachment` from the campaign.
    ///
    /// Tasks keep existing as standalone records. Records that do not
    /// reference this campaign are reported as [`DiscardOutcome::NotAttached`]
    /// and nothing is written.
    #[tracing::instrument(skip(self))]
    pub async fn discard(
        &self,
        campaign_id: DbId,
        attachment: Attachment,
    ) -> Result<DiscardOutcome, AttachmentError> {
        let mut attempt = 1;
        loop {
            match self.discard_once(campaign_id, attachment).await {
                Err(err) if conflicted(&err) && attempt < MAX_ATTEMPTS => {
                    tracing::debug!(attempt, "Retrying discard after conflict");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn discard_once(
        &self,
        campaign_id: DbId,
        attachment: Attachment,
    ) -> Result<DiscardOutcome, AttachmentError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(AttachmentError::Transaction)?;

        let current = self
            .store
            .current_campaign(&mut tx, attachment)
            .await
            .map_err(failed(AttachmentHalf::Reference, attachment))?;
        if current != Some(campaign_id) {
            tracing::debug!(campaign_id, current_campaign = ?current, "Record not attached");
            return Ok(DiscardOutcome::NotAttached);
        }

        if let Some(counter) = attachment.kind().counter() {
            self.store
                .adjust_counter(&mut tx, campaign_id, counter, -1)
                .await
                .map_err(failed(AttachmentHalf::Counter, attachment))?;
        }

        self.store
            .set_campaign(&mut tx, attachment, None)
            .await
            .map_err(failed(AttachmentHalf::Reference, attachment))?;

        self.store
            .commit(tx)
            .await
            .map_err(AttachmentError::Transaction)?;

        tracing::info!(campaign_id, "Discarded record from campaign");
        Ok(DiscardOutcome::Discarded(attachment))
    }
}
