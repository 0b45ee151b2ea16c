//! In-memory [`AttachmentStore`].
//!
//! Writes are staged in the transaction and applied under one lock on commit,
//! so counter deltas from concurrent transactions are never lost. References
//! read during a transaction are re-checked on commit; if another transaction
//! changed one in the meantime the commit is refused with
//! [`StoreError::Conflict`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::types::DbId;

use super::store::{AttachmentStore, StoreError};
use super::{Attachment, CampaignCounter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CampaignRow {
    leads_count: i32,
    opportunities_count: i32,
    deleted: bool,
}

impl CampaignRow {
    fn counter_mut(&mut self, counter: CampaignCounter) -> &mut i32 {
        match counter {
            CampaignCounter::Leads => &mut self.leads_count,
            CampaignCounter::Opportunities => &mut self.opportunities_count,
        }
    }

    fn counter(&self, counter: CampaignCounter) -> i32 {
        match counter {
            CampaignCounter::Leads => self.leads_count,
            CampaignCounter::Opportunities => self.opportunities_count,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    campaigns: HashMap<DbId, CampaignRow>,
    references: HashMap<Attachment, Option<DbId>>,
}

#[derive(Debug, Clone, Copy)]
enum StagedWrite {
    SetCampaign(Attachment, Option<DbId>),
    AdjustCounter(DbId, CampaignCounter, i32),
}

/// Writes staged by an open transaction.
#[derive(Debug, Default)]
pub struct MemoryTx {
    writes: Vec<StagedWrite>,
    observed: Vec<(Attachment, Option<DbId>)>,
}

impl MemoryTx {
    fn staged_reference(&self, attachment: Attachment) -> Option<Option<DbId>> {
        self.writes.iter().rev().find_map(|write| match write {
            StagedWrite::SetCampaign(a, campaign_id) if *a == attachment => Some(*campaign_id),
            _ => None,
        })
    }

    fn staged_delta(&self, campaign_id: DbId, counter: CampaignCounter) -> i32 {
        self.writes
            .iter()
            .map(|write| match write {
                StagedWrite::AdjustCounter(id, c, delta) if *id == campaign_id && *c == counter => {
                    *delta
                }
                _ => 0,
            })
            .sum()
    }
}

/// Campaign references and counters held in process memory.
///
/// Nothing is locked while a transaction is open. Where Postgres makes the
/// second writer of a record wait and then see the first writer's result,
/// this store lets both proceed and refuses the later commit instead.
#[derive(Debug, Default)]
pub struct InMemoryAttachmentStore {
    state: Mutex<State>,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a live campaign with zeroed counters.
    pub fn insert_campaign(&self, campaign_id: DbId) {
        self.lock().campaigns.insert(campaign_id, CampaignRow::default());
    }

    /// Mark a campaign soft-deleted.
    pub fn soft_delete_campaign(&self, campaign_id: DbId) {
        if let Some(row) = self.lock().campaigns.get_mut(&campaign_id) {
            row.deleted = true;
        }
    }

    /// Register a standalone record that references no campaign.
    pub fn insert_record(&self, attachment: Attachment) {
        self.lock().references.insert(attachment, None);
    }

    /// Current counter value, or `None` for an unknown campaign.
    pub fn counter(&self, campaign_id: DbId, counter: CampaignCounter) -> Option<i32> {
        self.lock()
            .campaigns
            .get(&campaign_id)
            .map(|row| row.counter(counter))
    }

    /// The campaign a record references. The outer `None` means the record
    /// does not exist.
    pub fn campaign_of(&self, attachment: Attachment) -> Option<Option<DbId>> {
        self.lock().references.get(&attachment).copied()
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        Ok(MemoryTx::default())
    }

    async fn lock_campaign(
        &self,
        _tx: &mut MemoryTx,
        campaign_id: DbId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .campaigns
            .get(&campaign_id)
            .is_some_and(|row| !row.deleted))
    }

    async fn current_campaign(
        &self,
        tx: &mut MemoryTx,
        attachment: Attachment,
    ) -> Result<Option<DbId>, StoreError> {
        let committed = self
            .lock()
            .references
            .get(&attachment)
            .copied()
            .ok_or(StoreError::RecordNotFound {
                entity: attachment.kind().entity(),
                id: attachment.id(),
            })?;
        match tx.staged_reference(attachment) {
            Some(staged) => Ok(staged),
            None => {
                tx.observed.push((attachment, committed));
                Ok(committed)
            }
        }
    }

    async fn set_campaign(
        &self,
        tx: &mut MemoryTx,
        attachment: Attachment,
        campaign_id: Option<DbId>,
    ) -> Result<(), StoreError> {
        if !self.lock().references.contains_key(&attachment) {
            return Err(StoreError::RecordNotFound {
                entity: attachment.kind().entity(),
                id: attachment.id(),
            });
        }
        tx.writes.push(StagedWrite::SetCampaign(attachment, campaign_id));
        Ok(())
    }

    async fn adjust_counter(
        &self,
        tx: &mut MemoryTx,
        campaign_id: DbId,
        counter: CampaignCounter,
        delta: i32,
    ) -> Result<(), StoreError> {
        let current = self
            .lock()
            .campaigns
            .get(&campaign_id)
            .map(|row| row.counter(counter))
            .ok_or(StoreError::RecordNotFound {
                entity: "Campaign",
                id: campaign_id,
            })?;
        if current + tx.staged_delta(campaign_id, counter) + delta < 0 {
            return Err(StoreError::CounterUnderflow {
                campaign_id,
                counter,
            });
        }
        tx.writes.push(StagedWrite::AdjustCounter(campaign_id, counter, delta));
        Ok(())
    }

    async fn commit(&self, tx: MemoryTx) -> Result<(), StoreError> {
        let mut state = self.lock();
        let stale = tx
            .observed
            .iter()
            .find(|(attachment, seen)| state.references.get(attachment) != Some(seen));
        if let Some((attachment, _)) = stale {
            return Err(StoreError::Conflict(*attachment));
        }
        for write in tx.writes {
            match write {
                StagedWrite::SetCampaign(attachment, campaign_id) => {
                    state.references.insert(attachment, campaign_id);
                }
                StagedWrite::AdjustCounter(campaign_id, counter, delta) => {
                    if let Some(row) = state.campaigns.get_mut(&campaign_id) {
                        *row.counter_mut(counter) += delta;
                    }
                }
            }
        }
        Ok(())
    }
}
