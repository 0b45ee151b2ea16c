//! PostgreSQL implementation of the attachment store port.
//!
//! Each coordinator transaction maps onto one `sqlx` transaction. The record
//! being attached or discarded is row-locked when its current reference is
//! read, so concurrent attach/discard of the same record serialize. Campaign
//! rows are then locked `FOR NO KEY UPDATE`, which blocks a concurrent soft
//! delete until the transaction ends without conflicting with the counter
//! `UPDATE`s that follow. Counters are moved with a single
//! `UPDATE ... SET col = col + $n` on live campaigns only.

use async_trait::async_trait;
use crm_core::attachment::{Attachment, AttachmentStore, CampaignCounter, StoreError};
use crm_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::task::ASSET_TYPE_CAMPAIGN;

/// [`AttachmentStore`] backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgAttachmentStore {
    pool: PgPool,
}

impl PgAttachmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(Box::new(err))
}

fn not_found(attachment: Attachment) -> StoreError {
    StoreError::RecordNotFound {
        entity: attachment.kind().entity(),
        id: attachment.id(),
    }
}

#[async_trait]
impl AttachmentStore for PgAttachmentStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        self.pool.begin().await.map_err(backend)
    }

    async fn lock_campaign(
        &self,
        tx: &mut Self::Tx,
        campaign_id: DbId,
    ) -> Result<bool, StoreError> {
        let live = sqlx::query_scalar::<_, bool>(
            "SELECT deleted_at IS NULL FROM campaigns WHERE id = $1 FOR NO KEY UPDATE",
        )
        .bind(campaign_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(backend)?;

        Ok(live.unwrap_or(false))
    }

    async fn current_campaign(
        &self,
        tx: &mut Self::Tx,
        attachment: Attachment,
    ) -> Result<Option<DbId>, StoreError> {
        let row: Option<Option<DbId>> = match attachment {
            Attachment::Lead(id) => {
                sqlx::query_scalar::<_, Option<DbId>>(
                    "SELECT campaign_id FROM leads WHERE id = $1 FOR UPDATE",
                )
                .bind(id)
                .fetch_optional(&mut **tx)
                .await
            }
            Attachment::Opportunity(id) => {
                sqlx::query_scalar::<_, Option<DbId>>(
                    "SELECT campaign_id FROM opportunities WHERE id = $1 FOR UPDATE",
                )
                .bind(id)
                .fetch_optional(&mut **tx)
                .await
            }
            Attachment::Task(id) => {
                sqlx::query_scalar::<_, Option<DbId>>(
                    "SELECT CASE WHEN asset_type = $2 THEN asset_id END \
                     FROM tasks WHERE id = $1 FOR UPDATE",
                )
                .bind(id)
                .bind(ASSET_TYPE_CAMPAIGN)
                .fetch_optional(&mut **tx)
                .await
            }
        }
        .map_err(backend)?;

        row.ok_or_else(|| not_found(attachment))
    }

    async fn set_campaign(
        &self,
        tx: &mut Self::Tx,
        attachment: Attachment,
        campaign_id: Option<DbId>,
    ) -> Result<(), StoreError> {
        let result = match attachment {
            Attachment::Lead(id) => {
                sqlx::query("UPDATE leads SET campaign_id = $2 WHERE id = $1")
                    .bind(id)
                    .bind(campaign_id)
                    .execute(&mut **tx)
                    .await
            }
            Attachment::Opportunity(id) => {
                sqlx::query("UPDATE opportunities SET campaign_id = $2 WHERE id = $1")
                    .bind(id)
                    .bind(campaign_id)
                    .execute(&mut **tx)
                    .await
            }
            Attachment::Task(id) => {
                let asset_type = campaign_id.map(|_| ASSET_TYPE_CAMPAIGN);
                sqlx::query("UPDATE tasks SET asset_type = $2, asset_id = $3 WHERE id = $1")
                    .bind(id)
                    .bind(asset_type)
                    .bind(campaign_id)
                    .execute(&mut **tx)
                    .await
            }
        }
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(not_found(attachment));
        }
        Ok(())
    }

    async fn adjust_counter(
        &self,
        tx: &mut Self::Tx,
        campaign_id: DbId,
        counter: CampaignCounter,
        delta: i32,
    ) -> Result<(), StoreError> {
        let column = counter.column();
        let query = format!(
            "UPDATE campaigns SET {column} = {column} + $2 \
             WHERE id = $1 AND deleted_at IS NULL AND {column} + $2 >= 0"
        );
        let result = sqlx::query(&query)
            .bind(campaign_id)
            .bind(delta)
            .execute(&mut **tx)
            .await
            .map_err(backend)?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let live = sqlx::query_scalar::<_, bool>(
            "SELECT deleted_at IS NULL FROM campaigns WHERE id = $1",
        )
        .bind(campaign_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(backend)?;

        if live == Some(true) {
            Err(StoreError::CounterUnderflow {
                campaign_id,
                counter,
            })
        } else {
            Err(StoreError::RecordNotFound {
                entity: "Campaign",
                id: campaign_id,
            })
        }
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        tx.commit().await.map_err(backend)
    }
}
