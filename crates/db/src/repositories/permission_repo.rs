//! Repository for the `campaign_permissions` table.

use std::collections::BTreeSet;

use crm_core::campaign::CampaignAccess;
use crm_core::types::{DbId, UserId};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::permission::CampaignPermission;

const COLUMNS: &str = "id, campaign_id, user_id, created_at, updated_at";

/// Which users may view a `Shared` campaign.
pub struct PermissionRepo;

impl PermissionRepo {
    /// The distinct user ids permitted on a campaign.
    pub async fn user_ids_for_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<BTreeSet<UserId>, sqlx::Error> {
        let ids: Vec<UserId> = sqlx::query_scalar(
            "SELECT user_id FROM campaign_permissions WHERE campaign_id = $1",
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    /// Full permission rows for a campaign, oldest first.
    pub async fn list_for_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<CampaignPermission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaign_permissions \
             WHERE campaign_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, CampaignPermission>(&query)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }

    /// Replace the permitted set of a campaign.
    ///
    /// Deletes existing rows, then inserts the new set.
    pub async fn replace_for_campaign(
        pool: &PgPool,
        campaign_id: DbId,
        user_ids: &[UserId],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::replace_inner(&mut tx, campaign_id, user_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Remove leftover permissions from a campaign that is not `Shared`.
    /// Returns the number removed.
    ///
    /// A `Shared` campaign must always keep at least one permitted user, so
    /// its rows are left untouched; move it off `Shared` through a validated
    /// update instead, which clears them in the same transaction.
    pub async fn clear_for_campaign(pool: &PgPool, campaign_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM campaign_permissions p USING campaigns c \
             WHERE p.campaign_id = c.id AND c.id = $1 AND c.access <> $2",
        )
        .bind(campaign_id)
        .bind(CampaignAccess::Shared.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Replace permissions within an existing transaction.
    pub(crate) async fn replace_inner(
        tx: &mut Transaction<'_, Postgres>,
        campaign_id: DbId,
        user_ids: &[UserId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM campaign_permissions WHERE campaign_id = $1")
            .bind(campaign_id)
            .execute(&mut **tx)
            .await?;

        if !user_ids.is_empty() {
            sqlx::query(
                "INSERT INTO campaign_permissions (campaign_id, user_id) \
                 SELECT $1, UNNEST($2::BIGINT[]) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(campaign_id)
            .bind(user_ids)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
