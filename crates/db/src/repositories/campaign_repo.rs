//! Repository for the `campaigns` table.

use crm_core::campaign::CampaignAccess;
use crm_core::types::{DbId, UserId};
use crm_core::validation::SiblingCampaign;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::campaign::{Campaign, CounterDrift, CreateCampaign, UpdateCampaign};
use crate::models::task::ASSET_TYPE_CAMPAIGN;
use crate::repositories::PermissionRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, assigned_to, name, access, status, budget, \
    target_leads, target_conversion, target_revenue, leads_count, opportunities_count, \
    revenue, starts_on, ends_on, objectives, background_info, deleted_at, \
    created_at, updated_at";

/// Provides CRUD operations for campaigns.
///
/// `leads_count` and `opportunities_count` are never written from DTOs; only
/// the attachment store, soft delete and [`CampaignRepo::reconcile_counters`]
/// move them.
pub struct CampaignRepo;

impl CampaignRepo {
    /// Insert a new campaign, returning the created row.
    ///
    /// A `Shared` campaign's permitted users are written in the same
    /// transaction. If `access` is `None`, defaults to `Public`.
    pub async fn create(pool: &PgPool, input: &CreateCampaign) -> Result<Campaign, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO campaigns \
                (user_id, assigned_to, name, access, status, budget, target_leads, \
                 target_conversion, target_revenue, revenue, starts_on, ends_on, \
                 objectives, background_info) \
             VALUES ($1, $2, $3, COALESCE($4, 'Public'), $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {COLUMNS}"
        );
        let campaign = sqlx::query_as::<_, Campaign>(&query)
            .bind(input.user_id)
            .bind(input.assigned_to)
            .bind(&input.name)
            .bind(input.access.map(CampaignAccess::as_str))
            .bind(&input.status)
            .bind(input.budget)
            .bind(input.target_leads)
            .bind(input.target_conversion)
            .bind(input.target_revenue)
            .bind(input.revenue)
            .bind(input.starts_on)
            .bind(input.ends_on)
            .bind(&input.objectives)
            .bind(&input.background_info)
            .fetch_one(&mut *tx)
            .await?;

        let access = input.access.unwrap_or_default();
        if access.uses_permissions() {
            PermissionRepo::replace_inner(&mut tx, campaign.id, &input.permitted_user_ids).await?;
        }

        tx.commit().await?;
        tracing::info!(campaign_id = campaign.id, user_id = campaign.user_id, "Campaign created");
        Ok(campaign)
    }

    /// Find a campaign by its internal ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a campaign by ID, including soft-deleted rows.
    pub async fn find_by_id_include_deleted(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's live campaigns, most recently created first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<Campaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns \
             WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Campaigns of `user_id` named exactly `name`, soft-deleted ones included.
    ///
    /// Feeds the name-uniqueness rule, which skips deleted entries itself.
    pub async fn name_siblings(
        pool: &PgPool,
        user_id: UserId,
        name: &str,
    ) -> Result<Vec<SiblingCampaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns WHERE user_id = $1 AND name = $2 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, Campaign>(&query)
            .bind(user_id)
            .bind(name)
            .fetch_all(pool)
            .await?;

        Ok(rows.iter().map(Campaign::as_sibling).collect())
    }

    /// Update a campaign. Only non-`None` fields in `input` are applied.
    ///
    /// Permissions follow the resulting access mode: anything other than
    /// `Shared` clears them, and `Shared` replaces them when
    /// `permitted_user_ids` is supplied. Returns `None` if no live row with
    /// the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCampaign,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE campaigns SET \
                assigned_to = COALESCE($2, assigned_to), \
                name = COALESCE($3, name), \
                access = COALESCE($4, access), \
                status = COALESCE($5, status), \
                budget = COALESCE($6, budget), \
                target_leads = COALESCE($7, target_leads), \
                target_conversion = COALESCE($8, target_conversion), \
                target_revenue = COALESCE($9, target_revenue), \
                revenue = COALESCE($10, revenue), \
                starts_on = COALESCE($11, starts_on), \
                ends_on = COALESCE($12, ends_on), \
                objectives = COALESCE($13, objectives), \
                background_info = COALESCE($14, background_info) \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        let campaign = sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(input.assigned_to)
            .bind(&input.name)
            .bind(input.access.map(CampaignAccess::as_str))
            .bind(&input.status)
            .bind(input.budget)
            .bind(input.target_leads)
            .bind(input.target_conversion)
            .bind(input.target_revenue)
            .bind(input.revenue)
            .bind(input.starts_on)
            .bind(input.ends_on)
            .bind(&input.objectives)
            .bind(&input.background_info)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(campaign) = campaign else {
            return Ok(None);
        };

        let shared = campaign.access == CampaignAccess::Shared.as_str();
        match (&input.permitted_user_ids, shared) {
            (_, false) => PermissionRepo::replace_inner(&mut tx, id, &[]).await?,
            (Some(user_ids), true) => PermissionRepo::replace_inner(&mut tx, id, user_ids).await?,
            (None, true) => {}
        }

        tx.commit().await?;
        tracing::debug!(campaign_id = id, "Campaign updated");
        Ok(Some(campaign))
    }

    /// Soft-delete a campaign and destroy everything attached to it.
    ///
    /// Tasks, leads and opportunities referencing the campaign are deleted and
    /// both counters are zeroed in the same transaction. Returns `true` if a
    /// live row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let marked = sqlx::query(
            "UPDATE campaigns \
             SET deleted_at = NOW(), leads_count = 0, opportunities_count = 0 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if marked.rows_affected() == 0 {
            return Ok(false);
        }

        let removed = Self::delete_dependents_inner(&mut tx, id).await?;

        tx.commit().await?;
        tracing::info!(campaign_id = id, removed, "Campaign soft-deleted");
        Ok(true)
    }

    /// Restore a soft-deleted campaign. Returns `true` if a row was restored.
    ///
    /// Fails with a unique violation if the owner has since created a live
    /// campaign with the same name.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE campaigns SET deleted_at = NULL WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a campaign. Returns `true` if a row was removed.
    ///
    /// Leads, opportunities and permissions go with it through foreign key
    /// cascades; tasks are removed explicitly since their reference is
    /// polymorphic.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM tasks WHERE asset_type = $1 AND asset_id = $2")
            .bind(ASSET_TYPE_CAMPAIGN)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Recompute both counters of every live campaign from its attachments.
    ///
    /// Campaigns whose stored counters were wrong are corrected and returned
    /// with their recorded and actual values. Runs as a single statement.
    pub async fn reconcile_counters(pool: &PgPool) -> Result<Vec<CounterDrift>, sqlx::Error> {
        sqlx::query_as::<_, CounterDrift>(
            "WITH tallies AS ( \
                SELECT c.id AS campaign_id, \
                       c.leads_count AS recorded_leads, \
                       (SELECT COUNT(*) FROM leads l WHERE l.campaign_id = c.id)::INT \
                           AS actual_leads, \
                       c.opportunities_count AS recorded_opportunities, \
                       (SELECT COUNT(*) FROM opportunities o WHERE o.campaign_id = c.id)::INT \
                           AS actual_opportunities \
                FROM campaigns c \
                WHERE c.deleted_at IS NULL \
             ), \
             drifted AS ( \
                SELECT * FROM tallies \
                WHERE recorded_leads <> actual_leads \
                   OR recorded_opportunities <> actual_opportunities \
             ), \
             fixed AS ( \
                UPDATE campaigns c \
                SET leads_count = d.actual_leads, \
                    opportunities_count = d.actual_opportunities \
                FROM drifted d \
                WHERE c.id = d.campaign_id \
                RETURNING c.id \
             ) \
             SELECT campaign_id, recorded_leads, actual_leads, \
                    recorded_opportunities, actual_opportunities \
             FROM drifted \
             ORDER BY campaign_id",
        )
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Delete tasks, leads and opportunities referencing a campaign. Returns
    /// the total number of rows removed.
    async fn delete_dependents_inner(
        tx: &mut Transaction<'_, Postgres>,
        campaign_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let tasks = sqlx::query("DELETE FROM tasks WHERE asset_type = $1 AND asset_id = $2")
            .bind(ASSET_TYPE_CAMPAIGN)
            .bind(campaign_id)
            .execute(&mut **tx)
            .await?;

        let leads = sqlx::query("DELETE FROM leads WHERE campaign_id = $1")
            .bind(campaign_id)
            .execute(&mut **tx)
            .await?;

        let opportunities = sqlx::query("DELETE FROM opportunities WHERE campaign_id = $1")
            .bind(campaign_id)
            .execute(&mut **tx)
            .await?;

        Ok(tasks.rows_affected() + leads.rows_affected() + opportunities.rows_affected())
    }
}
