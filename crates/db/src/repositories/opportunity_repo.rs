//! Repository for the `opportunities` table.

use crm_core::types::DbId;
use sqlx::PgPool;

use crate::models::opportunity::{CreateOpportunity, Opportunity};

const COLUMNS: &str = "id, user_id, campaign_id, name, stage, amount, probability, closes_on, \
    created_at, updated_at";

pub struct OpportunityRepo;

impl OpportunityRepo {
    /// Insert a new, unattached opportunity.
    pub async fn create(
        pool: &PgPool,
        input: &CreateOpportunity,
    ) -> Result<Opportunity, sqlx::Error> {
        let query = format!(
            "INSERT INTO opportunities (user_id, name, stage, amount, probability, closes_on) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Opportunity>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.stage)
            .bind(input.amount)
            .bind(input.probability)
            .bind(input.closes_on)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Opportunity>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM opportunities WHERE id = $1");
        sqlx::query_as::<_, Opportunity>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Opportunities attached to a campaign, oldest first.
    pub async fn list_by_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<Opportunity>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM opportunities WHERE campaign_id = $1 ORDER BY id");
        sqlx::query_as::<_, Opportunity>(&query)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }
}
