//! Repository for the `leads` table.

use crm_core::types::DbId;
use sqlx::PgPool;

use crate::models::lead::{CreateLead, Lead};

const COLUMNS: &str = "id, user_id, campaign_id, first_name, last_name, company, email, \
    status, source, created_at, updated_at";

pub struct LeadRepo;

impl LeadRepo {
    /// Insert a new, unattached lead.
    pub async fn create(pool: &PgPool, input: &CreateLead) -> Result<Lead, sqlx::Error> {
        let query = format!(
            "INSERT INTO leads (user_id, first_name, last_name, company, email, status, source) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(input.user_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.company)
            .bind(&input.email)
            .bind(&input.status)
            .bind(&input.source)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Lead>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM leads WHERE id = $1");
        sqlx::query_as::<_, Lead>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Leads attached to a campaign, oldest first.
    pub async fn list_by_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<Lead>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM leads WHERE campaign_id = $1 ORDER BY id");
        sqlx::query_as::<_, Lead>(&query)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }
}
