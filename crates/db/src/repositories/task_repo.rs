//! Repository for the `tasks` table.

use crm_core::types::DbId;
use sqlx::PgPool;

use crate::models::task::{CreateTask, Task, ASSET_TYPE_CAMPAIGN};

const COLUMNS: &str = "id, user_id, asset_type, asset_id, name, category, due_at, \
    completed_at, created_at, updated_at";

pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task with no asset.
    pub async fn create(pool: &PgPool, input: &CreateTask) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (user_id, name, category, due_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.category)
            .bind(input.due_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Tasks whose asset is the given campaign, oldest first.
    pub async fn list_by_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks WHERE asset_type = $1 AND asset_id = $2 ORDER BY id"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(ASSET_TYPE_CAMPAIGN)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }
}
