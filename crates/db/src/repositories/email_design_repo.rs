//! Repository for the `email_designs` table.

use crm_core::email_design::EmailDesignSource;
use sqlx::PgPool;

use crate::models::email_design::{EmailDesign, UpsertEmailDesign};

const COLUMNS: &str =
    "id, source_info_type, source_info_id, name, source_info, created_at, updated_at";

/// Stores email designs keyed by `(source_info_type, source_info_id)`.
pub struct EmailDesignRepo;

impl EmailDesignRepo {
    /// Insert a design, or refresh the name and payload of an existing one
    /// with the same source key.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertEmailDesign,
    ) -> Result<EmailDesign, sqlx::Error> {
        let query = format!(
            "INSERT INTO email_designs (source_info_type, source_info_id, name, source_info) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (source_info_type, source_info_id) DO UPDATE SET \
                name = EXCLUDED.name, \
                source_info = EXCLUDED.source_info \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailDesign>(&query)
            .bind(input.source.as_str())
            .bind(&input.source_id)
            .bind(&input.name)
            .bind(&input.source_info)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_source(
        pool: &PgPool,
        source: EmailDesignSource,
        source_id: &str,
    ) -> Result<Option<EmailDesign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM email_designs \
             WHERE source_info_type = $1 AND source_info_id = $2"
        );
        sqlx::query_as::<_, EmailDesign>(&query)
            .bind(source.as_str())
            .bind(source_id)
            .fetch_optional(pool)
            .await
    }

    /// All designs, most recently updated first.
    pub async fn list(pool: &PgPool) -> Result<Vec<EmailDesign>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM email_designs ORDER BY updated_at DESC, id DESC");
        sqlx::query_as::<_, EmailDesign>(&query).fetch_all(pool).await
    }
}
