//! PostgreSQL persistence for campaigns and their attachments.
//!
//! - [`models`] row structs and DTOs
//! - [`repositories`] zero-sized repositories taking `&PgPool`
//! - [`attachment_store`] the Postgres side of the attach/discard protocol
//! - [`campaign_save`] validated create/update

use sqlx::postgres::PgPoolOptions;

pub mod attachment_store;
pub mod campaign_save;
pub mod config;
pub mod models;
pub mod repositories;

pub use attachment_store::PgAttachmentStore;
pub use config::DbConfig;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from the loaded configuration.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}

/// Round-trip a trivial query to verify the pool is usable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
