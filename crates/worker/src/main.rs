//! Campaign counter reconciliation.
//!
//! Recomputes `leads_count` / `opportunities_count` for every live campaign
//! from the records that reference it and repairs any that drifted, e.g.
//! after an attach or discard was reported as a persistence failure.

use anyhow::Context;
use crm_db::repositories::CampaignRepo;
use crm_db::DbConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crm_worker=debug,crm_db=debug,crm_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DbConfig::from_env().context("Failed to load database config")?;
    let pool = crm_db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;
    crm_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    crm_db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!("Reconciling campaign counters");

    let drifted = CampaignRepo::reconcile_counters(&pool)
        .await
        .context("Counter reconciliation failed")?;

    for drift in &drifted {
        tracing::warn!(
            campaign_id = drift.campaign_id,
            recorded_leads = drift.recorded_leads,
            actual_leads = drift.actual_leads,
            recorded_opportunities = drift.recorded_opportunities,
            actual_opportunities = drift.actual_opportunities,
            "Campaign counters drifted; repaired"
        );
    }

    tracing::info!(repaired = drifted.len(), "Counter reconciliation complete");
    Ok(())
}
