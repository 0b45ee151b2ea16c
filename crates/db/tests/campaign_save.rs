//! Integration tests for validated campaign create/update.

use assert_matches::assert_matches;
use chrono::NaiveDate;
use crm_core::campaign::CampaignAccess;
use crm_core::error::CoreError;
use crm_core::settings::CampaignSettings;
use crm_core::validation::ViolationKind;
use crm_db::campaign_save::{create_campaign, update_campaign, SaveError};
use crm_db::models::campaign::{CreateCampaign, UpdateCampaign};
use crm_db::repositories::{CampaignRepo, PermissionRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_campaign(user_id: i64, name: &str) -> CreateCampaign {
    CreateCampaign {
        user_id,
        assigned_to: None,
        name: name.to_string(),
        access: None,
        status: None,
        budget: None,
        target_leads: None,
        target_conversion: None,
        target_revenue: None,
        revenue: None,
        starts_on: None,
        ends_on: None,
        objectives: None,
        background_info: None,
        permitted_user_ids: Vec::new(),
    }
}

fn kinds(err: &SaveError) -> Vec<ViolationKind> {
    err.violations()
        .map(|result| result.kinds().into_iter().collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_valid_campaign_is_saved(pool: PgPool) {
    let settings = CampaignSettings::default();
    let mut input = new_campaign(1, "Spring");
    input.status = Some("planned".to_string());
    input.starts_on = NaiveDate::from_ymd_opt(2024, 3, 1);
    input.ends_on = NaiveDate::from_ymd_opt(2024, 3, 31);

    let campaign = create_campaign(&pool, &input, &settings).await.unwrap();
    assert_eq!(campaign.name, "Spring");
    assert_eq!(campaign.access().unwrap(), CampaignAccess::Public);
    assert_eq!(campaign.leads_count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_name_rejected_for_same_owner_only(pool: PgPool) {
    let settings = CampaignSettings::default();
    create_campaign(&pool, &new_campaign(1, "Spring"), &settings)
        .await
        .unwrap();

    let err = create_campaign(&pool, &new_campaign(1, "Spring"), &settings)
        .await
        .unwrap_err();
    assert_eq!(kinds(&err), vec![ViolationKind::DuplicateName]);

    create_campaign(&pool, &new_campaign(2, "Spring"), &settings)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_violations_reported_and_nothing_written(pool: PgPool) {
    let settings = CampaignSettings::default();
    let mut input = new_campaign(1, "Launch");
    input.access = Some(CampaignAccess::Shared);
    input.status = Some("archived".to_string());
    input.starts_on = NaiveDate::from_ymd_opt(2024, 3, 10);
    input.ends_on = NaiveDate::from_ymd_opt(2024, 3, 1);

    let err = create_campaign(&pool, &input, &settings).await.unwrap_err();
    assert_eq!(
        kinds(&err),
        vec![
            ViolationKind::DatesNotInSequence,
            ViolationKind::ShareCampaignRequiresUsers,
            ViolationKind::InvalidStatus,
        ]
    );
    assert!(CampaignRepo::list_for_user(&pool, 1).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_statuses_come_from_settings(pool: PgPool) {
    let settings = CampaignSettings::from_list("draft, live");
    let mut input = new_campaign(1, "Spring");
    input.status = Some("live".to_string());
    create_campaign(&pool, &input, &settings).await.unwrap();

    let mut planned = new_campaign(1, "Summer");
    planned.status = Some("planned".to_string());
    let err = create_campaign(&pool, &planned, &settings).await.unwrap_err();
    assert_eq!(kinds(&err), vec![ViolationKind::InvalidStatus]);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_merges_stored_values(pool: PgPool) {
    let settings = CampaignSettings::default();
    let mut input = new_campaign(1, "Spring");
    input.starts_on = NaiveDate::from_ymd_opt(2024, 3, 10);
    let campaign = create_campaign(&pool, &input, &settings).await.unwrap();

    // An end date before the stored start date fails.
    let err = update_campaign(
        &pool,
        campaign.id,
        &UpdateCampaign {
            ends_on: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        },
        &settings,
    )
    .await
    .unwrap_err();
    assert_eq!(kinds(&err), vec![ViolationKind::DatesNotInSequence]);

    // Renaming onto itself is not a duplicate.
    let updated = update_campaign(
        &pool,
        campaign.id,
        &UpdateCampaign {
            name: Some("Spring".to_string()),
            objectives: Some("Grow".to_string()),
            ..Default::default()
        },
        &settings,
    )
    .await
    .unwrap();
    assert_eq!(updated.objectives.as_deref(), Some("Grow"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_leaving_shared_clears_permissions(pool: PgPool) {
    let settings = CampaignSettings::default();
    let mut input = new_campaign(1, "Partners");
    input.access = Some(CampaignAccess::Shared);
    input.permitted_user_ids = vec![2, 3];
    let campaign = create_campaign(&pool, &input, &settings).await.unwrap();

    // Shared with the stored users stays valid without resupplying them.
    update_campaign(
        &pool,
        campaign.id,
        &UpdateCampaign {
            objectives: Some("Co-market".to_string()),
            ..Default::default()
        },
        &settings,
    )
    .await
    .unwrap();

    // Emptying the set of a shared campaign is rejected.
    let err = update_campaign(
        &pool,
        campaign.id,
        &UpdateCampaign {
            permitted_user_ids: Some(Vec::new()),
            ..Default::default()
        },
        &settings,
    )
    .await
    .unwrap_err();
    assert_eq!(kinds(&err), vec![ViolationKind::ShareCampaignRequiresUsers]);

    update_campaign(
        &pool,
        campaign.id,
        &UpdateCampaign {
            access: Some(CampaignAccess::Private),
            ..Default::default()
        },
        &settings,
    )
    .await
    .unwrap();
    assert!(PermissionRepo::user_ids_for_campaign(&pool, campaign.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_campaign_is_not_found(pool: PgPool) {
    let err = update_campaign(
        &pool,
        4_242,
        &UpdateCampaign::default(),
        &CampaignSettings::default(),
    )
    .await
    .unwrap_err();
    assert_matches!(err, SaveError::Core(CoreError::NotFound { id: 4_242, .. }));
}
