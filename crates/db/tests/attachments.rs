//! Integration tests for attaching and discarding records against Postgres.
//!
//! Exercises `PgAttachmentStore` through the core coordinator:
//! - Leads and opportunities move their campaign counter by exactly one
//! - Repeated attach and wrong-campaign discard are no-ops
//! - Tasks link through the polymorphic asset pair and are not counted
//! - Moving a lead between campaigns keeps both counters exact
//! - Concurrent attaches to one campaign are all counted
//! - Opposite moves between two campaigns both complete
//! - A soft delete waits for an in-flight attach and then removes the lead

use assert_matches::assert_matches;
use std::time::Duration;

use crm_core::attachment::{
    AttachOutcome, Attachment, AttachmentCoordinator, AttachmentError, AttachmentHalf,
    AttachmentStore, CampaignCounter, DiscardOutcome, StoreError,
};
use crm_db::models::campaign::{Campaign, CreateCampaign};
use crm_db::models::lead::CreateLead;
use crm_db::models::opportunity::CreateOpportunity;
use crm_db::models::task::CreateTask;
use crm_db::repositories::{CampaignRepo, LeadRepo, OpportunityRepo, TaskRepo};
use crm_db::PgAttachmentStore;
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

fn new_lead(last_name: &str) -> CreateLead {
    CreateLead {
        user_id: 1,
        first_name: "Ada".to_string(),
        last_name: last_name.to_string(),
        company: None,
        email: None,
        status: None,
        source: None,
    }
}

fn new_opportunity(name: &str) -> CreateOpportunity {
    CreateOpportunity {
        user_id: 1,
        name: name.to_string(),
        stage: None,
        amount: None,
        probability: None,
        closes_on: None,
    }
}

fn new_task(name: &str) -> CreateTask {
    CreateTask {
        user_id: 1,
        name: name.to_string(),
        category: None,
        due_at: None,
    }
}

fn coordinator(pool: &PgPool) -> AttachmentCoordinator<PgAttachmentStore> {
    AttachmentCoordinator::new(PgAttachmentStore::new(pool.clone()))
}

async fn reload(pool: &PgPool, campaign_id: i64) -> Campaign {
    CampaignRepo::find_by_id_include_deleted(pool, campaign_id)
        .await
        .unwrap()
        .expect("campaign exists")
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attach_lead_increments_once(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, &new_campaign(1, "Spring"))
        .await
        .unwrap();
    let lead = LeadRepo::create(&pool, &new_lead("Lovelace")).await.unwrap();
    let coordinator = coordinator(&pool);

    let outcome = coordinator
        .attach(campaign.id, Attachment::Lead(lead.id))
        .await
        .unwrap();
    assert_matches!(outcome, AttachOutcome::Attached { previous_campaign: None, .. });

    let again = coordinator
        .attach(campaign.id, Attachment::Lead(lead.id))
        .await
        .unwrap();
    assert_eq!(again, AttachOutcome::AlreadyAttached);

    let lead = LeadRepo::find_by_id(&pool, lead.id).await.unwrap().unwrap();
    assert_eq!(lead.campaign_id, Some(campaign.id));
    assert_eq!(reload(&pool, campaign.id).await.leads_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_discard_lead_returns_counter_to_zero(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, &new_campaign(1, "Spring"))
        .await
        .unwrap();
    let lead = LeadRepo::create(&pool, &new_lead("Lovelace")).await.unwrap();
    let coordinator = coordinator(&pool);

    coordinator
        .attach(campaign.id, Attachment::Lead(lead.id))
        .await
        .unwrap();
    let outcome = coordinator
        .discard(campaign.id, Attachment::Lead(lead.id))
        .await
        .unwrap();
    assert_eq!(outcome, DiscardOutcome::Discarded(Attachment::Lead(lead.id)));

    let lead = LeadRepo::find_by_id(&pool, lead.id).await.unwrap().unwrap();
    assert_eq!(lead.campaign_id, None);
    assert_eq!(reload(&pool, campaign.id).await.leads_count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_discard_from_other_campaign_is_noop(pool: PgPool) {
    let a = CampaignRepo::create(&pool, &new_campaign(1, "A")).await.unwrap();
    let b = CampaignRepo::create(&pool, &new_campaign(1, "B")).await.unwrap();
    let lead = LeadRepo::create(&pool, &new_lead("Lovelace")).await.unwrap();
    let coordinator = coordinator(&pool);

    coordinator.attach(a.id, Attachment::Lead(lead.id)).await.unwrap();
    let outcome = coordinator
        .discard(b.id, Attachment::Lead(lead.id))
        .await
        .unwrap();
    assert_eq!(outcome, DiscardOutcome::NotAttached);

    assert_eq!(reload(&pool, a.id).await.leads_count, 1);
    assert_eq!(reload(&pool, b.id).await.leads_count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_moving_lead_adjusts_both_campaigns(pool: PgPool) {
    let a = CampaignRepo::create(&pool, &new_campaign(1, "A")).await.unwrap();
    let b = CampaignRepo::create(&pool, &new_campaign(1, "B")).await.unwrap();
    let lead = LeadRepo::create(&pool, &new_lead("Lovelace")).await.unwrap();
    let coordinator = coordinator(&pool);

    coordinator.attach(a.id, Attachment::Lead(lead.id)).await.unwrap();
    let outcome = coordinator.attach(b.id, Attachment::Lead(lead.id)).await.unwrap();
    assert_matches!(
        outcome,
        AttachOutcome::Attached { previous_campaign: Some(id), .. } if id == a.id
    );

    assert_eq!(reload(&pool, a.id).await.leads_count, 0);
    assert_eq!(reload(&pool, b.id).await.leads_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_attaches_are_all_counted(pool: PgPool) {
    let campaign_id = CampaignRepo::create(&pool, &new_campaign(1, "Spring"))
        .await
        .unwrap()
        .id;

    let mut handles = Vec::new();
    for i in 0..10 {
        let lead = LeadRepo::create(&pool, &new_lead(&format!("Lead {i}")))
            .await
            .unwrap();
        let coordinator = coordinator(&pool);
        handles.push(tokio::spawn(async move {
            coordinator
                .attach(campaign_id, Attachment::Lead(lead.id))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(reload(&pool, campaign_id).await.leads_count, 10);
    assert_eq!(
        LeadRepo::list_by_campaign(&pool, campaign_id)
            .await
            .unwrap()
            .len(),
        10
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_opposite_moves_both_complete(pool: PgPool) {
    let a = CampaignRepo::create(&pool, &new_campaign(1, "A")).await.unwrap();
    let b = CampaignRepo::create(&pool, &new_campaign(1, "B")).await.unwrap();
    let first = LeadRepo::create(&pool, &new_lead("First")).await.unwrap();
    let second = LeadRepo::create(&pool, &new_lead("Second")).await.unwrap();
    let coordinator = coordinator(&pool);
    coordinator.attach(a.id, Attachment::Lead(first.id)).await.unwrap();
    coordinator.attach(b.id, Attachment::Lead(second.id)).await.unwrap();

    for round in 0..10 {
        let (to, from) = if round % 2 == 0 { (b.id, a.id) } else { (a.id, b.id) };
        let (moved_first, moved_second) = tokio::join!(
            coordinator.attach(to, Attachment::Lead(first.id)),
            coordinator.attach(from, Attachment::Lead(second.id)),
        );
        moved_first.unwrap();
        moved_second.unwrap();
    }

    assert_eq!(reload(&pool, a.id).await.leads_count, 1);
    assert_eq!(reload(&pool, b.id).await.leads_count, 1);
    let first = LeadRepo::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert_eq!(first.campaign_id, Some(a.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_delete_waits_for_open_attach(pool: PgPool) {
    let campaign_id = CampaignRepo::create(&pool, &new_campaign(1, "Spring"))
        .await
        .unwrap()
        .id;
    let lead = LeadRepo::create(&pool, &new_lead("Lovelace")).await.unwrap();
    let attachment = Attachment::Lead(lead.id);
    let store = PgAttachmentStore::new(pool.clone());

    // Attach up to, but not including, the counter write and commit.
    let mut tx = store.begin().await.unwrap();
    assert_eq!(store.current_campaign(&mut tx, attachment).await.unwrap(), None);
    assert!(store.lock_campaign(&mut tx, campaign_id).await.unwrap());
    store
        .set_campaign(&mut tx, attachment, Some(campaign_id))
        .await
        .unwrap();

    let delete_pool = pool.clone();
    let delete =
        tokio::spawn(async move { CampaignRepo::soft_delete(&delete_pool, campaign_id).await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!delete.is_finished(), "soft delete must wait for the attach");

    store
        .adjust_counter(&mut tx, campaign_id, CampaignCounter::Leads, 1)
        .await
        .unwrap();
    store.commit(tx).await.unwrap();
    assert!(delete.await.unwrap().unwrap());

    assert!(LeadRepo::find_by_id(&pool, lead.id).await.unwrap().is_none());
    let deleted = reload(&pool, campaign_id).await;
    assert!(deleted.is_deleted());
    assert_eq!(deleted.leads_count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_counter_write_skips_deleted_campaign(pool: PgPool) {
    let campaign_id = CampaignRepo::create(&pool, &new_campaign(1, "Spring"))
        .await
        .unwrap()
        .id;
    assert!(CampaignRepo::soft_delete(&pool, campaign_id).await.unwrap());
    let store = PgAttachmentStore::new(pool.clone());

    let mut tx = store.begin().await.unwrap();
    assert!(!store.lock_campaign(&mut tx, campaign_id).await.unwrap());
    let err = store
        .adjust_counter(&mut tx, campaign_id, CampaignCounter::Leads, 1)
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::RecordNotFound { entity: "Campaign", .. });
    drop(tx);

    assert_eq!(reload(&pool, campaign_id).await.leads_count, 0);
}

// ---------------------------------------------------------------------------
// Opportunities and tasks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_opportunity_round_trip(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, &new_campaign(1, "Spring"))
        .await
        .unwrap();
    let opp = OpportunityRepo::create(&pool, &new_opportunity("Big deal"))
        .await
        .unwrap();
    let coordinator = coordinator(&pool);

    coordinator
        .attach(campaign.id, Attachment::Opportunity(opp.id))
        .await
        .unwrap();
    let attached = reload(&pool, campaign.id).await;
    assert_eq!(attached.opportunities_count, 1);
    assert_eq!(attached.leads_count, 0);

    coordinator
        .discard(campaign.id, Attachment::Opportunity(opp.id))
        .await
        .unwrap();
    assert_eq!(reload(&pool, campaign.id).await.opportunities_count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_task_links_through_asset_without_counting(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, &new_campaign(1, "Spring"))
        .await
        .unwrap();
    let task = TaskRepo::create(&pool, &new_task("Call back")).await.unwrap();
    let coordinator = coordinator(&pool);

    coordinator
        .attach(campaign.id, Attachment::Task(task.id))
        .await
        .unwrap();
    let linked = TaskRepo::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(linked.asset_type.as_deref(), Some("Campaign"));
    assert_eq!(linked.campaign_id(), Some(campaign.id));
    assert_eq!(TaskRepo::list_by_campaign(&pool, campaign.id).await.unwrap().len(), 1);

    let reloaded = reload(&pool, campaign.id).await;
    assert_eq!(reloaded.leads_count, 0);
    assert_eq!(reloaded.opportunities_count, 0);

    coordinator
        .discard(campaign.id, Attachment::Task(task.id))
        .await
        .unwrap();
    let unlinked = TaskRepo::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(unlinked.asset_type, None);
    assert_eq!(unlinked.asset_id, None);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attach_to_deleted_campaign_fails(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, &new_campaign(1, "Spring"))
        .await
        .unwrap();
    let lead = LeadRepo::create(&pool, &new_lead("Lovelace")).await.unwrap();
    assert!(CampaignRepo::soft_delete(&pool, campaign.id).await.unwrap());

    let err = coordinator(&pool)
        .attach(campaign.id, Attachment::Lead(lead.id))
        .await
        .unwrap_err();
    assert_matches!(err, AttachmentError::CampaignNotFound(id) if id == campaign.id);

    let lead = LeadRepo::find_by_id(&pool, lead.id).await.unwrap().unwrap();
    assert_eq!(lead.campaign_id, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attach_unknown_record_writes_nothing(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, &new_campaign(1, "Spring"))
        .await
        .unwrap();

    let err = coordinator(&pool)
        .attach(campaign.id, Attachment::Lead(9_999))
        .await
        .unwrap_err();
    assert_eq!(err.half(), Some(AttachmentHalf::Reference));
    assert_eq!(reload(&pool, campaign.id).await.leads_count, 0);
}
