//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.
//!
//! Campaign references on leads, opportunities and tasks are never written
//! here; they move only through [`crate::PgAttachmentStore`].

pub mod campaign_repo;
pub mod email_design_repo;
pub mod lead_repo;
pub mod opportunity_repo;
pub mod permission_repo;
pub mod task_repo;

pub use campaign_repo::CampaignRepo;
pub use email_design_repo::EmailDesignRepo;
pub use lead_repo::LeadRepo;
pub use opportunity_repo::OpportunityRepo;
pub use permission_repo::PermissionRepo;
pub use task_repo::TaskRepo;
