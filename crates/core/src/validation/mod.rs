//! Campaign validation engine.
//!
//! Provides violation types and a pure-logic evaluator. Facts that need a
//! database (sibling names, permitted users, allowed statuses) are passed in
//! by the caller.

pub mod evaluator;
pub mod rules;

pub use evaluator::{validate_campaign, CampaignCandidate, SiblingCampaign, ValidationContext};
pub use rules::{FieldViolation, ValidationResult, ViolationKind};
