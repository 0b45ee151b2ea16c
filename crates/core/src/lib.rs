//! Campaign domain logic with no database dependency.
//!
//! - [`validation`] gates a campaign's own field state before save.
//! - [`attachment`] attaches and discards tasks, leads and opportunities
//!   while keeping the campaign's cached counters in step.

pub mod attachment;
pub mod campaign;
pub mod email_design;
pub mod error;
pub mod settings;
pub mod types;
pub mod validation;
