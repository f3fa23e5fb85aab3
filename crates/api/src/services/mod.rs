//! Application services and external integrations.

pub mod admin_bootstrap;
pub mod auth;
pub mod availability;
pub mod booking_workflow;
pub mod calendar;
pub mod conversation;
pub mod email;
pub mod email_templates;
pub mod graph;
pub mod inbox_sync;

pub use auth::AuthService;
pub use availability::AvailabilityService;
pub use booking_workflow::BookingWorkflow;
pub use email::EmailService;
pub use inbox_sync::{InboxSyncService, InboxSyncSummary};
