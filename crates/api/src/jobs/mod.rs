//! Background job scheduler and job implementations.

mod complete_bookings;
mod inbox_poll;
mod pool_metrics;
mod scheduler;
mod session_cleanup;

pub use complete_bookings::CompletePastBookingsJob;
pub use inbox_poll::InboxPollJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use session_cleanup::SessionCleanupJob;
