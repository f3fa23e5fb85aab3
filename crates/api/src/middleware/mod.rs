//! HTTP middleware.

pub mod admin_auth;
pub mod logging;
pub mod metrics;
pub mod rate_limit;
pub mod security_headers;
pub mod trace_id;

pub use admin_auth::require_admin;
pub use logging::init_logging;
pub use metrics::{metrics_handler, metrics_middleware};
pub use rate_limit::{login_rate_limit, public_rate_limit, RateLimiterState};
pub use security_headers::security_headers_middleware;
pub use trace_id::trace_id;
