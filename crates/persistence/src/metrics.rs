//! Query timing and connection pool gauges.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Times one repository query.
///
/// ```ignore
/// let timer = QueryTimer::new("find_booking_by_reference");
/// let row = sqlx::query_as::<_, BookingEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// row
/// ```
pub struct QueryTimer {
    query: &'static str,
    started: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            started: Instant::now(),
        }
    }

    pub fn record(self) {
        let secs = self.started.elapsed().as_secs_f64();
        histogram!("database_query_duration_seconds", "query" => self.query).record(secs);
        counter!("database_queries_total", "query" => self.query).increment(1);
    }
}

/// Publishes pool size, idle connections and utilization.
pub fn record_pool_metrics(pool: &PgPool) {
    let (total, idle, in_use) = pool_usage(pool.size(), pool.num_idle());

    gauge!("database_connections_total").set(total as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_active").set(in_use as f64);
    if total > 0 {
        gauge!("database_pool_utilization").set(in_use as f64 / total as f64);
    }
}

fn pool_usage(size: u32, idle: usize) -> (usize, usize, usize) {
    let total = size as usize;
    let idle = idle.min(total);
    (total, idle, total - idle)
}
