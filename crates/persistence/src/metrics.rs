//! Database metrics.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record how long a named query took.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "spectate_db_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record connection pool gauges. Called from the health check.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("spectate_db_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("spectate_db_connections_idle").set(idle as f64);
}

/// Times a query from construction until [`QueryTimer::record`].
///
/// ```ignore
/// let timer = QueryTimer::new("find_spectator_invite_by_id");
/// let result = sqlx::query_as::<_, SpectatorInviteEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_name() {
        let timer = QueryTimer::new("add_invite_spectator");
        assert_eq!(timer.query_name, "add_invite_spectator");
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        QueryTimer::new("expire_overdue_spectator_invites").record();
    }
}
