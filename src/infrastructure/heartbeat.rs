use crate::realtime::ConnectionInner;
use std::sync::Weak;
use std::time::Duration;
use tokio::time::{self, Instant};

/// Watches one socket session for missing heartbeats.
///
/// Runs every `interval` while the session is open. When the silence since the
/// last heartbeat exceeds `limit`, the session is asked to close; the close
/// itself drives the reconnect.
pub struct HeartbeatMonitor {
    interval: Duration,
    limit: Duration,
    generation: u64,
    connection: Weak<ConnectionInner>,
}

impl HeartbeatMonitor {
    pub(crate) fn new(
        connection: Weak<ConnectionInner>,
        generation: u64,
        interval: Duration,
        limit: Duration,
    ) -> Self {
        Self {
            interval,
            limit,
            generation,
            connection,
        }
    }

    /// Whether `elapsed` silence exceeds the limit (strictly greater)
    pub fn is_expired(elapsed: Duration, limit: Duration) -> bool {
        elapsed > limit
    }

    pub async fn run(self) {
        let mut interval_timer = time::interval_at(Instant::now() + self.interval, self.interval);
        interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            interval_timer.tick().await;

            let connection = match self.connection.upgrade() {
                Some(conn) => conn,
                None => {
                    // Connection dropped, exit heartbeat task
                    break;
                }
            };

            let Some(last_heartbeat) = connection.last_heartbeat_for(self.generation) else {
                break;
            };

            let elapsed = last_heartbeat.elapsed();
            if Self::is_expired(elapsed, self.limit) {
                tracing::warn!(
                    "No heartbeat received in {}ms, closing connection",
                    elapsed.as_millis()
                );
                connection.request_socket_close(self.generation);
            }
        }
    }
}
