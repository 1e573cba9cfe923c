use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Reconnect timer with a fixed delay.
///
/// Every retry waits the same amount of time regardless of how many attempts
/// failed before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    delay: Duration,
}

impl Timer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Future that waits for the delay, then runs `callback`
    pub fn schedule<F, Fut>(&self, callback: F) -> impl Future<Output = ()> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        async move {
            sleep(delay).await;
            callback().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_schedule_waits_for_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let timer = Timer::new(Duration::from_secs(5));
        let handle = tokio::spawn(timer.schedule(move || async move {
            flag.store(true, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert!(!fired.load(Ordering::SeqCst));

        handle.await.unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }
}
