use std::collections::HashMap;
use std::future::Future;
use tokio::task::JoinHandle;

/// Background tasks a connection may own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Reads the socket and routes inbound frames
    Session,
    /// Periodic missed-heartbeat check
    Heartbeat,
    /// Pending reconnect timer
    Reconnect,
}

/// Tracks background tasks by kind so each can be cancelled deterministically
#[derive(Debug, Default)]
pub struct TaskManager {
    handles: HashMap<TaskKind, JoinHandle<()>>,
}

impl TaskManager {
    /// Create a new empty task manager
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    /// Spawn a task and track it, aborting any previous task of the same kind
    pub fn spawn<F>(&mut self, kind: TaskKind, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        if let Some(previous) = self.handles.insert(kind, handle) {
            previous.abort();
        }
    }

    /// Abort the task of the given kind, if any
    pub fn abort(&mut self, kind: TaskKind) {
        if let Some(handle) = self.handles.remove(&kind) {
            handle.abort();
        }
    }

    /// Stop tracking a task without cancelling it.
    ///
    /// Used by a task that is finishing on its own and must not abort itself.
    pub fn detach(&mut self, kind: TaskKind) {
        self.handles.remove(&kind);
    }

    /// Whether a task of the given kind is tracked and still running
    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.handles
            .get(&kind)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Abort all tasks without waiting
    pub fn abort_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_spawn_replaces_task_of_same_kind() {
        let mut tasks = TaskManager::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let first = tx.clone();
        tasks.spawn(TaskKind::Reconnect, async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = first.send("first");
        });
        tasks.spawn(TaskKind::Reconnect, async move {
            let _ = tx.send("second");
        });

        assert_eq!(rx.recv().await, Some("second"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_abort_stops_only_that_kind() {
        let mut tasks = TaskManager::new();
        tasks.spawn(TaskKind::Heartbeat, std::future::pending());
        tasks.spawn(TaskKind::Session, std::future::pending());

        tasks.abort(TaskKind::Heartbeat);

        assert!(!tasks.is_running(TaskKind::Heartbeat));
        assert!(tasks.is_running(TaskKind::Session));

        tasks.abort_all();
        assert!(!tasks.is_running(TaskKind::Session));
    }
}
