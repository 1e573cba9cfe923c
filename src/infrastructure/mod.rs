// Infrastructure module - background tasks, timers and the realtime HTTP calls
pub mod heartbeat;
pub mod http;
pub mod task_manager;
pub mod timer;

pub use heartbeat::HeartbeatMonitor;
pub use http::RealtimeHttp;
pub use task_manager::{TaskKind, TaskManager};
pub use timer::Timer;
