use futures::lock::Mutex;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// One async mutex per teacher, held across a quota/budget re-check and the
/// commit that consumes it.
///
/// Handles expire after `idle` without a lookup, so `idle` must stay far
/// above the longest critical section.
#[derive(Clone)]
pub struct TeacherLocks {
    handles: Cache<u64, Arc<Mutex<()>>>,
}

impl TeacherLocks {
    pub fn new(idle: Duration) -> Self {
        Self {
            handles: Cache::builder().time_to_idle(idle).build(),
        }
    }

    pub async fn handle(&self, teacher_id: u64) -> Arc<Mutex<()>> {
        self.handles
            .get_with(teacher_id, async { Arc::new(Mutex::new(())) })
            .await
    }
}
