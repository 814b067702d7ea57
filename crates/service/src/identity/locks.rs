use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-container async mutexes.
///
/// Holding the guard serializes read-modify-write sequences on one container;
/// different containers never contend. An entry stays until [`ContainerLocks::release`]
/// drops it while no task holds or awaits it.
#[derive(Default)]
pub struct ContainerLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ContainerLocks {
    pub fn new() -> Self { Self::default() }

    pub async fn lock(&self, container_id: &str) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(&self.locks.entry(container_id.to_string()).or_default());
        lock.lock_owned().await
    }

    /// Drop the mutex of a container nobody holds or waits on.
    ///
    /// Tasks that already cloned the mutex keep the entry alive; a later `lock`
    /// simply creates a fresh one.
    pub fn release(&self, container_id: &str) {
        self.locks.remove_if(container_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
