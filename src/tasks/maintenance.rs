//! Maintenance Timer
//!
//! Background sweep that periodically removes expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::SharedStore;

/// Owns the periodic expiration sweep for one store.
///
/// The hosting application calls [`MaintenanceTimer::start`] at startup and
/// [`MaintenanceTimer::stop`] at shutdown. Starting twice is a no-op, and
/// dropping the timer stops the sweep.
///
/// # Example
/// ```ignore
/// let mut timer = MaintenanceTimer::new(store.clone(), Duration::from_secs(60));
/// timer.start();
/// // Later, during shutdown:
/// timer.stop();
/// ```
#[derive(Debug)]
pub struct MaintenanceTimer<V> {
    store: SharedStore<V>,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl<V> MaintenanceTimer<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(store: SharedStore<V>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            handle: None,
        }
    }

    /// Spawns the sweep task. Returns false if it was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            warn!("Maintenance timer already running, ignoring start");
            return false;
        }

        self.handle = Some(spawn_sweep_task(self.store.clone(), self.interval));
        true
    }

    /// Aborts the sweep task. Returns false if it was not running.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                info!("Maintenance timer stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<V> Drop for MaintenanceTimer<V> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Spawns a background task that runs [`crate::cache::CacheStore::cleanup`]
/// every `interval`, holding the write lock only for the sweep itself.
fn spawn_sweep_task<V>(store: SharedStore<V>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting cache maintenance with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.write().await.cleanup();

            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    })
}
