//! Cache Sync Task
//!
//! Background task that flushes a shared [`PersistentCache`] to durable
//! storage when the host goes to the background and, optionally, on a timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::cache::PersistentCache;
use crate::lifecycle::LifecycleEvent;
use crate::persistent::{PersistentKey, PersistentValue};

/// Spawns a task that synchronizes `cache` whenever it is asked to.
///
/// A flush happens on every [`LifecycleEvent::DidEnterBackground`] received on
/// `events`, on every `interval` tick when a non-zero one is given, and after falling
/// behind the channel (missed events may have included a background signal).
/// When every sender is dropped the task flushes one last time and exits.
///
/// Each flush holds the cache's write lock and runs on the blocking pool,
/// since storage I/O is synchronous. A flush that fails leaves the cache
/// dirty, so the next one retries.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(PersistentCache::from_config(&config)));
/// let (tx, rx) = broadcast::channel(16);
/// let handle = spawn_sync_task(cache.clone(), config.sync_interval(), rx);
/// let mut observer = LifecycleObserver::forwarding(tx);
/// // Host reports it is being suspended:
/// observer.notify(LifecycleEvent::DidEnterBackground);
/// ```
pub fn spawn_sync_task<K, V>(
    cache: Arc<RwLock<PersistentCache<K, V>>>,
    interval: Option<Duration>,
    mut events: broadcast::Receiver<LifecycleEvent>,
) -> JoinHandle<()>
where
    K: PersistentKey + Send + Sync + 'static,
    V: PersistentValue + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(?interval, "Starting cache sync task");

        let mut ticker = interval.filter(|period| !period.is_zero()).map(|period| {
            // First tick one period from now, not immediately.
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        loop {
            let reason = tokio::select! {
                received = events.recv() => match received {
                    Ok(LifecycleEvent::DidEnterBackground) => "background",
                    Ok(event) => {
                        trace!(?event, "Sync task ignoring lifecycle event");
                        continue;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Sync task lagged behind lifecycle events");
                        "lagged"
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = next_tick(&mut ticker) => "interval",
            };

            flush(&cache, reason).await;
        }

        flush(&cache, "shutdown").await;
        info!("Cache sync task stopped");
    })
}

/// Waits for the next tick, or forever when there is no timer.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn flush<K, V>(cache: &Arc<RwLock<PersistentCache<K, V>>>, reason: &'static str)
where
    K: PersistentKey + Send + Sync + 'static,
    V: PersistentValue + Send + Sync + 'static,
{
    let mut guard = cache.clone().write_owned().await;
    match tokio::task::spawn_blocking(move || guard.synchronize()).await {
        Ok(true) => debug!(reason, "Cache synchronized"),
        Ok(false) => warn!(reason, "Cache synchronize failed, will retry on next flush"),
        Err(err) => warn!(reason, error = %err, "Cache synchronize did not complete"),
    }
}
