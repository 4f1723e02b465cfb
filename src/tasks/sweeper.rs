//! Expiration Sweeper
//!
//! Background task that periodically evicts cache entries whose TTL has
//! elapsed. Reads already ignore expired entries, so the sweep only bounds
//! how long expired entries keep holding memory.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};

/// One sweep pass over the store, returning the number of entries removed.
type SweepTick = fn(&mut CacheStore) -> usize;

/// A running sweep loop and the channel used to stop it.
struct SweepTask {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

// == Expiration Sweeper ==
/// Cancellable repeating sweep over one cache store.
///
/// Stopped until [`ExpirationSweeper::start`] is called. Dropping the
/// sweeper stops the loop at its next wake-up.
pub struct ExpirationSweeper {
    store: Arc<RwLock<CacheStore>>,
    interval_ms: Arc<AtomicI64>,
    task: Mutex<Option<SweepTask>>,
}

impl ExpirationSweeper {
    /// Creates a stopped sweeper for `store`.
    pub fn new(store: Arc<RwLock<CacheStore>>, interval_ms: i64) -> Self {
        Self {
            store,
            interval_ms: Arc::new(AtomicI64::new(interval_ms)),
            task: Mutex::new(None),
        }
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms.load(Ordering::Relaxed)
    }

    /// Changes the sweep interval. A running loop picks it up when it next
    /// reschedules; zero or negative makes it stop after its next tick.
    pub fn set_interval_ms(&self, interval_ms: i64) {
        self.interval_ms.store(interval_ms, Ordering::Relaxed);
    }

    /// Returns true while the sweep loop is alive.
    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    // == Start ==
    /// Starts the sweep loop on the current tokio runtime.
    ///
    /// Does nothing if the loop is already running, unless `restart` is set,
    /// in which case the running loop is stopped and a fresh one spawned.
    pub async fn start(&self, restart: bool) -> Result<()> {
        self.start_with(restart, CacheStore::sweep_expired).await
    }

    async fn start_with(&self, restart: bool, tick: SweepTick) -> Result<()> {
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
        let mut task = self.task.lock().await;

        if let Some(running) = task.as_ref() {
            if !running.handle.is_finished() && !restart {
                debug!("Expiration sweeper already running");
                return Ok(());
            }
        }
        if let Some(previous) = task.take() {
            let _ = previous.shutdown_tx.send(true);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = runtime.spawn(sweep_loop(
            self.store.clone(),
            self.interval_ms.clone(),
            shutdown_rx,
            tick,
        ));
        *task = Some(SweepTask {
            shutdown_tx,
            handle,
        });
        Ok(())
    }

    // == Stop ==
    /// Cancels the pending sweep and forgets every tracked key.
    ///
    /// A tick that is already executing runs to completion.
    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            let _ = task.shutdown_tx.send(true);
            info!("Expiration sweeper stopped");
        }
        self.store.write().await.clear_tracked();
    }
}

/// Sleeps for the current interval, sweeps, and repeats until stopped.
async fn sweep_loop(
    store: Arc<RwLock<CacheStore>>,
    interval_ms: Arc<AtomicI64>,
    mut shutdown_rx: watch::Receiver<bool>,
    tick: SweepTick,
) {
    info!(
        "Starting expiration sweeper with interval of {} ms",
        interval_ms.load(Ordering::Relaxed)
    );

    loop {
        let wait = interval_ms.load(Ordering::Relaxed);
        if wait > 0 {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(wait as u64)) => {}
                _ = shutdown_rx.changed() => break,
            }
        }

        // Each tick is its own task so a panic stays confined to that tick
        let tick_store = store.clone();
        let pass = tokio::spawn(async move { tick(&mut *tick_store.write().await) });
        match pass.await {
            Ok(0) => debug!("Expiration sweep: no expired entries found"),
            Ok(removed) => info!("Expiration sweep: removed {} expired entries", removed),
            Err(err) => warn!(error = %err, "Expiration sweep tick failed"),
        }

        if interval_ms.load(Ordering::Relaxed) <= 0 || *shutdown_rx.borrow() {
            break;
        }
    }

    debug!("Expiration sweep loop exited");
}
