use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, select};

use crate::shared::GridShared;

/// Modifications routed between update passes, so a flood of structure
/// writes cannot starve meshing.
const MOD_BATCH: usize = 256;

/// Handle to the background thread that drains modifications and processes
/// pending updates.
pub(crate) struct Worker {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    stop_tx: Sender<()>,
}

impl Worker {
    pub fn spawn(shared: Arc<GridShared>) -> io::Result<Self> {
        Self::spawn_with(shared, run)
    }

    /// Starts the thread with `body` as its loop. It must return once the
    /// stop flag is set or the stop channel fires.
    pub fn spawn_with<F>(shared: Arc<GridShared>, body: F) -> io::Result<Self>
    where
        F: FnOnce(&GridShared, &AtomicBool, &Receiver<()>) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = bounded(1);
        let flag = stop.clone();
        let handle = thread::Builder::new()
            .name("loam-worker".into())
            .spawn(move || body(&shared, &flag, &stop_rx))?;
        log::info!(target: "events", "background worker started");
        Ok(Self {
            handle: Some(handle),
            stop,
            stop_tx,
        })
    }

    /// The thread is gone although nobody asked it to stop.
    pub fn exited_unexpectedly(&self) -> bool {
        !self.stop.load(Ordering::Acquire) && self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Signals stop and joins. An update already in progress completes first.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        let _ = self.stop_tx.try_send(());
        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                log::error!(target: "events", "background worker panicked");
            } else {
                log::info!(target: "events", "background worker stopped");
            }
        }
    }

    /// Joins a thread that has already exited. Returns true if it panicked.
    pub fn reap(&mut self) -> bool {
        self.handle.take().is_some_and(|h| h.join().is_err())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn run(shared: &GridShared, stop: &AtomicBool, stop_rx: &Receiver<()>) {
    while !stop.load(Ordering::Acquire) {
        let routed = shared.drain_mods(MOD_BATCH);
        let built = shared.process_next();
        if routed > 0 || built {
            continue;
        }
        // Every modification send is followed by a wake, so idling on wake is enough.
        select! {
            recv(shared.wake_rx) -> _ => {}
            recv(stop_rx) -> _ => break,
        }
    }
}
