//! Shutdown Coordination
//!
//! Turns termination signals into a broadcast that long-running commands
//! select on. A second signal exits the process immediately.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Exit code used when a second signal forces the process down
const FORCED_EXIT_CODE: i32 = 130;

/// Coordinates graceful shutdown across the application
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
    signal_count: Arc<AtomicUsize>,
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("shutdown_requested", &self.is_shutdown_requested())
            .finish()
    }
}

impl ShutdownCoordinator {
    /// Create a coordinator together with a first receiver
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);
        let coordinator = Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            signal_count: Arc::new(AtomicUsize::new(0)),
        };
        (coordinator, shutdown_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Record one received signal
    ///
    /// Returns `true` for the first signal, which triggers shutdown. Later
    /// signals return `false` and the caller should exit at once.
    fn on_signal(&self) -> bool {
        let previous = self.signal_count.fetch_add(1, Ordering::AcqRel);
        self.trigger_shutdown();
        previous == 0
    }

    /// Spawn listeners for termination signals on the current runtime
    ///
    /// Signals are handled until the returned listener is stopped or dropped.
    pub fn listen_for_signals(&self) -> SignalListener {
        let mut tasks = Vec::new();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            // Writing into a closed pipe should end the process quietly.
            unsafe {
                libc::signal(libc::SIGPIPE, libc::SIG_DFL);
            }

            for kind in [
                SignalKind::interrupt(),
                SignalKind::terminate(),
                SignalKind::hangup(),
            ] {
                let coordinator = self.clone();
                tasks.push(tokio::spawn(async move {
                    let Ok(mut stream) = signal(kind) else {
                        log::warn!("Could not listen for signal {:?}", kind);
                        return;
                    };
                    while stream.recv().await.is_some() {
                        if !coordinator.on_signal() {
                            log::warn!("Second signal received; exiting");
                            std::process::exit(FORCED_EXIT_CODE);
                        }
                        log::info!("Shutdown requested, press Ctrl-C again to force exit");
                    }
                }));
            }
        }

        #[cfg(not(unix))]
        {
            let coordinator = self.clone();
            tasks.push(tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if !coordinator.on_signal() {
                        log::warn!("Ctrl-C received again; exiting");
                        std::process::exit(FORCED_EXIT_CODE);
                    }
                    log::info!("Shutdown requested, press Ctrl-C again to force exit");
                }
            }));
        }

        SignalListener { tasks }
    }
}

/// Running signal listener tasks; dropping this aborts them
#[must_use = "signals are only handled while the listener is kept"]
#[derive(Debug)]
pub struct SignalListener {
    tasks: Vec<JoinHandle<()>>,
}

impl SignalListener {
    /// Abort the listener tasks and wait for them to end
    ///
    /// Returns the number of listeners that were still active.
    pub async fn stop(mut self) -> usize {
        let mut stopped = 0;
        for task in std::mem::take(&mut self.tasks) {
            task.abort();
            if matches!(task.await, Err(e) if e.is_cancelled()) {
                stopped += 1;
            }
        }
        log::debug!("Stopped {} signal listener(s)", stopped);
        stopped
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_trigger_reaches_all_receivers() {
        let (coordinator, mut rx1) = ShutdownCoordinator::new();
        let mut rx2 = coordinator.subscribe();
        assert!(!coordinator.is_shutdown_requested());

        coordinator.trigger_shutdown();

        assert!(coordinator.is_shutdown_requested());
        assert!(timeout(Duration::from_millis(100), rx1.recv()).await.is_ok());
        assert!(timeout(Duration::from_millis(100), rx2.recv()).await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let (coordinator, mut rx) = ShutdownCoordinator::new();
        let clone = coordinator.clone();

        clone.trigger_shutdown();

        assert!(coordinator.is_shutdown_requested());
        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_listener_stops() {
        let (coordinator, _rx) = ShutdownCoordinator::new();
        let listener = coordinator.listen_for_signals();
        assert_eq!(listener.stop().await, 3);
        assert!(!coordinator.is_shutdown_requested());
    }

    #[test]
    fn test_only_first_signal_is_graceful() {
        let (coordinator, _rx) = ShutdownCoordinator::new();
        assert!(coordinator.on_signal());
        assert!(!coordinator.on_signal());
        assert!(coordinator.is_shutdown_requested());
    }
}
