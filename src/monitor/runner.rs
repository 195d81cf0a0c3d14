//! Outer poll loop.

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::config::Settings;
use crate::games::GameSignature;
use crate::presence::PresenceSink;
use crate::scanner::ProcessScanner;
use crate::status::StatusSurface;

use super::tracker::{GameTracker, SessionEvent};

/// How long teardown waits for the sink's background task to drain.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Ties the scanner, tracker, sink and status surface together in a single
/// cooperative loop. All work per tick is synchronous and bounded; the sleep
/// between ticks is the only cancellation point.
pub struct Monitor {
    settings: Settings,
    scanner: ProcessScanner,
    tracker: GameTracker,
    sink: Box<dyn PresenceSink>,
    status: Box<dyn StatusSurface>,
}

impl Monitor {
    pub fn new(
        settings: Settings,
        sink: Box<dyn PresenceSink>,
        status: Box<dyn StatusSurface>,
    ) -> Self {
        let tracker = GameTracker::new(settings.saves.clone());
        Self {
            settings,
            scanner: ProcessScanner::new(),
            tracker,
            sink,
            status,
        }
    }

    /// Run until Ctrl-C, then tear down cleanly.
    pub async fn run(&mut self) -> Result<()> {
        let interval = Duration::from_millis(self.settings.poll_interval_ms);
        self.status.update_status("Waiting for game...");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    break;
                }
            }

            self.tick();
            self.sink.run_pending_callbacks();
        }

        self.teardown().await;
        Ok(())
    }

    /// One poll cycle: scan, apply transitions, forward presence.
    fn tick(&mut self) {
        let detected = self.scanner.scan();
        self.apply(detected);
    }

    fn apply(&mut self, detected: Option<&'static GameSignature>) {
        let events = self.tracker.tick(detected, chrono::Utc::now().timestamp());

        for event in events {
            match event {
                SessionEvent::Detected(sig) => {
                    tracing::info!("game detected: {}", sig.display_name);
                    self.status
                        .update_status(&format!("Playing {}", sig.display_name));
                    self.status
                        .notify("pdxrpc", &format!("Now tracking {}", sig.display_name));
                    self.sink.initialize(sig.app_id);
                }
                SessionEvent::Closed(sig) => {
                    tracing::info!("game closed: {}", sig.display_name);
                    self.status.update_status("Waiting for game...");
                    self.sink.clear();
                }
            }
        }

        // Forward the latest known-good data every tick while active, even
        // when the save refresh found nothing new.
        if let Some(payload) = self.tracker.refresh_payload(Instant::now()) {
            self.sink.update(&payload);
        }
    }

    /// Close the session and drain the sink before returning, so the final
    /// clear and disconnect reach their destination before the runtime (and
    /// any task the sink spawned) goes away.
    async fn teardown(&mut self) {
        if let Some(sig) = self.tracker.close() {
            tracing::info!("game closed: {}", sig.display_name);
        }
        self.sink.clear();
        if let Some(task) = self.sink.shutdown() {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await.is_err() {
                tracing::warn!("presence sink did not drain in time");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::PresencePayload;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingSink {
        initialized: Arc<AtomicUsize>,
        updates: Arc<AtomicUsize>,
        cleared: Arc<AtomicUsize>,
        shutdowns: Arc<AtomicUsize>,
        /// Bumped by the background task handed out of `shutdown`, so tests
        /// can tell whether teardown actually waited for it.
        drained: Arc<AtomicUsize>,
    }

    impl PresenceSink for RecordingSink {
        fn initialize(&mut self, _app_id: i64) -> bool {
            self.initialized.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn update(&mut self, _payload: &PresencePayload) {
            self.updates.fetch_add(1, Ordering::SeqCst);
        }

        fn clear(&mut self) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
        }

        fn shutdown(&mut self) -> Option<tokio::task::JoinHandle<()>> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            let drained = Arc::clone(&self.drained);
            Some(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                drained.fetch_add(1, Ordering::SeqCst);
            }))
        }
    }

    struct QuietStatus;

    impl StatusSurface for QuietStatus {
        fn update_status(&self, _text: &str) {}
        fn notify(&self, _summary: &str, _body: &str) {}
    }

    fn monitor_with_recording_sink() -> (Monitor, RecordingSink) {
        let sink = RecordingSink::default();
        let handles = RecordingSink {
            initialized: Arc::clone(&sink.initialized),
            updates: Arc::clone(&sink.updates),
            cleared: Arc::clone(&sink.cleared),
            shutdowns: Arc::clone(&sink.shutdowns),
            drained: Arc::clone(&sink.drained),
        };
        let mut settings = Settings::default();
        let empty = tempfile::tempdir().unwrap().keep();
        settings.saves.hoi4_dir = Some(empty.clone());
        settings.saves.stellaris_dir = Some(empty);
        (
            Monitor::new(settings, Box::new(sink), Box::new(QuietStatus)),
            handles,
        )
    }

    #[test]
    fn detection_initializes_sink_and_sends_updates() {
        let (mut monitor, sink) = monitor_with_recording_sink();
        let stellaris = &crate::games::all()[0];

        monitor.apply(Some(stellaris));
        assert_eq!(sink.initialized.load(Ordering::SeqCst), 1);
        assert_eq!(sink.updates.load(Ordering::SeqCst), 1);

        // Still running: no re-initialize, but a fresh payload every tick.
        monitor.apply(Some(stellaris));
        assert_eq!(sink.initialized.load(Ordering::SeqCst), 1);
        assert_eq!(sink.updates.load(Ordering::SeqCst), 2);

        monitor.apply(None);
        assert_eq!(sink.cleared.load(Ordering::SeqCst), 1);
        assert_eq!(sink.updates.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn idle_ticks_touch_nothing() {
        let (mut monitor, sink) = monitor_with_recording_sink();
        monitor.apply(None);
        assert_eq!(sink.initialized.load(Ordering::SeqCst), 0);
        assert_eq!(sink.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn teardown_drains_the_sink_before_returning() {
        let (mut monitor, sink) = monitor_with_recording_sink();
        monitor.teardown().await;

        assert_eq!(sink.cleared.load(Ordering::SeqCst), 1);
        assert_eq!(sink.shutdowns.load(Ordering::SeqCst), 1);
        // The background task the sink handed back must have finished by the
        // time teardown returned, not been abandoned to die with the runtime.
        assert_eq!(sink.drained.load(Ordering::SeqCst), 1);
    }
}
