//! Session lifecycle state machine.

use std::time::Instant;

use crate::config::SaveSettings;
use crate::games::GameSignature;
use crate::presence::PresencePayload;
use crate::saves::Extractor;

/// Lifecycle event produced by a tick, for observers (log, tray, sink).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Detected(&'static GameSignature),
    Closed(&'static GameSignature),
}

/// Live tracking record for the currently-running game.
struct Session {
    signature: &'static GameSignature,
    /// Captured once at detection, never reset while the session lives.
    started_unix: i64,
    extractor: Extractor,
}

impl Session {
    fn new(signature: &'static GameSignature, now_unix: i64, saves: &SaveSettings) -> Self {
        let extractor = Extractor::for_format(signature.format, saves);
        Self {
            signature,
            started_unix: now_unix,
            extractor,
        }
    }
}

/// Tracks the active game across poll ticks. At most one session exists at a
/// time; a session owns its extractor exclusively.
pub struct GameTracker {
    saves: SaveSettings,
    current: Option<Session>,
}

impl GameTracker {
    pub fn new(saves: SaveSettings) -> Self {
        Self {
            saves,
            current: None,
        }
    }

    /// Consume one scan result and apply the lifecycle transitions.
    ///
    /// A game switch (different signature while active) behaves as the old
    /// game closing and the new one opening: two sequential events and a
    /// fresh session with a new start timestamp.
    pub fn tick(
        &mut self,
        detected: Option<&'static GameSignature>,
        now_unix: i64,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        match (&self.current, detected) {
            (None, None) => {}
            (None, Some(sig)) => {
                self.current = Some(Session::new(sig, now_unix, &self.saves));
                events.push(SessionEvent::Detected(sig));
            }
            (Some(session), Some(sig)) if session.signature == sig => {}
            (Some(session), Some(sig)) => {
                events.push(SessionEvent::Closed(session.signature));
                self.current = Some(Session::new(sig, now_unix, &self.saves));
                events.push(SessionEvent::Detected(sig));
            }
            (Some(session), None) => {
                events.push(SessionEvent::Closed(session.signature));
                self.current = None;
            }
        }

        events
    }

    /// Refresh the active session's telemetry and rebuild its payload.
    ///
    /// The payload is rebuilt from the cache on every call, even when the
    /// refresh found nothing new, so the sink always receives the latest
    /// known-good data. `None` while idle.
    pub fn refresh_payload(&mut self, now: Instant) -> Option<PresencePayload> {
        let session = self.current.as_mut()?;
        session.extractor.refresh(now);

        Some(PresencePayload {
            details: session.extractor.details_text(),
            state: session.extractor.state_text(),
            start_unix: session.started_unix,
            image_key: session.signature.image_key,
            image_text: session.signature.image_text,
        })
    }

    /// Signature of the active session, if any.
    pub fn active(&self) -> Option<&'static GameSignature> {
        self.current.as_ref().map(|s| s.signature)
    }

    /// Start timestamp of the active session, if any.
    pub fn started_unix(&self) -> Option<i64> {
        self.current.as_ref().map(|s| s.started_unix)
    }

    /// Drop the active session without emitting events, for teardown.
    pub fn close(&mut self) -> Option<&'static GameSignature> {
        self.current.take().map(|s| s.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games;
    use pretty_assertions::assert_eq;

    fn tracker() -> GameTracker {
        // Point both games at an empty directory so tests never touch a real
        // save location.
        let dir = tempfile::tempdir().unwrap().keep();
        GameTracker::new(SaveSettings {
            hoi4_dir: Some(dir.clone()),
            stellaris_dir: Some(dir),
            ..SaveSettings::default()
        })
    }

    fn stellaris() -> &'static GameSignature {
        &games::all()[0]
    }

    fn hoi4() -> &'static GameSignature {
        &games::all()[1]
    }

    #[test]
    fn idle_stays_idle_on_none() {
        let mut tracker = tracker();
        assert_eq!(tracker.tick(None, 100), vec![]);
        assert!(tracker.active().is_none());
    }

    #[test]
    fn idle_active_idle_round_trip() {
        let mut tracker = tracker();

        let events = tracker.tick(Some(stellaris()), 100);
        assert_eq!(events, vec![SessionEvent::Detected(stellaris())]);
        assert_eq!(tracker.started_unix(), Some(100));

        // Same game still running: no events, start timestamp untouched.
        assert_eq!(tracker.tick(Some(stellaris()), 200), vec![]);
        assert_eq!(tracker.started_unix(), Some(100));

        let events = tracker.tick(None, 300);
        assert_eq!(events, vec![SessionEvent::Closed(stellaris())]);
        assert!(tracker.active().is_none());
    }

    #[test]
    fn switching_games_starts_a_fresh_session() {
        let mut tracker = tracker();
        tracker.tick(Some(stellaris()), 100);

        let events = tracker.tick(Some(hoi4()), 500);
        assert_eq!(
            events,
            vec![
                SessionEvent::Closed(stellaris()),
                SessionEvent::Detected(hoi4()),
            ]
        );
        assert_eq!(tracker.active(), Some(hoi4()));
        assert_eq!(tracker.started_unix(), Some(500));
    }

    #[test]
    fn payload_is_rebuilt_every_tick_while_active() {
        let mut tracker = tracker();
        assert!(tracker.refresh_payload(Instant::now()).is_none());

        tracker.tick(Some(hoi4()), 100);
        let payload = tracker.refresh_payload(Instant::now()).unwrap();
        // No save data ever extracted: still a non-empty default line.
        assert_eq!(payload.details, "Conquering the World");
        assert_eq!(payload.start_unix, 100);
        assert_eq!(payload.image_key, "hoi4");

        let again = tracker.refresh_payload(Instant::now()).unwrap();
        assert_eq!(again, payload);
    }

    #[test]
    fn close_releases_the_session() {
        let mut tracker = tracker();
        tracker.tick(Some(stellaris()), 100);
        assert_eq!(tracker.close(), Some(stellaris()));
        assert!(tracker.refresh_payload(Instant::now()).is_none());
    }
}
