//! Presence-broadcasting boundary.

mod discord;

pub use discord::DiscordSink;

/// One tick's worth of presence data, rebuilt from the extractor cache on
/// every refresh and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresencePayload {
    /// First line, e.g. "Playing as German Reich". Never empty.
    pub details: String,
    /// Optional second line, e.g. "Year: 1939".
    pub state: Option<String>,
    /// Unix timestamp of the session start, for the elapsed-time display.
    pub start_unix: i64,
    /// Large image asset key.
    pub image_key: &'static str,
    /// Large image tooltip.
    pub image_text: &'static str,
}

/// Trait for presence sinks (Discord, a test recorder, ...).
///
/// The monitor loop calls `update` at most once per poll tick while a game is
/// active, and `clear` + `shutdown` on teardown. Sink failures must stay
/// inside the sink: log and drop the payload, the next tick retries
/// naturally.
pub trait PresenceSink {
    /// Connect (or reconnect) for the given application id. A `false` return
    /// means updates will be dropped until the next `initialize`.
    fn initialize(&mut self, app_id: i64) -> bool;

    /// Broadcast the payload.
    fn update(&mut self, payload: &PresencePayload);

    /// Remove any visible presence.
    fn clear(&mut self);

    /// Give the sink a chance to pump its internal callbacks. Most Rust sinks
    /// are task-driven and ignore this.
    fn run_pending_callbacks(&mut self) {}

    /// Tear the sink down for good. Returns the sink's background task, if it
    /// has one, so the caller can wait for queued work (a final clear, the
    /// disconnect) to drain before the process exits.
    fn shutdown(&mut self) -> Option<tokio::task::JoinHandle<()>>;
}
