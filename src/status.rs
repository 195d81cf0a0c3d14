//! Lifecycle notification surface.
//!
//! The boundary is a trait so a system tray (or anything else) can plug in;
//! a log-backed implementation is shipped by default.

/// Receives fire-and-forget human-readable lifecycle strings.
pub trait StatusSurface {
    /// Replace the persistent status line ("Waiting for game...").
    fn update_status(&self, text: &str);

    /// Show a one-off notification ("Now tracking Stellaris").
    fn notify(&self, summary: &str, body: &str);
}

/// Status surface that writes to the log.
pub struct LogStatus;

impl StatusSurface for LogStatus {
    fn update_status(&self, text: &str) {
        tracing::info!("status: {text}");
    }

    fn notify(&self, summary: &str, body: &str) {
        tracing::info!("{summary}: {body}");
    }
}
