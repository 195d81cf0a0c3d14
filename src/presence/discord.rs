//! Discord Rich Presence sink using discord-sdk.
//!
//! Each supported game has its own Discord application, so switching games
//! means tearing down the connection and handshaking again under the new
//! application id. The connection lives in a background task fed over a
//! channel; the monitor loop never blocks on Discord.

use std::time::{Duration, SystemTime};

use discord_sdk::{
    activity::{ActivityBuilder, Assets},
    wheel::{UserState, Wheel},
    Discord, Subscriptions,
};
use tokio::sync::mpsc;

use super::{PresencePayload, PresenceSink};

/// Timeout for waiting for the Discord handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
enum SinkCommand {
    Update(PresencePayload),
    Clear,
}

struct Connection {
    app_id: i64,
    tx: mpsc::UnboundedSender<SinkCommand>,
    task: tokio::task::JoinHandle<()>,
}

/// Presence sink backed by the local Discord client.
pub struct DiscordSink {
    connection: Option<Connection>,
}

impl DiscordSink {
    pub fn new() -> Self {
        Self { connection: None }
    }
}

impl Default for DiscordSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceSink for DiscordSink {
    fn initialize(&mut self, app_id: i64) -> bool {
        if let Some(conn) = &self.connection {
            if conn.app_id == app_id && !conn.tx.is_closed() {
                return true;
            }
        }

        // Dropping the old sender ends that connection task, which
        // disconnects from Discord on its way out.
        self.connection = None;

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(app_id, rx));
        self.connection = Some(Connection { app_id, tx, task });
        true
    }

    fn update(&mut self, payload: &PresencePayload) {
        let Some(conn) = &self.connection else {
            tracing::debug!("presence update dropped, sink not initialized");
            return;
        };
        if conn.tx.send(SinkCommand::Update(payload.clone())).is_err() {
            tracing::debug!("presence update dropped, Discord connection gone");
        }
    }

    fn clear(&mut self) {
        if let Some(conn) = &self.connection {
            let _ = conn.tx.send(SinkCommand::Clear);
        }
    }

    fn shutdown(&mut self) -> Option<tokio::task::JoinHandle<()>> {
        let conn = self.connection.take()?;
        tracing::info!("Discord presence sink shut down");
        // Closing the channel lets the task drain queued commands (the final
        // clear included), disconnect, and exit.
        drop(conn.tx);
        Some(conn.task)
    }
}

/// Background task owning one Discord connection.
async fn run_connection(app_id: i64, mut rx: mpsc::UnboundedReceiver<SinkCommand>) {
    let (wheel, handler) = Wheel::new(Box::new(|err| {
        tracing::warn!("Discord error: {err:?}");
    }));

    let mut user = wheel.user();

    let discord = match Discord::new(app_id, Subscriptions::ACTIVITY, Box::new(handler)) {
        Ok(discord) => discord,
        Err(e) => {
            tracing::warn!("Discord not available: {e:?}");
            return;
        }
    };

    tracing::info!("Discord connecting for application {app_id}...");

    let connected = tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
        if user.0.changed().await.is_err() {
            return Err("Discord connection closed".to_string());
        }
        match &*user.0.borrow() {
            UserState::Connected(user) => Ok(user.username.clone()),
            UserState::Disconnected(err) => Err(format!("Discord disconnected: {err:?}")),
        }
    })
    .await;

    match connected {
        Ok(Ok(username)) => tracing::info!("Discord Rich Presence connected as {username}"),
        Ok(Err(e)) => {
            tracing::warn!("{e}");
            return;
        }
        Err(_) => {
            tracing::warn!("Discord handshake timed out");
            return;
        }
    }

    while let Some(command) = rx.recv().await {
        let result = match command {
            SinkCommand::Update(payload) => {
                let start = SystemTime::UNIX_EPOCH
                    + Duration::from_secs(payload.start_unix.max(0) as u64);
                let mut activity = ActivityBuilder::new()
                    .details(payload.details)
                    .assets(Assets::default().large(
                        payload.image_key.to_owned(),
                        Some(payload.image_text.to_owned()),
                    ))
                    .start_timestamp(start);
                if let Some(state) = payload.state {
                    activity = activity.state(state);
                }
                discord.update_activity(activity).await
            }
            SinkCommand::Clear => discord.clear_activity().await,
        };

        if let Err(e) = result {
            tracing::debug!("failed to update Discord activity: {e:?}");
        }
    }

    discord.disconnect().await;
    tracing::info!("Discord connection for application {app_id} closed");
}
