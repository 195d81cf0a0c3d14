//! pdxrpc - Discord Rich Presence for Paradox grand strategy games.
//!
//! Watches the process list for supported games, tracks one session at a
//! time, and opportunistically parses the newest save file to show what is
//! being played ("Playing as German Reich", "Year: 1939") through Discord
//! Rich Presence.

pub mod config;
pub mod games;
pub mod monitor;
pub mod presence;
pub mod saves;
pub mod scanner;
pub mod status;
