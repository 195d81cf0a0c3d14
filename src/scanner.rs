//! Process scanning against the game registry.

use std::process::Command;

use crate::games::{self, GameSignature};

/// Scans the host process list for supported games.
pub struct ProcessScanner;

impl ProcessScanner {
    pub fn new() -> Self {
        Self
    }

    /// Check the running processes for a supported game.
    ///
    /// Any failure to invoke or read the process listing is logged and
    /// degrades to `None`; detection never takes the loop down.
    pub fn scan(&self) -> Option<&'static GameSignature> {
        let output = match list_processes() {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("process listing failed: {e:#}");
                return None;
            }
        };

        match_lines(output.lines())
    }
}

impl Default for ProcessScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Match process-listing lines against the registry.
///
/// Registry order is the priority order: the first signature whose key appears
/// as a case-insensitive substring of any line wins, regardless of which line
/// comes first in the listing.
pub fn match_lines<'a, I>(lines: I) -> Option<&'static GameSignature>
where
    I: Iterator<Item = &'a str>,
{
    let lines: Vec<String> = lines.map(|l| l.to_lowercase()).collect();

    games::all()
        .iter()
        .find(|sig| lines.iter().any(|line| line.contains(sig.process_key)))
}

#[cfg(windows)]
fn list_processes() -> anyhow::Result<String> {
    use anyhow::Context;

    let output = Command::new("tasklist.exe")
        .output()
        .context("failed to execute tasklist.exe")?;
    Ok(listing_from("tasklist.exe", output))
}

#[cfg(not(windows))]
fn list_processes() -> anyhow::Result<String> {
    use anyhow::Context;

    // comm= gives one bare process name per line, no header.
    let output = Command::new("ps")
        .args(["-e", "-o", "comm="])
        .output()
        .context("failed to execute ps")?;
    Ok(listing_from("ps", output))
}

/// Extract the listing text, flagging a failed child so an empty listing is
/// not silently mistaken for an empty process table.
fn listing_from(tool: &str, output: std::process::Output) -> String {
    if !output.status.success() {
        tracing::warn!(
            "{tool} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}
