//! Stellaris save decoding.
//!
//! Stellaris saves are zip containers holding a small `meta` entry and a large
//! `gamestate` entry. Both are scanned with first-match regexes; when `meta`
//! yields no empire name the first `name="..."` in `gamestate` is used
//! instead. That fallback is inherently ambiguous (a gamestate document holds
//! many `name=` keys) and is kept as-is rather than papered over with a real
//! parser.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use zip::ZipArchive;

use super::extractor::SaveReader;
use super::locate;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"date="([^"]+)""#).expect("invalid DATE_RE"));
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="([^"]+)""#).expect("invalid NAME_RE"));

/// Reads telemetry out of Stellaris save archives.
pub struct StellarisReader {
    save_dir: Option<PathBuf>,
    game_date: Option<String>,
    empire_name: Option<String>,
}

impl StellarisReader {
    pub fn new() -> Self {
        Self::with_save_dir(default_save_dir())
    }

    /// Use a specific save directory instead of the standard location.
    pub fn with_save_dir(save_dir: Option<PathBuf>) -> Self {
        Self {
            save_dir,
            game_date: None,
            empire_name: None,
        }
    }

    fn scan_archive(&mut self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let file = File::open(path)
            .with_context(|| format!("failed to open save file {}", path.display()))?;
        let mut archive = ZipArchive::new(file)
            .with_context(|| format!("failed to read save archive {}", path.display()))?;

        let mut name_found = false;

        match read_entry(&mut archive, "meta") {
            Some(meta) => {
                if let Some(caps) = DATE_RE.captures(&meta) {
                    self.game_date = Some(caps[1].to_string());
                }
                if let Some(caps) = NAME_RE.captures(&meta) {
                    self.empire_name = Some(caps[1].to_string());
                    name_found = true;
                }
            }
            None => tracing::debug!("no meta entry in {}", path.display()),
        }

        if !name_found {
            // Heuristic fallback: first name="..." anywhere in the gamestate.
            match read_entry(&mut archive, "gamestate") {
                Some(gamestate) => {
                    if let Some(caps) = NAME_RE.captures(&gamestate) {
                        self.empire_name = Some(caps[1].to_string());
                    }
                }
                None => tracing::debug!("no gamestate entry in {}", path.display()),
            }
        }

        tracing::debug!(
            "extracted date {:?}, empire {:?}",
            self.game_date,
            self.empire_name
        );
        Ok(())
    }
}

impl Default for StellarisReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveReader for StellarisReader {
    fn locate(&self) -> Option<PathBuf> {
        let dir = self.save_dir.as_deref()?;
        // Ironman autosaves are binary; the locator never surfaces them.
        locate::find_latest(dir, ".sav", |name| !name.starts_with("ironman"))
    }

    fn decode(&mut self, path: &Path) {
        // A corrupt or half-written archive keeps the previous cache.
        if let Err(e) = self.scan_archive(path) {
            tracing::warn!("{e:#}");
        }
    }

    fn details_text(&self) -> String {
        match &self.empire_name {
            Some(name) => format!("Playing as {name}"),
            None => "Exploring the Galaxy".to_string(),
        }
    }

    fn state_text(&self) -> Option<String> {
        let date = self.game_date.as_deref()?;
        let year = date.split('.').next().unwrap_or(date);
        Some(format!("Year: {year}"))
    }
}

/// Read a named archive entry as (lossy) text, `None` when absent or
/// unreadable.
fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Option<String> {
    let mut entry = archive.by_name(name).ok()?;
    let mut bytes = Vec::new();
    if let Err(e) = entry.read_to_end(&mut bytes) {
        tracing::debug!("failed to read {name} entry: {e}");
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn default_save_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join("Documents")
            .join("Paradox Interactive")
            .join("Stellaris")
            .join("save games")
    })
}
