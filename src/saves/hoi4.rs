//! Hearts of Iron IV save decoding.
//!
//! HOI4 saves start with a 7-byte magic header: `HOI4txt` for plaintext saves
//! and `HOI4bin` for Ironman saves. The binary format is deliberately not
//! parsed; plaintext saves are scanned with regexes over a bounded window
//! rather than a real grammar, which is a documented best-effort heuristic.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::extractor::SaveReader;
use super::locate;

const TXT_HEADER: &[u8; 7] = b"HOI4txt";
const BIN_HEADER: &[u8; 7] = b"HOI4bin";

/// Lines scanned after the header before giving up on the regex search.
/// Player tag and date sit near the top of the file; large late-game saves
/// run to hundreds of megabytes and must not be read whole.
const MAX_SCAN_LINES: usize = 1000;

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"player="([A-Z]{3})""#).expect("invalid TAG_RE"));
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"date="(\d{4})\.(\d+)\.(\d+)""#).expect("invalid DATE_RE"));

/// What the 7-byte header said about a save file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveHeader {
    Plaintext,
    Ironman,
    Unknown,
}

/// Reads telemetry out of HOI4 save files.
pub struct Hoi4Reader {
    save_dir: Option<PathBuf>,
    country_name: Option<String>,
    year: Option<String>,
    ironman: bool,
}

impl Hoi4Reader {
    pub fn new() -> Self {
        Self::with_save_dir(default_save_dir())
    }

    /// Use a specific save directory instead of the standard location.
    pub fn with_save_dir(save_dir: Option<PathBuf>) -> Self {
        Self {
            save_dir,
            country_name: None,
            year: None,
            ironman: false,
        }
    }

    fn read_header(path: &Path) -> std::io::Result<SaveHeader> {
        let mut file = File::open(path)?;
        let mut header = [0u8; 7];
        if let Err(e) = file.read_exact(&mut header) {
            // A file shorter than the magic is malformed, not a read failure.
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                tracing::debug!("save file too short for a header");
                return Ok(SaveHeader::Unknown);
            }
            return Err(e);
        }

        Ok(if &header == TXT_HEADER {
            SaveHeader::Plaintext
        } else if &header == BIN_HEADER {
            SaveHeader::Ironman
        } else {
            SaveHeader::Unknown
        })
    }

    /// Scan the first window of a plaintext save for the player tag and date.
    ///
    /// A pattern that fails to match leaves the corresponding cached field
    /// alone, so a partial save still shows the previous good value.
    fn scan_plaintext(&mut self, path: &Path) -> std::io::Result<()> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();

        // First line is the magic header.
        lines.next();

        let mut window = String::new();
        for line in lines.take(MAX_SCAN_LINES) {
            window.push_str(&line?);
            window.push('\n');
        }

        if let Some(caps) = TAG_RE.captures(&window) {
            let tag = &caps[1];
            let name = country_name(tag).unwrap_or(tag);
            tracing::debug!("found player tag {tag} ({name})");
            self.country_name = Some(name.to_string());
        }

        if let Some(caps) = DATE_RE.captures(&window) {
            tracing::debug!("found save date year {}", &caps[1]);
            self.year = Some(caps[1].to_string());
        }

        Ok(())
    }
}

impl Default for Hoi4Reader {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveReader for Hoi4Reader {
    fn locate(&self) -> Option<PathBuf> {
        let dir = self.save_dir.as_deref()?;
        locate::find_latest(dir, ".hoi4", |_| true)
    }

    fn decode(&mut self, path: &Path) {
        let header = match Self::read_header(path) {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!("failed to read save header from {}: {e}", path.display());
                return;
            }
        };

        match header {
            SaveHeader::Ironman => {
                tracing::debug!("binary save detected, Ironman mode");
                self.ironman = true;
                self.country_name = None;
                self.year = None;
            }
            SaveHeader::Unknown => {
                tracing::debug!("unrecognized save header in {}", path.display());
                self.ironman = false;
                self.country_name = None;
                self.year = None;
            }
            SaveHeader::Plaintext => {
                self.ironman = false;
                if let Err(e) = self.scan_plaintext(path) {
                    tracing::warn!("failed to scan save file {}: {e}", path.display());
                }
            }
        }
    }

    fn details_text(&self) -> String {
        if self.ironman {
            return "Conquering the World".to_string();
        }
        match &self.country_name {
            Some(name) => format!("Playing as {name}"),
            None => "Conquering the World".to_string(),
        }
    }

    fn state_text(&self) -> Option<String> {
        if self.ironman {
            return Some("Ironman Mode".to_string());
        }
        self.year.as_ref().map(|year| format!("Year: {year}"))
    }
}

fn default_save_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join("Documents")
            .join("Paradox Interactive")
            .join("Hearts of Iron IV")
            .join("save games")
    })
}

/// Resolve a three-letter country tag to its display name.
///
/// Covers the commonly played tags; anything else is shown verbatim.
fn country_name(tag: &str) -> Option<&'static str> {
    let name = match tag {
        "GER" => "German Reich",
        "SOV" => "Soviet Union",
        "USA" => "United States",
        "ENG" => "United Kingdom",
        "FRA" => "France",
        "ITA" => "Italy",
        "JAP" => "Japan",
        "CHI" => "China",
        "POL" => "Poland",
        "CAN" => "Canada",
        "AST" => "Australia",
        "NZL" => "New Zealand",
        "SAF" => "South Africa",
        "RAJ" => "British Raj",
        "HUN" => "Hungary",
        "ROM" => "Romania",
        "YUG" => "Yugoslavia",
        "SWE" => "Sweden",
        "NOR" => "Norway",
        "FIN" => "Finland",
        "SPR" => "Republican Spain",
        "SPA" => "Nationalist Spain",
        "POR" => "Portugal",
        "BEL" => "Belgium",
        "HOL" => "Netherlands",
        "LUX" => "Luxembourg",
        "DEN" => "Denmark",
        "GRE" => "Greece",
        "TUR" => "Turkey",
        "BUL" => "Bulgaria",
        "MEX" => "Mexico",
        "BRA" => "Brazil",
        "ARG" => "Argentina",
        _ => return None,
    };
    Some(name)
}
